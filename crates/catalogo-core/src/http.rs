//! Blocking facade over async reqwest.
//!
//! Requests run on a shared single-threaded tokio runtime and are driven with
//! `block_on`, so callers stay plain sequential code.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect/request timeouts for API sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Error from an HTTP exchange
#[derive(Debug)]
pub struct HttpError {
    /// Response status, `None` for transport failures
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(s) => write!(f, "HTTP {s}: {}", self.message),
            None => write!(f, "HTTP error: {}", self.message),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Create HTTP error from reqwest error, without the request URL
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        Self {
            status: e.status().map(|s| s.as_u16()),
            message: e.without_url().to_string(),
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        Self::from_reqwest(e)
    }
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Build a client that keeps cookies between requests (one per API session).
pub fn session_client(config: &HttpConfig) -> Result<reqwest::Client, HttpError> {
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .cookie_store(true)
        .build()
        .map_err(HttpError::from)
}

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormResponse {
    pub status: u16,
    pub body: String,
}

impl FormResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// POST a form-encoded body and return status and response text.
///
/// Only transport failures are errors; the caller judges the status.
pub fn post_form(
    client: &reqwest::Client,
    url: &str,
    form: &[(&str, &str)],
) -> Result<FormResponse, HttpError> {
    SHARED_RUNTIME.block_on(async {
        let resp = client.post(url).form(form).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok::<_, HttpError>(FormResponse { status, body })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_http_with_status() {
        let err = HttpError {
            status: Some(403),
            message: "Forbidden".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP 403: Forbidden");
    }

    #[test]
    fn display_http_without_status() {
        let err = HttpError {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP error: connection refused");
    }

    #[test]
    fn refused_connection_has_no_status() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = session_client(&HttpConfig::default()).unwrap();
        let err = post_form(&client, &format!("http://127.0.0.1:{port}/x"), &[("a", "b")])
            .unwrap_err();
        assert_eq!(err.status, None);
        assert!(err.to_string().starts_with("HTTP error: "));
        assert!(!err.message.contains("127.0.0.1"));
    }

    #[test]
    fn default_timeouts() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn form_response_success_range() {
        let ok = FormResponse {
            status: 200,
            body: "Ok.".to_string(),
        };
        let forbidden = FormResponse {
            status: 403,
            body: "Forbidden".to_string(),
        };
        assert!(ok.is_success());
        assert!(!forbidden.is_success());
    }

    #[test]
    fn session_client_builds() {
        assert!(session_client(&HttpConfig::default()).is_ok());
    }
}
