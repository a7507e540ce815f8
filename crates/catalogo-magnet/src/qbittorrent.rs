//! qBittorrent Web API client (login + torrents/add)

use catalogo_core::{FormResponse, HttpConfig, post_form, session_client};

use crate::batcher::{ApiError, TorrentApi};

/// Exact body qBittorrent returns for a successful login
pub const LOGIN_OK: &str = "Ok.";

/// Base URL with a scheme and without trailing slashes.
///
/// `localhost:8080` becomes `http://localhost:8080`.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// Login succeeds only on the literal success body, whatever the status.
pub fn check_login(response: FormResponse) -> Result<(), ApiError> {
    if response.body == LOGIN_OK {
        Ok(())
    } else {
        Err(ApiError::Auth {
            status: response.status,
            body: response.body,
        })
    }
}

/// Cookie-backed session against one qBittorrent instance
pub struct QbitClient {
    client: reqwest::Client,
    base_url: String,
}

impl QbitClient {
    pub fn new(base_url: &str, http: &HttpConfig) -> Result<Self, ApiError> {
        Ok(Self {
            client: session_client(http)?,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn login_url(&self) -> String {
        format!("{}/api/v2/auth/login", self.base_url)
    }

    pub fn add_url(&self) -> String {
        format!("{}/api/v2/torrents/add", self.base_url)
    }
}

impl TorrentApi for QbitClient {
    fn login(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        let response = post_form(
            &self.client,
            &self.login_url(),
            &[("username", username), ("password", password)],
        )?;
        check_login(response)
    }

    fn add_urls(&mut self, urls: &str) -> Result<(), ApiError> {
        let response = post_form(&self.client, &self.add_url(), &[("urls", urls)])?;
        if !response.is_success() {
            log::warn!(
                "torrents/add answered HTTP {}: {}",
                response.status,
                response.body.trim()
            );
        }
        Ok(())
    }
}
