//! Delivery of the magnet list: a text file, or rate-limited API batches

use std::io::{self, Write};
use std::time::Duration;

use catalogo_core::{CancelToken, HttpError};

/// Error from the torrent client API
#[derive(Debug)]
pub enum ApiError {
    /// Login answered with something other than the success body
    Auth { status: u16, body: String },
    Http(HttpError),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth { status, body } => {
                write!(f, "authentication failed (HTTP {status}): {body:?}")
            }
            Self::Http(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<HttpError> for ApiError {
    fn from(e: HttpError) -> Self {
        Self::Http(e)
    }
}

/// Remote torrent client accepting newline-separated magnet lists.
pub trait TorrentApi {
    fn login(&mut self, username: &str, password: &str) -> Result<(), ApiError>;

    /// Submit one batch (URIs joined with `\n`).
    fn add_urls(&mut self, urls: &str) -> Result<(), ApiError>;
}

/// Sleeps between batches.
pub trait Pacer {
    fn pause(&mut self, duration: Duration);
}

/// Real wall-clock sleeping
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Batch size and pauses for API submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub batch_size: usize,
    /// Pause after every batch
    pub delay: Duration,
    /// Extra pause after every `long_pause_every`-th batch
    pub long_delay: Duration,
    pub long_pause_every: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 400,
            delay: Duration::from_secs(2),
            long_delay: Duration::from_secs(5),
            long_pause_every: 10,
        }
    }
}

/// Login credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Outcome of an API submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitReport {
    pub total: usize,
    pub sent: usize,
    pub batches: usize,
    /// Stopped early on cancellation
    pub interrupted: bool,
}

/// Write one magnet per line, in order. Returns the count written.
pub fn write_lines<W: Write>(magnets: &[String], mut out: W) -> io::Result<usize> {
    for magnet in magnets {
        out.write_all(magnet.as_bytes())?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(magnets.len())
}

/// Log in, then submit `magnets` in order in fixed-size batches.
///
/// A failed login returns before any batch is sent. Cancellation is checked
/// before each batch; batches already sent stay sent. A request error stops
/// the loop and is returned.
pub fn submit_batches(
    api: &mut impl TorrentApi,
    credentials: &Credentials,
    magnets: &[String],
    policy: &BatchPolicy,
    pacer: &mut impl Pacer,
    cancel: &CancelToken,
) -> Result<SubmitReport, ApiError> {
    api.login(&credentials.username, &credentials.password)?;

    let batch_size = policy.batch_size.max(1);
    let mut report = SubmitReport {
        total: magnets.len(),
        ..SubmitReport::default()
    };
    log::info!(
        "Connected. Pushing {} magnets in batches of {batch_size}...",
        report.total
    );

    for batch in magnets.chunks(batch_size) {
        if cancel.is_cancelled() {
            log::warn!("Interrupted by user, {} batches not sent", remaining(&report, batch_size));
            report.interrupted = true;
            break;
        }
        api.add_urls(&batch.join("\n"))?;
        report.sent += batch.len();
        report.batches += 1;
        log::info!("Sent {}/{}", report.sent, report.total);

        pacer.pause(policy.delay);
        if policy.long_pause_every > 0 && report.batches % policy.long_pause_every == 0 {
            pacer.pause(policy.long_delay);
        }
    }

    log::info!("Finished sending. Sent {}/{}", report.sent, report.total);
    Ok(report)
}

fn remaining(report: &SubmitReport, batch_size: usize) -> usize {
    (report.total - report.sent).div_ceil(batch_size)
}
