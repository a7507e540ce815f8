//! Catalogo Magnet - magnet links from catalog rows
//!
//! Expands each row's comma-separated info-hash list into magnet URIs with a
//! synthesized display name and a fixed tracker list, then writes them to a
//! text file or pushes them to a qBittorrent instance in paced batches.

pub mod batcher;
pub mod magnet;
pub mod qbittorrent;
pub mod runner;

// Re-exports
pub use batcher::{
    ApiError, BatchPolicy, Credentials, Pacer, SubmitReport, ThreadPacer, TorrentApi,
    submit_batches, write_lines,
};
pub use magnet::{MagnetList, MagnetRecord, TRACKERS, display_name, magnet_uri};
pub use qbittorrent::QbitClient;
pub use runner::{ApiTarget, Delivery, MagnetConfig, Summary, generate, run, run_with};
