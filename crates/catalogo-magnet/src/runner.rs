//! Main runner for magnet generation and delivery

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use catalogo_core::{CancelToken, CatalogReader, HttpConfig, LanguageFilter};

use crate::batcher::{
    BatchPolicy, Credentials, Pacer, SubmitReport, ThreadPacer, TorrentApi, submit_batches,
    write_lines,
};
use crate::magnet::MagnetList;
use crate::qbittorrent::QbitClient;

/// Torrent client connection and pacing
#[derive(Debug, Clone)]
pub struct ApiTarget {
    pub url: String,
    pub credentials: Credentials,
    pub policy: BatchPolicy,
    pub http: HttpConfig,
}

/// Where the generated magnets go
#[derive(Debug, Clone)]
pub enum Delivery {
    /// One URI per line in a text file
    Text { output: PathBuf },
    /// Batched submission to the torrent client
    Api(ApiTarget),
}

/// Runtime configuration for one generation run
#[derive(Debug, Clone)]
pub struct MagnetConfig {
    pub input: PathBuf,
    pub languages: Option<LanguageFilter>,
    pub delivery: Delivery,
}

/// Run summary
#[derive(Debug)]
pub struct Summary {
    /// Rows that passed the language filter
    pub rows: usize,
    pub links: usize,
    pub magnets: usize,
    /// Lines written in text mode
    pub written: Option<usize>,
    /// Submission outcome in API mode
    pub submitted: Option<SubmitReport>,
    pub elapsed: Duration,
}

/// Read the catalog file and expand every accepted row into magnets.
pub fn generate(input: &Path, languages: Option<LanguageFilter>) -> Result<MagnetList> {
    let rows = CatalogReader::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let mut list = MagnetList::new(languages);
    for row in rows {
        let row = row.with_context(|| format!("Failed to read {}", input.display()))?;
        list.push_row(&row);
    }
    log::info!(
        "CSV rows: {}, Magnets: {} (from {} enlaces)",
        list.rows(),
        list.magnets().len(),
        list.links()
    );
    Ok(list)
}

/// Generate magnets and deliver them with the real HTTP client.
pub fn run(config: &MagnetConfig, cancel: &CancelToken) -> Result<Summary> {
    run_with(
        config,
        |target| QbitClient::new(&target.url, &target.http).context("Failed to build HTTP client"),
        &mut ThreadPacer,
        cancel,
    )
}

/// Same as [`run`] with the API client and pacer supplied by the caller.
///
/// `connect` is only called in API mode.
pub fn run_with<A: TorrentApi>(
    config: &MagnetConfig,
    connect: impl FnOnce(&ApiTarget) -> Result<A>,
    pacer: &mut impl Pacer,
    cancel: &CancelToken,
) -> Result<Summary> {
    let start = Instant::now();
    let list = generate(&config.input, config.languages.clone())?;
    let (rows, links) = (list.rows(), list.links());
    let magnets = list.into_magnets();

    let mut summary = Summary {
        rows,
        links,
        magnets: magnets.len(),
        written: None,
        submitted: None,
        elapsed: Duration::ZERO,
    };

    match &config.delivery {
        Delivery::Text { output } => {
            let file = File::create(output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let written = write_lines(&magnets, BufWriter::new(file))
                .with_context(|| format!("Failed to write {}", output.display()))?;
            log::info!("Wrote {written} magnets to {}", output.display());
            summary.written = Some(written);
        }
        Delivery::Api(target) => {
            let mut api = connect(target)?;
            let report = submit_batches(
                &mut api,
                &target.credentials,
                &magnets,
                &target.policy,
                pacer,
                cancel,
            )
            .with_context(|| format!("Submission to {} failed", target.url))?;
            summary.submitted = Some(report);
        }
    }

    summary.elapsed = start.elapsed();
    Ok(summary)
}
