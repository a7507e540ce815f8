//! Main runner for the differential filter

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use catalogo_core::{CancelToken, CatalogReader, LanguageFilter, ProgressContext, percent};

use crate::filter::{DifferentialFilter, Progress, output_writer};
use crate::keyset::ReferenceSet;

/// Runtime configuration for one differential run
#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Full catalog export (rows to filter)
    pub catalog: PathBuf,
    /// Owned-items list (reference keys)
    pub reference: PathBuf,
    /// Destination CSV
    pub output: PathBuf,
    /// `None` keeps every language
    pub languages: Option<LanguageFilter>,
    /// Rows between progress lines
    pub progress_every: usize,
    /// Suppress progress output
    pub quiet: bool,
}

/// Run summary
#[derive(Debug)]
pub struct Summary {
    pub processed: usize,
    pub kept: usize,
    pub skipped: usize,
    pub warnings: usize,
    pub reference_keys: usize,
    pub interrupted: bool,
    /// `None` when interrupted before the output file was created
    pub output: Option<PathBuf>,
    pub elapsed: Duration,
}

/// Progress line for `p`, as logged every `progress_every` rows
pub fn progress_message(p: &Progress) -> String {
    format!(
        "Processed {}/{} rows ({:.2}%)... Kept {} rows so far.",
        p.processed,
        p.total,
        percent(p.processed, p.total),
        p.kept
    )
}

/// Run the differential filter, logging progress lines
pub fn run(config: &DiffConfig, progress: &ProgressContext, cancel: &CancelToken) -> Result<Summary> {
    run_with(config, progress, cancel, |line| log::info!("{line}"))
}

/// Run the differential filter, handing progress lines to `report`
///
/// `report` is never called when `config.quiet` is set.
pub fn run_with(
    config: &DiffConfig,
    progress: &ProgressContext,
    cancel: &CancelToken,
    mut report: impl FnMut(&str),
) -> Result<Summary> {
    let start = Instant::now();

    if let Some(languages) = &config.languages {
        log::info!("Filtering languages: {:?}", languages.names());
    }

    let reference_rows = CatalogReader::open(&config.reference)
        .with_context(|| format!("Failed to open {}", config.reference.display()))?;
    let reference = ReferenceSet::from_reader(reference_rows)
        .with_context(|| format!("Failed to read {}", config.reference.display()))?;
    log::info!(
        "Loaded {} reference keys ({} rows skipped)",
        reference.len(),
        reference.skipped_rows()
    );
    if cancel.is_cancelled() {
        return Ok(interrupted_early(reference.len(), start));
    }

    let total = catalogo_core::count_data_rows(&config.catalog)
        .with_context(|| format!("Failed to read {}", config.catalog.display()))?;
    if cancel.is_cancelled() {
        return Ok(interrupted_early(reference.len(), start));
    }

    let rows = CatalogReader::open(&config.catalog)
        .with_context(|| format!("Failed to open {}", config.catalog.display()))?;
    let file = File::create(&config.output)
        .with_context(|| format!("Failed to create {}", config.output.display()))?;
    let mut out = output_writer(BufWriter::new(file));

    let bar = if config.quiet {
        indicatif::ProgressBar::hidden()
    } else {
        progress.rows_bar("rows", total as u64)
    };

    let filter = DifferentialFilter::new(&reference, config.languages.as_ref());
    let stats = filter
        .run(rows, &mut out, total, config.progress_every, cancel, |p| {
            bar.set_position(p.processed as u64);
            if !config.quiet {
                report(&progress_message(p));
            }
        })
        .with_context(|| format!("Failed to filter {}", config.catalog.display()))?;
    bar.finish_and_clear();

    if stats.interrupted {
        log::warn!("Interrupted by user after {} rows", stats.processed);
    }

    Ok(Summary {
        processed: stats.processed,
        kept: stats.kept,
        skipped: stats.skipped,
        warnings: stats.warnings,
        reference_keys: reference.len(),
        interrupted: stats.interrupted,
        output: Some(config.output.clone()),
        elapsed: start.elapsed(),
    })
}

fn interrupted_early(reference_keys: usize, start: Instant) -> Summary {
    log::warn!("Interrupted by user before processing any rows");
    Summary {
        processed: 0,
        kept: 0,
        skipped: 0,
        warnings: 0,
        reference_keys,
        interrupted: true,
        output: None,
        elapsed: start.elapsed(),
    }
}
