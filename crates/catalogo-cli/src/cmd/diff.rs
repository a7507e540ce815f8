//! csv-diferencial - catalog rows missing from the owned-items list

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use catalogo_core::{CancelToken, LanguageFilter, ProgressContext, fmt_num};
use catalogo_diff::{DiffConfig, Summary};

use crate::config::Config;
use crate::{command_line, print_summary, run_stamp};

const ABOUT: &str = "Compare a full catalog export against your owned-items list";

const LONG_ABOUT: &str = "\
Compare a full catalog export against your owned-items list.

Writes every catalog row that is not in the owned list, or is there with a
different revision, to difference-<YY-MM-DD-HHMM>.csv. Rows are matched on
'EPL Id' + 10000000 against '#epg_id', and 'Revisión' against '#version'.
Rows whose identifier cannot be read are kept and reported as warnings.";

#[derive(Parser, Debug)]
#[command(name = "csv-diferencial", version, about = ABOUT, long_about = LONG_ABOUT)]
pub struct DiffArgs {
    /// Full catalog export to filter
    pub catalog: Option<PathBuf>,

    /// Owned-items list to compare against
    pub reference: Option<PathBuf>,

    /// Also write the log to difference-<YY-MM-DD-HHMM>.log
    #[arg(short = 'l', long)]
    pub log: bool,

    /// Only keep these languages (comma-separated, overrides config)
    #[arg(long, value_delimiter = ',')]
    pub languages: Option<Vec<String>>,

    /// Suppress progress messages; only the final summary is printed
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory for output and log files (default: config or current dir)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Config file path (default: ./catalogo.toml or ~/.config/catalogo/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// `difference-<stamp>.csv` and `difference-<stamp>.log` inside `dir`
pub fn output_paths(dir: &Path, stamp: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("difference-{stamp}.csv")),
        dir.join(format!("difference-{stamp}.log")),
    )
}

pub fn main() -> ExitCode {
    let args = DiffArgs::parse();
    let (Some(catalog), Some(reference)) = (args.catalog.clone(), args.reference.clone()) else {
        let _ = DiffArgs::command().print_long_help();
        return ExitCode::SUCCESS;
    };
    match run(args, catalog, reference) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            crate::report_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: DiffArgs, catalog: PathBuf, reference: PathBuf) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.diff.output_dir.clone());
    let (output, log_path) = output_paths(&output_dir, &run_stamp());

    let progress = ProgressContext::new();
    let multi = if progress.is_tty() && !args.quiet {
        Some(progress.multi())
    } else {
        None
    };
    catalogo_core::init_logging(
        args.quiet,
        args.debug,
        multi,
        args.log.then_some(log_path.as_path()),
    )?;
    log::info!("Command: {}", command_line());
    config.log_source();

    let cancel = CancelToken::new();
    catalogo_core::install_signal_handlers(&cancel)?;

    let languages = match &args.languages {
        Some(names) => LanguageFilter::new(names),
        None => LanguageFilter::new(&config.diff.default_languages),
    };

    let diff_config = DiffConfig {
        catalog,
        reference,
        output,
        languages,
        progress_every: config.diff.progress_every,
        quiet: args.quiet,
    };
    let summary = catalogo_diff::run(&diff_config, &progress, &cancel)?;
    report(&summary, args.log.then_some(log_path.as_path()));
    Ok(())
}

fn report(summary: &Summary, log_path: Option<&Path>) {
    match &summary.output {
        Some(output) => log::info!("Done! Output file: {}", output.display()),
        None => log::warn!("Interrupted before any output was written"),
    }
    log::info!(
        "Total rows processed: {}, kept: {}, skipped: {}",
        summary.processed,
        summary.kept,
        summary.skipped
    );
    log::info!("Elapsed time: {:.2} seconds", summary.elapsed.as_secs_f64());

    let mut rows = vec![
        ("Reference keys", fmt_num(summary.reference_keys)),
        ("Rows processed", fmt_num(summary.processed)),
        ("Kept", fmt_num(summary.kept)),
        ("Skipped", fmt_num(summary.skipped)),
        ("Kept with warning", fmt_num(summary.warnings)),
        ("Elapsed", format!("{:.2}s", summary.elapsed.as_secs_f64())),
    ];
    if let Some(output) = &summary.output {
        rows.push(("Output", output.display().to_string()));
    }
    if let Some(path) = log_path {
        rows.push(("Log", path.display().to_string()));
    }
    if summary.interrupted {
        rows.push(("Status", "interrupted".to_string()));
    }
    print_summary("Difference", &rows);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_share_stamp() {
        let (csv, log) = output_paths(Path::new("/data"), "25-01-31-0945");
        assert_eq!(csv, PathBuf::from("/data/difference-25-01-31-0945.csv"));
        assert_eq!(log, PathBuf::from("/data/difference-25-01-31-0945.log"));
    }

    #[test]
    fn positionals_are_optional() {
        let args = DiffArgs::try_parse_from(["csv-diferencial"]).unwrap();
        assert!(args.catalog.is_none());
        assert!(args.reference.is_none());
    }

    #[test]
    fn parses_flags() {
        let args = DiffArgs::try_parse_from([
            "csv-diferencial",
            "full.csv",
            "mine.csv",
            "-l",
            "--languages=Español,ingles",
            "-q",
        ])
        .unwrap();
        assert_eq!(args.catalog, Some(PathBuf::from("full.csv")));
        assert_eq!(args.reference, Some(PathBuf::from("mine.csv")));
        assert!(args.log);
        assert!(args.quiet);
        assert_eq!(
            args.languages,
            Some(vec!["Español".to_string(), "ingles".to_string()])
        );
    }

    #[test]
    fn long_log_flag() {
        let args = DiffArgs::try_parse_from(["csv-diferencial", "a.csv", "b.csv", "--log"]).unwrap();
        assert!(args.log);
    }

    #[test]
    fn cli_definition_is_valid() {
        DiffArgs::command().debug_assert();
    }
}
