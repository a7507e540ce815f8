//! generate-magnets - magnet links from catalog rows, to a file or qBittorrent

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};

use catalogo_core::{CancelToken, LanguageFilter, fmt_num};
use catalogo_magnet::{ApiTarget, BatchPolicy, Credentials, Delivery, MagnetConfig, Summary};

use crate::config::Config;
use crate::{command_line, print_summary, run_stamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Write one magnet per line to OUTPUT_FILE
    Text,
    /// Push magnets to the qBittorrent Web API
    Api,
}

#[derive(Parser, Debug)]
#[command(
    name = "generate-magnets",
    version,
    about = "Build magnet links from a catalog CSV and save or submit them"
)]
pub struct MagnetArgs {
    /// Input catalog CSV
    pub input_csv: PathBuf,

    /// Output file (text mode only)
    pub output_file: Option<PathBuf>,

    /// Delivery mode
    #[arg(long, value_enum, default_value_t = Mode::Text)]
    pub mode: Mode,

    /// Comma-separated languages; rows whose Idioma contains none are dropped
    #[arg(long, value_delimiter = ',')]
    pub languages: Option<Vec<String>>,

    /// Also log to a file (default name: log-<YY-MM-DD-HHMM>.txt)
    #[arg(long, num_args = 0..=1, require_equals = true, value_name = "FILE")]
    pub log: Option<Option<PathBuf>>,

    /// qBittorrent base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// qBittorrent user name
    #[arg(long)]
    pub api_user: Option<String>,

    /// qBittorrent password
    #[arg(long)]
    pub api_pass: Option<String>,

    /// Magnets per request
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: Option<u64>,

    /// Seconds to wait after each batch
    #[arg(long)]
    pub delay: Option<u64>,

    /// Extra seconds to wait after every 10th batch
    #[arg(long)]
    pub batch_delay: Option<u64>,

    /// Config file path (default: ./catalogo.toml or ~/.config/catalogo/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl MagnetArgs {
    /// Log file requested with `--log` / `--log=FILE`
    pub fn log_path(&self, stamp: &str) -> Option<PathBuf> {
        self.log.as_ref().map(|file| {
            file.clone()
                .unwrap_or_else(|| PathBuf::from(format!("log-{stamp}.txt")))
        })
    }

    /// Resolve delivery from flags, falling back to the config file.
    pub fn delivery(&self, config: &Config) -> Result<Delivery> {
        match self.mode {
            Mode::Text => match &self.output_file {
                Some(output) => Ok(Delivery::Text {
                    output: output.clone(),
                }),
                None => bail!("Output file required in text mode"),
            },
            Mode::Api => {
                let qb = &config.qbittorrent;
                let batch_size = match self.batch_size {
                    Some(n) => usize::try_from(n)?,
                    None => qb.batch_size,
                };
                Ok(Delivery::Api(ApiTarget {
                    url: self.api_url.clone().unwrap_or_else(|| qb.url.clone()),
                    credentials: Credentials {
                        username: self
                            .api_user
                            .clone()
                            .unwrap_or_else(|| qb.username.clone()),
                        password: self
                            .api_pass
                            .clone()
                            .or_else(|| qb.password.clone())
                            .unwrap_or_default(),
                    },
                    policy: BatchPolicy {
                        batch_size,
                        delay: Duration::from_secs(self.delay.unwrap_or(qb.delay_secs)),
                        long_delay: Duration::from_secs(
                            self.batch_delay.unwrap_or(qb.batch_delay_secs),
                        ),
                        long_pause_every: qb.long_pause_every,
                    },
                    http: config.http.to_core(),
                }))
            }
        }
    }
}

pub fn main() -> ExitCode {
    let args = MagnetArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            crate::report_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: MagnetArgs) -> Result<()> {
    let log_path = args.log_path(&run_stamp());
    catalogo_core::init_logging(false, args.debug, None, log_path.as_deref())?;
    if log_path.is_some() {
        log::info!("{}", command_line());
    }

    let config = Config::load(args.config.as_deref())?;
    config.log_source();
    let delivery = args.delivery(&config)?;

    let cancel = CancelToken::new();
    catalogo_core::install_signal_handlers(&cancel)?;

    let magnet_config = MagnetConfig {
        input: args.input_csv.clone(),
        languages: args.languages.as_deref().and_then(LanguageFilter::new),
        delivery,
    };
    let summary = catalogo_magnet::run(&magnet_config, &cancel)?;
    if let Some(path) = &log_path {
        log::info!("Log written to {}", path.display());
    }
    report(&summary);
    Ok(())
}

fn report(summary: &Summary) {
    let mut rows = vec![
        ("CSV rows", fmt_num(summary.rows)),
        ("Links", fmt_num(summary.links)),
        ("Magnets", fmt_num(summary.magnets)),
    ];
    if let Some(written) = summary.written {
        rows.push(("Written", fmt_num(written)));
    }
    if let Some(report) = &summary.submitted {
        rows.push(("Sent", format!("{}/{}", fmt_num(report.sent), fmt_num(report.total))));
        rows.push(("Batches", fmt_num(report.batches)));
        if report.interrupted {
            rows.push(("Status", "interrupted".to_string()));
        }
    }
    rows.push(("Elapsed", format!("{:.2}s", summary.elapsed.as_secs_f64())));
    print_summary("Magnets", &rows);
}
