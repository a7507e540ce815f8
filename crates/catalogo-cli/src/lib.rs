//! catalogo-cli - command-line front ends for the catalog tools
//!
//! `csv-diferencial` filters a catalog export against an owned-items list;
//! `generate-magnets` turns catalog rows into magnet links.

pub mod cmd;
pub mod config;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

/// Timestamp used in generated file names (`YY-MM-DD-HHMM`, local time)
pub fn run_stamp() -> String {
    chrono::Local::now().format("%y-%m-%d-%H%M").to_string()
}

/// The invoked command line, for the log
pub fn command_line() -> String {
    std::env::args().collect::<Vec<_>>().join(" ")
}

/// Report a fatal error through the logger, or stderr if logging is not up yet
pub fn report_fatal(e: &anyhow::Error) {
    if log::log_enabled!(log::Level::Error) {
        log::error!("{e:#}");
    } else {
        eprintln!("Error: {e:#}");
    }
}

/// Print a key-value summary table on stderr
pub fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}
