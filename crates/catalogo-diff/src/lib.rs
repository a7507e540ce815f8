//! Catalogo Diff - rows of a catalog export that are not already owned
//!
//! Builds a set of owned `(identifier, revision)` pairs from a small
//! reference list, then streams the full catalog export and keeps every row
//! whose offset identifier and revision are not in that set.
//!
//! # Example
//!
//! ```ignore
//! use catalogo_diff::{DiffConfig, run};
//!
//! let summary = run(&config, &progress, &cancel)?;
//! println!("Kept {} of {} rows", summary.kept, summary.processed);
//! ```

pub mod filter;
pub mod keyset;
pub mod runner;

// Re-exports
pub use filter::{
    DifferentialFilter, FilterStats, ID_OFFSET, Progress, RowError, RowOutcome, SkipReason,
};
pub use keyset::{ReferenceKey, ReferenceSet};
pub use runner::{DiffConfig, Summary, progress_message, run, run_with};
