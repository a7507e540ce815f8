//! Catalogo Core - Common infrastructure for catalog CSV tools
//!
//! CSV row access, language names, logging, progress, cancellation and the
//! blocking HTTP facade shared by the differential filter and the magnet
//! generator.

pub mod cancel;
pub mod csv_io;
pub mod http;
pub mod language;
pub mod logging;
pub mod progress;

// Re-exports for convenience
pub use cancel::{CancelToken, install_signal_handlers};
pub use csv_io::{CatalogReader, CatalogRow, count_data_rows};
pub use http::{FormResponse, HttpConfig, HttpError, SHARED_RUNTIME, post_form, session_client};
pub use language::{LanguageFilter, canonical_language};
pub use logging::{RunLogger, init_logging};
pub use progress::{ProgressContext, fmt_num, percent};
