//! Differential filter: catalog rows not already owned at the same revision

use std::io::{Read, Write};

use catalogo_core::{CancelToken, CatalogReader, CatalogRow, LanguageFilter};

use crate::keyset::ReferenceSet;

/// Catalog identifiers live 10,000,000 below the reference namespace.
pub const ID_OFFSET: i64 = 10_000_000;

/// Identifier column of the catalog export
pub const CATALOG_ID_FIELD: &str = "EPL Id";
/// Revision column of the catalog export
pub const CATALOG_REVISION_FIELD: &str = "Revisión";
/// Language column of the catalog export
pub const CATALOG_LANGUAGE_FIELD: &str = "Idioma";

/// Why a row was left out of the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Language not in the allow-list
    Language,
    /// Same identifier and revision already in the reference set
    AlreadyOwned,
}

/// Why membership could not be decided for a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    MissingField(&'static str),
    BadIdentifier(String),
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field '{field}'"),
            Self::BadIdentifier(raw) => write!(f, "invalid identifier '{raw}'"),
        }
    }
}

impl std::error::Error for RowError {}

/// Decision for one catalog row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Kept,
    Skipped(SkipReason),
    /// Membership undecidable; the row is emitted anyway.
    KeptWithWarning(RowError),
}

impl RowOutcome {
    pub fn is_emitted(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Map a catalog identifier into the reference namespace.
pub fn effective_id(raw: &str) -> Result<i64, RowError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|id| id.checked_add(ID_OFFSET))
        .ok_or_else(|| RowError::BadIdentifier(raw.to_string()))
}

/// Running counters for a filter pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub processed: usize,
    pub kept: usize,
    pub skipped: usize,
    /// Rows kept because membership could not be decided (included in `kept`)
    pub warnings: usize,
    /// Pass stopped early on cancellation
    pub interrupted: bool,
}

/// Progress snapshot passed to the reporting callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub kept: usize,
}

/// Classifies catalog rows against the reference set.
#[derive(Debug, Clone, Copy)]
pub struct DifferentialFilter<'a> {
    reference: &'a ReferenceSet,
    languages: Option<&'a LanguageFilter>,
}

impl<'a> DifferentialFilter<'a> {
    pub fn new(reference: &'a ReferenceSet, languages: Option<&'a LanguageFilter>) -> Self {
        Self {
            reference,
            languages,
        }
    }

    pub fn classify(&self, row: &CatalogRow) -> RowOutcome {
        if let Some(languages) = self.languages {
            let language = row.get(CATALOG_LANGUAGE_FIELD).unwrap_or("");
            if !languages.allows(language) {
                return RowOutcome::Skipped(SkipReason::Language);
            }
        }
        match self.is_owned(row) {
            Ok(false) => RowOutcome::Kept,
            Ok(true) => RowOutcome::Skipped(SkipReason::AlreadyOwned),
            Err(e) => RowOutcome::KeptWithWarning(e),
        }
    }

    fn is_owned(&self, row: &CatalogRow) -> Result<bool, RowError> {
        let raw_id = row
            .get(CATALOG_ID_FIELD)
            .ok_or(RowError::MissingField(CATALOG_ID_FIELD))?;
        let id = effective_id(raw_id)?;
        let revision = row
            .get(CATALOG_REVISION_FIELD)
            .ok_or(RowError::MissingField(CATALOG_REVISION_FIELD))?
            .trim();
        Ok(self.reference.contains(id, revision))
    }

    /// Stream `rows` into `out`, writing the header then every emitted row in
    /// input order.
    ///
    /// `on_progress` fires every `progress_every` processed rows. `total` is
    /// the pre-counted row total used for percentages. Cancellation is checked
    /// before each row.
    pub fn run<R: Read, W: Write>(
        &self,
        rows: CatalogReader<R>,
        out: &mut csv::Writer<W>,
        total: usize,
        progress_every: usize,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(&Progress),
    ) -> Result<FilterStats, csv::Error> {
        out.write_record(rows.headers())?;

        let mut stats = FilterStats::default();
        for row in rows {
            if cancel.is_cancelled() {
                stats.interrupted = true;
                break;
            }
            let row = row?;
            stats.processed += 1;

            match self.classify(&row) {
                RowOutcome::Kept => {
                    out.write_record(row.aligned_values())?;
                    stats.kept += 1;
                }
                RowOutcome::KeptWithWarning(e) => {
                    log::warn!(
                        "Row {} caused an error but will be kept: {e}",
                        stats.processed
                    );
                    out.write_record(row.aligned_values())?;
                    stats.kept += 1;
                    stats.warnings += 1;
                }
                RowOutcome::Skipped(_) => stats.skipped += 1,
            }

            if progress_every > 0 && stats.processed % progress_every == 0 {
                on_progress(&Progress {
                    processed: stats.processed,
                    total,
                    kept: stats.kept,
                });
            }
        }
        out.flush()?;
        Ok(stats)
    }
}

/// CSV writer for filter output: every field quoted, CRLF records.
pub fn output_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::CRLF)
        .from_writer(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyset::ReferenceKey;
    use std::io::Cursor;

    fn reference(keys: &[(i64, &str)]) -> ReferenceSet {
        keys.iter()
            .map(|(id, rev)| ReferenceKey {
                id: *id,
                revision: (*rev).to_string(),
            })
            .collect()
    }

    fn row(id: &str, revision: &str, language: &str) -> CatalogRow {
        CatalogRow::from_pairs(&[
            ("EPL Id", id),
            ("Título", "Some title"),
            ("Revisión", revision),
            ("Idioma", language),
        ])
    }

    fn run_on(
        filter: &DifferentialFilter<'_>,
        data: &str,
        progress_every: usize,
        cancel: &CancelToken,
    ) -> (FilterStats, String, Vec<Progress>) {
        let reader = CatalogReader::from_reader(Cursor::new(data.as_bytes().to_vec())).unwrap();
        let mut out = output_writer(Vec::new());
        let mut seen = Vec::new();
        let stats = filter
            .run(reader, &mut out, 0, progress_every, cancel, |p| seen.push(*p))
            .unwrap();
        let text = String::from_utf8(out.into_inner().unwrap()).unwrap();
        (stats, text, seen)
    }

    #[test]
    fn offset_is_ten_million() {
        assert_eq!(ID_OFFSET, 10_000_000);
        assert_eq!(effective_id("1"), Ok(10_000_001));
        assert_eq!(effective_id(" 42 "), Ok(10_000_042));
    }

    #[test]
    fn effective_id_rejects_non_integers() {
        assert!(effective_id("abc").is_err());
        assert!(effective_id("1.5").is_err());
        assert!(effective_id("").is_err());
        assert!(effective_id(&i64::MAX.to_string()).is_err());
    }

    #[test]
    fn owned_revision_is_skipped() {
        let set = reference(&[(10_000_001, "3")]);
        let filter = DifferentialFilter::new(&set, None);
        assert_eq!(
            filter.classify(&row("1", "3", "Español")),
            RowOutcome::Skipped(SkipReason::AlreadyOwned)
        );
        assert_eq!(filter.classify(&row("1", "4", "Español")), RowOutcome::Kept);
    }

    #[test]
    fn revision_is_trimmed() {
        let set = reference(&[(10_000_001, "3")]);
        let filter = DifferentialFilter::new(&set, None);
        assert_eq!(
            filter.classify(&row(" 1 ", " 3 ", "")),
            RowOutcome::Skipped(SkipReason::AlreadyOwned)
        );
    }

    #[test]
    fn unparsable_id_is_kept_with_warning() {
        let set = reference(&[(10_000_001, "3")]);
        let filter = DifferentialFilter::new(&set, None);
        let outcome = filter.classify(&row("abc", "3", ""));
        assert_eq!(
            outcome,
            RowOutcome::KeptWithWarning(RowError::BadIdentifier("abc".to_string()))
        );
        assert!(outcome.is_emitted());
    }

    #[test]
    fn missing_revision_is_kept_with_warning() {
        let set = ReferenceSet::default();
        let filter = DifferentialFilter::new(&set, None);
        let outcome = filter.classify(&CatalogRow::from_pairs(&[("EPL Id", "1")]));
        assert_eq!(
            outcome,
            RowOutcome::KeptWithWarning(RowError::MissingField("Revisión"))
        );
    }

    #[test]
    fn language_filter_is_exact() {
        let set = ReferenceSet::default();
        let languages = LanguageFilter::new(&["ingles"]).unwrap();
        let filter = DifferentialFilter::new(&set, Some(&languages));
        assert_eq!(filter.classify(&row("1", "1", " Inglés ")), RowOutcome::Kept);
        assert_eq!(
            filter.classify(&row("1", "1", "Español")),
            RowOutcome::Skipped(SkipReason::Language)
        );
        assert_eq!(
            filter.classify(&row("1", "1", "inglés")),
            RowOutcome::Skipped(SkipReason::Language)
        );
    }

    #[test]
    fn language_check_precedes_identifier_check() {
        let set = ReferenceSet::default();
        let languages = LanguageFilter::new(&["Español"]).unwrap();
        let filter = DifferentialFilter::new(&set, Some(&languages));
        assert_eq!(
            filter.classify(&row("abc", "1", "Francés")),
            RowOutcome::Skipped(SkipReason::Language)
        );
    }

    #[test]
    fn missing_language_column_is_skipped_when_filtering() {
        let set = ReferenceSet::default();
        let languages = LanguageFilter::new(&["Español"]).unwrap();
        let filter = DifferentialFilter::new(&set, Some(&languages));
        let bare = CatalogRow::from_pairs(&[("EPL Id", "1"), ("Revisión", "1")]);
        assert_eq!(
            filter.classify(&bare),
            RowOutcome::Skipped(SkipReason::Language)
        );
    }

    #[test]
    fn run_preserves_order_and_quotes_everything() {
        let set = reference(&[(10_000_002, "1")]);
        let filter = DifferentialFilter::new(&set, None);
        let data = " EPL Id ,Título,Revisión\n3,C,1\n2,B,1\n1,A,1\nx,Bad,1\n";
        let (stats, text, _) = run_on(&filter, data, 1000, &CancelToken::new());

        assert_eq!(
            text,
            "\"EPL Id\",\"Título\",\"Revisión\"\r\n\
             \"3\",\"C\",\"1\"\r\n\
             \"1\",\"A\",\"1\"\r\n\
             \"x\",\"Bad\",\"1\"\r\n"
        );
        assert_eq!(stats.processed, 4);
        assert_eq!(stats.kept, 3);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.warnings, 1);
        assert!(!stats.interrupted);
    }

    #[test]
    fn run_reports_progress_at_fixed_intervals() {
        let set = ReferenceSet::default();
        let filter = DifferentialFilter::new(&set, None);
        let mut data = String::from("EPL Id,Revisión\n");
        for i in 0..5 {
            data.push_str(&format!("{i},1\n"));
        }
        let (_, _, seen) = run_on(&filter, &data, 2, &CancelToken::new());
        let processed: Vec<usize> = seen.iter().map(|p| p.processed).collect();
        assert_eq!(processed, vec![2, 4]);
        assert_eq!(seen[1].kept, 4);
    }

    #[test]
    fn cancelled_run_stops_before_first_row() {
        let set = ReferenceSet::default();
        let filter = DifferentialFilter::new(&set, None);
        let cancel = CancelToken::new();
        cancel.cancel();
        let (stats, text, _) = run_on(&filter, "EPL Id,Revisión\n1,1\n", 1000, &cancel);
        assert!(stats.interrupted);
        assert_eq!(stats.processed, 0);
        assert_eq!(text, "\"EPL Id\",\"Revisión\"\r\n");
    }
}
