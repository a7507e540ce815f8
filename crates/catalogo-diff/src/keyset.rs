//! Reference set of (identifier, revision) pairs from the owned-items list

use std::io::Read;

use catalogo_core::{CatalogReader, CatalogRow};
use rustc_hash::{FxHashMap, FxHashSet};

/// Identifier column of the reference file
pub const REFERENCE_ID_FIELD: &str = "#epg_id";
/// Revision column of the reference file
pub const REFERENCE_REVISION_FIELD: &str = "#version";

/// One owned item: identifier in the reference namespace plus its revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceKey {
    pub id: i64,
    pub revision: String,
}

/// Why a reference row did not produce a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    MissingField(&'static str),
    BadIdentifier(String),
}

impl std::fmt::Display for KeyParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field '{field}'"),
            Self::BadIdentifier(raw) => write!(f, "non-numeric identifier '{raw}'"),
        }
    }
}

impl std::error::Error for KeyParseError {}

/// Parse a reference identifier, accepting float notation (`"42.0"` → 42).
///
/// Fractions are truncated toward zero.
pub fn parse_reference_id(raw: &str) -> Result<i64, KeyParseError> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(id);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() < i64::MAX as f64 => Ok(value.trunc() as i64),
        _ => Err(KeyParseError::BadIdentifier(raw.to_string())),
    }
}

/// Extract the key from one reference row.
pub fn parse_reference_row(row: &CatalogRow) -> Result<ReferenceKey, KeyParseError> {
    let raw_id = row
        .get(REFERENCE_ID_FIELD)
        .ok_or(KeyParseError::MissingField(REFERENCE_ID_FIELD))?;
    let revision = row
        .get(REFERENCE_REVISION_FIELD)
        .ok_or(KeyParseError::MissingField(REFERENCE_REVISION_FIELD))?;
    Ok(ReferenceKey {
        id: parse_reference_id(raw_id)?,
        revision: revision.trim().to_string(),
    })
}

/// O(1) membership over owned (identifier, revision) pairs.
///
/// Built once before the large file is streamed, read-only afterwards.
#[derive(Debug, Default)]
pub struct ReferenceSet {
    by_id: FxHashMap<i64, FxHashSet<String>>,
    len: usize,
    skipped_rows: usize,
}

impl ReferenceSet {
    /// Read every row of the reference file.
    ///
    /// Rows without a usable identifier or revision are skipped silently;
    /// only I/O failures abort.
    pub fn from_reader<R: Read>(rows: CatalogReader<R>) -> Result<Self, csv::Error> {
        let mut set = Self::default();
        for (idx, row) in rows.enumerate() {
            let parsed = match row {
                Ok(row) => parse_reference_row(&row).map_err(|e| e.to_string()),
                Err(e) if e.is_io_error() => return Err(e),
                Err(e) => Err(e.to_string()),
            };
            match parsed {
                Ok(key) => set.insert(key),
                Err(reason) => {
                    log::debug!("reference row {}: skipped ({reason})", idx + 1);
                    set.skipped_rows += 1;
                }
            }
        }
        Ok(set)
    }

    /// Add a key. Duplicates collapse.
    pub fn insert(&mut self, key: ReferenceKey) {
        if self.by_id.entry(key.id).or_default().insert(key.revision) {
            self.len += 1;
        }
    }

    pub fn contains(&self, id: i64, revision: &str) -> bool {
        self.by_id
            .get(&id)
            .is_some_and(|revisions| revisions.contains(revision))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Rows of the reference file that did not yield a key.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

impl FromIterator<ReferenceKey> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = ReferenceKey>>(iter: I) -> Self {
        let mut set = Self::default();
        for key in iter {
            set.insert(key);
        }
        set
    }
}
