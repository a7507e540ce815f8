//! Magnet URI construction from catalog rows

use std::fmt;

use catalogo_core::{CatalogRow, LanguageFilter};
use unicode_normalization::UnicodeNormalization;

/// Trackers appended to every magnet, in this order.
pub const TRACKERS: [&str; 6] = [
    "http://tracker.openbittorrent.com:80/announce",
    "udp://tracker.openbittorrent.com:6969/announce",
    "udp://tracker.torrent.eu.org:451",
    "udp://open.demonii.com:1337",
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://tracker.cyberia.is:6969/announce",
];

/// Title columns, first non-empty wins
pub const TITLE_FIELDS: &[&str] = &["Título", "Titulo", "titulo"];
/// Identifier columns, first non-empty wins
pub const ID_FIELDS: &[&str] = &["EPL Id", "Id", "ID", "epl_id"];
/// Placeholder when no identifier column has a value
pub const MISSING_ID: &str = "NA";
pub const REVISION_FIELD: &str = "Revisión";
/// Comma-separated info hashes
pub const LINKS_FIELD: &str = "Enlace(s)";
pub const LANGUAGE_FIELD: &str = "Idioma";

/// Decompose and drop everything outside ASCII (`"Año"` → `"Ano"`).
pub fn ascii_fold(text: &str) -> String {
    text.nfkd().filter(char::is_ascii).collect()
}

/// `EPL_[<id>]_<ascii title>_(r<revision>)`
pub fn display_name(row: &CatalogRow) -> String {
    let title = ascii_fold(row.first_of(TITLE_FIELDS).unwrap_or(""));
    let id = row.first_of(ID_FIELDS).unwrap_or(MISSING_ID);
    let revision = row.get(REVISION_FIELD).unwrap_or("");
    format!("EPL_[{id}]_{title}_(r{revision})")
}

/// Non-empty, trimmed entries of a comma-separated hash list, in order.
pub fn split_links(field: &str) -> impl Iterator<Item = &str> {
    field.split(',').map(str::trim).filter(|h| !h.is_empty())
}

/// One magnet: content hash, display name and the fixed tracker list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetRecord<'a> {
    pub hash: &'a str,
    pub display_name: String,
}

impl<'a> MagnetRecord<'a> {
    pub fn new(row: &CatalogRow, hash: &'a str) -> Self {
        Self {
            hash,
            display_name: display_name(row),
        }
    }
}

impl fmt::Display for MagnetRecord<'_> {
    /// The display name goes in verbatim (not percent-encoded) so torrent
    /// clients show it as written; tracker URLs are form-encoded.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "magnet:?xt=urn:btih:{}&dn={}", self.hash, self.display_name)?;
        for tracker in TRACKERS {
            let encoded: String = url::form_urlencoded::byte_serialize(tracker.as_bytes()).collect();
            write!(f, "&tr={encoded}")?;
        }
        Ok(())
    }
}

/// Magnet URI for one row and one hash.
pub fn magnet_uri(row: &CatalogRow, hash: &str) -> String {
    MagnetRecord::new(row, hash).to_string()
}

/// Ordered magnet list accumulated over the rows of a catalog file.
#[derive(Debug, Default)]
pub struct MagnetList {
    languages: Option<LanguageFilter>,
    rows: usize,
    links: usize,
    magnets: Vec<String>,
}

impl MagnetList {
    /// `languages` excludes rows whose language column contains none of the
    /// names (case-insensitive substring).
    pub fn new(languages: Option<LanguageFilter>) -> Self {
        Self {
            languages,
            ..Self::default()
        }
    }

    /// Expand one row into one magnet per hash. Returns the number added.
    pub fn push_row(&mut self, row: &CatalogRow) -> usize {
        if let Some(languages) = &self.languages {
            if !languages.appears_in(row.get(LANGUAGE_FIELD).unwrap_or("")) {
                return 0;
            }
        }
        self.rows += 1;
        let before = self.magnets.len();
        for hash in split_links(row.get(LINKS_FIELD).unwrap_or("")) {
            self.magnets.push(magnet_uri(row, hash));
        }
        let added = self.magnets.len() - before;
        self.links += added;
        added
    }

    /// Rows that passed the language filter
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Hash entries found in accepted rows
    pub fn links(&self) -> usize {
        self.links
    }

    pub fn magnets(&self) -> &[String] {
        &self.magnets
    }

    pub fn into_magnets(self) -> Vec<String> {
        self.magnets
    }
}
