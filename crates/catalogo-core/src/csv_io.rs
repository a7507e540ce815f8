//! CSV row source for catalog exports
//!
//! Catalog exports come from spreadsheet tools: they may start with a UTF-8
//! byte-order mark, carry stray whitespace around header names, and contain
//! ragged rows. The reader here absorbs all three so callers can look fields
//! up by name.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use csv::StringRecord;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Buffer size for catalog file reads (256KB)
const READ_BUF_SIZE: usize = 256 * 1024;

/// One data row of a catalog file, addressed by (trimmed) header name.
///
/// Rows share their header list, so cloning a row only copies the record.
#[derive(Debug, Clone)]
pub struct CatalogRow {
    headers: Arc<[String]>,
    record: StringRecord,
}

impl CatalogRow {
    pub fn new(headers: Arc<[String]>, record: StringRecord) -> Self {
        Self { headers, record }
    }

    /// Build a row from `(field, value)` pairs. Header order follows the pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let headers: Arc<[String]> = pairs.iter().map(|(k, _)| (*k).to_string()).collect();
        let record = pairs.iter().map(|(_, v)| *v).collect::<StringRecord>();
        Self { headers, record }
    }

    /// Raw value of `field`, or `None` if the column is absent or the row is short.
    pub fn get(&self, field: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == field)?;
        self.record.get(idx)
    }

    /// First non-empty value among `candidates`, tried in order.
    pub fn first_of(&self, candidates: &[&str]) -> Option<&str> {
        candidates
            .iter()
            .filter_map(|field| self.get(field))
            .find(|value| !value.is_empty())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Values aligned to the header list: short rows are padded with empty
    /// strings and fields past the last header are dropped.
    pub fn aligned_values(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.headers.len()).map(|i| self.record.get(i).unwrap_or(""))
    }
}

/// Streaming reader yielding [`CatalogRow`]s in file order.
pub struct CatalogReader<R: Read> {
    reader: csv::Reader<R>,
    headers: Arc<[String]>,
}

impl CatalogReader<BufReader<File>> {
    /// Open a catalog file on disk.
    pub fn open(path: &Path) -> Result<Self, csv::Error> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::with_capacity(READ_BUF_SIZE, file))
    }
}

impl<R: BufRead> CatalogReader<R> {
    /// Wrap a buffered reader, skipping a leading BOM and trimming header names.
    pub fn from_reader(mut inner: R) -> Result<Self, csv::Error> {
        skip_bom(&mut inner)?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(inner);
        let headers: Arc<[String]> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        Ok(Self { reader, headers })
    }
}

impl<R: Read> CatalogReader<R> {
    /// Trimmed header names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl<R: Read> Iterator for CatalogReader<R> {
    type Item = Result<CatalogRow, csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => Some(Ok(CatalogRow::new(Arc::clone(&self.headers), record))),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

fn skip_bom<R: BufRead>(reader: &mut R) -> io::Result<()> {
    let buf = reader.fill_buf()?;
    if buf.starts_with(UTF8_BOM) {
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}

/// Count data rows by physical lines, minus the header line.
///
/// Used only as the denominator for progress percentages, so quoted fields
/// spanning several lines make it an overestimate.
pub fn count_data_rows(path: &Path) -> io::Result<usize> {
    let reader = BufReader::with_capacity(READ_BUF_SIZE, File::open(path)?);
    let mut lines = 0usize;
    for line in reader.split(b'\n') {
        line?;
        lines += 1;
    }
    Ok(lines.saturating_sub(1))
}
