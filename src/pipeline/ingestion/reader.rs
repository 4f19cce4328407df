use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};

use super::{RawRecord, RawValue};
use crate::constants::ROW_WARNING_LOG_LIMIT;
use crate::error::{Result, ScreenerError};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderOptions {
    /// Decode non-UTF-8 exports as Windows-1252 instead of rejecting them
    pub legacy_encoding_fallback: bool,
}

/// Rows read from one source file.
#[derive(Debug, Clone, Default)]
pub struct SourceRows {
    pub file: String,
    pub records: Vec<RawRecord>,
    pub rows_skipped: usize,
}

/// SHA-256 over every source byte, in file order.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

fn decode<'a>(path: &Path, bytes: &'a [u8], options: ReaderOptions) -> Result<Cow<'a, str>> {
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return Ok(text);
    }
    if options.legacy_encoding_fallback {
        debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
        let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
        return Ok(text);
    }
    Err(ScreenerError::data_source(path, "file is not valid UTF-8"))
}

/// Read and decode one export file, feeding its bytes into `fingerprint`.
pub fn read_source(path: &Path, options: ReaderOptions, fingerprint: &mut Fingerprint) -> Result<SourceRows> {
    let bytes = std::fs::read(path).map_err(|e| ScreenerError::data_source(path, e.to_string()))?;
    fingerprint.update(&bytes);

    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let text = decode(path, &bytes, options)?;
    parse_source(&file, &text).map_err(|e| match e {
        ScreenerError::DataSource { message, .. } => ScreenerError::data_source(path, message),
        other => other,
    })
}

/// Parse decoded CSV text. Only an unreadable header fails the file;
/// broken rows are skipped and counted.
pub fn parse_source(file: &str, text: &str) -> Result<SourceRows> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ScreenerError::data_source(file, format!("unreadable header: {e}")))?
        .clone();

    let mut rows = SourceRows {
        file: file.to_string(),
        ..SourceRows::default()
    };

    for (index, result) in reader.records().enumerate() {
        let fallback_line = index as u64 + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                rows.rows_skipped += 1;
                if rows.rows_skipped <= ROW_WARNING_LOG_LIMIT {
                    let line = e.position().map(|p| p.line()).unwrap_or(fallback_line);
                    let err = ScreenerError::RowParse {
                        file: file.to_string(),
                        line,
                        message: e.to_string(),
                    };
                    warn!("{}", err);
                }
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(fallback_line);
        let raw = RawRecord {
            file: file.to_string(),
            line,
            fields: headers
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| (column.to_string(), RawValue::Text(cell.to_string())))
                .collect(),
        };
        if raw.is_empty() {
            continue;
        }
        rows.records.push(raw);
    }

    if rows.rows_skipped > ROW_WARNING_LOG_LIMIT {
        warn!("{}: {} rows skipped in total", file, rows.rows_skipped);
    }
    debug!("{}: {} rows read", file, rows.records.len());
    Ok(rows)
}
