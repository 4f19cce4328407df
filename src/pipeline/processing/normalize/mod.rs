//! Field normalization: raw export rows into canonical instruments.
//!
//! Column lookup tolerates the spelling drift seen across export batches
//! (doubled internal spaces, trailing spaces, case changes). Numeric cells go
//! through one coercion path so placeholders never turn into zeros.

pub mod dedup;
pub mod layout;

pub use dedup::{normalize_batch, NormalizedBatch};
pub use layout::ColumnLayout;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::constants::PLACEHOLDER_TOKENS;
use crate::domain::{CanonicalInstrument, Field, Identity, Metric, MetricKind, TextField};
use crate::error::ScreenerError;
use crate::pipeline::ingestion::{RawRecord, RawValue};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

/// Every catalog spelling, collapsed and lowercased.
static MODELED_COLUMNS: Lazy<HashSet<String>> = Lazy::new(|| {
    Field::all()
        .flat_map(|field| field.columns().iter())
        .map(|column| collapse(column).to_lowercase())
        .collect()
});

#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Keep non-blank columns the catalog does not model, for display
    pub retain_unmodeled_columns: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            retain_unmodeled_columns: true,
        }
    }
}

fn collapse(column: &str) -> String {
    WHITESPACE.replace_all(column.trim(), " ").into_owned()
}

/// Look up a canonical key in a raw record. Unknown keys resolve to nothing.
pub fn resolve_column<'a>(record: &'a RawRecord, canonical_key: &str) -> Option<&'a RawValue> {
    Field::from_key(canonical_key).and_then(|field| resolve_field(record, field))
}

/// Candidates are tried in priority order; each is matched exactly, then
/// whitespace-collapsed, then case-insensitively. Blank cells are skipped
/// so a duplicated column falls through to its populated twin.
///
/// Builds a [`ColumnLayout`] for this one record; batches share one per header.
pub fn resolve_field(record: &RawRecord, field: Field) -> Option<&RawValue> {
    ColumnLayout::for_record(record).resolve(record, field)
}

fn is_placeholder(text: &str) -> bool {
    text.is_empty() || text == "-" || PLACEHOLDER_TOKENS.iter().any(|token| text.eq_ignore_ascii_case(token))
}

/// Parse a numeric cell. Missing, placeholder, unparseable and non-finite
/// values all yield `default`.
pub fn coerce_numeric(value: Option<&RawValue>, default: Option<f64>) -> Option<f64> {
    let parsed = match value? {
        RawValue::Number(number) => Some(*number),
        RawValue::Text(text) => {
            let text = text.trim();
            if is_placeholder(text) {
                None
            } else {
                let cleaned: String = text.chars().filter(|c| *c != ',' && *c != '%').collect();
                cleaned.trim().parse::<f64>().ok()
            }
        }
    };
    parsed.filter(|number| number.is_finite()).or(default)
}

/// Integer variant of [`coerce_numeric`], truncating toward zero.
pub fn coerce_integer(value: Option<&RawValue>, default: Option<i64>) -> Option<i64> {
    coerce_numeric(value, None)
        .map(|number| number.trunc() as i64)
        .or(default)
}

fn text_field(record: &RawRecord, layout: &ColumnLayout, field: TextField) -> Option<String> {
    layout
        .resolve(record, Field::Text(field))
        .map(RawValue::as_text)
        .filter(|text| !is_placeholder(text))
}

/// Build one canonical instrument from one raw row.
pub fn normalize_record(record: &RawRecord, options: NormalizeOptions) -> Result<CanonicalInstrument, ScreenerError> {
    normalize_with_layout(record, &ColumnLayout::for_record(record), options)
}

/// [`normalize_record`] against a layout built for the record's header.
pub fn normalize_with_layout(
    record: &RawRecord,
    layout: &ColumnLayout,
    options: NormalizeOptions,
) -> Result<CanonicalInstrument, ScreenerError> {
    let identity = Identity::new(
        text_field(record, layout, TextField::Isin),
        text_field(record, layout, TextField::NseCode),
        text_field(record, layout, TextField::BseCode),
    );
    let name = text_field(record, layout, TextField::StockName).unwrap_or_default();

    let mut instrument = CanonicalInstrument::new(identity, name).ok_or_else(|| ScreenerError::IdentityMissing {
        file: record.file.clone(),
        line: record.line,
    })?;

    instrument.sector = text_field(record, layout, TextField::Sector);
    instrument.industry = text_field(record, layout, TextField::Industry);

    for metric in Metric::ALL {
        let raw = layout.resolve(record, Field::Metric(*metric));
        let value = match metric.kind() {
            MetricKind::Decimal => coerce_numeric(raw, None),
            MetricKind::Integer => coerce_integer(raw, None).map(|v| v as f64),
        };
        instrument.metrics.set(*metric, value);
    }

    if options.retain_unmodeled_columns {
        for (column, value) in layout.unmodeled(record) {
            if value.is_blank() {
                continue;
            }
            instrument
                .extras
                .entry(column.trim().to_string())
                .or_insert_with(|| value.as_text());
        }
    }

    instrument.source_files.push(record.file.clone());
    Ok(instrument)
}
