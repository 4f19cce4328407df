// Pipeline ingestion: source discovery and CSV decoding into raw records

pub mod discovery;
pub mod reader;

pub use discovery::{discover_sources, SourceFile};
pub use reader::{parse_source, read_source, Fingerprint, ReaderOptions, SourceRows};

/// One cell as it arrived from a source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
}

impl RawValue {
    /// Blank cells never satisfy a column lookup.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Text(text) => text.trim().is_empty(),
            RawValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            RawValue::Text(text) => text.trim().to_string(),
            RawValue::Number(number) => number.to_string(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

/// A source row: column names exactly as exported, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub file: String,
    pub line: u64,
    pub fields: Vec<(String, RawValue)>,
}

impl RawRecord {
    pub fn new(file: impl Into<String>, line: u64) -> Self {
        Self {
            file: file.into(),
            line,
            fields: Vec::new(),
        }
    }

    pub fn with(mut self, column: &str, value: impl Into<RawValue>) -> Self {
        self.fields.push((column.to_string(), value.into()));
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(column, _)| column.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.is_blank())
    }
}
