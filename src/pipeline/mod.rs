// Data pipeline: discover exports, read rows, normalize, score

pub mod ingestion;
pub mod processing;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::config::DataConfig;
use crate::domain::CanonicalInstrument;
use crate::error::Result;
use crate::observability::metrics as obs;
use ingestion::{discover_sources, read_source, Fingerprint, ReaderOptions};
use processing::normalize::{normalize_batch, NormalizeOptions};
use processing::scoring::ScoringEngine;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub folder: PathBuf,
    pub file_prefix: String,
    pub reader: ReaderOptions,
    pub normalize: NormalizeOptions,
}

impl From<&DataConfig> for LoadOptions {
    fn from(config: &DataConfig) -> Self {
        Self {
            folder: config.folder.clone(),
            file_prefix: config.file_prefix.clone(),
            reader: ReaderOptions {
                legacy_encoding_fallback: config.legacy_encoding_fallback,
            },
            normalize: NormalizeOptions {
                retain_unmodeled_columns: config.retain_unmodeled_columns,
            },
        }
    }
}

/// What one load attempt read and produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub files_loaded: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub rows_dropped: usize,
    pub duplicates_merged: usize,
    pub instruments: usize,
    /// SHA-256 over all source bytes in file order
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LoadedSet {
    pub instruments: Vec<CanonicalInstrument>,
    pub report: LoadReport,
}

/// Run the whole pipeline once. Any file-level failure fails the attempt.
#[instrument(skip(options, engine), fields(folder = %options.folder.display()))]
pub fn load_instruments(options: &LoadOptions, engine: &ScoringEngine) -> Result<LoadedSet> {
    let sources = discover_sources(&options.folder, &options.file_prefix).map_err(|e| {
        obs::ingest::load_error();
        e
    })?;

    let mut fingerprint = Fingerprint::default();
    let mut records = Vec::new();
    let mut rows_skipped = 0;
    for source in &sources {
        let rows = read_source(&source.path, options.reader, &mut fingerprint).map_err(|e| {
            obs::ingest::load_error();
            e
        })?;
        obs::ingest::file_loaded(rows.records.len());
        obs::ingest::rows_skipped(rows.rows_skipped);
        rows_skipped += rows.rows_skipped;
        records.extend(rows.records);
    }
    let rows_read = records.len();

    let mut batch = normalize_batch(records, options.normalize);
    obs::normalize::batch_normalized(
        batch.instruments.len(),
        batch.dropped_without_identity,
        batch.merged_duplicates,
    );
    engine.evaluate_all(&mut batch.instruments);

    let report = LoadReport {
        files_loaded: sources.len(),
        rows_read,
        rows_skipped,
        rows_dropped: batch.dropped_without_identity,
        duplicates_merged: batch.merged_duplicates,
        instruments: batch.instruments.len(),
        fingerprint: fingerprint.finish(),
        loaded_at: Utc::now(),
    };
    info!(
        "Loaded {} instruments from {} files ({} rows, {} skipped, {} dropped, {} merged)",
        report.instruments,
        report.files_loaded,
        report.rows_read,
        report.rows_skipped,
        report.rows_dropped,
        report.duplicates_merged
    );

    Ok(LoadedSet {
        instruments: batch.instruments,
        report,
    })
}
