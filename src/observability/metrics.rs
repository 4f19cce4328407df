//! Metric catalog and recording helpers for the screening pipeline
//!
//! Every metric name lives in [`MetricName`] so call sites never carry
//! magic strings. Recording functions are grouped by pipeline phase.

use std::fmt;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingest metrics
    IngestFilesLoaded,
    IngestRowsRead,
    IngestRowsSkipped,
    IngestLoadErrors,

    // Normalize metrics
    NormalizeInstruments,
    NormalizeDroppedWithoutIdentity,
    NormalizeDuplicatesMerged,

    // Scoring metrics
    ScoringQualityScore,
    ScoringTierAssigned,

    // Repository metrics
    RepositoryReloads,
    RepositoryReloadDuration,
    RepositoryInstruments,

    // Collaborator and API metrics
    DirectoryLookups,
    ApiRequests,
}

/// How a metric is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::IngestFilesLoaded => "qs_ingest_files_loaded_total",
            MetricName::IngestRowsRead => "qs_ingest_rows_read_total",
            MetricName::IngestRowsSkipped => "qs_ingest_rows_skipped_total",
            MetricName::IngestLoadErrors => "qs_ingest_load_errors_total",

            MetricName::NormalizeInstruments => "qs_normalize_instruments_total",
            MetricName::NormalizeDroppedWithoutIdentity => "qs_normalize_dropped_without_identity_total",
            MetricName::NormalizeDuplicatesMerged => "qs_normalize_duplicates_merged_total",

            MetricName::ScoringQualityScore => "qs_scoring_quality_score",
            MetricName::ScoringTierAssigned => "qs_scoring_tier_assigned_total",

            MetricName::RepositoryReloads => "qs_repository_reloads_total",
            MetricName::RepositoryReloadDuration => "qs_repository_reload_duration_seconds",
            MetricName::RepositoryInstruments => "qs_repository_instruments",

            MetricName::DirectoryLookups => "qs_directory_lookups_total",
            MetricName::ApiRequests => "qs_api_requests_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            IngestFilesLoaded,
            IngestRowsRead,
            IngestRowsSkipped,
            IngestLoadErrors,
            NormalizeInstruments,
            NormalizeDroppedWithoutIdentity,
            NormalizeDuplicatesMerged,
            ScoringQualityScore,
            ScoringTierAssigned,
            RepositoryReloads,
            RepositoryReloadDuration,
            RepositoryInstruments,
            DirectoryLookups,
            ApiRequests,
        ]
        .into_iter()
    }

    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricName::ScoringQualityScore | MetricName::RepositoryReloadDuration => MetricType::Histogram,
            MetricName::RepositoryInstruments => MetricType::Gauge,
            _ => MetricType::Counter,
        }
    }

    /// Returns (phase, description, unit)
    pub fn metadata(&self) -> (&'static str, &'static str, Option<&'static str>) {
        match self {
            MetricName::IngestFilesLoaded => ("ingest", "Source files read", None),
            MetricName::IngestRowsRead => ("ingest", "CSV rows read", None),
            MetricName::IngestRowsSkipped => ("ingest", "Malformed rows skipped", None),
            MetricName::IngestLoadErrors => ("ingest", "Load attempts failed on a data source", None),

            MetricName::NormalizeInstruments => ("normalize", "Canonical instruments produced", None),
            MetricName::NormalizeDroppedWithoutIdentity => ("normalize", "Rows dropped without an identity key", None),
            MetricName::NormalizeDuplicatesMerged => ("normalize", "Rows merged into an existing identity", None),

            MetricName::ScoringQualityScore => ("scoring", "Composite quality score distribution", None),
            MetricName::ScoringTierAssigned => ("scoring", "Instruments assigned to a tier", None),

            MetricName::RepositoryReloads => ("repository", "Snapshot reloads by outcome", None),
            MetricName::RepositoryReloadDuration => ("repository", "Snapshot build duration", Some("s")),
            MetricName::RepositoryInstruments => ("repository", "Instruments in the live snapshot", None),

            MetricName::DirectoryLookups => ("directory", "Identity directory lookups by outcome", None),
            MetricName::ApiRequests => ("api", "HTTP requests by route", None),
        }
    }
}

/// Register a description for every catalog metric with the installed
/// recorder. Returns how many were described.
pub fn describe_all() -> usize {
    use ::metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

    let mut described = 0;
    for metric in MetricName::all_metrics() {
        let name = metric.as_str();
        let (_, description, unit) = metric.metadata();
        match (metric.metric_type(), unit) {
            (MetricType::Counter, _) => describe_counter!(name, Unit::Count, description),
            (MetricType::Histogram, Some("s")) => describe_histogram!(name, Unit::Seconds, description),
            (MetricType::Histogram, _) => describe_histogram!(name, description),
            (MetricType::Gauge, _) => describe_gauge!(name, description),
        }
        described += 1;
    }
    described
}

// ============================================================================
// Ingest Metrics
// ============================================================================

pub mod ingest {
    use super::MetricName;

    pub fn file_loaded(rows: usize) {
        ::metrics::counter!(MetricName::IngestFilesLoaded.as_str()).increment(1);
        ::metrics::counter!(MetricName::IngestRowsRead.as_str()).increment(rows as u64);
    }

    pub fn rows_skipped(count: usize) {
        if count > 0 {
            ::metrics::counter!(MetricName::IngestRowsSkipped.as_str()).increment(count as u64);
        }
    }

    pub fn load_error() {
        ::metrics::counter!(MetricName::IngestLoadErrors.as_str()).increment(1);
    }
}

// ============================================================================
// Normalize Metrics
// ============================================================================

pub mod normalize {
    use super::MetricName;

    pub fn batch_normalized(instruments: usize, dropped: usize, merged: usize) {
        ::metrics::counter!(MetricName::NormalizeInstruments.as_str()).increment(instruments as u64);
        ::metrics::counter!(MetricName::NormalizeDroppedWithoutIdentity.as_str()).increment(dropped as u64);
        ::metrics::counter!(MetricName::NormalizeDuplicatesMerged.as_str()).increment(merged as u64);
    }
}

// ============================================================================
// Scoring Metrics
// ============================================================================

pub mod scoring {
    use super::MetricName;

    pub fn quality_score_recorded(score: f64) {
        ::metrics::histogram!(MetricName::ScoringQualityScore.as_str()).record(score);
    }

    pub fn tier_assigned(tier: &str) {
        ::metrics::counter!(MetricName::ScoringTierAssigned.as_str(), "tier" => tier.to_string())
            .increment(1);
    }
}

// ============================================================================
// Repository Metrics
// ============================================================================

pub mod repository {
    use super::MetricName;

    pub fn reload_finished(success: bool, secs: f64) {
        let outcome = if success { "success" } else { "error" };
        ::metrics::counter!(MetricName::RepositoryReloads.as_str(), "outcome" => outcome).increment(1);
        ::metrics::histogram!(MetricName::RepositoryReloadDuration.as_str()).record(secs);
    }

    pub fn instruments_live(count: usize) {
        ::metrics::gauge!(MetricName::RepositoryInstruments.as_str()).set(count as f64);
    }
}

// ============================================================================
// Collaborator and API Metrics
// ============================================================================

pub mod directory {
    use super::MetricName;

    pub fn lookup(outcome: &'static str) {
        ::metrics::counter!(MetricName::DirectoryLookups.as_str(), "outcome" => outcome).increment(1);
    }
}

pub mod api {
    use super::MetricName;

    pub fn request(route: &'static str) {
        ::metrics::counter!(MetricName::ApiRequests.as_str(), "route" => route).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn metric_names_are_unique_and_prefixed() {
        let names: Vec<&str> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
        assert!(names.iter().all(|n| n.starts_with("qs_")));
    }

    #[test]
    fn every_metric_has_metadata() {
        for metric in MetricName::all_metrics() {
            let (phase, description, _) = metric.metadata();
            assert!(!phase.is_empty());
            assert!(!description.is_empty());
        }
    }

    #[test]
    fn types_follow_name_suffixes() {
        for metric in MetricName::all_metrics() {
            let name = metric.as_str();
            match metric.metric_type() {
                MetricType::Counter => assert!(name.ends_with("_total"), "{name}"),
                MetricType::Histogram | MetricType::Gauge => assert!(!name.ends_with("_total"), "{name}"),
            }
        }
        assert_eq!(MetricName::RepositoryReloadDuration.metric_type(), MetricType::Histogram);
        assert_eq!(MetricName::RepositoryInstruments.metric_type(), MetricType::Gauge);
    }

    #[test]
    fn describe_all_covers_the_catalog() {
        assert_eq!(describe_all(), MetricName::all_metrics().count());
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        ingest::file_loaded(10);
        normalize::batch_normalized(5, 1, 2);
        scoring::quality_score_recorded(72.5);
        scoring::tier_assigned("Great");
        repository::reload_finished(true, 0.01);
        repository::instruments_live(5);
    }
}
