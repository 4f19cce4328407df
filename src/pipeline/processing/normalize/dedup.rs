use std::collections::HashMap;
use tracing::{debug, warn};

use super::{normalize_with_layout, ColumnLayout, NormalizeOptions};
use crate::constants::ROW_WARNING_LOG_LIMIT;
use crate::domain::{CanonicalInstrument, IdentityKey};
use crate::pipeline::ingestion::RawRecord;

/// Result of normalizing one load's worth of rows.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// One instrument per identity key, in first-appearance order
    pub instruments: Vec<CanonicalInstrument>,
    pub dropped_without_identity: usize,
    pub merged_duplicates: usize,
}

fn should_replace(existing: &CanonicalInstrument, incoming: &CanonicalInstrument) -> bool {
    incoming.has_both_index_scores() && !existing.has_both_index_scores()
}

/// Normalize rows and collapse them to one instrument per identity key.
///
/// On a collision the incoming row wins only when it carries both composite
/// index scores and the existing one does not. Either way the winner is then
/// completed from the loser, so no metric field is lost.
pub fn normalize_batch<I>(records: I, options: NormalizeOptions) -> NormalizedBatch
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut batch = NormalizedBatch::default();
    let mut positions: HashMap<IdentityKey, usize> = HashMap::new();
    let mut layout: Option<ColumnLayout> = None;

    for record in records {
        let current = match layout.take() {
            Some(cached) if cached.fits(&record) => cached,
            _ => ColumnLayout::for_record(&record),
        };
        let outcome = normalize_with_layout(&record, &current, options);
        layout = Some(current);

        let incoming = match outcome {
            Ok(instrument) => instrument,
            Err(e) => {
                batch.dropped_without_identity += 1;
                if batch.dropped_without_identity <= ROW_WARNING_LOG_LIMIT {
                    warn!("{}", e);
                }
                continue;
            }
        };

        match positions.get(incoming.key()) {
            Some(&index) => {
                // Take the stored record out, then put the merge back in its slot
                let existing = batch.instruments.swap_remove(index);
                let merged = if should_replace(&existing, &incoming) {
                    debug!("{} replaced by row {} of {}", existing.key(), record.line, record.file);
                    incoming.merged_with(&existing)
                } else {
                    existing.merged_with(&incoming)
                };
                batch.instruments.push(merged);
                let last = batch.instruments.len() - 1;
                batch.instruments.swap(index, last);
                batch.merged_duplicates += 1;
            }
            None => {
                positions.insert(incoming.key().clone(), batch.instruments.len());
                batch.instruments.push(incoming);
            }
        }
    }

    if batch.dropped_without_identity > ROW_WARNING_LOG_LIMIT {
        warn!("{} rows dropped without ISIN or NSE code", batch.dropped_without_identity);
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Metric;

    fn row(file: &str, line: u64) -> RawRecord {
        RawRecord::new(file, line).with("Stock", "Acme Ltd").with("ISIN", "ABC123")
    }

    #[test]
    fn later_row_with_both_indices_wins_but_keeps_first_row_fields() {
        let first = row("a.csv", 2).with("ROE", "18").with("Sector", "Industrials");
        let second = row("b.csv", 2)
            .with("ROE", "9")
            .with("Durability Score", "80")
            .with("Valuation Score", "55");

        let batch = normalize_batch(vec![first, second], NormalizeOptions::default());
        let merged = &batch.instruments[0];

        assert_eq!(batch.instruments.len(), 1);
        assert_eq!(batch.merged_duplicates, 1);
        assert_eq!(merged.metric(Metric::DurabilityScore), Some(80.0));
        assert_eq!(merged.metric(Metric::ValuationScore), Some(55.0));
        assert_eq!(merged.metric(Metric::Roe), Some(9.0));
        assert_eq!(merged.sector.as_deref(), Some("Industrials"));
        assert_eq!(merged.source_files, vec!["b.csv".to_string(), "a.csv".to_string()]);
    }

    #[test]
    fn first_seen_wins_without_index_scores() {
        let first = row("a.csv", 2).with("ROE", "18");
        let second = row("b.csv", 2).with("ROE", "9").with("ROCE", "22");

        let batch = normalize_batch(vec![first, second], NormalizeOptions::default());
        let merged = &batch.instruments[0];

        assert_eq!(merged.metric(Metric::Roe), Some(18.0));
        assert_eq!(merged.metric(Metric::Roce), Some(22.0));
    }

    #[test]
    fn rows_without_identity_are_dropped_and_counted() {
        let orphan = RawRecord::new("a.csv", 3).with("Stock", "Ghost").with("BSE Code", "500001");
        let batch = normalize_batch(vec![row("a.csv", 2), orphan], NormalizeOptions::default());

        assert_eq!(batch.instruments.len(), 1);
        assert_eq!(batch.dropped_without_identity, 1);
        assert!(batch.instruments.iter().all(|i| i.name != "Ghost"));
    }

    #[test]
    fn output_follows_first_appearance() {
        let rows = vec![
            RawRecord::new("a.csv", 2).with("NSE Code", "ZED"),
            RawRecord::new("a.csv", 3).with("NSE Code", "ACME"),
            RawRecord::new("a.csv", 4).with("NSE Code", "MID"),
            RawRecord::new("b.csv", 2).with("NSE Code", "zed").with("BSE Code", "500001"),
            RawRecord::new("b.csv", 3).with("NSE Code", "acme"),
        ];
        let batch = normalize_batch(rows, NormalizeOptions::default());
        let keys: Vec<&str> = batch.instruments.iter().map(|i| i.key().as_str()).collect();
        assert_eq!(keys, vec!["NSE:ZED", "NSE:ACME", "NSE:MID"]);
        assert_eq!(batch.merged_duplicates, 2);
        assert_eq!(batch.instruments[0].identity().bse_code(), Some("500001"));
    }
}
