use serde::Serialize;

use crate::domain::{CanonicalInstrument, Metric};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Upper-middle element for even counts
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub range: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStatistics {
    pub total_instruments: usize,
    pub with_durability: usize,
    pub with_valuation: usize,
    pub with_both: usize,
    pub durability: Option<IndexSummary>,
    pub valuation: Option<IndexSummary>,
    /// Deciles over instruments that carry both indices
    pub durability_buckets: Vec<Bucket>,
    pub valuation_buckets: Vec<Bucket>,
}

fn summarize(mut values: Vec<f64>) -> Option<IndexSummary> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    Some(IndexSummary {
        min: values[0],
        max: values[values.len() - 1],
        mean: (mean * 100.0).round() / 100.0,
        median: values[values.len() / 2],
    })
}

fn deciles(values: impl Iterator<Item = f64>) -> Vec<Bucket> {
    let mut counts = [0usize; 10];
    for value in values.filter(|v| (0.0..=100.0).contains(v)) {
        let index = ((value / 10.0).floor() as usize).min(9);
        counts[index] += 1;
    }
    counts
        .iter()
        .enumerate()
        .map(|(n, count)| Bucket {
            range: if n == 9 {
                "90-100".to_string()
            } else {
                format!("{}-{}", n * 10, n * 10 + 9)
            },
            count: *count,
        })
        .collect()
}

pub fn score_statistics(instruments: &[CanonicalInstrument]) -> ScoreStatistics {
    let durability: Vec<f64> = instruments.iter().filter_map(|i| i.metric(Metric::DurabilityScore)).collect();
    let valuation: Vec<f64> = instruments.iter().filter_map(|i| i.metric(Metric::ValuationScore)).collect();
    let both: Vec<(f64, f64)> = instruments
        .iter()
        .filter_map(|i| Some((i.metric(Metric::DurabilityScore)?, i.metric(Metric::ValuationScore)?)))
        .collect();

    ScoreStatistics {
        total_instruments: instruments.len(),
        with_durability: durability.len(),
        with_valuation: valuation.len(),
        with_both: both.len(),
        durability: summarize(durability),
        valuation: summarize(valuation),
        durability_buckets: deciles(both.iter().map(|(d, _)| *d)),
        valuation_buckets: deciles(both.iter().map(|(_, v)| *v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;

    fn stock(code: &str, durability: Option<f64>, valuation: Option<f64>) -> CanonicalInstrument {
        let mut instrument = CanonicalInstrument::new(Identity::new(None, Some(code.into()), None), code).unwrap();
        instrument.metrics.set(Metric::DurabilityScore, durability);
        instrument.metrics.set(Metric::ValuationScore, valuation);
        instrument
    }

    #[test]
    fn summary_uses_upper_middle_median() {
        let set = vec![
            stock("A", Some(10.0), Some(100.0)),
            stock("B", Some(40.0), Some(55.0)),
            stock("C", Some(70.0), None),
            stock("D", Some(90.0), Some(9.0)),
            stock("E", None, None),
        ];
        let stats = score_statistics(&set);

        assert_eq!(stats.total_instruments, 5);
        assert_eq!((stats.with_durability, stats.with_valuation, stats.with_both), (4, 3, 3));

        let durability = stats.durability.unwrap();
        assert_eq!(durability.min, 10.0);
        assert_eq!(durability.max, 90.0);
        assert_eq!(durability.mean, 52.5);
        assert_eq!(durability.median, 70.0);
    }

    #[test]
    fn deciles_count_only_instruments_with_both() {
        let set = vec![
            stock("A", Some(10.0), Some(100.0)),
            stock("B", Some(19.0), Some(55.0)),
            stock("C", Some(70.0), None),
        ];
        let stats = score_statistics(&set);

        assert_eq!(stats.durability_buckets.len(), 10);
        assert_eq!(stats.durability_buckets[1].range, "10-19");
        assert_eq!(stats.durability_buckets[1].count, 2);
        assert_eq!(stats.durability_buckets[7].count, 0);
        assert_eq!(stats.valuation_buckets[9].range, "90-100");
        assert_eq!(stats.valuation_buckets[9].count, 1);
    }

    #[test]
    fn empty_set_has_no_summaries() {
        let stats = score_statistics(&[]);
        assert!(stats.durability.is_none());
        assert!(stats.durability_buckets.iter().all(|b| b.count == 0));
    }
}
