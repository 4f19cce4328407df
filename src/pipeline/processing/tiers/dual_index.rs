use serde::{Deserialize, Serialize};

use super::rank_desc;
use crate::domain::{CanonicalInstrument, Metric};

/// Inclusive optional bounds on the two composite index scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DualIndexBounds {
    pub min_durability: Option<f64>,
    pub max_durability: Option<f64>,
    pub min_valuation: Option<f64>,
    pub max_valuation: Option<f64>,
}

impl DualIndexBounds {
    pub fn at_least(min_durability: f64, min_valuation: f64) -> Self {
        Self {
            min_durability: Some(min_durability),
            min_valuation: Some(min_valuation),
            ..Self::default()
        }
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::default()
    }
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

/// Instruments carrying both indices inside the bounds, best combined first.
/// Ignores tier assignment entirely.
pub fn filter_by_dual_index_scores<'a>(
    instruments: &'a [CanonicalInstrument],
    bounds: &DualIndexBounds,
) -> Vec<&'a CanonicalInstrument> {
    let mut matches: Vec<&CanonicalInstrument> = instruments
        .iter()
        .filter(|instrument| {
            match (
                instrument.metric(Metric::DurabilityScore),
                instrument.metric(Metric::ValuationScore),
            ) {
                (Some(durability), Some(valuation)) => {
                    within(durability, bounds.min_durability, bounds.max_durability)
                        && within(valuation, bounds.min_valuation, bounds.max_valuation)
                }
                _ => false,
            }
        })
        .collect();

    rank_desc(&mut matches, |i| {
        i.or_zero(Metric::DurabilityScore) + i.or_zero(Metric::ValuationScore)
    });
    matches
}
