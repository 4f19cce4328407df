//! Tier gates.
//!
//! Tiers are tested in priority order and an instrument lands in the first
//! tier whose every check passes, so membership is exclusive by construction.

pub mod dual_index;

pub use dual_index::{filter_by_dual_index_scores, DualIndexBounds};

use serde::Serialize;
use std::cmp::Ordering;

use crate::domain::{CanonicalInstrument, LabelKind, Metric, Tier};

#[derive(Debug, Clone, Copy)]
pub enum Check {
    /// Strictly greater, missing reads as 0
    Above(Metric, f64),
    /// Strictly less, missing reads as 0
    Below(Metric, f64),
    /// Risk gate: passes when the value was not sourced
    AbsentOrAbove(Metric, f64),
    MinStreak(u32),
    ScoreAtLeast(f64),
    ScoreBelow(f64),
    LabelIn(LabelKind, &'static [&'static str]),
    /// Passes when the label was not assigned
    LabelNotIn(LabelKind, &'static [&'static str]),
    AnyOf(&'static [Check]),
}

impl Check {
    pub fn passes(&self, instrument: &CanonicalInstrument) -> bool {
        let derived = &instrument.derived;
        match *self {
            Check::Above(metric, bound) => instrument.or_zero(metric) > bound,
            Check::Below(metric, bound) => instrument.or_zero(metric) < bound,
            Check::AbsentOrAbove(metric, bound) => instrument.metric(metric).map_or(true, |v| v > bound),
            Check::MinStreak(quarters) => derived.labels.consecutive_positive_quarters >= quarters,
            Check::ScoreAtLeast(bound) => derived.quality_score >= bound,
            Check::ScoreBelow(bound) => derived.quality_score < bound,
            Check::LabelIn(kind, allowed) => derived
                .labels
                .text(kind)
                .map_or(false, |text| allowed.contains(&text)),
            Check::LabelNotIn(kind, denied) => derived
                .labels
                .text(kind)
                .map_or(true, |text| !denied.contains(&text)),
            Check::AnyOf(checks) => checks.iter().any(|check| check.passes(instrument)),
        }
    }
}

/// How a tier's members are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierOrder {
    ScoreDesc,
    /// Mean of EPS growth and revenue growth, descending
    GrowthDesc,
}

#[derive(Debug)]
pub struct TierGate {
    pub tier: Tier,
    pub checks: &'static [Check],
    pub order: TierOrder,
}

#[derive(Debug)]
pub struct GateSet {
    pub name: &'static str,
    /// Highest priority first
    pub tiers: &'static [TierGate],
}

pub static CANONICAL_GATES: GateSet = GateSet {
    name: "quality-v3",
    tiers: &[
        TierGate {
            tier: Tier::Great,
            order: TierOrder::ScoreDesc,
            checks: &[
                Check::Above(Metric::Roe, 12.0),
                Check::Above(Metric::Roce, 15.0),
                Check::Below(Metric::DebtToEquity, 1.0),
                Check::Above(Metric::InterestCoverage, 3.0),
                Check::Above(Metric::CurrentRatio, 1.2),
                Check::Above(Metric::EpsTtmGrowth, 0.0),
                Check::Above(Metric::RevenueGrowthTtm, 10.0),
                Check::MinStreak(1),
                Check::LabelIn(
                    LabelKind::ProfitGrowthConsistency,
                    &["Consistent", "Very Consistent", "Moderate"],
                ),
                Check::LabelIn(LabelKind::MarginStability, &["Stable", "Expanding", "Moderately Stable"]),
                Check::ScoreAtLeast(70.0),
                Check::Above(Metric::MarketCap, 0.0),
                Check::AbsentOrAbove(Metric::Roa, 5.0),
                Check::AbsentOrAbove(Metric::CashFlowReturnOnAssets, 0.0),
                Check::LabelNotIn(LabelKind::CashFlowQuality, &["Negative"]),
                Check::Below(Metric::PromoterPledgePercentage, 30.0),
                Check::AbsentOrAbove(Metric::AltmanZscore, 1.8),
            ],
        },
        TierGate {
            tier: Tier::Aggressive,
            order: TierOrder::GrowthDesc,
            checks: &[
                Check::Above(Metric::Roe, 10.0),
                Check::Above(Metric::Roce, 12.0),
                Check::Below(Metric::DebtToEquity, 1.5),
                Check::Above(Metric::InterestCoverage, 2.0),
                Check::AnyOf(&[
                    Check::Above(Metric::EpsTtmGrowth, 15.0),
                    Check::Above(Metric::RevenueGrowthTtm, 20.0),
                ]),
                Check::ScoreAtLeast(60.0),
                Check::Above(Metric::MarketCap, 0.0),
                Check::LabelNotIn(LabelKind::ProfitGrowthConsistency, &["Inconsistent"]),
                Check::LabelNotIn(LabelKind::MarginStability, &["Volatile"]),
                Check::AbsentOrAbove(Metric::Roa, 3.0),
                Check::LabelNotIn(LabelKind::CashFlowQuality, &["Negative"]),
                Check::Below(Metric::PromoterPledgePercentage, 40.0),
                Check::AbsentOrAbove(Metric::AltmanZscore, 1.5),
            ],
        },
        TierGate {
            tier: Tier::Good,
            order: TierOrder::ScoreDesc,
            checks: &[
                Check::Above(Metric::Roe, 8.0),
                Check::Above(Metric::Roce, 10.0),
                Check::Below(Metric::DebtToEquity, 2.0),
                Check::Above(Metric::InterestCoverage, 1.5),
                Check::ScoreAtLeast(55.0),
                Check::ScoreBelow(70.0),
                Check::Above(Metric::MarketCap, 0.0),
                Check::LabelNotIn(LabelKind::ProfitGrowthConsistency, &["Inconsistent"]),
                Check::LabelNotIn(LabelKind::MarginStability, &["Volatile"]),
                Check::LabelNotIn(LabelKind::CashFlowQuality, &["Negative"]),
                Check::AnyOf(&[
                    Check::Above(Metric::EpsTtmGrowth, -5.0),
                    Check::Above(Metric::RevenueGrowthTtm, 5.0),
                ]),
                Check::Below(Metric::PromoterPledgePercentage, 50.0),
            ],
        },
    ],
};

/// Members of each classified tier, each already in listing order.
#[derive(Debug, Clone, Default)]
pub struct TierPartition<'a> {
    pub great: Vec<&'a CanonicalInstrument>,
    pub aggressive: Vec<&'a CanonicalInstrument>,
    pub good: Vec<&'a CanonicalInstrument>,
}

/// Sort descending by `key`, breaking ties by identity key ascending.
pub(crate) fn rank_desc<F>(items: &mut [&CanonicalInstrument], key: F)
where
    F: Fn(&CanonicalInstrument) -> f64,
{
    items.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key().cmp(b.key()))
    });
}

fn growth_average(instrument: &CanonicalInstrument) -> f64 {
    (instrument.or_zero(Metric::EpsTtmGrowth) + instrument.or_zero(Metric::RevenueGrowthTtm)) / 2.0
}

impl GateSet {
    pub fn gate(&self, tier: Tier) -> Option<&TierGate> {
        self.tiers.iter().find(|gate| gate.tier == tier)
    }

    pub fn passes(&self, tier: Tier, instrument: &CanonicalInstrument) -> bool {
        self.gate(tier)
            .map_or(false, |gate| gate.checks.iter().all(|check| check.passes(instrument)))
    }

    /// First tier whose gate passes. Requires labels and score to be current.
    pub fn classify(&self, instrument: &CanonicalInstrument) -> Tier {
        self.tiers
            .iter()
            .find(|gate| gate.checks.iter().all(|check| check.passes(instrument)))
            .map(|gate| gate.tier)
            .unwrap_or(Tier::Unclassified)
    }

    /// Instruments assigned `tier`, in that tier's listing order.
    pub fn members<'a>(&self, instruments: &'a [CanonicalInstrument], tier: Tier) -> Vec<&'a CanonicalInstrument> {
        let mut members: Vec<&CanonicalInstrument> =
            instruments.iter().filter(|i| i.derived.tier == tier).collect();
        let order = self.gate(tier).map(|gate| gate.order).unwrap_or(TierOrder::ScoreDesc);
        match order {
            TierOrder::ScoreDesc => rank_desc(&mut members, |i| i.derived.quality_score),
            TierOrder::GrowthDesc => rank_desc(&mut members, growth_average),
        }
        members
    }

    pub fn partition<'a>(&self, instruments: &'a [CanonicalInstrument]) -> TierPartition<'a> {
        TierPartition {
            great: self.members(instruments, Tier::Great),
            aggressive: self.members(instruments, Tier::Aggressive),
            good: self.members(instruments, Tier::Good),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, MarginStability, ProfitGrowthConsistency};

    /// Clears every Great check except those driven by the arguments.
    fn candidate(code: &str, roce: f64, eps_growth: f64, revenue_growth: f64, score: f64) -> CanonicalInstrument {
        let mut instrument = CanonicalInstrument::new(Identity::new(None, Some(code.into()), None), code)
            .unwrap()
            .with_metric(Metric::Roe, 18.0)
            .with_metric(Metric::Roce, roce)
            .with_metric(Metric::DebtToEquity, 0.4)
            .with_metric(Metric::InterestCoverage, 8.0)
            .with_metric(Metric::CurrentRatio, 1.8)
            .with_metric(Metric::EpsTtmGrowth, eps_growth)
            .with_metric(Metric::RevenueGrowthTtm, revenue_growth)
            .with_metric(Metric::MarketCap, 12_000.0)
            .with_metric(Metric::PromoterPledgePercentage, 0.0);
        instrument.derived.labels.consecutive_positive_quarters = 2;
        instrument.derived.labels.profit_growth_consistency = ProfitGrowthConsistency::Consistent;
        instrument.derived.labels.margin_stability = MarginStability::Stable;
        instrument.derived.quality_score = score;
        instrument
    }

    fn classified(mut instrument: CanonicalInstrument) -> CanonicalInstrument {
        instrument.derived.tier = CANONICAL_GATES.classify(&instrument);
        instrument
    }

    fn bound(gates: &GateSet, tier: Tier, metric: Metric) -> Option<Check> {
        gates.gate(tier)?.checks.iter().copied().find(|check| match check {
            Check::Above(m, _) | Check::Below(m, _) | Check::AbsentOrAbove(m, _) => *m == metric,
            _ => false,
        })
    }

    #[test]
    fn great_is_at_least_as_tight_as_looser_tiers() {
        let gates = &CANONICAL_GATES;
        for (tight, loose) in [(Tier::Great, Tier::Aggressive), (Tier::Great, Tier::Good), (Tier::Aggressive, Tier::Good)] {
            for metric in Metric::ALL {
                match (bound(gates, tight, *metric), bound(gates, loose, *metric)) {
                    (Some(Check::Above(_, t)), Some(Check::Above(_, l)))
                    | (Some(Check::AbsentOrAbove(_, t)), Some(Check::AbsentOrAbove(_, l))) => {
                        assert!(t >= l, "{:?} {:?} vs {:?}", metric, tight, loose)
                    }
                    (Some(Check::Below(_, t)), Some(Check::Below(_, l))) => {
                        assert!(t <= l, "{:?} {:?} vs {:?}", metric, tight, loose)
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn failing_great_only_on_roce_lands_in_aggressive() {
        let gates = &CANONICAL_GATES;
        assert_eq!(gates.classify(&candidate("FAST", 16.0, 20.0, 25.0, 80.0)), Tier::Great);

        let fast = candidate("FAST", 15.0, 20.0, 25.0, 80.0);
        let failing: Vec<&Check> = gates
            .gate(Tier::Great)
            .unwrap()
            .checks
            .iter()
            .filter(|check| !check.passes(&fast))
            .collect();
        assert_eq!(failing.len(), 1);
        assert!(matches!(failing[0], Check::Above(Metric::Roce, bound) if *bound == 15.0));
        assert_eq!(gates.classify(&fast), Tier::Aggressive);
    }

    #[test]
    fn aggressive_members_rank_by_growth_average() {
        let instruments = vec![
            // Higher score, lower growth average (8)
            classified(candidate("LOWG", 13.0, 16.0, 0.0, 75.0)),
            // Growth average 35
            classified(candidate("HIGHG", 13.0, 30.0, 40.0, 62.0)),
        ];
        assert!(instruments.iter().all(|i| i.derived.tier == Tier::Aggressive));

        let keys: Vec<&str> = CANONICAL_GATES
            .members(&instruments, Tier::Aggressive)
            .iter()
            .map(|i| i.key().as_str())
            .collect();
        assert_eq!(keys, vec!["NSE:HIGHG", "NSE:LOWG"]);
    }

    #[test]
    fn good_takes_scores_from_55_up_to_70() {
        // Too slow for Aggressive, too little ROCE for Great
        let tier_at = |score: f64| CANONICAL_GATES.classify(&candidate("STEADY", 13.0, 5.0, 5.0, score));
        assert_eq!(tier_at(55.0), Tier::Good);
        assert_eq!(tier_at(69.99), Tier::Good);
        assert_eq!(tier_at(54.99), Tier::Unclassified);
        assert_eq!(tier_at(70.0), Tier::Unclassified);
    }

    #[test]
    fn good_members_rank_by_score() {
        let instruments = vec![
            classified(candidate("LOW", 13.0, 5.0, 5.0, 56.0)),
            classified(candidate("HIGH", 13.0, 5.0, 5.0, 68.0)),
        ];
        let keys: Vec<&str> = CANONICAL_GATES
            .members(&instruments, Tier::Good)
            .iter()
            .map(|i| i.key().as_str())
            .collect();
        assert_eq!(keys, vec!["NSE:HIGH", "NSE:LOW"]);
    }

    #[test]
    fn risk_gates_pass_when_absent() {
        let instrument = CanonicalInstrument::new(Identity::new(None, Some("X".into()), None), "X").unwrap();
        assert!(Check::AbsentOrAbove(Metric::Roa, 5.0).passes(&instrument));
        assert!(Check::LabelNotIn(LabelKind::CashFlowQuality, &["Negative"]).passes(&instrument));

        let weak = instrument.with_metric(Metric::Roa, 2.0);
        assert!(!Check::AbsentOrAbove(Metric::Roa, 5.0).passes(&weak));
    }

    #[test]
    fn ties_break_by_identity_key() {
        let make = |code: &str| {
            let mut i = CanonicalInstrument::new(Identity::new(None, Some(code.into()), None), code).unwrap();
            i.derived.quality_score = 80.0;
            i
        };
        let items = vec![make("ZED"), make("ACME"), make("MID")];
        let mut refs: Vec<&CanonicalInstrument> = items.iter().collect();
        rank_desc(&mut refs, |i| i.derived.quality_score);
        let keys: Vec<&str> = refs.iter().map(|i| i.key().as_str()).collect();
        assert_eq!(keys, vec!["NSE:ACME", "NSE:MID", "NSE:ZED"]);
    }
}
