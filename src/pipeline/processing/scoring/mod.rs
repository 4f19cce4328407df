// Quality scoring: trend labels, composite score and tier assignment

pub mod labels;
pub mod table;

pub use labels::derive_labels;
pub use table::{Rule, ScoreTable, Scorer, CANONICAL_TABLE};

use serde::Serialize;
use tracing::debug;

use crate::domain::{CanonicalInstrument, MetricSet, TrendLabels};
use crate::observability::metrics as obs;
use crate::pipeline::processing::tiers::{GateSet, CANONICAL_GATES};
use table::{Bonus, CappedTerm, Ladder, Presence, Step};

/// Points one rule awarded an instrument.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub id: u8,
    pub name: &'static str,
    pub earned: f64,
    pub max_points: f64,
}

/// Scores instruments against one score table and one gate set.
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    table: &'static ScoreTable,
    gates: &'static GateSet,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(&CANONICAL_TABLE, &CANONICAL_GATES)
    }
}

fn first_step(steps: &[Step], value: f64) -> f64 {
    steps
        .iter()
        .find(|step| step.test.passes(value))
        .map(|step| step.points)
        .unwrap_or(0.0)
}

/// `None` when a presence-gated ladder does not apply.
fn run_ladder(ladder: &Ladder, metrics: &MetricSet) -> Option<f64> {
    let value = match ladder.presence {
        Presence::ZeroDefault => metrics.or_zero(ladder.metric),
        Presence::NonZero => metrics.get(ladder.metric).filter(|v| *v != 0.0)?,
    };
    Some(first_step(ladder.steps, value))
}

fn run_bonus(bonus: &Bonus, metrics: &MetricSet) -> f64 {
    if bonus.test.passes(metrics.or_zero(bonus.metric)) {
        bonus.points
    } else {
        0.0
    }
}

fn run_capped(terms: &[CappedTerm], metrics: &MetricSet) -> f64 {
    terms
        .iter()
        .filter_map(|term| {
            metrics
                .get(term.metric)
                .filter(|v| *v != 0.0)
                .map(|v| (v / term.divisor).min(term.cap))
        })
        .sum()
}

impl ScoringEngine {
    pub fn new(table: &'static ScoreTable, gates: &'static GateSet) -> Self {
        Self { table, gates }
    }

    pub fn table(&self) -> &'static ScoreTable {
        self.table
    }

    pub fn gates(&self) -> &'static GateSet {
        self.gates
    }

    fn rule_points(&self, rule: &Rule, metrics: &MetricSet, labels: &TrendLabels) -> f64 {
        let earned = match &rule.scorer {
            Scorer::Retired => 0.0,
            Scorer::Ladder(ladder) => run_ladder(ladder, metrics).unwrap_or(0.0),
            Scorer::Fallback { primary, secondary } => run_ladder(primary, metrics)
                .or_else(|| run_ladder(secondary, metrics))
                .unwrap_or(0.0),
            Scorer::WithBonus { ladder, bonus } => {
                run_ladder(ladder, metrics).unwrap_or(0.0) + run_bonus(bonus, metrics)
            }
            Scorer::Streak { steps, otherwise } => {
                let streak = first_step(steps, labels.consecutive_positive_quarters as f64);
                if streak > 0.0 {
                    streak
                } else {
                    run_bonus(otherwise, metrics)
                }
            }
            Scorer::Label { kind, points } => labels
                .text(*kind)
                .and_then(|text| points.iter().find(|(label, _)| *label == text))
                .map(|(_, points)| *points)
                .unwrap_or(0.0),
            Scorer::CappedSum(terms) => run_capped(terms, metrics),
        };
        earned.min(rule.max_points)
    }

    /// Per-rule points for an instrument with the given labels.
    pub fn breakdown(&self, metrics: &MetricSet, labels: &TrendLabels) -> Vec<RuleOutcome> {
        self.table
            .active_rules()
            .map(|rule| RuleOutcome {
                id: rule.id,
                name: rule.name,
                earned: self.rule_points(rule, metrics, labels),
                max_points: rule.max_points,
            })
            .collect()
    }

    /// Composite score in [0, 100], rounded to two decimals.
    pub fn score_with(&self, metrics: &MetricSet, labels: &TrendLabels) -> f64 {
        let max_possible = self.table.max_possible();
        if max_possible <= 0.0 {
            return 0.0;
        }
        let earned: f64 = self
            .table
            .rules
            .iter()
            .map(|rule| self.rule_points(rule, metrics, labels))
            .sum();
        let normalized = (earned / max_possible * 100.0).clamp(0.0, 100.0);
        (normalized * 100.0).round() / 100.0
    }

    pub fn score(&self, instrument: &CanonicalInstrument) -> f64 {
        let labels = derive_labels(&instrument.metrics);
        self.score_with(&instrument.metrics, &labels)
    }

    /// Recompute labels, score and tier in place.
    pub fn evaluate(&self, instrument: &mut CanonicalInstrument) {
        let labels = derive_labels(&instrument.metrics);
        let score = self.score_with(&instrument.metrics, &labels);
        instrument.derived.labels = labels;
        instrument.derived.quality_score = score;
        instrument.derived.tier = self.gates.classify(instrument);

        obs::scoring::quality_score_recorded(score);
        obs::scoring::tier_assigned(instrument.derived.tier.as_str());
    }

    pub fn evaluate_all(&self, instruments: &mut [CanonicalInstrument]) {
        for instrument in instruments.iter_mut() {
            self.evaluate(instrument);
        }
        debug!("Scored {} instruments against {}", instruments.len(), self.table.name);
    }
}
