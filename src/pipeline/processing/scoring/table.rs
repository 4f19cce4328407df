//! Declarative score table.
//!
//! Each rule names its maximum points and how points are earned. Retired
//! rules stay in the table with zero weight so rule numbering is stable.

use crate::domain::{LabelKind, Metric};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Test {
    Gt(f64),
    Lt(f64),
    Eq(f64),
    /// Inclusive on both ends
    Within(f64, f64),
}

impl Test {
    pub fn passes(self, value: f64) -> bool {
        match self {
            Test::Gt(bound) => value > bound,
            Test::Lt(bound) => value < bound,
            Test::Eq(target) => value == target,
            Test::Within(low, high) => value >= low && value <= high,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub test: Test,
    pub points: f64,
}

const fn gt(bound: f64, points: f64) -> Step {
    Step { test: Test::Gt(bound), points }
}

const fn lt(bound: f64, points: f64) -> Step {
    Step { test: Test::Lt(bound), points }
}

const fn eq(target: f64, points: f64) -> Step {
    Step { test: Test::Eq(target), points }
}

const fn within(low: f64, high: f64, points: f64) -> Step {
    Step { test: Test::Within(low, high), points }
}

/// How a missing input is read by a ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Missing reads as 0 and the ladder still runs
    ZeroDefault,
    /// Missing or 0 means the ladder does not apply
    NonZero,
}

#[derive(Debug, Clone, Copy)]
pub struct Ladder {
    pub metric: Metric,
    pub presence: Presence,
    pub steps: &'static [Step],
}

#[derive(Debug, Clone, Copy)]
pub struct Bonus {
    pub metric: Metric,
    pub test: Test,
    pub points: f64,
}

/// `min(value / divisor, cap)`, counted only for a non-zero value.
#[derive(Debug, Clone, Copy)]
pub struct CappedTerm {
    pub metric: Metric,
    pub divisor: f64,
    pub cap: f64,
}

#[derive(Debug, Clone, Copy)]
pub enum Scorer {
    Retired,
    Ladder(Ladder),
    /// The secondary ladder runs only when the primary does not apply
    Fallback { primary: Ladder, secondary: Ladder },
    WithBonus { ladder: Ladder, bonus: Bonus },
    /// Consecutive positive EPS quarters, with a weaker signal as fallback
    Streak { steps: &'static [Step], otherwise: Bonus },
    Label { kind: LabelKind, points: &'static [(&'static str, f64)] },
    CappedSum(&'static [CappedTerm]),
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub id: u8,
    pub name: &'static str,
    pub max_points: f64,
    pub scorer: Scorer,
}

#[derive(Debug)]
pub struct ScoreTable {
    pub name: &'static str,
    pub rules: &'static [Rule],
}

impl ScoreTable {
    /// Every rule counts toward the denominator whether or not its data was present.
    pub fn max_possible(&self) -> f64 {
        self.rules.iter().map(|rule| rule.max_points).sum()
    }

    pub fn active_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| !matches!(rule.scorer, Scorer::Retired))
    }
}

const fn ladder(metric: Metric, steps: &'static [Step]) -> Ladder {
    Ladder {
        metric,
        presence: Presence::ZeroDefault,
        steps,
    }
}

const fn present_ladder(metric: Metric, steps: &'static [Step]) -> Ladder {
    Ladder {
        metric,
        presence: Presence::NonZero,
        steps,
    }
}

const fn retired(id: u8, name: &'static str) -> Rule {
    Rule {
        id,
        name,
        max_points: 0.0,
        scorer: Scorer::Retired,
    }
}

pub static CANONICAL_TABLE: ScoreTable = ScoreTable {
    name: "quality-v3",
    rules: &[
        Rule {
            id: 1,
            name: "roe",
            max_points: 20.0,
            scorer: Scorer::Ladder(ladder(Metric::Roe, &[gt(20.0, 20.0), gt(15.0, 15.0), gt(12.0, 10.0), gt(8.0, 5.0)])),
        },
        Rule {
            id: 2,
            name: "roce",
            max_points: 20.0,
            scorer: Scorer::Ladder(ladder(Metric::Roce, &[gt(25.0, 20.0), gt(20.0, 15.0), gt(15.0, 10.0), gt(10.0, 5.0)])),
        },
        Rule {
            id: 3,
            name: "debt_to_equity",
            max_points: 15.0,
            scorer: Scorer::Ladder(ladder(
                Metric::DebtToEquity,
                &[eq(0.0, 15.0), lt(0.3, 12.0), lt(0.5, 10.0), lt(1.0, 7.0), lt(1.5, 3.0)],
            )),
        },
        Rule {
            id: 4,
            name: "interest_coverage",
            max_points: 10.0,
            scorer: Scorer::Ladder(ladder(
                Metric::InterestCoverage,
                &[gt(10.0, 10.0), gt(5.0, 8.0), gt(3.0, 5.0), gt(1.5, 2.0)],
            )),
        },
        Rule {
            id: 5,
            name: "current_ratio",
            max_points: 10.0,
            scorer: Scorer::Ladder(ladder(Metric::CurrentRatio, &[gt(2.0, 10.0), gt(1.5, 8.0), gt(1.2, 5.0), gt(1.0, 2.0)])),
        },
        Rule {
            id: 6,
            name: "promoter_holding",
            max_points: 7.0,
            scorer: Scorer::WithBonus {
                ladder: ladder(Metric::PromoterHolding, &[gt(50.0, 5.0), gt(30.0, 3.0), gt(20.0, 1.0)]),
                bonus: Bonus {
                    metric: Metric::PromoterHoldingChangeQoq,
                    test: Test::Gt(0.0),
                    points: 2.0,
                },
            },
        },
        Rule {
            id: 7,
            name: "eps_ttm_growth",
            max_points: 10.0,
            scorer: Scorer::Ladder(ladder(Metric::EpsTtmGrowth, &[gt(20.0, 10.0), gt(10.0, 7.0), gt(5.0, 4.0), gt(0.0, 2.0)])),
        },
        retired(8, "revenue_growth"),
        Rule {
            id: 9,
            name: "net_profit_3y_growth",
            max_points: 8.0,
            scorer: Scorer::Ladder(ladder(Metric::NetProfit3yGrowth, &[gt(20.0, 8.0), gt(10.0, 5.0), gt(0.0, 2.0)])),
        },
        Rule {
            id: 10,
            name: "opm_annual",
            max_points: 5.0,
            scorer: Scorer::Ladder(ladder(Metric::OpmAnn, &[gt(15.0, 5.0), gt(10.0, 3.0), gt(5.0, 1.0)])),
        },
        Rule {
            id: 11,
            name: "peg",
            max_points: 5.0,
            scorer: Scorer::Ladder(present_ladder(
                Metric::PegTtm,
                &[within(0.7, 1.5, 5.0), within(0.5, 2.0, 3.0), within(f64::MIN_POSITIVE, 0.5, 1.0)],
            )),
        },
        Rule {
            id: 12,
            name: "quarterly_eps_streak",
            max_points: 8.0,
            scorer: Scorer::Streak {
                steps: &[gt(1.0, 8.0), eq(1.0, 4.0)],
                otherwise: Bonus {
                    metric: Metric::BasicEpsQoqGrowth,
                    test: Test::Gt(0.0),
                    points: 2.0,
                },
            },
        },
        retired(13, "pe_vs_industry"),
        Rule {
            id: 14,
            name: "price_to_book",
            max_points: 5.0,
            scorer: Scorer::Fallback {
                primary: present_ladder(Metric::PriceToBook, &[lt(1.0, 5.0), lt(2.0, 3.0), lt(3.0, 1.0)]),
                secondary: present_ladder(Metric::IndustryPbvTtm, &[lt(2.0, 2.0)]),
            },
        },
        Rule {
            id: 15,
            name: "ev_per_ebitda",
            max_points: 5.0,
            scorer: Scorer::Ladder(present_ladder(Metric::EvPerEbitdaAnn, &[lt(8.0, 5.0), lt(12.0, 3.0), lt(15.0, 1.0)])),
        },
        Rule {
            id: 16,
            name: "promoter_trend",
            max_points: 3.0,
            scorer: Scorer::Label {
                kind: LabelKind::PromoterTrend,
                points: &[("Rising (Strong)", 3.0), ("Rising", 3.0), ("Rising (Moderate)", 2.0), ("Stable", 1.0)],
            },
        },
        Rule {
            id: 17,
            name: "margin_stability",
            max_points: 3.0,
            scorer: Scorer::Label {
                kind: LabelKind::MarginStability,
                points: &[("Expanding", 3.0), ("Stable", 2.0), ("Moderately Stable", 1.0)],
            },
        },
        Rule {
            id: 18,
            name: "profit_growth_consistency",
            max_points: 4.0,
            scorer: Scorer::Label {
                kind: LabelKind::ProfitGrowthConsistency,
                points: &[("Very Consistent", 4.0), ("Consistent", 3.0), ("Moderate", 1.0)],
            },
        },
        Rule {
            id: 19,
            name: "composite_index_scores",
            max_points: 14.0,
            scorer: Scorer::CappedSum(&[
                CappedTerm {
                    metric: Metric::DurabilityScore,
                    divisor: 2.0,
                    cap: 7.0,
                },
                CappedTerm {
                    metric: Metric::ValuationScore,
                    divisor: 2.0,
                    cap: 7.0,
                },
            ]),
        },
        Rule {
            id: 20,
            name: "piotroski",
            max_points: 9.0,
            scorer: Scorer::CappedSum(&[CappedTerm {
                metric: Metric::PiotroskiScore,
                divisor: 1.0,
                cap: 9.0,
            }]),
        },
        Rule {
            id: 21,
            name: "altman_zscore",
            max_points: 6.0,
            scorer: Scorer::Ladder(present_ladder(Metric::AltmanZscore, &[gt(3.0, 6.0), gt(2.7, 4.0), gt(1.8, 2.0)])),
        },
        retired(22, "tobin_q"),
        retired(23, "graham_number"),
        retired(24, "roa"),
        Rule {
            id: 25,
            name: "cash_flow_quality",
            max_points: 1.0,
            scorer: Scorer::Label {
                kind: LabelKind::CashFlowQuality,
                points: &[("Improving", 1.0)],
            },
        },
        retired(26, "cash_eps_growth"),
        retired(27, "working_capital_efficiency"),
        retired(28, "operating_profit_growth"),
        Rule {
            id: 29,
            name: "ebitda_margin",
            max_points: 5.0,
            scorer: Scorer::WithBonus {
                ladder: ladder(
                    Metric::EbitdaAnnMargin,
                    &[gt(25.0, 4.0), gt(20.0, 3.0), gt(15.0, 2.0), gt(10.0, 1.0)],
                ),
                bonus: Bonus {
                    metric: Metric::EbitdaQtrYoyGrowth,
                    test: Test::Gt(15.0),
                    points: 1.0,
                },
            },
        },
        Rule {
            id: 30,
            name: "price_to_sales",
            max_points: 3.0,
            scorer: Scorer::Fallback {
                primary: present_ladder(Metric::PriceToSalesTtm, &[lt(1.0, 3.0), lt(2.0, 2.0), lt(3.0, 1.0)]),
                secondary: present_ladder(Metric::PriceToSalesAnn, &[lt(1.0, 3.0), lt(2.0, 2.0)]),
            },
        },
        Rule {
            id: 31,
            name: "price_to_cashflow",
            max_points: 3.0,
            scorer: Scorer::Ladder(present_ladder(Metric::PriceToCashflow, &[lt(10.0, 3.0), lt(15.0, 2.0), lt(20.0, 1.0)])),
        },
        Rule {
            id: 32,
            name: "roce_consistency",
            max_points: 3.0,
            scorer: Scorer::Label {
                kind: LabelKind::RoceConsistency,
                points: &[("Very Consistent", 3.0), ("Consistent", 2.0), ("Improving", 1.0)],
            },
        },
        Rule {
            id: 33,
            name: "roe_trend",
            max_points: 2.0,
            scorer: Scorer::Label {
                kind: LabelKind::RoeTrend,
                points: &[("Consistently Rising", 2.0), ("Rising", 1.0)],
            },
        },
        Rule {
            id: 34,
            name: "promoter_pledge",
            max_points: 2.0,
            scorer: Scorer::Ladder(ladder(Metric::PromoterPledgePercentage, &[eq(0.0, 2.0), lt(10.0, 1.0)])),
        },
        Rule {
            id: 35,
            name: "industry_sector_score",
            max_points: 3.0,
            scorer: Scorer::CappedSum(&[
                CappedTerm {
                    metric: Metric::IndustryScore,
                    divisor: 20.0,
                    cap: 1.5,
                },
                CappedTerm {
                    metric: Metric::SectorScore,
                    divisor: 20.0,
                    cap: 1.5,
                },
            ]),
        },
        retired(36, "checklist"),
        retired(37, "bank_ratios"),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn canonical_table_totals_189() {
        assert_eq!(CANONICAL_TABLE.max_possible(), 189.0);
        assert_eq!(CANONICAL_TABLE.rules.len(), 37);
        assert_eq!(CANONICAL_TABLE.active_rules().count(), 27);
    }

    #[test]
    fn rule_ids_are_sequential_and_names_unique() {
        let ids: Vec<u8> = CANONICAL_TABLE.rules.iter().map(|r| r.id).collect();
        assert_eq!(ids, (1..=37).collect::<Vec<u8>>());

        let names: HashSet<&str> = CANONICAL_TABLE.rules.iter().map(|r| r.name).collect();
        assert_eq!(names.len(), 37);
    }

    #[test]
    fn no_step_awards_more_than_its_rule() {
        for rule in CANONICAL_TABLE.rules {
            let ladders: Vec<&Ladder> = match &rule.scorer {
                Scorer::Ladder(l) => vec![l],
                Scorer::Fallback { primary, secondary } => vec![primary, secondary],
                Scorer::WithBonus { ladder, .. } => vec![ladder],
                _ => continue,
            };
            for l in ladders {
                for step in l.steps {
                    assert!(step.points <= rule.max_points, "rule {}", rule.name);
                }
            }
        }
    }

    #[test]
    fn within_is_inclusive() {
        assert!(Test::Within(0.7, 1.5).passes(0.7));
        assert!(Test::Within(0.7, 1.5).passes(1.5));
        assert!(!Test::Within(0.7, 1.5).passes(1.51));
    }
}
