//! Caller-parameterized screen: hard filters, then a weighted component score.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::constants::{DEFAULT_SCREEN_LIMIT, MAX_SCREEN_LIMIT};
use crate::domain::{CanonicalInstrument, Metric};
use crate::error::{Result, ScreenerError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScreenSort {
    #[default]
    Score,
    #[serde(alias = "quality_score")]
    QualityScore,
    #[serde(alias = "market_cap")]
    MarketCap,
    #[serde(alias = "pe_ttm", alias = "pe_ratio")]
    PeTtm,
    Roe,
    #[serde(alias = "revenue_growth")]
    RevenueGrowth,
    #[serde(alias = "durability_score", alias = "trendlyne_durability_score")]
    DurabilityScore,
    #[serde(alias = "valuation_score", alias = "trendlyne_valuation_score")]
    ValuationScore,
    #[serde(alias = "momentum_score", alias = "trendlyne_momentum_score")]
    MomentumScore,
    #[serde(alias = "piotroski_score")]
    PiotroskiScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierFilterCriteria {
    #[serde(alias = "min_market_cap")]
    pub min_market_cap: Option<f64>,
    #[serde(alias = "max_market_cap")]
    pub max_market_cap: Option<f64>,

    #[serde(alias = "max_pe_ttm")]
    pub max_pe_ttm: Option<f64>,
    #[serde(alias = "max_peg_ttm")]
    pub max_peg_ttm: Option<f64>,
    #[serde(alias = "max_price_to_book")]
    pub max_price_to_book: Option<f64>,
    #[serde(alias = "max_price_to_sales")]
    pub max_price_to_sales: Option<f64>,

    #[serde(alias = "min_roe")]
    pub min_roe: Option<f64>,
    #[serde(alias = "min_roa")]
    pub min_roa: Option<f64>,
    #[serde(alias = "min_operating_margin")]
    pub min_operating_margin: Option<f64>,
    #[serde(alias = "min_operating_margin_qtr")]
    pub min_operating_margin_qtr: Option<f64>,
    #[serde(alias = "min_piotroski_score")]
    pub min_piotroski_score: Option<f64>,

    #[serde(alias = "min_revenue_growth")]
    pub min_revenue_growth: Option<f64>,
    #[serde(alias = "min_revenue_growth_qtr_yoy")]
    pub min_revenue_growth_qtr_yoy: Option<f64>,
    #[serde(alias = "min_profit_growth")]
    pub min_profit_growth: Option<f64>,
    #[serde(alias = "min_net_profit_qoq_growth")]
    pub min_net_profit_qoq_growth: Option<f64>,
    #[serde(alias = "min_eps_ttm_growth")]
    pub min_eps_ttm_growth: Option<f64>,

    #[serde(alias = "max_debt_to_equity")]
    pub max_debt_to_equity: Option<f64>,
    #[serde(alias = "min_current_ratio")]
    pub min_current_ratio: Option<f64>,
    #[serde(alias = "min_cash_from_operating_annual")]
    pub min_cash_from_operating_annual: Option<f64>,
    #[serde(alias = "min_net_cash_flow_annual")]
    pub min_net_cash_flow_annual: Option<f64>,

    #[serde(alias = "min_durability_score", alias = "min_trendlyne_durability_score")]
    pub min_durability_score: Option<f64>,
    #[serde(alias = "min_valuation_score", alias = "min_trendlyne_valuation_score")]
    pub min_valuation_score: Option<f64>,
    #[serde(alias = "min_momentum_score", alias = "min_trendlyne_momentum_score")]
    pub min_momentum_score: Option<f64>,

    #[serde(alias = "use_index_scores", alias = "use_trendlyne_scores")]
    pub use_index_scores: bool,
    #[serde(alias = "valuation_weight")]
    pub valuation_weight: f64,
    #[serde(alias = "profitability_weight")]
    pub profitability_weight: f64,
    #[serde(alias = "growth_weight")]
    pub growth_weight: f64,
    #[serde(alias = "index_weight", alias = "trendlyne_weight")]
    pub index_weight: f64,

    #[serde(alias = "min_score")]
    pub min_score: Option<f64>,
    pub limit: usize,
    #[serde(alias = "sort_by")]
    pub sort_by: ScreenSort,
}

impl Default for TierFilterCriteria {
    fn default() -> Self {
        Self {
            min_market_cap: None,
            max_market_cap: None,
            max_pe_ttm: None,
            max_peg_ttm: None,
            max_price_to_book: None,
            max_price_to_sales: None,
            min_roe: None,
            min_roa: None,
            min_operating_margin: None,
            min_operating_margin_qtr: None,
            min_piotroski_score: None,
            min_revenue_growth: None,
            min_revenue_growth_qtr_yoy: None,
            min_profit_growth: None,
            min_net_profit_qoq_growth: None,
            min_eps_ttm_growth: None,
            max_debt_to_equity: None,
            min_current_ratio: None,
            min_cash_from_operating_annual: None,
            min_net_cash_flow_annual: None,
            min_durability_score: None,
            min_valuation_score: None,
            min_momentum_score: None,
            use_index_scores: true,
            valuation_weight: 0.2,
            profitability_weight: 0.25,
            growth_weight: 0.25,
            index_weight: 0.3,
            min_score: None,
            limit: DEFAULT_SCREEN_LIMIT,
            sort_by: ScreenSort::Score,
        }
    }
}

/// An instrument that passed the screen, with its screen score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenHit<'a> {
    #[serde(flatten)]
    pub instrument: &'a CanonicalInstrument,
    pub screen_score: f64,
}

/// Running `earned / applicable` for one component.
#[derive(Default)]
struct Component {
    earned: f64,
    applicable: f64,
}

impl Component {
    /// Lower is better: earns `1 - value / bound` when within the bound.
    fn ceiling(&mut self, value: Option<f64>, bound: Option<f64>) {
        if let (Some(value), Some(bound)) = (value.filter(|v| *v != 0.0), bound.filter(|b| *b > 0.0)) {
            if value <= bound {
                self.earned += (1.0 - value / bound).clamp(0.0, 1.0);
            }
            self.applicable += 1.0;
        }
    }

    /// Higher is better: earns up to 1 at twice the floor.
    fn floor(&mut self, value: Option<f64>, floor: Option<f64>) {
        if let (Some(value), Some(floor)) = (value.filter(|v| *v != 0.0), floor.filter(|f| *f > 0.0)) {
            if value >= floor {
                self.earned += (value / (floor * 2.0)).min(1.0);
            }
            self.applicable += 1.0;
        }
    }

    /// Index scores are 0-100; a floor gates the points but not applicability.
    fn index(&mut self, value: Option<f64>, floor: Option<f64>) {
        if let Some(value) = value {
            if floor.map_or(true, |f| value >= f) {
                self.earned += (value / 100.0).clamp(0.0, 1.0);
            }
            self.applicable += 1.0;
        }
    }

    fn normalized(&self) -> Option<f64> {
        (self.applicable > 0.0).then(|| self.earned / self.applicable * 100.0)
    }
}

fn meets_min(value: Option<f64>, min: Option<f64>) -> bool {
    match min {
        Some(min) => value.map_or(false, |v| v >= min),
        None => true,
    }
}

fn meets_max(value: Option<f64>, max: Option<f64>) -> bool {
    match max {
        Some(max) => value.map_or(true, |v| v <= max),
        None => true,
    }
}

impl TierFilterCriteria {
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("valuationWeight", self.valuation_weight),
            ("profitabilityWeight", self.profitability_weight),
            ("growthWeight", self.growth_weight),
            ("indexWeight", self.index_weight),
        ];
        for (name, weight) in weights {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ScreenerError::InvalidCriteria(format!("{name} must be between 0 and 1, got {weight}")));
            }
        }
        if weights.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(ScreenerError::InvalidCriteria("at least one weight must be positive".into()));
        }
        if self.limit == 0 || self.limit > MAX_SCREEN_LIMIT {
            return Err(ScreenerError::InvalidCriteria(format!(
                "limit must be between 1 and {MAX_SCREEN_LIMIT}, got {}",
                self.limit
            )));
        }
        Ok(())
    }

    /// Hard filters. An absent metric fails a minimum and passes a maximum.
    pub fn admits(&self, instrument: &CanonicalInstrument) -> bool {
        let m = |metric| instrument.metric(metric);
        meets_min(m(Metric::MarketCap), self.min_market_cap)
            && meets_max(m(Metric::MarketCap), self.max_market_cap)
            && meets_max(m(Metric::PeTtm), self.max_pe_ttm)
            && meets_max(m(Metric::PegTtm), self.max_peg_ttm)
            && meets_max(m(Metric::PriceToBook), self.max_price_to_book)
            && meets_max(m(Metric::PriceToSalesTtm), self.max_price_to_sales)
            && meets_min(m(Metric::Roe), self.min_roe)
            && meets_min(m(Metric::Roa), self.min_roa)
            && meets_min(m(Metric::OpmAnn), self.min_operating_margin)
            && meets_min(m(Metric::OpmQtr), self.min_operating_margin_qtr)
            && meets_min(m(Metric::PiotroskiScore), self.min_piotroski_score)
            && meets_min(m(Metric::RevenueGrowthAnnualYoy), self.min_revenue_growth)
            && meets_min(m(Metric::RevenueGrowthQtrYoy), self.min_revenue_growth_qtr_yoy)
            && meets_min(m(Metric::NetProfit3yGrowth), self.min_profit_growth)
            && meets_min(m(Metric::NetProfitQoqGrowth), self.min_net_profit_qoq_growth)
            && meets_min(m(Metric::EpsTtmGrowth), self.min_eps_ttm_growth)
            && meets_max(m(Metric::DebtToEquity), self.max_debt_to_equity)
            && meets_min(m(Metric::CurrentRatio), self.min_current_ratio)
            && meets_min(m(Metric::CashFromOperatingAnnual), self.min_cash_from_operating_annual)
            && meets_min(m(Metric::NetCashFlowAnnual), self.min_net_cash_flow_annual)
            && meets_min(m(Metric::DurabilityScore), self.min_durability_score)
            && meets_min(m(Metric::ValuationScore), self.min_valuation_score)
            && meets_min(m(Metric::MomentumScore), self.min_momentum_score)
    }

    /// Weighted component score in [0, 100]. Components with no applicable
    /// inputs drop out of the weight total.
    pub fn weighted_score(&self, instrument: &CanonicalInstrument) -> f64 {
        let m = |metric| instrument.metric(metric);

        let mut valuation = Component::default();
        valuation.ceiling(m(Metric::PeTtm), self.max_pe_ttm);
        valuation.ceiling(m(Metric::PegTtm), self.max_peg_ttm);
        valuation.ceiling(m(Metric::PriceToBook), self.max_price_to_book);
        valuation.ceiling(m(Metric::PriceToSalesTtm), self.max_price_to_sales);

        let mut profitability = Component::default();
        profitability.floor(m(Metric::Roe), self.min_roe);
        profitability.floor(m(Metric::Roa), self.min_roa);
        profitability.floor(m(Metric::OpmAnn), self.min_operating_margin);
        profitability.floor(m(Metric::OpmQtr), self.min_operating_margin_qtr);
        if let (Some(piotroski), Some(min)) = (m(Metric::PiotroskiScore), self.min_piotroski_score.filter(|v| *v > 0.0)) {
            if piotroski >= min {
                profitability.earned += (piotroski / 9.0).min(1.0);
            }
            profitability.applicable += 1.0;
        }

        let mut growth = Component::default();
        growth.floor(m(Metric::RevenueGrowthAnnualYoy), self.min_revenue_growth);
        growth.floor(m(Metric::RevenueGrowthQtrYoy), self.min_revenue_growth_qtr_yoy);
        growth.floor(m(Metric::NetProfit3yGrowth), self.min_profit_growth);
        growth.floor(m(Metric::NetProfitQoqGrowth), self.min_net_profit_qoq_growth);
        growth.floor(m(Metric::EpsTtmGrowth), self.min_eps_ttm_growth);

        let mut index = Component::default();
        if self.use_index_scores {
            index.index(m(Metric::DurabilityScore), self.min_durability_score);
            index.index(m(Metric::ValuationScore), self.min_valuation_score);
            index.index(m(Metric::MomentumScore), self.min_momentum_score);
        }

        let weighted = [
            (valuation.normalized(), self.valuation_weight),
            (profitability.normalized(), self.profitability_weight),
            (growth.normalized(), self.growth_weight),
            (index.normalized(), self.index_weight),
        ];
        let (total, weight) = weighted
            .iter()
            .filter_map(|(score, weight)| score.map(|s| (s * weight, *weight)))
            .fold((0.0, 0.0), |(total, weights), (s, w)| (total + s, weights + w));

        if weight <= 0.0 {
            return 0.0;
        }
        ((total / weight).clamp(0.0, 100.0) * 100.0).round() / 100.0
    }

    fn sort_key(&self, hit: &ScreenHit<'_>) -> f64 {
        let i = hit.instrument;
        match self.sort_by {
            ScreenSort::Score => hit.screen_score,
            ScreenSort::QualityScore => i.derived.quality_score,
            ScreenSort::MarketCap => i.or_zero(Metric::MarketCap),
            // Cheapest first; missing PE sorts last
            ScreenSort::PeTtm => -i.metric(Metric::PeTtm).filter(|v| *v != 0.0).unwrap_or(f64::INFINITY),
            ScreenSort::Roe => i.or_zero(Metric::Roe),
            ScreenSort::RevenueGrowth => i
                .metric(Metric::RevenueGrowthAnnualYoy)
                .or_else(|| i.metric(Metric::RevenueGrowthQtrYoy))
                .unwrap_or(0.0),
            ScreenSort::DurabilityScore => i.or_zero(Metric::DurabilityScore),
            ScreenSort::ValuationScore => i.or_zero(Metric::ValuationScore),
            ScreenSort::MomentumScore => i.or_zero(Metric::MomentumScore),
            ScreenSort::PiotroskiScore => i.or_zero(Metric::PiotroskiScore),
        }
    }
}

/// Run a screen over a scored set. Criteria are validated first.
pub fn screen<'a>(instruments: &'a [CanonicalInstrument], criteria: &TierFilterCriteria) -> Result<Vec<ScreenHit<'a>>> {
    criteria.validate()?;

    let mut hits: Vec<ScreenHit<'a>> = instruments
        .iter()
        .filter(|instrument| criteria.admits(instrument))
        .map(|instrument| ScreenHit {
            instrument,
            screen_score: criteria.weighted_score(instrument),
        })
        .filter(|hit| criteria.min_score.map_or(true, |min| hit.screen_score >= min))
        .collect();

    hits.sort_by(|a, b| {
        criteria
            .sort_key(b)
            .partial_cmp(&criteria.sort_key(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.instrument.key().cmp(b.instrument.key()))
    });
    hits.truncate(criteria.limit);
    Ok(hits)
}
