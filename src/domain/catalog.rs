//! Canonical field catalog.
//!
//! Each metric names its stable key, its wire name, whether it is read as an
//! integer, and the export column spellings tried in priority order. Adding a
//! column variant is a data change here and nowhere else.

use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Decimal,
    Integer,
}

macro_rules! metric_catalog {
    ($( $variant:ident => $key:literal, $wire:literal, $kind:ident, [$($column:literal),+ $(,)?]; )+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Metric {
            $($variant),+
        }

        impl Metric {
            pub const ALL: &'static [Metric] = &[$(Metric::$variant),+];
            pub const COUNT: usize = Metric::ALL.len();

            /// Stable internal key (snake_case)
            pub fn key(self) -> &'static str {
                match self {
                    $(Metric::$variant => $key),+
                }
            }

            /// Field name in API responses (camelCase)
            pub fn wire_name(self) -> &'static str {
                match self {
                    $(Metric::$variant => $wire),+
                }
            }

            pub fn kind(self) -> MetricKind {
                match self {
                    $(Metric::$variant => MetricKind::$kind),+
                }
            }

            /// Export column spellings, highest priority first
            pub fn columns(self) -> &'static [&'static str] {
                match self {
                    $(Metric::$variant => &[$($column),+]),+
                }
            }
        }
    };
}

metric_catalog! {
    // Size and price
    MarketCap => "market_cap", "marketCap", Decimal, ["Market Capitalization", "Market Cap", "Mkt Cap"];
    CurrentPrice => "current_price", "currentPrice", Decimal, ["Current Price", "Price", "Last Price"];
    PeTtm => "pe_ttm", "peTtm", Decimal, ["PE TTM Price to Earnings", "PE TTM", "PE Ratio"];

    // Profitability
    Roe => "roe", "roe", Decimal, ["ROE Ann  %", "ROE Annual %", "ROE"];
    Roe1yAgo => "roe_1y_ago", "roe1YAgo", Decimal, ["ROE Ann  1Yr Ago %", "ROE Annual 1Yr Ago %"];
    Roe2yAgo => "roe_2y_ago", "roe2YAgo", Decimal, ["ROE Ann  2Yr Ago %", "ROE Annual 2Yr Ago %"];
    Roe3yAgo => "roe_3y_ago", "roe3YAgo", Decimal, ["ROE Ann  3Yr Ago %", "ROE Annual 3Yr Ago %"];
    Roce => "roce", "roce", Decimal, ["ROCE Ann  %", "ROCE Annual %", "ROCE"];
    Roce3yAvg => "roce_3y_avg", "roce3YAvg", Decimal, ["ROCE Ann  3Yr Avg %", "ROCE Annual 3Yr Avg %"];
    Roce5yAvg => "roce_5y_avg", "roce5YAvg", Decimal, ["ROCE Ann  5Yr Avg %", "ROCE Annual 5Yr Avg %"];
    Roa => "roa_ann", "roaAnn", Decimal, ["RoA Ann  %", "RoA Annual %", "ROA"];

    // Leverage and liquidity
    DebtToEquity => "debt_to_equity", "debtToEquity", Decimal, ["Total Debt to Total Equity Ann ", "Debt to Equity"];
    InterestCoverage => "interest_coverage", "interestCoverage", Decimal, ["Interest Coverage Ratio Ann ", "Interest Coverage Ratio"];
    CurrentRatio => "current_ratio", "currentRatio", Decimal, ["Current Ratio Ann ", "Current Ratio"];
    CurrentRatioTtm => "current_ratio_ttm", "currentRatioTtm", Decimal, ["Current Ratio TTM"];

    // Ownership
    PromoterHolding => "promoter_holding", "promoterHolding", Decimal, ["Promoter holding latest %", "Promoter Holding"];
    PromoterHoldingChangeQoq => "promoter_holding_change_qoq", "promoterHoldingChangeQoq", Decimal, ["Promoter holding change QoQ %"];
    PromoterHoldingChange1y => "promoter_holding_change_1y", "promoterHoldingChange1Y", Decimal, ["Promoter holding change 4Qtr %", "Promoter holding change 1Yr %"];
    PromoterPledgePercentage => "promoter_pledge_percentage", "promoterPledgePercentage", Decimal, ["Promoter holding pledge percentage % Qtr"];

    // Earnings
    EpsTtmGrowth => "eps_ttm_growth", "epsTtmGrowth", Decimal, ["EPS TTM Growth %"];
    EpsQtrYoyGrowth => "eps_qtr_yoy_growth", "epsQtrYoYGrowth", Decimal, ["EPS Qtr YoY Growth %"];
    BasicEpsQoqGrowth => "basic_eps_qoq_growth", "basicEpsQoqGrowth", Decimal, ["Basic EPS QoQ Growth %"];
    BasicEpsTtm => "basic_eps_ttm", "basicEpsTtm", Decimal, ["Basic EPS TTM"];
    BasicEpsQtr => "basic_eps_qtr", "basicEpsQtr", Decimal, ["Basic EPS Qtr"];
    BasicEps1qAgo => "basic_eps_1q_ago", "basicEps1QAgo", Decimal, ["Basic EPS 1Qtr ago", "Basic EPS 1Q Ago"];
    BasicEps2qAgo => "basic_eps_2q_ago", "basicEps2QAgo", Decimal, ["Basic EPS 2Qtr ago", "Basic EPS 2Q Ago"];

    // Revenue and profit growth
    RevenueGrowthTtm => "operating_rev_growth_ttm", "operatingRevGrowthTtm", Decimal, ["Operating Revenue growth TTM %", "Revenue Growth TTM %"];
    RevenueGrowthAnnualYoy => "revenue_growth_annual_yoy", "revenueGrowthAnnualYoY", Decimal, ["Revenue Growth Annual YoY %"];
    RevenueGrowthQtrYoy => "revenue_growth_qtr_yoy", "revenueGrowthQtrYoY", Decimal, ["Revenue Growth Qtr YoY %"];
    NetProfitAnn => "net_profit_ann", "netProfitAnn", Decimal, ["Net Profit Ann ", "Net Profit Annual"];
    NetProfitAnn1yAgo => "net_profit_ann_1y_ago", "netProfitAnn1YAgo", Decimal, ["Net Profit Ann  1Yr ago", "Net Profit Annual 1Yr Ago"];
    NetProfitQtr => "net_profit_qtr", "netProfitQtr", Decimal, ["Net Profit Qtr"];
    NetProfit1qAgo => "net_profit_1q_ago", "netProfit1QAgo", Decimal, ["Net Profit 1Qtr ago", "Net Profit Qtr 1Qtr ago"];
    NetProfit2qAgo => "net_profit_2q_ago", "netProfit2QAgo", Decimal, ["Net Profit 2Qtr ago", "Net Profit Qtr 2Qtr ago"];
    NetProfit3yGrowth => "net_profit_3y_growth", "netProfit3YGrowth", Decimal, ["Net Profit 3Y Growth %", "Net Profit 3Yr Growth %"];
    NetProfit5yGrowth => "net_profit_5y_growth", "netProfit5YGrowth", Decimal, ["Net Profit 5Y Growth %", "Net Profit 5Yr Growth %"];
    NetProfitQoqGrowth => "net_profit_qoq_growth", "netProfitQoqGrowth", Decimal, ["Net Profit QoQ Growth %"];

    // Margins
    OpmAnn => "opm_ann", "opmAnn", Decimal, ["OPM Ann  %", "Operating Profit Margin Annual %"];
    OpmAnn1yAgo => "opm_ann_1y_ago", "opmAnn1YAgo", Decimal, ["OPM Ann  1Yr ago %", "Operating Profit Margin Annual 1Yr ago %"];
    OpmTtm => "opm_ttm", "opmTtm", Decimal, ["OPM TTM %"];
    OpmQtr => "opm_qtr", "opmQtr", Decimal, ["OPM Qtr %", "Operating Profit Margin Qtr %"];
    Opm1qAgo => "opm_1q_ago", "opm1QAgo", Decimal, ["OPM 1Qtr ago %", "Operating Profit Margin Qtr 1Qtr ago %"];
    NpmTtm => "npm_ttm", "npmTtm", Decimal, ["NPM TTM %"];
    EbitdaAnn => "ebitda_ann", "ebitdaAnn", Decimal, ["EBITDA Ann "];
    EbitdaTtm => "ebitda_ttm", "ebitdaTtm", Decimal, ["EBITDA TTM"];
    EbitdaAnnMargin => "ebitda_ann_margin", "ebitdaAnnMargin", Decimal, ["EBITDA Ann  Margin %"];
    EbitdaQtrYoyGrowth => "ebitda_qtr_yoy_growth", "ebitdaQtrYoYGrowth", Decimal, ["EBITDA Qtr YoY Growth %"];

    // Valuation
    PegTtm => "peg_ttm", "pegTtm", Decimal, ["PEG TTM", "PEG TTM PE to Growth"];
    PriceToBook => "price_to_book", "priceToBook", Decimal, ["PBV TTM", "Price to Book Value"];
    PriceToBookAdjusted => "price_to_book_adjusted", "priceToBookAdjusted", Decimal, ["PBV Adjusted", "Price to Book Value Adjusted"];
    EvPerEbitdaAnn => "ev_per_ebitda_ann", "evPerEbitdaAnn", Decimal, ["EV Per EBITDA Ann "];
    PriceToSalesAnn => "price_to_sales_ann", "priceToSalesAnn", Decimal, ["Price To Sales Ann "];
    PriceToSalesTtm => "price_to_sales_ttm", "priceToSalesTtm", Decimal, ["Price to Sales TTM"];
    PriceToCashflow => "price_to_cashflow", "priceToCashflow", Decimal, ["Price to Cash Flow TTM", "Price to Cashflow"];

    // Source-supplied composite indices
    DurabilityScore => "durability_score", "durabilityScore", Integer, ["Durability Score", "Durability", "DurabilityScore", "Trendlyne Durability Score"];
    ValuationScore => "valuation_score", "valuationScore", Integer, ["Valuation Score", "Valuation", "ValuationScore", "Trendlyne Valuation Score"];
    MomentumScore => "momentum_score", "momentumScore", Integer, ["Momentum Score", "Trendlyne Momentum Score"];
    IndustryScore => "industry_score", "industryScore", Integer, ["Industry Score"];
    SectorScore => "sector_score", "sectorScore", Integer, ["Sector Score"];
    PiotroskiScore => "piotroski_score", "piotroskiScore", Integer, ["Piotroski Score"];
    AltmanZscore => "altman_zscore", "altmanZscore", Decimal, ["Altman Zscore", "Altman Z Score"];

    // Cash flow
    CashFlowReturnOnAssets => "cash_flow_return_on_assets", "cashFlowReturnOnAssets", Decimal, ["Cash Flow Return on Assets Ann  %", "CFROA Ann  %"];
    CashFlowReturnOnAssets1yAgo => "cash_flow_return_on_assets_1y_ago", "cashFlowReturnOnAssets1YAgo", Decimal, ["Cash Flow Return on Assets Ann  1Yr ago %", "CFROA Ann  1Yr ago %"];
    CashFromOperatingAnnual => "cash_from_operating_annual", "cashFromOperatingAnnual", Decimal, ["Cash from Operating Activity Annual"];
    NetCashFlowAnnual => "net_cash_flow_annual", "netCashFlowAnnual", Decimal, ["Net Cash Flow Annual"];

    // Sector and industry comparisons
    SectorRoce => "sector_roce", "sectorRoce", Decimal, ["Sector ROCE"];
    IndustryRoce => "industry_roce", "industryRoce", Decimal, ["Industry ROCE"];
    SectorRoe => "sector_roe", "sectorRoe", Decimal, ["Sector ROE", "Sector Return on Equity ROE"];
    IndustryRoe => "industry_roe", "industryRoe", Decimal, ["Industry ROE", "Industry Return on Equity ROE"];
    SectorPegTtm => "sector_peg_ttm", "sectorPegTtm", Decimal, ["Sector PEG TTM"];
    IndustryPegTtm => "industry_peg_ttm", "industryPegTtm", Decimal, ["Industry PEG TTM"];
    SectorPbvTtm => "sector_pbv_ttm", "sectorPbvTtm", Decimal, ["Sector PBV TTM", "Sector Price to Book TTM"];
    IndustryPbvTtm => "industry_pbv_ttm", "industryPbvTtm", Decimal, ["Industry PBV TTM", "Industry Price to Book TTM"];
    SectorNetProfitGrowthQtrQoq => "sector_net_profit_growth_qtr_qoq", "sectorNetProfitGrowthQtrQoq", Decimal, ["Sector Net Profit Growth Qtr QoQ %"];
    SectorNetProfitGrowthAnnYoy => "sector_net_profit_growth_ann_yoy", "sectorNetProfitGrowthAnnYoy", Decimal, ["Sector Net Profit Growth Ann  YoY %"];
    IndustryNetProfitGrowthQtrQoq => "industry_net_profit_growth_qtr_qoq", "industryNetProfitGrowthQtrQoq", Decimal, ["Industry Net Profit Growth Qtr QoQ %"];
    IndustryNetProfitGrowthAnnYoy => "industry_net_profit_growth_ann_yoy", "industryNetProfitGrowthAnnYoy", Decimal, ["Industry Net Profit Growth Ann  YoY %"];

    // SWOT tag counts
    SwotStrengths => "swot_strengths", "swotStrengths", Integer, ["SWOT Strengths"];
    SwotWeakness => "swot_weakness", "swotWeakness", Integer, ["SWOT Weakness"];
    SwotOpportunities => "swot_opportunities", "swotOpportunities", Integer, ["SWOT Opportunities"];
    SwotThreats => "swot_threats", "swotThreats", Integer, ["SWOT Threats"];

    // Forecaster estimates
    FcEst1qForwardEbitQtr => "fc_est_1q_forward_ebit_qtr", "fcEst1QForwardEbitQtr", Decimal, ["FC Est  1Q forward EBIT Qtr"];
    FcEst1qFwdCashEpsQtr => "fc_est_1q_fwd_cash_eps_qtr", "fcEst1QFwdCashEpsQtr", Decimal, ["FC Est  1Q fwd Cash EPS Qtr"];
    FcEst1qFwdInterestExpenseQtr => "fc_est_1q_fwd_interest_expense_qtr", "fcEst1QFwdInterestExpenseQtr", Decimal, ["FC Est  1Q fwd Interest Expense Qtr"];
}

/// Identity and descriptive text columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    StockName,
    NseCode,
    BseCode,
    Isin,
    Sector,
    Industry,
}

impl TextField {
    pub const ALL: &'static [TextField] = &[
        TextField::StockName,
        TextField::NseCode,
        TextField::BseCode,
        TextField::Isin,
        TextField::Sector,
        TextField::Industry,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TextField::StockName => "stock_name",
            TextField::NseCode => "nse_code",
            TextField::BseCode => "bse_code",
            TextField::Isin => "isin",
            TextField::Sector => "sector",
            TextField::Industry => "industry",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            TextField::StockName => &["Stock", "Stock Name", "Name", "Company Name"],
            TextField::NseCode => &["NSE Code", "Symbol", "Stock Code"],
            TextField::BseCode => &["BSE Code"],
            TextField::Isin => &["ISIN", "ISIN Code"],
            TextField::Sector => &["Sector", "sector_name", "Sector Name"],
            TextField::Industry => &["Industry", "Industry Name"],
        }
    }
}

/// Any canonical key the normalizer can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Text(TextField),
    Metric(Metric),
}

static FIELDS_BY_KEY: Lazy<HashMap<&'static str, Field>> = Lazy::new(|| {
    let mut fields = HashMap::new();
    for text in TextField::ALL {
        fields.insert(text.key(), Field::Text(*text));
    }
    for metric in Metric::ALL {
        fields.insert(metric.key(), Field::Metric(*metric));
    }
    fields
});

impl Field {
    pub fn from_key(key: &str) -> Option<Field> {
        FIELDS_BY_KEY.get(key).copied()
    }

    pub fn key(self) -> &'static str {
        match self {
            Field::Text(text) => text.key(),
            Field::Metric(metric) => metric.key(),
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Field::Text(text) => text.columns(),
            Field::Metric(metric) => metric.columns(),
        }
    }

    pub fn all() -> impl Iterator<Item = Field> {
        TextField::ALL
            .iter()
            .map(|t| Field::Text(*t))
            .chain(Metric::ALL.iter().map(|m| Field::Metric(*m)))
    }
}

/// One optional value per catalog metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSet {
    values: [Option<f64>; Metric::COUNT],
}

impl Default for MetricSet {
    fn default() -> Self {
        Self {
            values: [None; Metric::COUNT],
        }
    }
}

impl MetricSet {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric as usize]
    }

    /// Value with the zero default used by score and gate arithmetic
    pub fn or_zero(&self, metric: Metric) -> f64 {
        self.get(metric).unwrap_or(0.0)
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.values[metric as usize] = value;
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }

    pub fn is_present(&self, metric: Metric) -> bool {
        self.get(metric).is_some()
    }

    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Fill every absent metric from `other`, returning how many were filled.
    pub fn fill_missing_from(&mut self, other: &MetricSet) -> usize {
        let mut filled = 0;
        for (mine, theirs) in self.values.iter_mut().zip(other.values.iter()) {
            if mine.is_none() && theirs.is_some() {
                *mine = *theirs;
                filled += 1;
            }
        }
        filled
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL
            .iter()
            .filter_map(move |m| self.get(*m).map(|v| (*m, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_and_wire_names_are_unique() {
        let keys: HashSet<&str> = Field::all().map(|f| f.key()).collect();
        assert_eq!(keys.len(), TextField::ALL.len() + Metric::COUNT);

        let wire: HashSet<&str> = Metric::ALL.iter().map(|m| m.wire_name()).collect();
        assert_eq!(wire.len(), Metric::COUNT);
    }

    #[test]
    fn discriminants_index_the_value_array() {
        for (index, metric) in Metric::ALL.iter().enumerate() {
            assert_eq!(*metric as usize, index);
        }
    }

    #[test]
    fn from_key_round_trips_every_field() {
        for field in Field::all() {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
        assert_eq!(Field::from_key("not_a_field"), None);
    }

    #[test]
    fn fill_missing_keeps_existing_values() {
        let mut first = MetricSet::default().with(Metric::Roe, 18.0);
        let second = MetricSet::default()
            .with(Metric::Roe, 2.0)
            .with(Metric::DurabilityScore, 65.0);

        let filled = first.fill_missing_from(&second);

        assert_eq!(filled, 1);
        assert_eq!(first.get(Metric::Roe), Some(18.0));
        assert_eq!(first.get(Metric::DurabilityScore), Some(65.0));
    }
}
