//! Qualitative trend labels. Each is a pure function of the metric set,
//! reading missing values as zero unless noted.

use crate::domain::{
    CashFlowQuality, MarginStability, Metric, MetricSet, OwnershipTrend, ProfitGrowthConsistency, RoceConsistency,
    RoeTrend, TrendLabels,
};

pub fn derive_labels(metrics: &MetricSet) -> TrendLabels {
    TrendLabels {
        consecutive_positive_quarters: consecutive_positive_quarters(metrics),
        profit_growth_consistency: profit_growth_consistency(metrics),
        margin_stability: margin_stability(metrics),
        promoter_trend: promoter_trend(metrics),
        cash_flow_quality: cash_flow_quality(metrics),
        roe_trend: roe_trend(metrics),
        roce_consistency: roce_consistency(metrics),
    }
}

/// Quarters of rising EPS counted back from the latest, stopping at the first miss.
pub fn consecutive_positive_quarters(metrics: &MetricSet) -> u32 {
    let pairs = [
        (Metric::BasicEpsQtr, Metric::BasicEps1qAgo),
        (Metric::BasicEps1qAgo, Metric::BasicEps2qAgo),
    ];

    let mut count = 0;
    for (later, earlier) in pairs {
        let later = metrics.or_zero(later);
        let earlier = metrics.or_zero(earlier);
        if later > 0.0 && (later > earlier || earlier <= 0.0) {
            count += 1;
        } else {
            break;
        }
    }
    count
}

pub fn profit_growth_consistency(metrics: &MetricSet) -> ProfitGrowthConsistency {
    let annual = metrics.or_zero(Metric::NetProfitAnn);
    let year_ago = metrics.or_zero(Metric::NetProfitAnn1yAgo);
    if annual <= 0.0 || year_ago <= 0.0 {
        return ProfitGrowthConsistency::Negative;
    }

    let growth = (annual - year_ago) / year_ago.abs() * 100.0;
    let positive_quarters = [Metric::NetProfitQtr, Metric::NetProfit1qAgo, Metric::NetProfit2qAgo]
        .into_iter()
        .filter(|m| metrics.or_zero(*m) > 0.0)
        .count();

    if growth > 15.0 && positive_quarters >= 2 {
        ProfitGrowthConsistency::VeryConsistent
    } else if growth > 10.0 && positive_quarters >= 2 {
        ProfitGrowthConsistency::Consistent
    } else if growth > 0.0 {
        ProfitGrowthConsistency::Moderate
    } else {
        ProfitGrowthConsistency::Inconsistent
    }
}

pub fn margin_stability(metrics: &MetricSet) -> MarginStability {
    let annual = metrics.or_zero(Metric::OpmAnn);
    let year_ago = metrics.or_zero(Metric::OpmAnn1yAgo);
    if annual <= 0.0 {
        return MarginStability::Negative;
    }

    if annual > year_ago {
        return if metrics.or_zero(Metric::OpmQtr) > metrics.or_zero(Metric::Opm1qAgo) {
            MarginStability::Expanding
        } else {
            MarginStability::ExpandingVolatile
        };
    }

    let change = (annual - year_ago).abs() / year_ago.max(1.0);
    if change < 0.05 {
        MarginStability::Stable
    } else if change < 0.15 {
        MarginStability::ModeratelyStable
    } else {
        MarginStability::Volatile
    }
}

pub fn promoter_trend(metrics: &MetricSet) -> OwnershipTrend {
    let yearly = metrics.or_zero(Metric::PromoterHoldingChange1y);
    if yearly > 1.0 {
        if metrics.or_zero(Metric::PromoterHoldingChangeQoq) > 0.0 {
            OwnershipTrend::RisingStrong
        } else {
            OwnershipTrend::Rising
        }
    } else if yearly > 0.0 {
        OwnershipTrend::RisingModerate
    } else if yearly.abs() < 1.0 {
        OwnershipTrend::Stable
    } else {
        OwnershipTrend::Declining
    }
}

/// `None` when cash-flow return on assets was not sourced.
pub fn cash_flow_quality(metrics: &MetricSet) -> Option<CashFlowQuality> {
    let current = metrics.get(Metric::CashFlowReturnOnAssets)?;
    let prior = metrics.or_zero(Metric::CashFlowReturnOnAssets1yAgo);

    let quality = if current > 0.0 && prior > 0.0 {
        if current > prior {
            CashFlowQuality::Improving
        } else if (current - prior).abs() < 2.0 {
            CashFlowQuality::Stable
        } else {
            CashFlowQuality::Declining
        }
    } else if current > 0.0 {
        CashFlowQuality::Positive
    } else {
        CashFlowQuality::Negative
    };
    Some(quality)
}

pub fn roe_trend(metrics: &MetricSet) -> RoeTrend {
    let roe = metrics.or_zero(Metric::Roe);
    let one = metrics.or_zero(Metric::Roe1yAgo);
    let two = metrics.or_zero(Metric::Roe2yAgo);
    let three = metrics.or_zero(Metric::Roe3yAgo);

    if roe > one && one > two && two > three {
        RoeTrend::ConsistentlyRising
    } else if roe > one {
        RoeTrend::Rising
    } else if (roe - one).abs() < 2.0 {
        RoeTrend::Stable
    } else {
        RoeTrend::Declining
    }
}

pub fn roce_consistency(metrics: &MetricSet) -> RoceConsistency {
    let roce = metrics.or_zero(Metric::Roce);
    let avg_3y = metrics.or_zero(Metric::Roce3yAvg);
    let avg_5y = metrics.or_zero(Metric::Roce5yAvg);
    if avg_3y <= 0.0 || avg_5y <= 0.0 {
        return RoceConsistency::InsufficientData;
    }

    let diff_3y = (roce - avg_3y).abs();
    let diff_5y = (roce - avg_5y).abs();
    if diff_3y < 3.0 && diff_5y < 5.0 {
        RoceConsistency::VeryConsistent
    } else if diff_3y < 5.0 {
        RoceConsistency::Consistent
    } else if roce > avg_3y {
        RoceConsistency::Improving
    } else {
        RoceConsistency::Volatile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[(Metric, f64)]) -> MetricSet {
        values
            .iter()
            .fold(MetricSet::default(), |acc, (metric, value)| acc.with(*metric, *value))
    }

    #[test]
    fn streak_stops_at_first_miss() {
        let rising = set(&[
            (Metric::BasicEpsQtr, 5.0),
            (Metric::BasicEps1qAgo, 4.0),
            (Metric::BasicEps2qAgo, 3.0),
        ]);
        assert_eq!(consecutive_positive_quarters(&rising), 2);

        let turnaround = set(&[(Metric::BasicEpsQtr, 1.0), (Metric::BasicEps1qAgo, -2.0)]);
        assert_eq!(consecutive_positive_quarters(&turnaround), 1);

        let falling = set(&[(Metric::BasicEpsQtr, 3.0), (Metric::BasicEps1qAgo, 4.0), (Metric::BasicEps2qAgo, 1.0)]);
        assert_eq!(consecutive_positive_quarters(&falling), 0);
    }

    #[test]
    fn profit_consistency_bands() {
        let strong = set(&[
            (Metric::NetProfitAnn, 120.0),
            (Metric::NetProfitAnn1yAgo, 100.0),
            (Metric::NetProfitQtr, 30.0),
            (Metric::NetProfit1qAgo, 28.0),
        ]);
        assert_eq!(profit_growth_consistency(&strong), ProfitGrowthConsistency::VeryConsistent);

        let modest = set(&[(Metric::NetProfitAnn, 105.0), (Metric::NetProfitAnn1yAgo, 100.0)]);
        assert_eq!(profit_growth_consistency(&modest), ProfitGrowthConsistency::Moderate);

        let shrinking = set(&[(Metric::NetProfitAnn, 90.0), (Metric::NetProfitAnn1yAgo, 100.0)]);
        assert_eq!(profit_growth_consistency(&shrinking), ProfitGrowthConsistency::Inconsistent);

        assert_eq!(profit_growth_consistency(&MetricSet::default()), ProfitGrowthConsistency::Negative);
    }

    #[test]
    fn margin_bands() {
        let expanding = set(&[
            (Metric::OpmAnn, 20.0),
            (Metric::OpmAnn1yAgo, 18.0),
            (Metric::OpmQtr, 21.0),
            (Metric::Opm1qAgo, 19.0),
        ]);
        assert_eq!(margin_stability(&expanding), MarginStability::Expanding);

        let choppy = set(&[(Metric::OpmAnn, 20.0), (Metric::OpmAnn1yAgo, 18.0)]);
        assert_eq!(margin_stability(&choppy), MarginStability::ExpandingVolatile);

        let flat = set(&[(Metric::OpmAnn, 19.5), (Metric::OpmAnn1yAgo, 20.0)]);
        assert_eq!(margin_stability(&flat), MarginStability::Stable);

        let slipping = set(&[(Metric::OpmAnn, 18.0), (Metric::OpmAnn1yAgo, 20.0)]);
        assert_eq!(margin_stability(&slipping), MarginStability::ModeratelyStable);

        let collapsing = set(&[(Metric::OpmAnn, 10.0), (Metric::OpmAnn1yAgo, 20.0)]);
        assert_eq!(margin_stability(&collapsing), MarginStability::Volatile);
    }

    #[test]
    fn promoter_bands() {
        let strong = set(&[(Metric::PromoterHoldingChange1y, 2.0), (Metric::PromoterHoldingChangeQoq, 0.5)]);
        assert_eq!(promoter_trend(&strong), OwnershipTrend::RisingStrong);
        assert_eq!(promoter_trend(&set(&[(Metric::PromoterHoldingChange1y, 2.0)])), OwnershipTrend::Rising);
        assert_eq!(promoter_trend(&set(&[(Metric::PromoterHoldingChange1y, 0.4)])), OwnershipTrend::RisingModerate);
        assert_eq!(promoter_trend(&MetricSet::default()), OwnershipTrend::Stable);
        assert_eq!(promoter_trend(&set(&[(Metric::PromoterHoldingChange1y, -3.0)])), OwnershipTrend::Declining);
    }

    #[test]
    fn cash_flow_quality_is_absent_without_cfroa() {
        assert_eq!(cash_flow_quality(&MetricSet::default()), None);

        let improving = set(&[(Metric::CashFlowReturnOnAssets, 12.0), (Metric::CashFlowReturnOnAssets1yAgo, 9.0)]);
        assert_eq!(cash_flow_quality(&improving), Some(CashFlowQuality::Improving));

        let steady = set(&[(Metric::CashFlowReturnOnAssets, 9.0), (Metric::CashFlowReturnOnAssets1yAgo, 10.0)]);
        assert_eq!(cash_flow_quality(&steady), Some(CashFlowQuality::Stable));

        let first_year = set(&[(Metric::CashFlowReturnOnAssets, 4.0)]);
        assert_eq!(cash_flow_quality(&first_year), Some(CashFlowQuality::Positive));

        let burning = set(&[(Metric::CashFlowReturnOnAssets, -1.0)]);
        assert_eq!(cash_flow_quality(&burning), Some(CashFlowQuality::Negative));
    }

    #[test]
    fn roe_and_roce_bands() {
        let climbing = set(&[
            (Metric::Roe, 20.0),
            (Metric::Roe1yAgo, 18.0),
            (Metric::Roe2yAgo, 16.0),
            (Metric::Roe3yAgo, 14.0),
        ]);
        assert_eq!(roe_trend(&climbing), RoeTrend::ConsistentlyRising);
        assert_eq!(roe_trend(&set(&[(Metric::Roe, 15.0), (Metric::Roe1yAgo, 20.0)])), RoeTrend::Declining);

        let steady = set(&[(Metric::Roce, 22.0), (Metric::Roce3yAvg, 21.0), (Metric::Roce5yAvg, 19.0)]);
        assert_eq!(roce_consistency(&steady), RoceConsistency::VeryConsistent);
        let jump = set(&[(Metric::Roce, 30.0), (Metric::Roce3yAvg, 20.0), (Metric::Roce5yAvg, 18.0)]);
        assert_eq!(roce_consistency(&jump), RoceConsistency::Improving);
        assert_eq!(roce_consistency(&set(&[(Metric::Roce, 30.0)])), RoceConsistency::InsufficientData);
    }
}
