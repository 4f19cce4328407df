use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative label kinds the score table can award points for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    ProfitGrowthConsistency,
    MarginStability,
    PromoterTrend,
    CashFlowQuality,
    RoeTrend,
    RoceConsistency,
}

macro_rules! string_label {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_label!(ProfitGrowthConsistency {
    Negative => "Negative",
    Inconsistent => "Inconsistent",
    Moderate => "Moderate",
    Consistent => "Consistent",
    VeryConsistent => "Very Consistent",
});

string_label!(MarginStability {
    Negative => "Negative",
    Expanding => "Expanding",
    ExpandingVolatile => "Expanding (Volatile)",
    Stable => "Stable",
    ModeratelyStable => "Moderately Stable",
    Volatile => "Volatile",
});

string_label!(OwnershipTrend {
    RisingStrong => "Rising (Strong)",
    Rising => "Rising",
    RisingModerate => "Rising (Moderate)",
    Stable => "Stable",
    Declining => "Declining",
});

string_label!(CashFlowQuality {
    Improving => "Improving",
    Stable => "Stable",
    Declining => "Declining",
    Positive => "Positive",
    Negative => "Negative",
});

string_label!(RoeTrend {
    ConsistentlyRising => "Consistently Rising",
    Rising => "Rising",
    Stable => "Stable",
    Declining => "Declining",
});

string_label!(RoceConsistency {
    VeryConsistent => "Very Consistent",
    Consistent => "Consistent",
    Improving => "Improving",
    Volatile => "Volatile",
    InsufficientData => "Insufficient Data",
});

string_label!(Tier {
    Great => "Great",
    Aggressive => "Aggressive",
    Good => "Good",
    Unclassified => "Unclassified",
});

impl Default for Tier {
    fn default() -> Self {
        Tier::Unclassified
    }
}

impl Tier {
    /// Classified tiers in priority order
    pub const RANKED: [Tier; 3] = [Tier::Great, Tier::Aggressive, Tier::Good];

    pub fn parse(value: &str) -> Option<Tier> {
        match value.trim().to_ascii_lowercase().as_str() {
            "great" => Some(Tier::Great),
            "aggressive" | "medium" => Some(Tier::Aggressive),
            "good" => Some(Tier::Good),
            "unclassified" => Some(Tier::Unclassified),
            _ => None,
        }
    }
}

/// Labels computed once per scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendLabels {
    pub consecutive_positive_quarters: u32,
    pub profit_growth_consistency: ProfitGrowthConsistency,
    pub margin_stability: MarginStability,
    pub promoter_trend: OwnershipTrend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_flow_quality: Option<CashFlowQuality>,
    pub roe_trend: RoeTrend,
    pub roce_consistency: RoceConsistency,
}

impl Default for TrendLabels {
    fn default() -> Self {
        Self {
            consecutive_positive_quarters: 0,
            profit_growth_consistency: ProfitGrowthConsistency::Negative,
            margin_stability: MarginStability::Negative,
            promoter_trend: OwnershipTrend::Stable,
            cash_flow_quality: None,
            roe_trend: RoeTrend::Stable,
            roce_consistency: RoceConsistency::InsufficientData,
        }
    }
}

impl TrendLabels {
    /// Text of the label of the given kind, if one was assigned
    pub fn text(&self, kind: LabelKind) -> Option<&'static str> {
        match kind {
            LabelKind::ProfitGrowthConsistency => Some(self.profit_growth_consistency.as_str()),
            LabelKind::MarginStability => Some(self.margin_stability.as_str()),
            LabelKind::PromoterTrend => Some(self.promoter_trend.as_str()),
            LabelKind::CashFlowQuality => self.cash_flow_quality.map(|q| q.as_str()),
            LabelKind::RoeTrend => Some(self.roe_trend.as_str()),
            LabelKind::RoceConsistency => Some(self.roce_consistency.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_serialize_as_display_text() {
        let json = serde_json::to_string(&MarginStability::ExpandingVolatile).unwrap();
        assert_eq!(json, "\"Expanding (Volatile)\"");
        assert_eq!(RoceConsistency::InsufficientData.to_string(), "Insufficient Data");
    }

    #[test]
    fn tier_parse_accepts_medium_alias() {
        assert_eq!(Tier::parse("Medium"), Some(Tier::Aggressive));
        assert_eq!(Tier::parse(" great "), Some(Tier::Great));
        assert_eq!(Tier::parse("excellent"), None);
    }

    #[test]
    fn missing_cash_flow_quality_has_no_text() {
        let labels = TrendLabels::default();
        assert_eq!(labels.text(LabelKind::CashFlowQuality), None);
        assert_eq!(labels.text(LabelKind::RoeTrend), Some("Stable"));
    }
}
