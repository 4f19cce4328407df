use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::catalog::{Metric, MetricKind, MetricSet};
use super::labels::{Tier, TrendLabels};
use crate::constants::{ISIN_KEY_PREFIX, NSE_KEY_PREFIX};

/// Deduplication key: `ISIN:<isin>` when an ISIN exists, else `NSE:<code>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn isin(isin: &str) -> Self {
        IdentityKey(format!("{}:{}", ISIN_KEY_PREFIX, isin.trim().to_uppercase()))
    }

    pub fn nse(code: &str) -> Self {
        IdentityKey(format!("{}:{}", NSE_KEY_PREFIX, code.trim().to_uppercase()))
    }

    /// Parse an explicit `ISIN:` / `NSE:` key, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let (prefix, rest) = value.trim().split_once(':')?;
        if rest.trim().is_empty() {
            return None;
        }
        if prefix.eq_ignore_ascii_case(ISIN_KEY_PREFIX) {
            Some(IdentityKey::isin(rest))
        } else if prefix.eq_ignore_ascii_case(NSE_KEY_PREFIX) {
            Some(IdentityKey::nse(rest))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    isin: Option<String>,
    nse_code: Option<String>,
    bse_code: Option<String>,
}

fn clean_code(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Identity {
    pub fn new(isin: Option<String>, nse_code: Option<String>, bse_code: Option<String>) -> Self {
        Self {
            isin: clean_code(isin),
            nse_code: clean_code(nse_code),
            bse_code: clean_code(bse_code),
        }
    }

    pub fn isin(&self) -> Option<&str> {
        self.isin.as_deref()
    }

    pub fn nse_code(&self) -> Option<&str> {
        self.nse_code.as_deref()
    }

    pub fn bse_code(&self) -> Option<&str> {
        self.bse_code.as_deref()
    }

    pub fn key(&self) -> Option<IdentityKey> {
        match (&self.isin, &self.nse_code) {
            (Some(isin), _) => Some(IdentityKey::isin(isin)),
            (None, Some(code)) => Some(IdentityKey::nse(code)),
            (None, None) => None,
        }
    }

    /// A new identity holding these codes, completed from `other` only where
    /// the completion cannot change the key.
    pub fn completed_from(&self, other: &Identity) -> Identity {
        let nse_code = match (&self.isin, &self.nse_code) {
            (Some(_), None) => other.nse_code.clone(),
            _ => self.nse_code.clone(),
        };
        Identity {
            isin: self.isin.clone(),
            nse_code,
            bse_code: self.bse_code.clone().or_else(|| other.bse_code.clone()),
        }
    }
}

/// Computed by the scoring engine. Only meaningful after a scoring pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedFields {
    pub quality_score: f64,
    pub tier: Tier,
    pub labels: TrendLabels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalInstrument {
    identity: Identity,
    key: IdentityKey,
    pub name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub metrics: MetricSet,
    /// Unmodeled columns kept for display only
    pub extras: BTreeMap<String, String>,
    pub source_files: Vec<String>,
    pub derived: DerivedFields,
}

impl CanonicalInstrument {
    /// Returns `None` when the identity has neither ISIN nor NSE code.
    pub fn new(identity: Identity, name: impl Into<String>) -> Option<Self> {
        let key = identity.key()?;
        Some(Self {
            identity,
            key,
            name: name.into(),
            sector: None,
            industry: None,
            metrics: MetricSet::default(),
            extras: BTreeMap::new(),
            source_files: Vec::new(),
            derived: DerivedFields::default(),
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(metric)
    }

    pub fn or_zero(&self, metric: Metric) -> f64 {
        self.metrics.or_zero(metric)
    }

    pub fn with_metric(mut self, metric: Metric, value: f64) -> Self {
        self.metrics.set(metric, Some(value));
        self
    }

    pub fn has_both_index_scores(&self) -> bool {
        self.metrics.is_present(Metric::DurabilityScore) && self.metrics.is_present(Metric::ValuationScore)
    }

    /// A new record built from this one and completed with anything `other`
    /// has and this one lacks. Identity codes are folded in while the new
    /// record is built; the key is this record's key.
    pub fn merged_with(self, other: &CanonicalInstrument) -> CanonicalInstrument {
        let identity = self.identity.completed_from(&other.identity);
        let mut merged = CanonicalInstrument { identity, ..self };
        merged.fill_from(other);
        merged
    }

    fn fill_from(&mut self, other: &CanonicalInstrument) {
        self.metrics.fill_missing_from(&other.metrics);
        if self.name.trim().is_empty() {
            self.name = other.name.clone();
        }
        if self.sector.is_none() {
            self.sector = other.sector.clone();
        }
        if self.industry.is_none() {
            self.industry = other.industry.clone();
        }
        for (column, value) in &other.extras {
            self.extras.entry(column.clone()).or_insert_with(|| value.clone());
        }
        for file in &other.source_files {
            if !self.source_files.contains(file) {
                self.source_files.push(file.clone());
            }
        }
    }

    /// Wrapper that also serializes the extension map.
    pub fn detail(&self) -> InstrumentDetail<'_> {
        InstrumentDetail(self)
    }

    fn write_fields<M: SerializeMap>(&self, map: &mut M, include_extras: bool) -> Result<(), M::Error> {
        map.serialize_entry("identityKey", &self.key)?;
        map.serialize_entry("stockName", &self.name)?;
        if let Some(code) = self.identity.nse_code() {
            map.serialize_entry("nseCode", code)?;
        }
        if let Some(code) = self.identity.bse_code() {
            map.serialize_entry("bseCode", code)?;
        }
        if let Some(isin) = self.identity.isin() {
            map.serialize_entry("isin", isin)?;
        }
        if let Some(sector) = &self.sector {
            map.serialize_entry("sector", sector)?;
        }
        if let Some(industry) = &self.industry {
            map.serialize_entry("industry", industry)?;
        }

        for (metric, value) in self.metrics.iter() {
            match metric.kind() {
                MetricKind::Integer => map.serialize_entry(metric.wire_name(), &(value as i64))?,
                MetricKind::Decimal => map.serialize_entry(metric.wire_name(), &value)?,
            }
        }

        let derived = &self.derived;
        let labels = &derived.labels;
        map.serialize_entry("qualityScore", &derived.quality_score)?;
        map.serialize_entry("qualityTier", &derived.tier)?;
        map.serialize_entry("consecutivePositiveQuarters", &labels.consecutive_positive_quarters)?;
        map.serialize_entry("profitGrowthConsistency", &labels.profit_growth_consistency)?;
        map.serialize_entry("marginStability", &labels.margin_stability)?;
        map.serialize_entry("promoterTrend", &labels.promoter_trend)?;
        if let Some(quality) = &labels.cash_flow_quality {
            map.serialize_entry("cashFlowQuality", quality)?;
        }
        map.serialize_entry("roeTrend", &labels.roe_trend)?;
        map.serialize_entry("roceConsistency", &labels.roce_consistency)?;
        map.serialize_entry("sourceFiles", &self.source_files)?;

        if include_extras && !self.extras.is_empty() {
            map.serialize_entry("extras", &self.extras)?;
        }
        Ok(())
    }
}

impl Serialize for CanonicalInstrument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.write_fields(&mut map, false)?;
        map.end()
    }
}

pub struct InstrumentDetail<'a>(&'a CanonicalInstrument);

impl Serialize for InstrumentDetail<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.0.write_fields(&mut map, true)?;
        map.end()
    }
}
