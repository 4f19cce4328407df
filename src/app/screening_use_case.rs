use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::ports::IdentityDirectory;
use crate::constants::{
    DEFAULT_MIN_DURABILITY, DEFAULT_MIN_VALUATION, DEFAULT_SEARCH_LIMIT, EXCELLENT_MIN_DURABILITY,
    EXCELLENT_MIN_VALUATION, MAX_SEARCH_LIMIT,
};
use crate::domain::{CanonicalInstrument, IdentityKey, Tier};
use crate::error::{Result, ScreenerError};
use crate::observability::metrics as obs;
use crate::pipeline::processing::screen::{screen, TierFilterCriteria};
use crate::pipeline::processing::stats::{score_statistics, ScoreStatistics};
use crate::pipeline::processing::tiers::dual_index::{filter_by_dual_index_scores, DualIndexBounds};
use crate::pipeline::LoadReport;
use crate::repository::{InstrumentRepository, Snapshot};

/// `{count, tier, stocks}` as returned by every listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TierListing<T = CanonicalInstrument> {
    pub count: usize,
    pub tier: String,
    pub stocks: Vec<T>,
}

impl<T> TierListing<T> {
    fn new(tier: impl Into<String>, stocks: Vec<T>) -> Self {
        Self {
            count: stocks.len(),
            tier: tier.into(),
            stocks,
        }
    }
}

fn owned_listing(tier: impl Into<String>, stocks: Vec<&CanonicalInstrument>) -> TierListing {
    TierListing::new(tier, stocks.into_iter().cloned().collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct AllTiers {
    pub great: TierListing,
    pub aggressive: TierListing,
    pub good: TierListing,
}

/// A screen hit detached from the snapshot it came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenedStock {
    #[serde(flatten)]
    pub instrument: CanonicalInstrument,
    pub screen_score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub status: &'static str,
    pub before: usize,
    pub after: usize,
    pub snapshot_id: Uuid,
    pub report: LoadReport,
}

/// Fixed lower bounds served by the preset dual-index endpoints.
#[derive(Debug, Clone, Copy)]
pub struct DualIndexPreset {
    pub label: &'static str,
    pub min_durability: i64,
    pub min_valuation: i64,
}

pub const DUAL_INDEX_BEST: DualIndexPreset = DualIndexPreset {
    label: "Best Durability & Valuation",
    min_durability: DEFAULT_MIN_DURABILITY,
    min_valuation: DEFAULT_MIN_VALUATION,
};

pub const DUAL_INDEX_EXCELLENT: DualIndexPreset = DualIndexPreset {
    label: "Excellent Durability & Valuation",
    min_durability: EXCELLENT_MIN_DURABILITY,
    min_valuation: EXCELLENT_MIN_VALUATION,
};

fn describe_bounds(bounds: &DualIndexBounds) -> String {
    let parts: Vec<String> = [
        bounds.min_durability.map(|v| format!("Durability>={}", v)),
        bounds.max_durability.map(|v| format!("Durability<={}", v)),
        bounds.min_valuation.map(|v| format!("Valuation>={}", v)),
        bounds.max_valuation.map(|v| format!("Valuation<={}", v)),
    ]
    .into_iter()
    .flatten()
    .collect();
    if parts.is_empty() {
        "Durability & Valuation (Any)".to_string()
    } else {
        format!("Durability & Valuation ({})", parts.join(", "))
    }
}

fn check_index_bound(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !(0.0..=100.0).contains(&v) => Err(ScreenerError::InvalidCriteria(format!(
            "{} must be between 0 and 100, got {}",
            name, v
        ))),
        _ => Ok(()),
    }
}

/// Read and refresh operations behind the HTTP API and the CLI.
pub struct QualityStocksUseCase {
    repository: Arc<InstrumentRepository>,
    directory: Option<Arc<dyn IdentityDirectory>>,
}

impl QualityStocksUseCase {
    pub fn new(repository: Arc<InstrumentRepository>, directory: Option<Arc<dyn IdentityDirectory>>) -> Self {
        Self { repository, directory }
    }

    pub fn repository(&self) -> &InstrumentRepository {
        &self.repository
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.repository.snapshot().await
    }

    /// Members of one classified tier in listing order. Empty is a valid result.
    pub async fn tier(&self, tier: Tier) -> Result<TierListing> {
        if tier == Tier::Unclassified {
            return Err(ScreenerError::InvalidCriteria(
                "only great, aggressive and good tiers are listed".to_string(),
            ));
        }
        let snapshot = self.snapshot().await;
        let gates = self.repository.engine().gates();
        Ok(owned_listing(tier.as_str(), gates.members(&snapshot.instruments, tier)))
    }

    pub async fn all_tiers(&self) -> AllTiers {
        let snapshot = self.snapshot().await;
        let partition = self.repository.engine().gates().partition(&snapshot.instruments);
        AllTiers {
            great: owned_listing(Tier::Great.as_str(), partition.great),
            aggressive: owned_listing(Tier::Aggressive.as_str(), partition.aggressive),
            good: owned_listing(Tier::Good.as_str(), partition.good),
        }
    }

    /// Resolve through the directory when one is configured, then look up locally.
    pub async fn stock(&self, code: &str) -> Result<CanonicalInstrument> {
        let snapshot = self.snapshot().await;
        let found = match &self.directory {
            Some(directory) => match directory.resolve(code).await {
                Ok(Some(entry)) => {
                    obs::directory::lookup("hit");
                    entry
                        .isin
                        .as_deref()
                        .and_then(|isin| snapshot.by_key(&IdentityKey::isin(isin)))
                        .or_else(|| snapshot.find(&entry.nse_code))
                        .or_else(|| snapshot.find(code))
                }
                Ok(None) => {
                    obs::directory::lookup("miss");
                    snapshot.find(code)
                }
                Err(e) => {
                    obs::directory::lookup("unavailable");
                    warn!("{} directory lookup for '{}' failed: {}", directory.name(), code, e);
                    return Err(e);
                }
            },
            None => snapshot.find(code),
        };

        match found {
            Some(instrument) => Ok(instrument.clone()),
            None => {
                debug!("Stock '{}' not found in snapshot {}", code, snapshot.id);
                Err(ScreenerError::NotFound(code.to_string()))
            }
        }
    }

    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<CanonicalInstrument>> {
        if query.trim().is_empty() {
            return Err(ScreenerError::InvalidCriteria("query must not be empty".to_string()));
        }
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
            return Err(ScreenerError::InvalidCriteria(format!(
                "limit must be between 1 and {}, got {}",
                MAX_SEARCH_LIMIT, limit
            )));
        }
        let snapshot = self.snapshot().await;
        Ok(snapshot.search(query, limit).into_iter().cloned().collect())
    }

    /// Dual-index filter. With no bound given, the default preset applies.
    pub async fn dual_index(&self, bounds: DualIndexBounds) -> Result<TierListing> {
        check_index_bound("minDurability", bounds.min_durability)?;
        check_index_bound("maxDurability", bounds.max_durability)?;
        check_index_bound("minValuation", bounds.min_valuation)?;
        check_index_bound("maxValuation", bounds.max_valuation)?;

        let bounds = if bounds.is_unbounded() {
            DualIndexBounds::at_least(DEFAULT_MIN_DURABILITY as f64, DEFAULT_MIN_VALUATION as f64)
        } else {
            bounds
        };
        let snapshot = self.snapshot().await;
        Ok(owned_listing(
            describe_bounds(&bounds),
            filter_by_dual_index_scores(&snapshot.instruments, &bounds),
        ))
    }

    pub async fn dual_index_preset(&self, preset: DualIndexPreset) -> TierListing {
        let bounds = DualIndexBounds::at_least(preset.min_durability as f64, preset.min_valuation as f64);
        let snapshot = self.snapshot().await;
        owned_listing(
            format!(
                "{} (Durability>={}, Valuation>={})",
                preset.label, preset.min_durability, preset.min_valuation
            ),
            filter_by_dual_index_scores(&snapshot.instruments, &bounds),
        )
    }

    pub async fn statistics(&self) -> ScoreStatistics {
        score_statistics(&self.snapshot().await.instruments)
    }

    pub async fn screen(&self, criteria: &TierFilterCriteria) -> Result<TierListing<ScreenedStock>> {
        let snapshot = self.snapshot().await;
        let hits = screen(&snapshot.instruments, criteria)?
            .into_iter()
            .map(|hit| ScreenedStock {
                instrument: hit.instrument.clone(),
                screen_score: hit.screen_score,
            })
            .collect();
        Ok(TierListing::new("Custom Screen", hits))
    }

    pub async fn refresh(&self) -> Result<RefreshSummary> {
        let outcome = self.repository.reload().await?;
        info!("Refresh complete: {} -> {} instruments", outcome.before, outcome.after);
        Ok(RefreshSummary {
            status: "ok",
            before: outcome.before,
            after: outcome.after,
            snapshot_id: outcome.snapshot_id,
            report: outcome.report,
        })
    }
}
