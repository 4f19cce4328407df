use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::domain::{CanonicalInstrument, IdentityKey};
use crate::error::{Result, ScreenerError};
use crate::observability::metrics as obs;
use crate::pipeline::processing::scoring::ScoringEngine;
use crate::pipeline::{load_instruments, LoadOptions, LoadReport, LoadedSet};

/// An immutable, fully scored instrument set.
#[derive(Debug)]
pub struct Snapshot {
    pub id: Uuid,
    pub instruments: Vec<CanonicalInstrument>,
    /// `None` until the first successful load
    pub report: Option<LoadReport>,
    by_key: HashMap<IdentityKey, usize>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::from_instruments(Vec::new(), None)
    }

    pub fn from_instruments(instruments: Vec<CanonicalInstrument>, report: Option<LoadReport>) -> Self {
        let by_key = instruments
            .iter()
            .enumerate()
            .map(|(index, instrument)| (instrument.key().clone(), index))
            .collect();
        Self {
            id: Uuid::new_v4(),
            instruments,
            report,
            by_key,
        }
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.report.as_ref().map(|report| report.loaded_at)
    }

    pub fn by_key(&self, key: &IdentityKey) -> Option<&CanonicalInstrument> {
        self.by_key.get(key).map(|index| &self.instruments[*index])
    }

    /// Look up by explicit identity key, then NSE code, ISIN and BSE code,
    /// all case-insensitive.
    pub fn find(&self, code: &str) -> Option<&CanonicalInstrument> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        if let Some(found) = IdentityKey::parse(code).and_then(|key| self.by_key(&key)) {
            return Some(found);
        }
        let matches = |value: Option<&str>| value.map_or(false, |v| v.eq_ignore_ascii_case(code));
        self.instruments
            .iter()
            .find(|i| matches(i.identity().nse_code()))
            .or_else(|| self.by_key(&IdentityKey::isin(code)))
            .or_else(|| self.instruments.iter().find(|i| matches(i.identity().bse_code())))
    }

    /// Case-insensitive substring match on name or NSE code, in load order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&CanonicalInstrument> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.instruments
            .iter()
            .filter(|i| {
                i.name.to_lowercase().contains(&needle)
                    || i.identity()
                        .nse_code()
                        .map_or(false, |code| code.to_lowercase().contains(&needle))
            })
            .take(limit)
            .collect()
    }
}

/// Outcome of a successful reload.
#[derive(Debug, Clone)]
pub struct ReloadOutcome {
    pub before: usize,
    pub after: usize,
    pub snapshot_id: Uuid,
    pub report: LoadReport,
}

/// Owns the current snapshot. Readers clone the `Arc` and never see a
/// partially built set; a failed reload leaves the previous one in place.
pub struct InstrumentRepository {
    options: LoadOptions,
    engine: ScoringEngine,
    current: RwLock<Arc<Snapshot>>,
    reload_guard: Mutex<()>,
}

impl InstrumentRepository {
    pub fn new(options: LoadOptions, engine: ScoringEngine) -> Self {
        Self::with_snapshot(options, engine, Snapshot::empty())
    }

    pub fn with_snapshot(options: LoadOptions, engine: ScoringEngine, snapshot: Snapshot) -> Self {
        Self {
            options,
            engine,
            current: RwLock::new(Arc::new(snapshot)),
            reload_guard: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    /// Re-read every source file and swap the snapshot on success.
    #[instrument(skip(self), fields(folder = %self.options.folder.display()))]
    pub async fn reload(&self) -> Result<ReloadOutcome> {
        let _serialized = self.reload_guard.lock().await;
        let started = Instant::now();
        let before = self.snapshot().await.len();

        let options = self.options.clone();
        let engine = self.engine;
        let loaded = tokio::task::spawn_blocking(move || load_instruments(&options, &engine))
            .await
            .map_err(|e| ScreenerError::data_source(&self.options.folder, format!("load task failed: {}", e)))
            .and_then(|result| result);

        let LoadedSet { instruments, report } = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                obs::repository::reload_finished(false, started.elapsed().as_secs_f64());
                error!("Reload failed, keeping snapshot with {} instruments: {}", before, e);
                return Err(e);
            }
        };

        let snapshot = Arc::new(Snapshot::from_instruments(instruments, Some(report.clone())));
        let outcome = ReloadOutcome {
            before,
            after: snapshot.len(),
            snapshot_id: snapshot.id,
            report,
        };
        *self.current.write().await = snapshot;

        obs::repository::reload_finished(true, started.elapsed().as_secs_f64());
        obs::repository::instruments_live(outcome.after);
        info!(
            "Snapshot {} live: {} -> {} instruments",
            outcome.snapshot_id, outcome.before, outcome.after
        );
        Ok(outcome)
    }

    pub async fn find(&self, code: &str) -> Option<CanonicalInstrument> {
        let snapshot = self.snapshot().await;
        let found = snapshot.find(code).cloned();
        if found.is_none() {
            debug!("No instrument for code '{}'", code);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;
    use crate::pipeline::ingestion::ReaderOptions;
    use crate::pipeline::processing::normalize::NormalizeOptions;
    use std::path::Path;

    fn options(folder: &Path) -> LoadOptions {
        LoadOptions {
            folder: folder.to_path_buf(),
            file_prefix: "trendlyne-filtered".to_string(),
            reader: ReaderOptions::default(),
            normalize: NormalizeOptions::default(),
        }
    }

    fn stock(isin: Option<&str>, nse: &str, bse: Option<&str>, name: &str) -> CanonicalInstrument {
        CanonicalInstrument::new(
            Identity::new(isin.map(String::from), Some(nse.to_string()), bse.map(String::from)),
            name,
        )
        .unwrap()
    }

    #[test]
    fn find_tries_key_then_codes() {
        let snapshot = Snapshot::from_instruments(
            vec![
                stock(Some("INE002A01018"), "RELIANCE", Some("500325"), "Reliance Industries"),
                stock(None, "TCS", None, "Tata Consultancy Services"),
            ],
            None,
        );

        assert_eq!(snapshot.find("reliance").unwrap().name, "Reliance Industries");
        assert_eq!(snapshot.find("ine002a01018").unwrap().name, "Reliance Industries");
        assert_eq!(snapshot.find("500325").unwrap().name, "Reliance Industries");
        assert_eq!(snapshot.find("NSE:tcs").unwrap().name, "Tata Consultancy Services");
        assert!(snapshot.find("INFY").is_none());
        assert!(snapshot.find("  ").is_none());
    }

    #[test]
    fn search_matches_name_or_code_and_honors_limit() {
        let snapshot = Snapshot::from_instruments(
            vec![
                stock(None, "TATAMOTORS", None, "Tata Motors"),
                stock(None, "TCS", None, "Tata Consultancy Services"),
                stock(None, "INFY", None, "Infosys"),
            ],
            None,
        );

        assert_eq!(snapshot.search("tata", 10).len(), 2);
        assert_eq!(snapshot.search("tata", 1).len(), 1);
        assert_eq!(snapshot.search("infy", 10)[0].name, "Infosys");
        assert!(snapshot.search("", 10).is_empty());
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("trendlyne-filtered (1).csv"),
            "Stock,NSE Code,ISIN\nInfosys,INFY,INE009A01021\n",
        )
        .unwrap();

        let repository = InstrumentRepository::new(options(dir.path()), ScoringEngine::default());
        let outcome = repository.reload().await.unwrap();
        assert_eq!((outcome.before, outcome.after), (0, 1));
        let first = repository.snapshot().await;

        std::fs::write(dir.path().join("trendlyne-filtered (2).csv"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
        let err = repository.reload().await.unwrap_err();
        assert!(matches!(err, ScreenerError::DataSource { .. }));

        let current = repository.snapshot().await;
        assert_eq!(current.id, first.id);
        assert_eq!(current.len(), 1);
    }

    #[tokio::test]
    async fn missing_folder_is_a_data_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let repository = InstrumentRepository::new(options(&dir.path().join("absent")), ScoringEngine::default());
        let err = repository.reload().await.unwrap_err();
        assert!(matches!(err, ScreenerError::DataSource { .. }));
        assert!(repository.snapshot().await.is_empty());
    }
}
