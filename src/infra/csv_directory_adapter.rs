use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::app::ports::{DirectoryEntry, IdentityDirectory};
use crate::error::{Result, ScreenerError};

/// Directory backed by a `stockName,nseCode,isin` CSV, read once at startup.
pub struct CsvDirectory {
    path: PathBuf,
    entries: Vec<DirectoryEntry>,
}

impl CsvDirectory {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| ScreenerError::data_source(path, e.to_string()))?;

        let mut entries = Vec::new();
        for row in reader.deserialize::<DirectoryEntry>() {
            let entry = row.map_err(|e| ScreenerError::data_source(path, e.to_string()))?;
            if !entry.nse_code.is_empty() {
                entries.push(entry);
            }
        }
        info!("Loaded {} directory entries from {}", entries.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl IdentityDirectory for CsvDirectory {
    async fn resolve(&self, code: &str) -> Result<Option<DirectoryEntry>> {
        let code = code.trim();
        Ok(self
            .entries
            .iter()
            .find(|entry| {
                entry.nse_code.eq_ignore_ascii_case(code)
                    || entry.isin.as_deref().map_or(false, |isin| isin.eq_ignore_ascii_case(code))
            })
            .cloned())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_by_code_or_isin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nifty_stocks.csv");
        std::fs::write(
            &path,
            "stockName,nseCode,isin\nReliance Industries Ltd,RELIANCE,INE002A01018\nInfosys Ltd, INFY ,INE009A01021\n",
        )
        .unwrap();

        let directory = CsvDirectory::open(&path).unwrap();
        assert_eq!(directory.len(), 2);

        let entry = directory.resolve("infy").await.unwrap().unwrap();
        assert_eq!(entry.stock_name, "Infosys Ltd");
        assert_eq!(entry.nse_code, "INFY");

        let entry = directory.resolve("ine002a01018").await.unwrap().unwrap();
        assert_eq!(entry.nse_code, "RELIANCE");

        assert!(directory.resolve("TCS").await.unwrap().is_none());
    }

    #[test]
    fn missing_file_is_a_data_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvDirectory::open(dir.path().join("absent.csv")).err().unwrap();
        assert!(matches!(err, ScreenerError::DataSource { .. }));
    }
}
