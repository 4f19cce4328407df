use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{Result, ScreenerError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub directory: Option<DirectoryConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub folder: PathBuf,
    pub file_prefix: String,
    /// Decode non-UTF-8 exports as Windows-1252 instead of failing the load
    pub legacy_encoding_fallback: bool,
    /// Keep unmodeled columns for display on the detail endpoint
    pub retain_unmodeled_columns: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from(constants::DEFAULT_DATA_DIR),
            file_prefix: constants::DEFAULT_FILE_PREFIX.to_string(),
            legacy_encoding_fallback: false,
            retain_unmodeled_columns: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_name: String,
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file_name: "screener.log".to_string(),
            default_filter: "quality_screener=debug,info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9898,
        }
    }
}

/// Where codes are resolved before the local lookup.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectoryConfig {
    /// A `stockName,nseCode,isin` CSV next to the exports
    Csv {
        #[serde(default = "default_directory_path")]
        path: PathBuf,
    },
    /// Firestore-compatible REST document store
    DocumentStore {
        base_url: String,
        project_id: String,
        collection: String,
        #[serde(default = "default_directory_timeout")]
        timeout_seconds: u64,
        #[serde(default)]
        api_key: Option<String>,
    },
}

fn default_directory_path() -> PathBuf {
    PathBuf::from(constants::DEFAULT_DATA_DIR).join(constants::DEFAULT_DIRECTORY_FILE)
}

fn default_directory_timeout() -> u64 {
    5
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ScreenerError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Load the file when it exists, fall back to defaults otherwise, then
    /// apply environment overrides.
    pub fn load_or_default(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let mut config = if config_path.exists() {
            Self::load_from(config_path)?
        } else {
            Config::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var("QS_DATA_DIR") {
            self.data.folder = PathBuf::from(dir);
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| ScreenerError::Config(format!("PORT '{}' is not a port: {}", port, e)))?;
        }
        if let Ok(port) = std::env::var("QS_METRICS_PORT") {
            self.metrics.port = port.parse().map_err(|e| {
                ScreenerError::Config(format!("QS_METRICS_PORT '{}' is not a port: {}", port, e))
            })?;
            self.metrics.enabled = true;
        }
        if let Ok(url) = std::env::var("QS_DIRECTORY_URL") {
            match &mut self.directory {
                Some(DirectoryConfig::DocumentStore { base_url, .. }) => *base_url = url,
                _ => {
                    return Err(ScreenerError::Config(
                        "QS_DIRECTORY_URL requires a [directory] section of kind document_store"
                            .to_string(),
                    ))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.data.file_prefix, "trendlyne-filtered");
        assert!(config.directory.is_none());
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn parses_document_store_directory() {
        let config: Config = toml::from_str(
            r#"
            [data]
            folder = "exports"

            [directory]
            kind = "document_store"
            base_url = "http://localhost:8080/v1"
            project_id = "demo"
            collection = "nifty_stocks"
            "#,
        )
        .unwrap();

        assert_eq!(config.data.folder, PathBuf::from("exports"));
        match config.directory {
            Some(DirectoryConfig::DocumentStore {
                project_id,
                timeout_seconds,
                ..
            }) => {
                assert_eq!(project_id, "demo");
                assert_eq!(timeout_seconds, 5);
            }
            other => panic!("unexpected directory config: {:?}", other),
        }
    }

    #[test]
    fn csv_directory_defaults_to_data_folder() {
        let config: Config = toml::from_str("[directory]\nkind = \"csv\"\n").unwrap();
        match config.directory {
            Some(DirectoryConfig::Csv { path }) => assert_eq!(path, PathBuf::from("data/nifty_stocks.csv")),
            other => panic!("unexpected directory config: {:?}", other),
        }
    }

    #[test]
    fn load_from_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ScreenerError::Config(_)));
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[server]\nport = 9100").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
