use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, ScreenerError};

/// A matching export file and the batch number taken from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub ordinal: u32,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn source_pattern(prefix: &str) -> Result<Regex> {
    let pattern = format!(r"(?i)^{}\s*\((\d+)\)\.csv$", regex::escape(prefix.trim()));
    Regex::new(&pattern).map_err(|e| ScreenerError::Config(format!("invalid file prefix {prefix:?}: {e}")))
}

/// Find `<prefix> (N).csv` files in `folder`, ordered by N.
///
/// A missing folder is an error; a folder without matches yields an empty list.
pub fn discover_sources(folder: &Path, prefix: &str) -> Result<Vec<SourceFile>> {
    if !folder.is_dir() {
        return Err(ScreenerError::data_source(folder, "data folder does not exist"));
    }

    let pattern = source_pattern(prefix)?;
    let entries = std::fs::read_dir(folder).map_err(|e| ScreenerError::data_source(folder, e.to_string()))?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ScreenerError::data_source(folder, e.to_string()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(captures) = pattern.captures(&name) else {
            continue;
        };
        let Ok(ordinal) = captures[1].parse::<u32>() else {
            debug!("Skipping {} with out-of-range batch number", name);
            continue;
        };
        sources.push(SourceFile {
            path: entry.path(),
            ordinal,
        });
    }

    sources.sort_by(|a, b| a.ordinal.cmp(&b.ordinal).then_with(|| a.path.cmp(&b.path)));
    debug!("Discovered {} source files in {}", sources.len(), folder.display());
    Ok(sources)
}
