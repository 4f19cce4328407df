use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A directory record mapping a code to the instrument's primary identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub stock_name: String,
    pub nse_code: String,
    #[serde(default)]
    pub isin: Option<String>,
}

/// Resolves a user-supplied code before the local snapshot lookup.
///
/// `Ok(None)` means the directory does not know the code. Transport and
/// backend failures are `ScreenerError::CollaboratorUnavailable`.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn resolve(&self, code: &str) -> Result<Option<DirectoryEntry>>;

    /// Short label used in logs and metrics
    fn name(&self) -> &'static str;
}
