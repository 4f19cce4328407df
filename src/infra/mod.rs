// Adapters for the ports declared in app::ports

pub mod csv_directory_adapter;
pub mod document_store_adapter;

pub use csv_directory_adapter::CsvDirectory;
pub use document_store_adapter::DocumentStoreDirectory;

use std::sync::Arc;
use std::time::Duration;

use crate::app::ports::IdentityDirectory;
use crate::config::DirectoryConfig;
use crate::error::Result;

/// Build the configured identity directory, if any.
pub fn build_directory(config: Option<&DirectoryConfig>) -> Result<Option<Arc<dyn IdentityDirectory>>> {
    let directory: Arc<dyn IdentityDirectory> = match config {
        None => return Ok(None),
        Some(DirectoryConfig::Csv { path }) => Arc::new(CsvDirectory::open(path)?),
        Some(DirectoryConfig::DocumentStore {
            base_url,
            project_id,
            collection,
            timeout_seconds,
            api_key,
        }) => Arc::new(DocumentStoreDirectory::new(
            base_url.clone(),
            project_id.clone(),
            collection.clone(),
            Duration::from_secs(*timeout_seconds),
            api_key.clone(),
        )?),
    };
    Ok(Some(directory))
}
