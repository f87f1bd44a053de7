//! File resolution: mapping an opaque identifier to a concrete file.
//!
//! Two interchangeable strategies implement [`Resolver`]:
//!
//! - [`CatalogResolver`] - looks identifiers up in a local SQLite catalog
//! - [`RegistryResolver`] - asks a remote DRS registry and fetches the file
//!   and its index from MinIO/S3 on demand (`registry` feature)
//!
//! One strategy is selected at startup by [`from_config`] and shared by the
//! ticket and slice services.

mod catalog;
#[cfg(feature = "registry")]
mod registry;

pub use catalog::CatalogResolver;
#[cfg(feature = "registry")]
pub use registry::{ObjectStore, RegistryResolver};

use crate::{
    Error, Result,
    config::{Config, FileRetrieval},
    types::{FileRecord, Resolution},
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[async_trait]
pub trait Resolver: Send + Sync {
    /// Look up an identifier. Lookup failures the client cannot act on
    /// collapse into [`Resolution::NotFound`].
    async fn resolve(&self, id: &str) -> Result<Resolution>;

    /// Make the file readable on local disk and return its path.
    async fn localize(&self, file: &FileRecord) -> Result<PathBuf>;

    /// Whether missing range bounds are read from the file before planning.
    fn infers_bounds(&self) -> bool;
}

/// Build the resolver selected by `--file-retrieval`.
pub async fn from_config(config: &Config) -> Result<Arc<dyn Resolver>> {
    match config.file_retrieval {
        FileRetrieval::Db => Ok(Arc::new(CatalogResolver::new(
            config.local_db_path.clone(),
            config.local_files_path.clone(),
        ))),
        #[cfg(feature = "registry")]
        FileRetrieval::Minio => Ok(Arc::new(RegistryResolver::from_config(config).await?)),
        #[cfg(not(feature = "registry"))]
        FileRetrieval::Minio => Err(Error::Config(
            "minio file retrieval requires the `registry` feature".to_string(),
        )),
    }
}

/// Registry settings that must be present when the registry strategy is used.
pub(crate) fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{} is required for minio file retrieval", flag)))
}
