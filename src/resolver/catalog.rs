use super::Resolver;
use crate::{
    Error, Result,
    types::{FileRecord, Format, Resolution},
};
use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};

/// Resolves identifiers through the `files` table of a SQLite catalog.
///
/// The catalog is opened read-only for every lookup, so concurrent requests
/// never contend on a shared connection.
pub struct CatalogResolver {
    db_path: PathBuf,
    files_dir: PathBuf,
}

impl CatalogResolver {
    pub fn new(db_path: PathBuf, files_dir: PathBuf) -> Self {
        Self { db_path, files_dir }
    }

    fn lookup(db_path: &Path, id: &str) -> Result<Option<FileRecord>> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(db_path, flags)?;

        let row = connection
            .query_row(
                "SELECT id, extension, format FROM files WHERE id = ?1 LIMIT 1",
                (id,),
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, extension, format)) = row else {
            return Ok(None);
        };

        let format = format.parse::<Format>().inspect_err(|_| {
            tracing::warn!("catalog entry {} has unrecognized format {:?}", id, format);
        })?;

        Ok(Some(FileRecord {
            storage_locator: format!("{}{}", id, extension),
            id,
            extension,
            format,
        }))
    }
}

#[async_trait]
impl Resolver for CatalogResolver {
    async fn resolve(&self, id: &str) -> Result<Resolution> {
        let db_path = self.db_path.clone();
        let key = id.to_string();
        let found = tokio::task::spawn_blocking(move || Self::lookup(&db_path, &key))
            .await
            .map_err(|e| Error::Internal(format!("catalog lookup task failed: {}", e)))??;

        tracing::debug!("catalog lookup for {}: found={}", id, found.is_some());
        Ok(match found {
            Some(file) => Resolution::Found(file),
            None => Resolution::NotFound,
        })
    }

    async fn localize(&self, file: &FileRecord) -> Result<PathBuf> {
        Ok(file.path_in(&self.files_dir))
    }

    fn infers_bounds(&self) -> bool {
        true
    }
}
