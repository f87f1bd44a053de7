//! Slice extraction: copying the requested records into a temporary file.

use crate::formats::{self, Reference, SliceRegion, contig_name};
use crate::resolver::Resolver;
use crate::types::{CoordinateRange, FileRecord, Format, Resolution};
use crate::{Error, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// A slice written to the temporary directory. The file is removed when
/// this value is dropped.
#[derive(Debug)]
pub struct SliceFile {
    file: NamedTempFile,
    file_name: String,
    format: Format,
    records: u64,
}

impl SliceFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Name of the source file, to be shown to the client.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub async fn read_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(tokio::fs::read(self.path()).await?))
    }
}

/// Answers `data` requests: the URLs handed out in tickets.
pub struct SliceService {
    resolver: Arc<dyn Resolver>,
    temp_dir: PathBuf,
    reference: Reference,
}

impl SliceService {
    pub fn new(resolver: Arc<dyn Resolver>, temp_dir: PathBuf, reference: Reference) -> Self {
        Self {
            resolver,
            temp_dir,
            reference,
        }
    }

    pub async fn extract(&self, id: &str, range: CoordinateRange) -> Result<SliceFile> {
        range.validate()?;

        let file = match self.resolver.resolve(id).await? {
            Resolution::Found(file) => file,
            Resolution::NotFound => return Err(Error::not_found("data", id)),
        };
        let src = self.resolver.localize(&file).await?;

        let temp_dir = self.temp_dir.clone();
        let reference = self.reference.clone();
        tokio::task::spawn_blocking(move || {
            write_slice_file(&file, &src, &temp_dir, range, &reference)
        })
            .await
            .map_err(|e| Error::Internal(format!("slice task failed: {}", e)))?
    }
}

fn write_slice_file(
    file: &FileRecord,
    src: &Path,
    temp_dir: &Path,
    range: CoordinateRange,
    reference: &Reference,
) -> Result<SliceFile> {
    // The suffix keeps the source extension so writers pick the same container.
    let temp = tempfile::Builder::new()
        .prefix("htsget")
        .suffix(&file.extension)
        .tempfile_in(temp_dir)?;

    let region = SliceRegion {
        contig: range.contig.map(|c| contig_name(file.format, &c)),
        start: range.start,
        end: range.end,
    };
    let records = formats::write_slice(file.format, src, temp.path(), &region, reference)?;

    Ok(SliceFile {
        file: temp,
        file_name: file.storage_locator.clone(),
        format: file.format,
        records,
    })
}
