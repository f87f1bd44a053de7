//! MinIO (S3 API) access for the registry strategy.

use crate::{Error, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Where registry-named files are fetched from.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download `key` to `dest`.
    async fn download(&self, key: &str, dest: &Path) -> Result<()>;
}

/// A single bucket on an S3-compatible object store.
pub struct ObjectStore {
    client: Client,
    bucket: String,
}

impl ObjectStore {
    /// Connect with static credentials and path-style addressing, as MinIO expects.
    pub async fn new(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        region: String,
        bucket: String,
    ) -> Result<Self> {
        let credentials = Credentials::new(access_key, secret_key, None, None, "htsget-config");

        let sdk_config = aws_config::from_env()
            .region(aws_config::Region::new(region))
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket,
        })
    }

}

#[async_trait]
impl BlobStore for ObjectStore {
    /// The object is written next to `dest` first and renamed into place, so
    /// a failed transfer never leaves a file that looks complete.
    async fn download(&self, key: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("S3 get_object {} failed: {}", key, e)))?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Internal(format!("S3 read body failed: {}", e)))?;

        let partial = dest.with_file_name(format!(
            "{}.part",
            dest.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));

        let mut file = fs::File::create(&partial).await?;
        file.write_all(&body.into_bytes()).await?;
        file.flush().await?;
        drop(file);

        fs::rename(&partial, dest).await?;
        Ok(())
    }
}
