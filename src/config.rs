use clap::{Parser, ValueEnum};
use std::num::NonZeroU64;
use std::path::PathBuf;

/// How identifiers are mapped to files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum FileRetrieval {
    /// Local SQLite catalog
    #[default]
    Db,
    /// Remote DRS registry, files fetched from MinIO/S3
    Minio,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "htsget-tickets")]
#[command(about = "htsget ticket server for variant and alignment files")]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "HTSGET_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "HTSGET_PORT", default_value = "8080")]
    pub port: u16,

    /// Path prefix of the service (e.g., /htsget)
    #[arg(long, env = "HTSGET_BASE_PATH", default_value = "")]
    pub base_path: String,

    /// Coordinate span covered by one ticket
    #[arg(long, env = "HTSGET_CHUNK_SIZE", default_value = "10000000")]
    pub chunk_size: NonZeroU64,

    /// File resolution strategy
    #[arg(long, env = "HTSGET_FILE_RETRIEVAL", value_enum, default_value_t = FileRetrieval::Db)]
    pub file_retrieval: FileRetrieval,

    /// Directory containing data files
    #[arg(long, env = "HTSGET_LOCAL_FILES_PATH", default_value = "./data/files")]
    pub local_files_path: PathBuf,

    /// SQLite catalog of files
    #[arg(long, env = "HTSGET_LOCAL_DB_PATH", default_value = "./data/files.db")]
    pub local_db_path: PathBuf,

    /// Indexed FASTA (`.fai` alongside) used to decode CRAM records
    #[arg(long, env = "HTSGET_REFERENCE_PATH")]
    pub reference_path: Option<PathBuf>,

    /// Directory for slice files
    #[arg(long, env = "HTSGET_TEMPORARY_FILES_PATH", default_value = "./data/tmp")]
    pub temporary_files_path: PathBuf,

    /// DRS registry endpoint (e.g., http://localhost:8080/ga4gh/dos/v1)
    #[arg(long, env = "HTSGET_DRS_URL")]
    pub drs_url: Option<String>,

    /// MinIO endpoint (e.g., https://play.min.io:9000)
    #[arg(long, env = "HTSGET_MINIO_ENDPOINT")]
    pub minio_endpoint: Option<String>,

    #[arg(long, env = "HTSGET_MINIO_ACCESS_KEY")]
    pub minio_access_key: Option<String>,

    #[arg(long, env = "HTSGET_MINIO_SECRET_KEY", hide_env_values = true)]
    pub minio_secret_key: Option<String>,

    /// Bucket holding data and index files
    #[arg(long, env = "HTSGET_MINIO_BUCKET", default_value = "test")]
    pub minio_bucket: String,

    #[arg(long, env = "HTSGET_MINIO_REGION", default_value = "us-east-1")]
    pub minio_region: String,

    /// Enable CORS for all origins
    #[arg(long, env = "HTSGET_CORS", default_value = "true")]
    pub cors: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Host used in tickets when a request carries no `Host` header.
    pub fn fallback_host(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base path without a trailing slash; empty when unset.
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim_end_matches('/');
        if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        }
    }
}
