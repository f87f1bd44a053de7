//! Registry strategy: a GA4GH DRS registry names the file, MinIO holds it.

mod object_store;

pub use object_store::{BlobStore, ObjectStore};

use super::{Resolver, required};
use crate::{
    Config, Error, Result,
    types::{FileRecord, Format, Resolution},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use url::Url;

/// Every registry-resolved file is treated as VCF.
const REGISTRY_FORMAT: Format = Format::Vcf;

const KNOWN_EXTENSIONS: &[&str] = &[".vcf.gz", ".vcf", ".bcf", ".bam", ".cram"];

#[derive(Debug, Deserialize)]
struct DataObjectResponse {
    data_object: DataObject,
}

#[derive(Debug, Deserialize)]
struct DataObject {
    name: String,
}

type DownloadLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

pub struct RegistryResolver {
    client: Client,
    drs_url: Url,
    store: Box<dyn BlobStore>,
    files_dir: PathBuf,
    downloads: DownloadLocks,
}

impl RegistryResolver {
    pub fn new(
        drs_url: Url,
        store: impl BlobStore + 'static,
        files_dir: PathBuf,
    ) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            drs_url,
            store: Box::new(store),
            files_dir,
            downloads: Mutex::new(HashMap::new()),
        })
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let drs_url = Url::parse(required(&config.drs_url, "--drs-url")?)
            .map_err(|e| Error::Config(format!("invalid DRS url: {}", e)))?;

        let store = ObjectStore::new(
            required(&config.minio_endpoint, "--minio-endpoint")?,
            required(&config.minio_access_key, "--minio-access-key")?,
            required(&config.minio_secret_key, "--minio-secret-key")?,
            config.minio_region.clone(),
            config.minio_bucket.clone(),
        )
        .await?;

        tokio::fs::create_dir_all(&config.local_files_path).await?;

        Self::new(drs_url, store, config.local_files_path.clone())
    }

    async fn data_object_name(&self, id: &str) -> Result<String> {
        let url = data_object_url(&self.drs_url, id)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("DRS request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Internal(format!(
                "DRS returned {} for {}",
                response.status(),
                id
            )));
        }

        let body: DataObjectResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("malformed DRS response: {}", e)))?;

        checked_name(body.data_object.name)
    }

    fn download_slot(&self, id: &str) -> DownloadSlot<'_> {
        let mut downloads = self
            .downloads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let lock = downloads.entry(id.to_string()).or_default().clone();
        DownloadSlot {
            downloads: &self.downloads,
            id: id.to_string(),
            lock,
        }
    }
}

/// Holds one identifier's download lock; the table entry goes away with the
/// last holder.
struct DownloadSlot<'a> {
    downloads: &'a DownloadLocks,
    id: String,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for DownloadSlot<'_> {
    fn drop(&mut self) {
        let mut downloads = self
            .downloads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Clones are only taken under the table lock: 2 means the table and us.
        if Arc::strong_count(&self.lock) == 2 {
            downloads.remove(&self.id);
        }
    }
}

#[async_trait]
impl Resolver for RegistryResolver {
    async fn resolve(&self, id: &str) -> Result<Resolution> {
        match self.data_object_name(id).await {
            Ok(name) => {
                tracing::debug!("registry resolved {} to {}", id, name);
                Ok(Resolution::Found(file_record(id, name)))
            }
            Err(e) => {
                tracing::warn!("registry lookup for {} failed: {}", id, e);
                Ok(Resolution::NotFound)
            }
        }
    }

    async fn localize(&self, file: &FileRecord) -> Result<PathBuf> {
        let slot = self.download_slot(&file.id);
        let _guard = slot.lock.lock().await;

        let index_name = format!("{}.{}", file.storage_locator, file.format.index_extension());
        for name in [file.storage_locator.as_str(), index_name.as_str()] {
            let dest = self.files_dir.join(name);
            if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
                tracing::debug!("{} already present, skipping download", name);
                continue;
            }
            // A missing file surfaces later when the slice is opened.
            if let Err(e) = self.store.download(name, &dest).await {
                tracing::error!("failed to fetch {}: {}", name, e);
            }
        }

        Ok(file.path_in(&self.files_dir))
    }

    fn infers_bounds(&self) -> bool {
        false
    }
}

fn data_object_url(base: &Url, id: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("DRS url {} cannot be a base", base)))?
        .pop_if_empty()
        .push("dataobjects")
        .push(id);
    Ok(url)
}

/// Registry names become local file names, so only a bare file name is usable.
fn checked_name(name: String) -> Result<String> {
    let mut components = Path::new(&name).components();
    let bare = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\']);

    if bare {
        Ok(name)
    } else {
        Err(Error::Internal(format!("unusable data object name {:?}", name)))
    }
}

fn file_record(id: &str, name: String) -> FileRecord {
    let extension = KNOWN_EXTENSIONS
        .iter()
        .find(|ext| name.ends_with(*ext))
        .map(|ext| ext.to_string())
        .or_else(|| {
            Path::new(&name)
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
        })
        .unwrap_or_default();

    FileRecord {
        id: id.to_string(),
        extension,
        format: REGISTRY_FORMAT,
        storage_locator: name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, extract, http::StatusCode, routing::get};
    use serde_json::{Value, json};
    use std::time::Duration;

    /// In-memory object store recording every requested key.
    #[derive(Default)]
    struct FakeStore {
        objects: HashMap<String, String>,
        requested: Arc<Mutex<Vec<String>>>,
    }

    impl FakeStore {
        fn with(objects: &[(&str, &str)]) -> Self {
            Self {
                objects: objects
                    .iter()
                    .map(|(key, body)| (key.to_string(), body.to_string()))
                    .collect(),
                requested: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl BlobStore for FakeStore {
        async fn download(&self, key: &str, dest: &Path) -> Result<()> {
            self.requested.lock().unwrap().push(key.to_string());
            // Yield so concurrent callers interleave.
            tokio::time::sleep(Duration::from_millis(20)).await;
            let body = self
                .objects
                .get(key)
                .ok_or_else(|| Error::Internal(format!("no such key: {}", key)))?;
            tokio::fs::write(dest, body).await?;
            Ok(())
        }
    }

    fn resolver(drs_url: &str, store: FakeStore, dir: &Path) -> RegistryResolver {
        RegistryResolver::new(Url::parse(drs_url).unwrap(), store, dir.to_path_buf()).unwrap()
    }

    fn sample_file() -> FileRecord {
        file_record("NA18537", "NA18537.vcf.gz".to_string())
    }

    /// Minimal DRS registry on a random local port.
    async fn drs_server() -> String {
        async fn data_object(
            extract::Path(id): extract::Path<String>,
        ) -> std::result::Result<Json<Value>, StatusCode> {
            match id.as_str() {
                "NA18537" => Ok(Json(
                    json!({"data_object": {"id": "NA18537", "name": "NA18537.vcf.gz"}}),
                )),
                "escape" => Ok(Json(json!({"data_object": {"name": "../../outside.vcf"}}))),
                "broken" => Ok(Json(json!({"objects": []}))),
                _ => Err(StatusCode::NOT_FOUND),
            }
        }

        let app = axum::Router::new().route("/ga4gh/dos/v1/dataobjects/{id}", get(data_object));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}/ga4gh/dos/v1", addr)
    }

    #[test]
    fn test_data_object_url() {
        let base = Url::parse("http://localhost:8080/ga4gh/dos/v1/").unwrap();
        let url = data_object_url(&base, "NA18537").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/ga4gh/dos/v1/dataobjects/NA18537"
        );
    }

    #[test]
    fn test_data_object_url_encodes_id() {
        let base = Url::parse("http://localhost:8080/ga4gh/dos/v1").unwrap();
        let url = data_object_url(&base, "a/b").unwrap();
        assert_eq!(url.path(), "/ga4gh/dos/v1/dataobjects/a%2Fb");
    }

    #[test]
    fn test_file_record_is_vcf() {
        let file = file_record("NA18537", "NA18537.vcf.gz".to_string());
        assert_eq!(file.extension, ".vcf.gz");
        assert_eq!(file.format, Format::Vcf);
        assert_eq!(file.storage_locator, "NA18537.vcf.gz");

        let file = file_record("HG02102", "HG02102.bam".to_string());
        assert_eq!(file.extension, ".bam");
        assert_eq!(file.format, Format::Vcf);
    }

    #[test]
    fn test_drs_response_parses() {
        let body = r#"{"data_object": {"id": "NA18537", "name": "NA18537.vcf.gz", "size": "12"}}"#;
        let parsed: DataObjectResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data_object.name, "NA18537.vcf.gz");
    }

    #[test]
    fn test_checked_name() {
        assert_eq!(checked_name("NA18537.vcf.gz".to_string()).unwrap(), "NA18537.vcf.gz");
        for name in ["../x.vcf", "/etc/passwd", "a/b.vcf", "..", ".", "", "a\\b.vcf"] {
            assert!(checked_name(name.to_string()).is_err(), "{:?} accepted", name);
        }
    }

    #[tokio::test]
    async fn test_resolve_against_registry() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(&drs_server().await, FakeStore::default(), dir.path());

        match resolver.resolve("NA18537").await.unwrap() {
            Resolution::Found(file) => {
                assert_eq!(file.storage_locator, "NA18537.vcf.gz");
                assert_eq!(file.format, Format::Vcf);
            }
            Resolution::NotFound => panic!("NA18537 should resolve"),
        }
        for id in ["HG02102", "escape", "broken"] {
            assert_eq!(resolver.resolve(id).await.unwrap(), Resolution::NotFound);
        }
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver("http://127.0.0.1:1/", FakeStore::default(), dir.path());
        assert_eq!(resolver.resolve("NA18537").await.unwrap(), Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_localize_fetches_file_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::with(&[("NA18537.vcf.gz", "data"), ("NA18537.vcf.gz.tbi", "index")]);
        let requested = store.requested.clone();
        let resolver = resolver("http://localhost/", store, dir.path());

        let path = resolver.localize(&sample_file()).await.unwrap();
        assert_eq!(path, dir.path().join("NA18537.vcf.gz"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "data");
        assert!(dir.path().join("NA18537.vcf.gz.tbi").exists());
        assert_eq!(
            *requested.lock().unwrap(),
            vec!["NA18537.vcf.gz", "NA18537.vcf.gz.tbi"]
        );
    }

    #[tokio::test]
    async fn test_localize_skips_present_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("NA18537.vcf.gz"), "local").unwrap();
        let store = FakeStore::with(&[("NA18537.vcf.gz", "remote"), ("NA18537.vcf.gz.tbi", "index")]);
        let requested = store.requested.clone();
        let resolver = resolver("http://localhost/", store, dir.path());

        let path = resolver.localize(&sample_file()).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "local");
        assert_eq!(*requested.lock().unwrap(), vec!["NA18537.vcf.gz.tbi"]);
    }

    #[tokio::test]
    async fn test_localize_tolerates_fetch_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::with(&[("NA18537.vcf.gz", "data")]);
        let requested = store.requested.clone();
        let resolver = resolver("http://localhost/", store, dir.path());

        let path = resolver.localize(&sample_file()).await.unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("NA18537.vcf.gz.tbi").exists());
        assert_eq!(requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_localize_downloads_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::with(&[("NA18537.vcf.gz", "data"), ("NA18537.vcf.gz.tbi", "index")]);
        let requested = store.requested.clone();
        let resolver = resolver("http://localhost/", store, dir.path());
        let file = sample_file();

        let (first, second) = tokio::join!(resolver.localize(&file), resolver.localize(&file));
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(
            *requested.lock().unwrap(),
            vec!["NA18537.vcf.gz", "NA18537.vcf.gz.tbi"]
        );
    }

    #[tokio::test]
    async fn test_download_locks_released() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::with(&[("NA18537.vcf.gz", "data")]);
        let resolver = resolver("http://localhost/", store, dir.path());
        let file = sample_file();

        let (first, second) = tokio::join!(resolver.localize(&file), resolver.localize(&file));
        first.unwrap();
        second.unwrap();
        assert!(resolver.downloads.lock().unwrap().is_empty());

        let other = file_record("HG02102", "HG02102.vcf".to_string());
        resolver.localize(&other).await.unwrap();
        assert!(resolver.downloads.lock().unwrap().is_empty());
    }
}
