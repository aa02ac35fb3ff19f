//! # Stage Object Storage
//!
//! Abstract destination for generated stage images. Implement [`ObjectStore`]
//! to add a new backend; the pipeline only ever talks through this trait and
//! only ever uses keys produced by `crop_geometry::stage_key`.
//!
//! Writes are idempotent overwrites with no versioning, so regenerating a
//! puzzle's crops is always safe to retry. Two backends ship here:
//!
//! - [`FsStore`]: a local directory tree, used for development and tests
//! - [`HttpStore`]: PUT against a hosted bucket endpoint with a bearer token

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CropError, CropResult};

/// Abstract object-store interface for stage uploads.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a complete object under `key`, overwriting any previous version.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> CropResult<()>;

    /// Human-readable destination for logging.
    fn describe(&self) -> String;
}

/// Filesystem-backed store rooted at a directory.
///
/// Keys map directly to relative paths, so `{puzzleId}/stage_{n}.jpg` lands
/// as a file under a per-puzzle subdirectory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> CropResult<()> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CropError::storage(key, format!("create dir: {e}")))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CropError::storage(key, format!("write: {e}")))?;
        debug!(key, len = bytes.len(), "wrote stage to filesystem");
        Ok(())
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// HTTP-backed store that PUTs objects to `{base_url}/{key}`.
///
/// Matches the hosted-bucket upload surface: bearer-token auth, explicit
/// content type, and upsert semantics so re-runs overwrite in place.
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> CropResult<()> {
        let url = format!("{}/{key}", self.base_url);
        let mut request = self
            .client
            .put(&url)
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(bytes.to_vec());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CropError::storage_source(key, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CropError::storage(
                key,
                format!("HTTP status {status} from {url}"),
            ));
        }
        debug!(key, len = bytes.len(), "uploaded stage");
        Ok(())
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
