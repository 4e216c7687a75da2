use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::listing::StorageError;
use crate::token::SessionToken;
use crate::util::{is_listable, safe_file_name, write_atomic};

/// An object stored remotely under a session prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub size_bytes: u64,
}

/// Cloud (or otherwise remote) upload storage.
/// 遠端上傳儲存空間的抽象介面。
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_objects(&self, session: &SessionToken) -> Result<Vec<RemoteObject>, StorageError>;
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// Outcome of downloading a single remote object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub name: String,
    pub key: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadResult {
    fn ok(object: &RemoteObject, path: PathBuf) -> Self {
        Self {
            name: object.name.clone(),
            key: object.key.clone(),
            success: true,
            local_path: Some(path),
            error: None,
        }
    }

    fn failed(object: &RemoteObject, error: impl Into<String>) -> Self {
        Self {
            name: object.name.clone(),
            key: object.key.clone(),
            success: false,
            local_path: None,
            error: Some(error.into()),
        }
    }
}

/// Copies remote objects into the kiosk's local session folder.
#[async_trait]
pub trait FileDownloader: Send + Sync {
    async fn download(&self, session: &SessionToken, objects: &[RemoteObject])
        -> Vec<DownloadResult>;
}

/// Downloads from a [`RemoteStore`] into `<root>/<session>/<name>`.
///
/// Every object is attempted; one failure never aborts the rest.
pub struct StoreDownloader {
    store: Arc<dyn RemoteStore>,
    root: PathBuf,
}

impl StoreDownloader {
    pub fn new(store: Arc<dyn RemoteStore>, root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            root: root.into(),
        }
    }
}

#[async_trait]
impl FileDownloader for StoreDownloader {
    async fn download(
        &self,
        session: &SessionToken,
        objects: &[RemoteObject],
    ) -> Vec<DownloadResult> {
        let dir = self.root.join(session.as_str());
        let mut results = Vec::with_capacity(objects.len());
        for object in objects {
            let Some(file_name) = safe_file_name(&object.name) else {
                warn!(key = %object.key, "refusing remote object with unusable name");
                results.push(DownloadResult::failed(object, "unusable file name"));
                continue;
            };
            let target = dir.join(file_name);
            let result = match self.store.fetch(&object.key).await {
                Ok(bytes) => match write_atomic(&target, &bytes).await {
                    Ok(()) => DownloadResult::ok(object, target),
                    Err(err) => DownloadResult::failed(object, err.to_string()),
                },
                Err(err) => DownloadResult::failed(object, err.to_string()),
            };
            if let Some(error) = &result.error {
                warn!(key = %object.key, error = %error, "download failed");
            }
            results.push(result);
        }
        info!(
            session = %session,
            requested = objects.len(),
            downloaded = results.iter().filter(|r| r.success).count(),
            "session download finished"
        );
        results
    }
}

/// Treats a mounted directory (network share, synced bucket) as remote storage
/// laid out as `<root>/<session>/<name>`.
#[derive(Debug, Clone)]
pub struct MirrorDirectoryStore {
    root: PathBuf,
}

impl MirrorDirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl RemoteStore for MirrorDirectoryStore {
    async fn list_objects(&self, session: &SessionToken) -> Result<Vec<RemoteObject>, StorageError> {
        let dir = self.root.join(session.as_str());
        let prefix = session.as_str().to_string();
        tokio::task::spawn_blocking(move || -> Result<Vec<RemoteObject>, StorageError> {
            if !dir.is_dir() {
                return Ok(Vec::new());
            }
            let mut objects = Vec::new();
            for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
                let entry = entry.map_err(|source| StorageError::Scan {
                    path: dir.clone(),
                    source,
                })?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if !entry.file_type().is_file() || !is_listable(&name) {
                    continue;
                }
                let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
                objects.push(RemoteObject {
                    key: format!("{prefix}/{name}"),
                    name,
                    size_bytes,
                });
            }
            Ok(objects)
        })
        .await?
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = key
            .split('/')
            .filter(|part| !part.is_empty() && *part != "." && *part != "..")
            .fold(self.root.clone(), |path, part| path.join(part));
        tokio::fs::read(&path)
            .await
            .map_err(|source| StorageError::Io { path, source })
    }
}
