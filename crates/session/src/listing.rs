use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::files::{FileListing, MediaKind, UploadedFile};
use crate::token::SessionToken;
use crate::util::is_listable;

/// Errors raised while talking to local or remote upload storage.
/// 存取本機或遠端上傳儲存空間時的錯誤。
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("remote storage error: {0}")]
    Remote(String),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Lists the files uploaded for a session.
#[async_trait]
pub trait FileLister: Send + Sync {
    async fn list(&self, session: &SessionToken) -> Result<FileListing, StorageError>;
}

/// Lists `<root>/<session>/` on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDirectoryLister {
    root: PathBuf,
}

impl LocalDirectoryLister {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, session: &SessionToken) -> PathBuf {
        self.root.join(session.as_str())
    }
}

#[async_trait]
impl FileLister for LocalDirectoryLister {
    async fn list(&self, session: &SessionToken) -> Result<FileListing, StorageError> {
        let dir = self.session_dir(session);
        let prefix = session.as_str().to_string();
        let listing = tokio::task::spawn_blocking(move || scan_session_dir(&dir, &prefix)).await??;
        debug!(
            session = %session,
            files = listing.files.len(),
            exists = listing.exists,
            "listed session uploads"
        );
        Ok(listing)
    }
}

fn scan_session_dir(dir: &Path, prefix: &str) -> Result<FileListing, StorageError> {
    if !dir.is_dir() {
        return Ok(FileListing::missing());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| StorageError::Scan {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_listable(&name) {
            continue;
        }
        let metadata = entry.metadata().map_err(|source| StorageError::Scan {
            path: entry.path().to_path_buf(),
            source,
        })?;
        files.push(UploadedFile {
            kind: MediaKind::from_name(&name),
            storage_key: format!("{prefix}/{name}"),
            local_path: Some(entry.path().to_path_buf()),
            size_bytes: metadata.len(),
            created_at: metadata.created().ok().map(DateTime::<Utc>::from),
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            name,
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(FileListing {
        files,
        exists: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_session_folder_is_an_empty_listing() {
        let tmp = tempdir().unwrap();
        let lister = LocalDirectoryLister::new(tmp.path());
        let listing = lister
            .list(&SessionToken::parse("QuietOwl11").unwrap())
            .await
            .unwrap();
        assert!(!listing.exists);
        assert!(listing.is_empty());
    }

    #[tokio::test]
    async fn lists_files_sorted_and_classified() {
        let tmp = tempdir().unwrap();
        let session = SessionToken::parse("QuietOwl11").unwrap();
        let dir = tmp.path().join(session.as_str());
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("b.pdf"), b"%PDF").unwrap();
        fs::write(dir.join("A.JPG"), b"jpg").unwrap();
        fs::write(dir.join("c.png.part"), b"partial").unwrap();
        fs::write(dir.join("nested/ignored.png"), b"png").unwrap();

        let listing = LocalDirectoryLister::new(tmp.path())
            .list(&session)
            .await
            .unwrap();

        assert!(listing.exists);
        let names: Vec<_> = listing.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["A.JPG", "b.pdf"]);
        assert_eq!(listing.files[0].kind, MediaKind::Image);
        assert_eq!(listing.files[1].kind, MediaKind::Pdf);
        assert_eq!(listing.files[1].storage_key, "QuietOwl11/b.pdf");
        assert_eq!(listing.files[1].size_bytes, 4);
        assert!(listing.files[1].modified_at.is_some());
    }
}
