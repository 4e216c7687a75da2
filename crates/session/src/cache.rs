use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::files::{FileListing, UploadedFile};
use crate::listing::{FileLister, StorageError};
use crate::remote::{FileDownloader, RemoteStore};
use crate::token::SessionToken;

/// Last known file list for the session. Refreshes replace it wholesale.
/// 工作階段檔案清單快取，每次重新整理皆整體替換。
#[derive(Debug, Clone, Default)]
pub struct FileCache {
    files: Vec<UploadedFile>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl FileCache {
    pub fn replace(&mut self, files: Vec<UploadedFile>) {
        self.files = files;
        self.refreshed_at = Some(Utc::now());
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn images(&self) -> impl Iterator<Item = &UploadedFile> {
        self.files.iter().filter(|file| file.is_image())
    }

    pub fn pdfs(&self) -> impl Iterator<Item = &UploadedFile> {
        self.files.iter().filter(|file| file.is_pdf())
    }

    pub fn find(&self, name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|file| file.name == name)
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.refreshed_at = None;
    }
}

/// Remote storage consulted when nothing has reached the local folder yet.
#[derive(Clone)]
pub struct RemoteFallback {
    pub store: Arc<dyn RemoteStore>,
    pub downloader: Arc<dyn FileDownloader>,
}

/// The session's uploaded files, kept fresh from local and remote storage.
pub struct SessionFiles {
    session: SessionToken,
    lister: Arc<dyn FileLister>,
    remote: Option<RemoteFallback>,
    cache: FileCache,
}

impl SessionFiles {
    pub fn new(session: SessionToken, lister: Arc<dyn FileLister>) -> Self {
        Self {
            session,
            lister,
            remote: None,
            cache: FileCache::default(),
        }
    }

    pub fn with_remote(mut self, remote: RemoteFallback) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn session(&self) -> &SessionToken {
        &self.session
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// Lists local uploads; when there are none, pulls the session's objects
    /// from remote storage and lists again. Remote problems are logged and
    /// leave the (empty) local result in place.
    ///
    /// The cache is only replaced once a listing succeeds.
    pub async fn refresh(&mut self) -> Result<&[UploadedFile], StorageError> {
        let mut listing = self.lister.list(&self.session).await?;
        if listing.is_empty() {
            if let Some(remote) = &self.remote {
                if let Some(relisted) = self.pull_remote(remote).await? {
                    listing = relisted;
                }
            }
        }
        info!(session = %self.session, files = listing.files.len(), "session files refreshed");
        self.cache.replace(listing.files);
        Ok(self.cache.files())
    }

    async fn pull_remote(
        &self,
        remote: &RemoteFallback,
    ) -> Result<Option<FileListing>, StorageError> {
        let objects = match remote.store.list_objects(&self.session).await {
            Ok(objects) => objects,
            Err(err) => {
                warn!(session = %self.session, error = %err, "remote listing failed");
                return Ok(None);
            }
        };
        if objects.is_empty() {
            return Ok(None);
        }
        let results = remote.downloader.download(&self.session, &objects).await;
        if !results.iter().any(|result| result.success) {
            warn!(session = %self.session, "no remote files could be downloaded");
            return Ok(None);
        }
        self.lister.list(&self.session).await.map(Some)
    }
}
