use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::canvas::{CanvasItem, CanvasPage};
use crate::job::{ColorMode, DuplexMode, FileRef, PageSelection, PaperSize, PrintJobId};
use crate::queue::PrintQueueItem;

/// Request to print one composed canvas page.
/// 列印單一已排版畫布頁面的請求。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedPageRequest {
    pub page_id: u32,
    pub color_mode: ColorMode,
    pub paper: PaperSize,
    pub items: Vec<CanvasItem>,
}

impl ComposedPageRequest {
    pub fn from_page(page: &CanvasPage) -> Self {
        Self {
            page_id: page.id,
            color_mode: page.color_mode,
            paper: PaperSize::A4,
            items: page.items.clone(),
        }
    }
}

/// Request to print a queued document.
/// 列印佇列中文件的請求。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPrintRequest {
    pub job_id: PrintJobId,
    pub file: FileRef,
    pub copies: u32,
    pub page_range: PageSelection,
    /// Resolved page numbers, in print order.
    pub pages: Vec<u32>,
    pub color_mode: ColorMode,
    pub duplex: DuplexMode,
}

impl DocumentPrintRequest {
    pub fn from_queue_item(item: &PrintQueueItem) -> Self {
        Self {
            job_id: item.id,
            file: item.file.clone(),
            copies: item.settings.copies,
            page_range: item.settings.page_range.clone(),
            pages: item.selected_pages(),
            color_mode: item.settings.color_mode,
            duplex: item.settings.duplex,
        }
    }
}

/// Response shape shared by both print capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub method: String,
}

impl DispatchOutcome {
    pub fn succeeded(method: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            method: method.into(),
        }
    }

    pub fn failed(method: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            method: method.into(),
        }
    }
}

/// Errors raised when a print request could not be delivered at all.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("print transport failed: {0}")]
    Transport(String),
    #[error("failed to write spool ticket {path}: {source}")]
    Spool {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode print request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// External print capability (native spooler, IPC bridge, ...).
/// 外部列印能力的抽象介面。
#[async_trait]
pub trait PrintDispatcher: Send + Sync {
    async fn print_composed_page(
        &self,
        request: ComposedPageRequest,
    ) -> Result<DispatchOutcome, DispatchError>;

    async fn print_document(
        &self,
        request: DocumentPrintRequest,
    ) -> Result<DispatchOutcome, DispatchError>;
}

/// JSON record of a dispatched print request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpoolTicket {
    ComposedPage(ComposedPageRequest),
    Document(DocumentPrintRequest),
}

/// Dispatcher that drops one JSON ticket per request into a spool directory,
/// for a print daemon to pick up.
/// 將每個請求寫成 JSON 工作單放入佇列資料夾的派送器。
#[derive(Debug)]
pub struct SpoolDirectoryDispatcher {
    root: PathBuf,
    sequence: AtomicU64,
}

impl SpoolDirectoryDispatcher {
    pub const METHOD: &'static str = "spool-directory";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write_ticket(
        &self,
        label: &str,
        ticket: &SpoolTicket,
    ) -> Result<DispatchOutcome, DispatchError> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stamp = Utc::now().format("%Y%m%d%H%M%S%3f");
        let path = self.root.join(format!("{stamp}-{seq:04}-{label}.json"));
        let payload = serde_json::to_vec_pretty(ticket)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| DispatchError::Spool {
                path: self.root.clone(),
                source,
            })?;
        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &payload)
            .await
            .map_err(|source| DispatchError::Spool {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| DispatchError::Spool {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "spool ticket written");
        Ok(DispatchOutcome::succeeded(Self::METHOD))
    }
}

#[async_trait]
impl PrintDispatcher for SpoolDirectoryDispatcher {
    async fn print_composed_page(
        &self,
        request: ComposedPageRequest,
    ) -> Result<DispatchOutcome, DispatchError> {
        info!(page = request.page_id, items = request.items.len(), "spooling canvas page");
        let label = format!("page-{}", request.page_id);
        self.write_ticket(&label, &SpoolTicket::ComposedPage(request))
            .await
    }

    async fn print_document(
        &self,
        request: DocumentPrintRequest,
    ) -> Result<DispatchOutcome, DispatchError> {
        info!(job = %request.job_id, file = %request.file.name, "spooling document");
        let label = format!("doc-{}", request.job_id.value());
        self.write_ticket(&label, &SpoolTicket::Document(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CanvasBoard, ItemSource, Point, Size};
    use crate::job::PrintSettings;
    use crate::pricing::Tariff;
    use crate::queue::PrintQueue;
    use tempfile::tempdir;

    fn read_tickets(root: &Path) -> Vec<SpoolTicket> {
        let mut paths: Vec<_> = std::fs::read_dir(root)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        paths.sort();
        paths
            .into_iter()
            .map(|path| serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn spool_dispatcher_writes_one_ticket_per_request() {
        let tmp = tempdir().unwrap();
        let spool = tmp.path().join("spool");
        let dispatcher = SpoolDirectoryDispatcher::new(&spool);

        let mut board = CanvasBoard::default();
        board
            .add_item(
                1,
                ItemSource {
                    file: FileRef::new("cat.png", "/uploads/cat.png"),
                    natural_size: Some(Size::new(300.0, 200.0)),
                },
                Point::new(200.0, 200.0),
            )
            .unwrap();
        let mut queue = PrintQueue::new();
        queue
            .enqueue(
                FileRef::new("notes.pdf", "/uploads/notes.pdf"),
                PrintSettings {
                    page_range: PageSelection::Even,
                    ..PrintSettings::default()
                },
                5,
                &Tariff::default(),
            )
            .unwrap();

        let page = dispatcher
            .print_composed_page(ComposedPageRequest::from_page(&board.pages()[0]))
            .await
            .unwrap();
        let doc = dispatcher
            .print_document(DocumentPrintRequest::from_queue_item(&queue.items()[0]))
            .await
            .unwrap();
        assert!(page.success && doc.success);
        assert_eq!(doc.method, SpoolDirectoryDispatcher::METHOD);

        let tickets = read_tickets(&spool);
        assert_eq!(tickets.len(), 2);
        match &tickets[0] {
            SpoolTicket::ComposedPage(request) => {
                assert_eq!(request.page_id, 1);
                assert_eq!(request.items.len(), 1);
            }
            other => panic!("expected composed page ticket, got {other:?}"),
        }
        match &tickets[1] {
            SpoolTicket::Document(request) => {
                assert_eq!(request.pages, vec![2, 4]);
                assert_eq!(request.file.name, "notes.pdf");
            }
            other => panic!("expected document ticket, got {other:?}"),
        }
    }

    #[test]
    fn outcome_serializes_without_empty_error() {
        let json = serde_json::to_string(&DispatchOutcome::succeeded("ipc")).unwrap();
        assert_eq!(json, r#"{"success":true,"method":"ipc"}"#);
    }
}
