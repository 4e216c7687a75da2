use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::job::{FileRef, PrintJobId, PrintSettings};
use crate::pricing::Tariff;

/// A PDF queued for printing. Cost and page count are frozen when queued.
/// 已排入列印佇列的 PDF；費用與頁數在加入時即固定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintQueueItem {
    pub id: PrintJobId,
    pub file: FileRef,
    pub total_pages: u32,
    pub settings: PrintSettings,
    pub pages_to_print: u32,
    pub cost: u64,
    pub queued_at: DateTime<Utc>,
}

impl PrintQueueItem {
    pub fn file_name(&self) -> &str {
        &self.file.name
    }

    /// Local wall-clock time at which the item was queued, e.g. `14:05:09`.
    pub fn display_time(&self) -> String {
        self.queued_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }

    /// Ordered page numbers this job prints.
    pub fn selected_pages(&self) -> Vec<u32> {
        self.settings.page_range.expand(self.total_pages)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("copies must be at least 1")]
    ZeroCopies,
    #[error("'{file}' has no pages selected for printing")]
    NothingToPrint { file: String },
}

/// Ordered list of document jobs awaiting checkout.
/// 等待結帳的文件列印工作清單。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintQueue {
    items: Vec<PrintQueueItem>,
}

impl PrintQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prices `settings` against `tariff` now and appends the job.
    pub fn enqueue(
        &mut self,
        file: FileRef,
        settings: PrintSettings,
        total_pages: u32,
        tariff: &Tariff,
    ) -> Result<&PrintQueueItem, QueueError> {
        if settings.copies == 0 {
            return Err(QueueError::ZeroCopies);
        }
        let pages_to_print = settings.page_range.pages_to_print(total_pages);
        if pages_to_print == 0 {
            return Err(QueueError::NothingToPrint { file: file.name });
        }
        let cost = tariff.settings_cost(pages_to_print, &settings);
        let item = PrintQueueItem {
            id: PrintJobId::new(),
            file,
            total_pages,
            settings,
            pages_to_print,
            cost,
            queued_at: Utc::now(),
        };
        debug!(id = %item.id, file = %item.file.name, pages = pages_to_print, cost, "queued document");
        self.items.push(item);
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn remove(&mut self, id: PrintJobId) -> Option<PrintQueueItem> {
        let position = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(position))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: PrintJobId) -> Option<&PrintQueueItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[PrintQueueItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrintQueueItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_cost(&self) -> u64 {
        self.items
            .iter()
            .map(|item| item.cost)
            .fold(0, u64::saturating_add)
    }
}
