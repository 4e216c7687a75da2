use serde::{Deserialize, Serialize};

/// Overall state of a print batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintStatus {
    Idle,
    Processing,
    Completed,
    CompletedWithErrors,
}

/// Transient status record for the batch currently being printed.
/// 目前列印批次的暫時狀態。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintProgress {
    pub current_job: Option<String>,
    pub completed: usize,
    pub total: usize,
    pub status: PrintStatus,
}

impl PrintProgress {
    pub fn idle() -> Self {
        Self {
            current_job: None,
            completed: 0,
            total: 0,
            status: PrintStatus::Idle,
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.completed as f32 / self.total as f32).clamp(0.0, 1.0)
    }
}

impl Default for PrintProgress {
    fn default() -> Self {
        Self::idle()
    }
}

/// Receives progress snapshots while a batch runs.
pub trait ProgressSink: Send {
    fn update(&mut self, progress: &PrintProgress);
}

impl<F> ProgressSink for F
where
    F: FnMut(&PrintProgress) + Send,
{
    fn update(&mut self, progress: &PrintProgress) {
        self(progress)
    }
}

/// Sink that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreProgress;

impl ProgressSink for IgnoreProgress {
    fn update(&mut self, _progress: &PrintProgress) {}
}
