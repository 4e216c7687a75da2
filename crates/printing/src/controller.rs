use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::canvas::CanvasPage;
use crate::job::PrintJobId;
use crate::platform::{
    ComposedPageRequest, DispatchError, DispatchOutcome, DocumentPrintRequest, PrintDispatcher,
};
use crate::progress::{PrintProgress, PrintStatus, ProgressSink};
use crate::queue::PrintQueueItem;

/// Tuning for a print batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Pause between consecutive document dispatches so a single physical
    /// printer is never handed more than one job at a time.
    pub inter_job_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            inter_job_delay: Duration::from_millis(2000),
        }
    }
}

/// One unit of work within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchUnit {
    CanvasPage { page_id: u32 },
    Document { job_id: PrintJobId, file_name: String },
}

impl fmt::Display for BatchUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchUnit::CanvasPage { page_id } => write!(f, "Canvas page {page_id}"),
            BatchUnit::Document { file_name, .. } => f.write_str(file_name),
        }
    }
}

/// A unit that could not be printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintFailure {
    pub unit: BatchUnit,
    pub message: String,
}

/// Aggregated result of a print batch.
/// 列印批次的彙總結果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total_jobs: usize,
    pub completed: usize,
    pub failures: Vec<PrintFailure>,
    pub status: PrintStatus,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// User-facing summary listing every failed unit.
    pub fn summary(&self) -> String {
        if self.failures.is_empty() {
            return format!("All {} print jobs completed.", self.total_jobs);
        }
        let mut text = format!(
            "{} of {} print jobs completed. Failed:",
            self.completed, self.total_jobs
        );
        for failure in &self.failures {
            text.push_str(&format!("\n- {}: {}", failure.unit, failure.message));
        }
        text
    }
}

/// Prints canvas pages, then queued documents, strictly in list order.
///
/// Failures are recorded and the batch carries on; there is no way to stop a
/// batch once it has started.
/// 依序列印畫布頁面與佇列文件；失敗會被記錄但不會中斷批次。
pub async fn run_print_batch<D>(
    dispatcher: &D,
    pages: &[CanvasPage],
    queue: &[PrintQueueItem],
    options: &BatchOptions,
    progress: &mut dyn ProgressSink,
) -> BatchReport
where
    D: PrintDispatcher + ?Sized,
{
    let mut state = PrintProgress {
        current_job: None,
        completed: 0,
        total: pages.len() + queue.len(),
        status: PrintStatus::Processing,
    };
    let mut failures = Vec::new();
    info!(
        pages = pages.len(),
        documents = queue.len(),
        "starting print batch"
    );

    for page in pages {
        let unit = BatchUnit::CanvasPage { page_id: page.id };
        state.current_job = Some(unit.to_string());
        progress.update(&state);

        let result = dispatcher
            .print_composed_page(ComposedPageRequest::from_page(page))
            .await;
        record(result, unit, &mut state, &mut failures);
        progress.update(&state);
    }

    for (index, item) in queue.iter().enumerate() {
        if index > 0 && !options.inter_job_delay.is_zero() {
            tokio::time::sleep(options.inter_job_delay).await;
        }
        let unit = BatchUnit::Document {
            job_id: item.id,
            file_name: item.file.name.clone(),
        };
        state.current_job = Some(unit.to_string());
        progress.update(&state);

        let result = dispatcher
            .print_document(DocumentPrintRequest::from_queue_item(item))
            .await;
        record(result, unit, &mut state, &mut failures);
        progress.update(&state);
    }

    state.current_job = None;
    state.status = if failures.is_empty() {
        PrintStatus::Completed
    } else {
        PrintStatus::CompletedWithErrors
    };
    progress.update(&state);
    info!(
        completed = state.completed,
        failed = failures.len(),
        "print batch finished"
    );

    BatchReport {
        total_jobs: state.total,
        completed: state.completed,
        failures,
        status: state.status,
    }
}

fn record(
    result: Result<DispatchOutcome, DispatchError>,
    unit: BatchUnit,
    state: &mut PrintProgress,
    failures: &mut Vec<PrintFailure>,
) {
    let message = match result {
        Ok(outcome) if outcome.success => {
            state.completed += 1;
            return;
        }
        Ok(outcome) => outcome
            .error
            .unwrap_or_else(|| format!("{} reported failure", outcome.method)),
        Err(err) => err.to_string(),
    };
    warn!(unit = %unit, error = %message, "print job failed");
    failures.push(PrintFailure { unit, message });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CanvasBoard, ItemSource, Point};
    use crate::job::{FileRef, PrintSettings};
    use crate::pricing::Tariff;
    use crate::progress::IgnoreProgress;
    use crate::queue::PrintQueue;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedDispatcher {
        calls: Mutex<Vec<String>>,
        fail_names: Vec<String>,
    }

    #[async_trait]
    impl PrintDispatcher for ScriptedDispatcher {
        async fn print_composed_page(
            &self,
            request: ComposedPageRequest,
        ) -> Result<DispatchOutcome, DispatchError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("page-{}", request.page_id));
            Ok(DispatchOutcome::succeeded("test"))
        }

        async fn print_document(
            &self,
            request: DocumentPrintRequest,
        ) -> Result<DispatchOutcome, DispatchError> {
            self.calls.lock().unwrap().push(request.file.name.clone());
            if self.fail_names.contains(&request.file.name) {
                return Ok(DispatchOutcome::failed("test", "printer offline"));
            }
            Ok(DispatchOutcome::succeeded("test"))
        }
    }

    fn pages_with_content(count: u32) -> Vec<CanvasPage> {
        let mut board = CanvasBoard::default();
        for page in 1..=count {
            if page > 1 {
                board.add_page();
            }
            board
                .add_item(
                    page,
                    ItemSource {
                        file: FileRef::new("a.png", "a.png"),
                        natural_size: None,
                    },
                    Point::new(100.0, 100.0),
                )
                .unwrap();
        }
        board.pages().to_vec()
    }

    fn queue_of(names: &[&str]) -> PrintQueue {
        let mut queue = PrintQueue::new();
        for name in names {
            queue
                .enqueue(
                    FileRef::new(*name, *name),
                    PrintSettings::default(),
                    2,
                    &Tariff::default(),
                )
                .unwrap();
        }
        queue
    }

    fn no_delay() -> BatchOptions {
        BatchOptions {
            inter_job_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn empty_batch_dispatches_nothing() {
        let dispatcher = ScriptedDispatcher::default();
        let report =
            run_print_batch(&dispatcher, &[], &[], &no_delay(), &mut IgnoreProgress).await;
        assert_eq!(report.total_jobs, 0);
        assert_eq!(report.status, PrintStatus::Completed);
        assert!(dispatcher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn pages_print_before_documents_in_order() {
        let dispatcher = ScriptedDispatcher::default();
        let pages = pages_with_content(2);
        let queue = queue_of(&["a.pdf", "b.pdf"]);
        let mut snapshots = Vec::new();
        let mut sink = |progress: &PrintProgress| snapshots.push(progress.clone());

        let report =
            run_print_batch(&dispatcher, &pages, queue.items(), &no_delay(), &mut sink).await;

        assert_eq!(
            *dispatcher.calls.lock().unwrap(),
            vec!["page-1", "page-2", "a.pdf", "b.pdf"]
        );
        assert_eq!(report.completed, 4);
        assert_eq!(report.status, PrintStatus::Completed);
        assert_eq!(report.summary(), "All 4 print jobs completed.");

        let last = snapshots.last().unwrap();
        assert_eq!(last.status, PrintStatus::Completed);
        assert_eq!(last.completed, 4);
        assert!(snapshots
            .iter()
            .any(|snapshot| snapshot.current_job.as_deref() == Some("Canvas page 2")));
    }

    #[tokio::test]
    async fn failures_are_recorded_and_batch_continues() {
        let dispatcher = ScriptedDispatcher {
            fail_names: vec!["bad.pdf".into()],
            ..ScriptedDispatcher::default()
        };
        let queue = queue_of(&["bad.pdf", "good.pdf"]);

        let report = run_print_batch(
            &dispatcher,
            &[],
            queue.items(),
            &no_delay(),
            &mut IgnoreProgress,
        )
        .await;

        assert_eq!(report.status, PrintStatus::CompletedWithErrors);
        assert_eq!(report.completed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].message, "printer offline");
        assert!(report.summary().contains("- bad.pdf: printer offline"));
        assert_eq!(dispatcher.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn documents_are_spaced_by_inter_job_delay() {
        let dispatcher = ScriptedDispatcher::default();
        let queue = queue_of(&["a.pdf", "b.pdf", "c.pdf"]);
        let options = BatchOptions {
            inter_job_delay: Duration::from_secs(2),
        };
        let started = tokio::time::Instant::now();

        run_print_batch(&dispatcher, &[], queue.items(), &options, &mut IgnoreProgress).await;

        assert!(started.elapsed() >= Duration::from_secs(4));
        assert!(started.elapsed() < Duration::from_secs(6));
    }
}
