use printkiosk_printing::{BatchReport, PrintProgress, PrintStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Pending,
    Processing,
    Completed,
    CompletedWithErrors,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("a checkout is already in progress")]
    AlreadyProcessing,
    #[error("no checkout is in progress")]
    NotProcessing,
}

/// Explicit checkout state plus the progress of the running batch.
/// 結帳流程狀態與目前批次進度。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KioskWorkflow {
    state: CheckoutState,
    progress: PrintProgress,
    payment_id: Option<String>,
    last_report: Option<BatchReport>,
}

impl Default for KioskWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl KioskWorkflow {
    pub fn new() -> Self {
        Self {
            state: CheckoutState::Pending,
            progress: PrintProgress::idle(),
            payment_id: None,
            last_report: None,
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn progress(&self) -> &PrintProgress {
        &self.progress
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.payment_id.as_deref()
    }

    pub fn last_report(&self) -> Option<&BatchReport> {
        self.last_report.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.state == CheckoutState::Processing
    }

    /// Starts a new checkout. A finished checkout may be followed by another.
    pub fn begin(&mut self) -> Result<(), WorkflowError> {
        if self.is_processing() {
            return Err(WorkflowError::AlreadyProcessing);
        }
        self.state = CheckoutState::Processing;
        self.progress = PrintProgress::idle();
        self.payment_id = None;
        self.last_report = None;
        Ok(())
    }

    /// Payment was dismissed or could not start; nothing was charged.
    pub fn cancel(&mut self) -> Result<(), WorkflowError> {
        if !self.is_processing() {
            return Err(WorkflowError::NotProcessing);
        }
        self.state = CheckoutState::Pending;
        self.progress = PrintProgress::idle();
        self.payment_id = None;
        Ok(())
    }

    pub fn record_payment(&mut self, payment_id: impl Into<String>) {
        self.payment_id = Some(payment_id.into());
    }

    pub(crate) fn progress_mut(&mut self) -> &mut PrintProgress {
        &mut self.progress
    }

    pub fn finish(&mut self, report: BatchReport) -> Result<CheckoutState, WorkflowError> {
        if !self.is_processing() {
            return Err(WorkflowError::NotProcessing);
        }
        self.state = match report.status {
            PrintStatus::CompletedWithErrors => CheckoutState::CompletedWithErrors,
            _ if !report.is_success() => CheckoutState::CompletedWithErrors,
            _ => CheckoutState::Completed,
        };
        self.last_report = Some(report);
        Ok(self.state)
    }
}
