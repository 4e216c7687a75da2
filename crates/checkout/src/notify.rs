use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub description: String,
    pub amount: u64,
}

/// Receipt sent to the customer after payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub phone: String,
    pub amount: u64,
    pub payment_id: String,
    pub session_id: String,
    pub items: Vec<ReceiptLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("receipt delivery failed: {0}")]
pub struct NotifyError(pub String);

/// SMS or other receipt channel. Failures never affect the checkout result.
#[async_trait]
pub trait ReceiptNotifier: Send + Sync {
    async fn send(&self, receipt: &Receipt) -> Result<(), NotifyError>;
}

/// Writes receipts to the log instead of sending them anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReceiptNotifier;

#[async_trait]
impl ReceiptNotifier for LogReceiptNotifier {
    async fn send(&self, receipt: &Receipt) -> Result<(), NotifyError> {
        info!(
            phone = %receipt.phone,
            payment_id = %receipt.payment_id,
            amount = receipt.amount,
            lines = receipt.items.len(),
            "receipt issued"
        );
        Ok(())
    }
}
