use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Customer details pre-filled into the hosted checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotes {
    pub session_id: String,
    pub canvas_pages: usize,
    pub documents: usize,
}

/// Request handed to the hosted checkout.
/// 交給線上結帳的付款請求。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount in minor currency units (paise for INR).
    pub amount_minor: u64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub prefill: Prefill,
    pub notes: PaymentNotes,
    pub theme_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Paid { payment_id: String },
    /// The customer closed the checkout without paying.
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The checkout could not be started at all.
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("payment declined: {0}")]
    Declined(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn collect(&self, request: PaymentRequest) -> Result<PaymentOutcome, PaymentError>;
}

/// Pay-at-counter gateway: the operator takes cash and the kiosk records a
/// locally generated payment reference.
#[derive(Debug)]
pub struct CounterPaymentGateway {
    sequence: AtomicU64,
}

impl CounterPaymentGateway {
    pub fn new() -> Self {
        Self {
            sequence: AtomicU64::new(1),
        }
    }
}

impl Default for CounterPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for CounterPaymentGateway {
    async fn collect(&self, request: PaymentRequest) -> Result<PaymentOutcome, PaymentError> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let payment_id = format!("counter_{}_{seq:03}", Utc::now().format("%Y%m%d%H%M%S"));
        info!(
            payment_id = %payment_id,
            amount_minor = request.amount_minor,
            currency = %request.currency,
            "payment taken at counter"
        );
        Ok(PaymentOutcome::Paid { payment_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PaymentRequest {
        PaymentRequest {
            amount_minor: 2200,
            currency: "INR".into(),
            name: "PrintKiosk".into(),
            description: "Print order".into(),
            prefill: Prefill::default(),
            notes: PaymentNotes {
                session_id: "SunnyOtter42".into(),
                canvas_pages: 1,
                documents: 1,
            },
            theme_color: "#3399cc".into(),
        }
    }

    #[tokio::test]
    async fn counter_gateway_issues_distinct_references() {
        let gateway = CounterPaymentGateway::new();
        let first = gateway.collect(request()).await.unwrap();
        let second = gateway.collect(request()).await.unwrap();
        match (first, second) {
            (PaymentOutcome::Paid { payment_id: a }, PaymentOutcome::Paid { payment_id: b }) => {
                assert!(a.starts_with("counter_"));
                assert_ne!(a, b);
            }
            other => panic!("expected two payments, got {other:?}"),
        }
    }

    #[test]
    fn outcome_is_tagged() {
        let json = serde_json::to_string(&PaymentOutcome::Dismissed).unwrap();
        assert_eq!(json, r#"{"status":"dismissed"}"#);
    }
}
