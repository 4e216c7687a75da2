use std::sync::Arc;
use std::time::Duration;

use printkiosk_printing::{
    run_print_batch, to_minor_units, BatchOptions, BatchReport, CanvasPage, PrintDispatcher,
    PrintProgress, ProgressSink, Tariff,
};
use printkiosk_settings::{CheckoutSettings, KioskConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::notify::{Receipt, ReceiptLine, ReceiptNotifier};
use crate::order::{KioskOrder, Quote};
use crate::payment::{PaymentError, PaymentGateway, PaymentNotes, PaymentOutcome, PaymentRequest, Prefill};
use crate::validation::{validate_mobile, ValidationError};
use crate::workflow::{CheckoutState, KioskWorkflow, WorkflowError};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// Result of a completed checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    /// Customer closed the payment window; the order is untouched.
    Dismissed,
    Printed(CheckoutSummary),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub payment_id: String,
    pub quote: Quote,
    pub report: BatchReport,
    pub state: CheckoutState,
    pub receipt_sent: bool,
}

impl CheckoutSummary {
    /// Message shown to the customer once printing is over.
    pub fn message(&self) -> String {
        let mut text = self.report.summary();
        if !self.report.is_success() {
            text.push_str(&format!(
                "\nPlease contact staff and quote payment ID {}.",
                self.payment_id
            ));
        }
        text
    }
}

/// Validates, takes payment, prints, sends the receipt and resets the order.
/// 驗證、付款、列印、寄送收據並重設訂單的結帳流程。
pub struct CheckoutFlow {
    gateway: Arc<dyn PaymentGateway>,
    dispatcher: Arc<dyn PrintDispatcher>,
    notifier: Arc<dyn ReceiptNotifier>,
    tariff: Tariff,
    settings: CheckoutSettings,
    batch: BatchOptions,
}

impl CheckoutFlow {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        dispatcher: Arc<dyn PrintDispatcher>,
        notifier: Arc<dyn ReceiptNotifier>,
    ) -> Self {
        Self::from_config(gateway, dispatcher, notifier, &KioskConfig::default())
    }

    pub fn from_config(
        gateway: Arc<dyn PaymentGateway>,
        dispatcher: Arc<dyn PrintDispatcher>,
        notifier: Arc<dyn ReceiptNotifier>,
        config: &KioskConfig,
    ) -> Self {
        Self {
            gateway,
            dispatcher,
            notifier,
            tariff: config.tariff,
            settings: config.checkout.clone(),
            batch: BatchOptions {
                inter_job_delay: Duration::from_millis(config.checkout.inter_job_delay_ms),
            },
        }
    }

    pub fn with_batch_options(mut self, batch: BatchOptions) -> Self {
        self.batch = batch;
        self
    }

    pub fn tariff(&self) -> &Tariff {
        &self.tariff
    }

    pub fn quote(&self, order: &KioskOrder) -> Quote {
        order.quote(&self.tariff)
    }

    /// Runs one checkout for `order`.
    ///
    /// Validation, payment errors and dismissal leave `order` untouched and the
    /// workflow pending. Once payment succeeds every print job is attempted and
    /// the order is reset whatever the batch outcome.
    pub async fn checkout(
        &self,
        order: &mut KioskOrder,
        workflow: &mut KioskWorkflow,
        progress: &mut dyn ProgressSink,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let phone = order.mobile.as_deref().map(validate_mobile).transpose()?;
        let quote = self.quote(order);
        if quote.is_empty() {
            return Err(ValidationError::EmptyOrder.into());
        }

        workflow.begin()?;
        let request = self.payment_request(order, &quote, phone.clone());
        info!(
            session = %order.session,
            amount = quote.total,
            jobs = quote.print_jobs(),
            "collecting payment"
        );
        let payment_id = match self.gateway.collect(request).await {
            Ok(PaymentOutcome::Paid { payment_id }) => payment_id,
            Ok(PaymentOutcome::Dismissed) => {
                info!(session = %order.session, "payment dismissed");
                workflow.cancel()?;
                return Ok(CheckoutOutcome::Dismissed);
            }
            Err(err) => {
                warn!(session = %order.session, error = %err, "payment failed");
                workflow.cancel()?;
                return Err(err.into());
            }
        };
        workflow.record_payment(payment_id.clone());

        let pages: Vec<CanvasPage> = order.canvas.billable_pages().cloned().collect();
        let report = {
            let (tracked, outer) = (workflow.progress_mut(), progress);
            let mut sink = |snapshot: &PrintProgress| {
                *tracked = snapshot.clone();
                outer.update(snapshot);
            };
            run_print_batch(
                self.dispatcher.as_ref(),
                &pages,
                order.queue.items(),
                &self.batch,
                &mut sink,
            )
            .await
        };

        let receipt_sent = match phone {
            Some(phone) => self.send_receipt(order, &pages, &payment_id, phone).await,
            None => false,
        };

        order.reset();
        let state = workflow.finish(report.clone())?;
        info!(payment_id = %payment_id, state = ?state, "checkout finished");

        Ok(CheckoutOutcome::Printed(CheckoutSummary {
            payment_id,
            quote,
            report,
            state,
            receipt_sent,
        }))
    }

    fn payment_request(&self, order: &KioskOrder, quote: &Quote, phone: Option<String>) -> PaymentRequest {
        PaymentRequest {
            amount_minor: to_minor_units(quote.total),
            currency: self.settings.currency.clone(),
            name: self.settings.shop_name.clone(),
            description: self.settings.description.clone(),
            prefill: Prefill { contact: phone },
            notes: PaymentNotes {
                session_id: order.session.to_string(),
                canvas_pages: quote.canvas_pages,
                documents: quote.documents,
            },
            theme_color: self.settings.theme_color.clone(),
        }
    }

    async fn send_receipt(
        &self,
        order: &KioskOrder,
        pages: &[CanvasPage],
        payment_id: &str,
        phone: String,
    ) -> bool {
        let mut items: Vec<ReceiptLine> = pages
            .iter()
            .map(|page| ReceiptLine {
                description: format!("Canvas page {} ({})", page.id, page.color_mode.as_str()),
                amount: self.tariff.canvas_page_cost(page.color_mode),
            })
            .collect();
        items.extend(order.queue.iter().map(|item| ReceiptLine {
            description: format!(
                "{} ({} pages x {})",
                item.file_name(),
                item.pages_to_print,
                item.settings.copies
            ),
            amount: item.cost,
        }));
        items.extend(order.cart.items().iter().map(|line| ReceiptLine {
            description: format!("{} x {}", line.name, line.quantity),
            amount: line.line_total(),
        }));
        let receipt = Receipt {
            phone,
            amount: items.iter().map(|line| line.amount).sum(),
            payment_id: payment_id.to_string(),
            session_id: order.session.to_string(),
            items,
        };
        match self.notifier.send(&receipt).await {
            Ok(()) => true,
            Err(err) => {
                warn!(payment_id, error = %err, "receipt notification failed");
                false
            }
        }
    }
}
