//! Checkout for the print kiosk: validation, paper-shop cart, payment,
//! receipts and the orchestration that prints a paid order.
//! 自助列印機結帳：驗證、紙張購物車、付款、收據與付款後的列印流程。

pub mod cart;
pub mod flow;
pub mod notify;
pub mod order;
pub mod payment;
pub mod validation;
pub mod workflow;

pub use cart::{Cart, CartItem};
pub use flow::{CheckoutError, CheckoutFlow, CheckoutOutcome, CheckoutSummary};
pub use notify::{LogReceiptNotifier, NotifyError, Receipt, ReceiptLine, ReceiptNotifier};
pub use order::{KioskOrder, Quote};
pub use payment::{
    CounterPaymentGateway, PaymentError, PaymentGateway, PaymentNotes, PaymentOutcome,
    PaymentRequest, Prefill,
};
pub use validation::{validate_mobile, ValidationError};
pub use workflow::{CheckoutState, KioskWorkflow, WorkflowError};
