use printkiosk_printing::{CanvasBoard, CanvasGeometry, PrintQueue, Tariff};
use printkiosk_session::SessionToken;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;

/// Everything the customer has assembled in the current session.
#[derive(Debug, Clone)]
pub struct KioskOrder {
    pub session: SessionToken,
    pub mobile: Option<String>,
    pub canvas: CanvasBoard,
    pub queue: PrintQueue,
    pub cart: Cart,
}

impl KioskOrder {
    pub fn new(session: SessionToken, geometry: CanvasGeometry) -> Self {
        Self {
            session,
            mobile: None,
            canvas: CanvasBoard::new(geometry),
            queue: PrintQueue::new(),
            cart: Cart::new(),
        }
    }

    pub fn quote(&self, tariff: &Tariff) -> Quote {
        let canvas_total = self.canvas.total_cost(tariff);
        let queue_total = self.queue.total_cost();
        let cart_total = self.cart.total();
        Quote {
            canvas_pages: self.canvas.billable_pages().count(),
            documents: self.queue.len(),
            cart_lines: self.cart.items().len(),
            canvas_total,
            queue_total,
            cart_total,
            total: canvas_total
                .saturating_add(queue_total)
                .saturating_add(cart_total),
        }
    }

    /// Back to one blank canvas page, an empty queue and an empty cart.
    pub fn reset(&mut self) {
        self.canvas.reset();
        self.queue.clear();
        self.cart.clear();
    }
}

/// Running total shown before payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub canvas_pages: usize,
    pub documents: usize,
    pub cart_lines: usize,
    pub canvas_total: u64,
    pub queue_total: u64,
    pub cart_total: u64,
    pub total: u64,
}

impl Quote {
    /// Nothing to print and nothing to sell.
    pub fn is_empty(&self) -> bool {
        self.canvas_pages == 0 && self.documents == 0 && self.cart_lines == 0
    }

    pub fn print_jobs(&self) -> usize {
        self.canvas_pages + self.documents
    }
}
