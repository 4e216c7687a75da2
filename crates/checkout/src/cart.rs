use printkiosk_settings::SheetProduct;
use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Paper-shop line: a catalog product and how many sheets of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }
}

/// Blank-paper purchases made alongside print jobs.
/// 與列印工作一併購買的空白紙張。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` sheets of `product`, merging with an existing line.
    /// The price is captured the first time the product enters the cart.
    pub fn add(&mut self, product: &SheetProduct, quantity: u32) -> Result<(), ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.items.push(CartItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                unit_price: product.unit_price,
                quantity,
            }),
        }
        Ok(())
    }

    /// Sets the quantity of a line; zero removes it.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), ValidationError> {
        let position = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or_else(|| ValidationError::UnknownProduct(product_id.to_string()))?;
        if quantity == 0 {
            self.items.remove(position);
        } else {
            self.items[position].quantity = quantity;
        }
        Ok(())
    }

    pub fn remove(&mut self, product_id: &str) -> Option<CartItem> {
        let position = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)?;
        Some(self.items.remove(position))
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total(&self) -> u64 {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(0, u64::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
