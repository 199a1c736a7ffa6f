//! Client-side shopping cart.
//!
//! The cart lives entirely on the client until checkout; nothing here is
//! persisted by the backend. On successful order creation the caller clears
//! the cart.

use serde::{Deserialize, Serialize};

use super::id::MenuItemId;
use super::menu::{MenuCategory, MenuItem};
use super::money::Rupees;
use super::order::OrderItem;
use super::payment::ShoppingItem;

/// Flat delivery fee added to every checkout.
pub const DELIVERY_FEE: Rupees = Rupees::new(50);

/// Tax rate applied to the cart subtotal, in percent.
pub const TAX_RATE_PERCENT: u64 = 8;

/// A line in the client-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: MenuItemId,
    pub name: String,
    pub price: Rupees,
    pub quantity: u64,
    pub category: MenuCategory,
    pub image_url: Option<String>,
}

/// The client-side cart: insertion-ordered lines keyed by menu item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The cart lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Add one unit of a menu item, creating the line if absent.
    pub fn add(&mut self, item: &MenuItem) {
        if let Some(line) = self.items.iter_mut().find(|l| l.id == item.id) {
            line.quantity += 1;
        } else {
            self.items.push(CartItem {
                id: item.id,
                name: item.name.clone(),
                price: item.price,
                quantity: 1,
                category: item.category,
                image_url: item.image_url.clone(),
            });
        }
    }

    /// Set a line's quantity; zero removes the line.
    pub fn set_quantity(&mut self, id: MenuItemId, quantity: u64) {
        if quantity == 0 {
            self.remove(id);
        } else if let Some(line) = self.items.iter_mut().find(|l| l.id == id) {
            line.quantity = quantity;
        }
    }

    /// Remove a line entirely.
    pub fn remove(&mut self, id: MenuItemId) {
        self.items.retain(|l| l.id != id);
    }

    /// Empty the cart (called after successful order creation).
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Subtotal of all lines, before delivery fee and tax.
    #[must_use]
    pub fn subtotal(&self) -> Rupees {
        self.items.iter().map(|l| l.price * l.quantity).sum()
    }

    /// Order lines for the create-order payload, capturing current prices.
    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.items
            .iter()
            .map(|l| OrderItem {
                menu_item_id: l.id,
                quantity: l.quantity,
                price: l.price,
            })
            .collect()
    }
}

/// Checkout charges derived from a cart subtotal.
///
/// Tax is exact in paise: 8% of a whole-rupee subtotal is always a whole
/// number of paise, so no rounding happens until the grand total is
/// converted back to rupees for the order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    pub subtotal: Rupees,
    pub delivery_fee: Rupees,
    /// Tax line in paise.
    pub tax_in_paise: u64,
}

impl CheckoutTotals {
    /// Compute the standard charges for a subtotal.
    #[must_use]
    pub const fn compute(subtotal: Rupees) -> Self {
        Self {
            subtotal,
            delivery_fee: DELIVERY_FEE,
            tax_in_paise: subtotal.get() * TAX_RATE_PERCENT,
        }
    }

    /// Grand total in paise (what the payment processor charges).
    #[must_use]
    pub const fn grand_total_in_paise(&self) -> u64 {
        self.subtotal.as_paise() + self.delivery_fee.as_paise() + self.tax_in_paise
    }

    /// Grand total rounded to whole rupees (what the order record stores).
    #[must_use]
    pub const fn grand_total(&self) -> Rupees {
        Rupees::new((self.grand_total_in_paise() + 50) / 100)
    }
}

/// Build the payment processor line items for a cart: one line per cart
/// item plus the delivery fee and tax lines.
#[must_use]
pub fn checkout_line_items(cart: &Cart) -> Vec<ShoppingItem> {
    let totals = CheckoutTotals::compute(cart.subtotal());

    let mut lines: Vec<ShoppingItem> = cart
        .items()
        .iter()
        .map(|l| ShoppingItem::inr(l.name.clone(), l.category.label(), l.price, l.quantity))
        .collect();

    lines.push(ShoppingItem::inr(
        "Delivery Fee",
        "Standard delivery",
        totals.delivery_fee,
        1,
    ));
    lines.push(ShoppingItem {
        product_name: "Tax".to_string(),
        product_description: format!("{TAX_RATE_PERCENT}% tax"),
        currency: "inr".to_string(),
        quantity: 1,
        price_in_cents: totals.tax_in_paise,
    });

    lines
}
