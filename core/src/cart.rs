//! Storefront cart and checkout.
//!
//! RULE: the calculators never see storage. Checkout reads the cart
//! through a `CartStore`, prices it, and writes the order back through
//! the same store. Recording the order and emptying the cart is one
//! step: either both happen or neither does.

use crate::{
    error::{ShopError, ShopResult},
    idempotency::ChargeRequest,
    tier_pricing::round_total,
    types::{EntityId, Money},
    vat::{Customer, VatResult, VatSettings},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One cart line, in the storefront's JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub name:          String,
    /// Unit price HT.
    pub price:         Money,
    pub quantity:      u32,
    #[serde(default)]
    pub details:       String,
    /// Unit supplier cost, when known.
    #[serde(default)]
    pub supplier_cost: Option<Money>,
}

impl CartItem {
    /// Price times quantity; None when out of Decimal's range.
    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id:    EntityId,
    pub items:       Vec<CartItem>,
    pub customer:    Customer,
    pub subtotal_ht: Money,
    pub vat:         VatResult,
    pub total_ttc:   Money,
    pub created_at:  DateTime<Utc>,
    pub charge:      ChargeRequest,
}

/// Where the storefront keeps its cart and last order.
pub trait CartStore {
    fn get(&self) -> ShopResult<Vec<CartItem>>;
    fn set(&mut self, items: &[CartItem]) -> ShopResult<()>;
    /// Record `order` and empty the cart atomically. On error the cart
    /// and the order history are left as they were.
    fn commit_order(&mut self, order: &Order) -> ShopResult<()>;
    fn last_order(&self) -> ShopResult<Option<Order>>;
}

/// In-process store, used by tests and the IPC runner.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    items:  Vec<CartItem>,
    orders: Vec<Order>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}

impl CartStore for MemoryCartStore {
    fn get(&self) -> ShopResult<Vec<CartItem>> {
        Ok(self.items.clone())
    }

    fn set(&mut self, items: &[CartItem]) -> ShopResult<()> {
        self.items = items.to_vec();
        Ok(())
    }

    fn commit_order(&mut self, order: &Order) -> ShopResult<()> {
        self.orders.push(order.clone());
        self.items.clear();
        Ok(())
    }

    fn last_order(&self) -> ShopResult<Option<Order>> {
        Ok(self.orders.last().cloned())
    }
}

/// Add `item` to the cart, merging with an identical line (same name and
/// details) by summing quantities.
pub fn add_to_cart(store: &mut impl CartStore, item: CartItem) -> ShopResult<Vec<CartItem>> {
    let mut items = store.get()?;
    match items
        .iter_mut()
        .find(|i| i.name == item.name && i.details == item.details)
    {
        Some(existing) => {
            existing.quantity = existing
                .quantity
                .checked_add(item.quantity)
                .ok_or_else(|| ShopError::QuantityOverflow { name: item.name.clone() })?;
        }
        None => items.push(item),
    }
    store.set(&items)?;
    Ok(items)
}

/// Sum of line totals, rounded to cents. None when out of range.
pub fn cart_subtotal(items: &[CartItem]) -> Option<Money> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.line_total()?))
        .map(round_total)
}

/// Revenue minus supplier cost, over the lines whose cost is known.
pub fn cart_margin(items: &[CartItem]) -> Option<Money> {
    items
        .iter()
        .filter_map(|i| i.supplier_cost.map(|cost| (i, cost)))
        .try_fold(Decimal::ZERO, |acc, (i, cost)| {
            let unit = i.price.checked_sub(cost)?;
            acc.checked_add(unit.checked_mul(Decimal::from(i.quantity))?)
        })
        .map(round_total)
}

pub struct Checkout {
    pub vat: VatSettings,
}

impl Checkout {
    pub fn new(vat: VatSettings) -> Self {
        Self { vat }
    }

    /// Price the cart, record the order and empty the cart.
    /// Amounts out of range refuse the order and leave the cart intact.
    pub fn place_order(
        &self,
        store: &mut impl CartStore,
        customer: &Customer,
    ) -> ShopResult<Order> {
        let items = store.get()?;
        if items.is_empty() {
            return Err(ShopError::EmptyCart);
        }

        let subtotal_ht = cart_subtotal(&items).ok_or(ShopError::AmountOutOfRange)?;
        let vat = self.vat.compute(subtotal_ht, customer);
        if vat.warning.is_some() {
            return Err(ShopError::AmountOutOfRange);
        }
        let order_id = format!("ord-{}", Uuid::new_v4().simple());
        let charge = ChargeRequest::new(&order_id, vat.amount_ttc);

        let order = Order {
            order_id,
            items,
            customer: customer.clone(),
            subtotal_ht,
            total_ttc: vat.amount_ttc,
            vat,
            created_at: Utc::now(),
            charge,
        };

        store.commit_order(&order)?;

        log::info!(
            "checkout: order {} placed, {} lines, HT {} TTC {} ({})",
            order.order_id,
            order.items.len(),
            order.subtotal_ht,
            order.total_ttc,
            order.vat.vat_label
        );

        Ok(order)
    }
}

impl Default for Checkout {
    fn default() -> Self {
        Self::new(VatSettings::default())
    }
}
