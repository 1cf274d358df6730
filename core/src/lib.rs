//! printshop-core: pricing, VAT and commission engine shared by the
//! storefront checkout, the product configurator and the billing dashboard.
//!
//! The calculators (`tier_pricing`, `vat`, `commission`, `quote`) are pure.
//! They never fail; degraded results carry a status instead.
//! Only `store`, `config` and `cart` touch I/O.

pub mod cart;
pub mod catalog;
pub mod commission;
pub mod config;
pub mod error;
pub mod idempotency;
pub mod quote;
pub mod store;
pub mod tier_pricing;
pub mod types;
pub mod vat;
