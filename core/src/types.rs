//! Shared primitive types used across the pricing core.

use rust_decimal::Decimal;

/// Every monetary amount. Always EUR, never a binary float.
pub type Money = Decimal;

/// A stable, unique identifier for any stored entity (order, client).
pub type EntityId = String;

/// ISO-3166 alpha-2 country code, upper-case (e.g. "LU", "FR").
pub type CountryCode = String;

/// Decimal places used when displaying a unit price.
pub const UNIT_PRICE_DP: u32 = 4;

/// Decimal places used for every total (HT, VAT, TTC).
pub const TOTAL_DP: u32 = 2;
