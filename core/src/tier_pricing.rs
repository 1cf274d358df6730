//! Tier price selector: volume pricing for configurator and storefront.
//!
//! The unit price depends only on the selected tier, never on where the
//! requested quantity falls inside the band: the divisor is always the
//! tier's own `min_quantity`.

use crate::{
    catalog::PricingTier,
    types::{Money, TOTAL_DP, UNIT_PRICE_DP},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How the tier for a quote was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingStatus {
    /// The quantity fell inside a tier's band.
    Matched,
    /// No band contained the quantity; the last tier was used instead.
    FallbackToLastTier,
    /// No usable tier. Shown as "Configuration non disponible".
    Unavailable,
}

impl PricingStatus {
    /// Caller-facing message, if any.
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            Self::Matched            => None,
            Self::FallbackToLastTier => Some("Quantité hors paliers: tarif du dernier palier appliqué"),
            Self::Unavailable        => Some("Configuration non disponible"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierQuote {
    pub quantity:           u32,
    pub tier:               Option<PricingTier>,
    pub unit_supplier_cost: Money,
    /// Rounded to 4 decimal places.
    pub unit_selling_price: Money,
    /// Rounded to 2 decimal places.
    pub total_ht:           Money,
    pub status:             PricingStatus,
}

impl TierQuote {
    fn unavailable(quantity: u32) -> Self {
        Self {
            quantity,
            tier: None,
            unit_supplier_cost: Decimal::ZERO,
            unit_selling_price: Decimal::ZERO,
            total_ht: Decimal::ZERO,
            status: PricingStatus::Unavailable,
        }
    }
}

/// One row of the configurator's price-break table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreak {
    pub min_quantity:       u32,
    pub max_quantity:       Option<u32>,
    pub unit_selling_price: Money,
    /// Total for `min_quantity` units.
    pub total_ht:           Money,
}

pub fn round_unit(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(UNIT_PRICE_DP, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_total(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(TOTAL_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Pick the tier whose band contains `quantity`.
///
/// Falls back to the LAST tier when nothing matches, including quantities
/// below the smallest minimum. Returns None only for an empty slice.
pub fn select_tier(quantity: u32, tiers: &[PricingTier]) -> Option<&PricingTier> {
    tiers
        .iter()
        .find(|t| t.contains(quantity))
        .or_else(|| tiers.last())
}

/// (unit supplier cost, unit selling price), both unrounded.
/// None for a zero minimum or when the arithmetic leaves Decimal's range.
fn unit_prices(tier: &PricingTier) -> Option<(Decimal, Decimal)> {
    if tier.min_quantity == 0 {
        return None;
    }
    let unit_cost = tier.supplier_cost.checked_div(Decimal::from(tier.min_quantity))?;
    let markup = tier
        .margin_percent
        .checked_div(Decimal::ONE_HUNDRED)?
        .checked_add(Decimal::ONE)?;
    Some((unit_cost, unit_cost.checked_mul(markup)?))
}

fn line_total(unit_price: Decimal, quantity: u32) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity)).map(round_total)
}

/// Price `quantity` units against a variant's tiers.
pub fn compute_tier_price(quantity: u32, tiers: &[PricingTier]) -> TierQuote {
    let matched = tiers.iter().any(|t| t.contains(quantity));
    let tier = match select_tier(quantity, tiers) {
        Some(t) => t,
        None => {
            log::debug!("pricing: no tiers available for quantity {quantity}");
            return TierQuote::unavailable(quantity);
        }
    };

    let priced = unit_prices(tier)
        .and_then(|(cost, price)| Some((cost, price, line_total(price, quantity)?)));
    let (unit_cost, unit_price, total_ht) = match priced {
        Some(p) => p,
        None => {
            log::warn!(
                "pricing: tier (min {}) cannot be priced for quantity {quantity}",
                tier.min_quantity
            );
            return TierQuote::unavailable(quantity);
        }
    };

    let status = if matched {
        PricingStatus::Matched
    } else {
        log::debug!(
            "pricing: quantity {quantity} outside every band, using last tier (min {})",
            tier.min_quantity
        );
        PricingStatus::FallbackToLastTier
    };

    TierQuote {
        quantity,
        tier: Some(tier.clone()),
        unit_supplier_cost: round_unit(unit_cost),
        unit_selling_price: round_unit(unit_price),
        total_ht,
        status,
    }
}

/// Full price-break table for a variant, one row per tier.
/// Tiers that cannot be priced are skipped.
pub fn price_break_table(tiers: &[PricingTier]) -> Vec<PriceBreak> {
    tiers
        .iter()
        .filter_map(|tier| {
            let (_, unit_price) = unit_prices(tier)?;
            Some(PriceBreak {
                min_quantity: tier.min_quantity,
                max_quantity: tier.max_quantity,
                unit_selling_price: round_unit(unit_price),
                total_ht: line_total(unit_price, tier.min_quantity)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn tier(min: u32, max: Option<u32>, cost: &str, margin: &str) -> PricingTier {
        PricingTier {
            min_quantity: min,
            max_quantity: max,
            supplier_cost: Decimal::from_str(cost).unwrap(),
            margin_percent: Decimal::from_str(margin).unwrap(),
        }
    }

    #[test]
    fn empty_tiers_are_unavailable() {
        let quote = compute_tier_price(10, &[]);
        assert_eq!(quote.status, PricingStatus::Unavailable);
        assert_eq!(quote.total_ht, Decimal::ZERO);
        assert_eq!(quote.status.warning(), Some("Configuration non disponible"));
    }

    #[test]
    fn zero_minimum_tier_is_unavailable() {
        let tiers = vec![tier(0, None, "5", "50")];
        assert_eq!(compute_tier_price(3, &tiers).status, PricingStatus::Unavailable);
        assert!(price_break_table(&tiers).is_empty());
    }

    #[test]
    fn out_of_range_cost_is_unavailable() {
        let tiers = vec![PricingTier {
            min_quantity: 1,
            max_quantity: None,
            supplier_cost: Decimal::MAX,
            margin_percent: Decimal::from(50),
        }];
        let quote = compute_tier_price(2, &tiers);
        assert_eq!(quote.status, PricingStatus::Unavailable);
        assert_eq!(quote.total_ht, Decimal::ZERO);
        assert!(price_break_table(&tiers).is_empty());
    }

    #[test]
    fn huge_quantity_overflowing_total_is_unavailable() {
        let tiers = vec![PricingTier {
            min_quantity: 1,
            max_quantity: None,
            supplier_cost: Decimal::MAX / Decimal::from(1000),
            margin_percent: Decimal::ZERO,
        }];
        assert_eq!(compute_tier_price(1, &tiers).status, PricingStatus::Matched);
        assert_eq!(compute_tier_price(u32::MAX, &tiers).status, PricingStatus::Unavailable);
    }

    #[test]
    fn quantity_above_closed_last_band_falls_back() {
        let tiers = vec![tier(50, Some(99), "4.50", "60"), tier(100, Some(249), "7.20", "55")];
        let quote = compute_tier_price(500, &tiers);
        assert_eq!(quote.status, PricingStatus::FallbackToLastTier);
        assert_eq!(quote.tier.unwrap().min_quantity, 100);
    }

    #[test]
    fn price_break_rows_follow_tiers() {
        let tiers = vec![tier(50, Some(99), "4.50", "60"), tier(100, None, "7.20", "55")];
        let table = price_break_table(&tiers);
        assert_eq!(table.len(), 2);
        // 4.50 / 50 * 1.60 = 0.144
        assert_eq!(table[0].unit_selling_price, Decimal::from_str("0.144").unwrap());
        assert_eq!(table[0].total_ht, Decimal::from_str("7.20").unwrap());
        assert_eq!(table[1].max_quantity, None);
    }
}
