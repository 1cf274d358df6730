//! Product catalog: the static `products.json` the configurator reads.
//!
//! RULE: catalog data is loaded once and never mutated.
//! Tiers within a variant are ordered ascending by min_quantity.

use crate::{
    error::{ShopError, ShopResult},
    types::Money,
};
use serde::{Deserialize, Serialize};

/// One quantity band of a variant.
///
/// `supplier_cost` is the TOTAL supplier cost for producing
/// `min_quantity` units, not a per-unit cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTier {
    pub min_quantity:   u32,
    #[serde(default)]
    pub max_quantity:   Option<u32>,
    pub supplier_cost:  Money,
    pub margin_percent: Money,
}

impl PricingTier {
    /// True if `quantity` falls inside this tier's band.
    pub fn contains(&self, quantity: u32) -> bool {
        quantity >= self.min_quantity
            && self.max_quantity.map_or(true, |max| quantity <= max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id:            String,
    pub label:         String,
    #[serde(default)]
    pub pricing_tiers: Vec<PricingTier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id:       String,
    pub name:     String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parse a `products.json` document (a bare JSON array of products).
    pub fn from_json(json: &str) -> ShopResult<Self> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        for product in &products {
            for variant in &product.variants {
                if !tiers_are_ordered(&variant.pricing_tiers) {
                    log::warn!(
                        "catalog: {}/{} has unordered or overlapping tiers",
                        product.id, variant.id
                    );
                }
            }
        }
        Ok(Self { products })
    }

    pub fn product(&self, product_id: &str) -> ShopResult<&Product> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| ShopError::ProductNotFound {
                product_id: product_id.to_string(),
            })
    }

    pub fn variant(&self, product_id: &str, variant_id: &str) -> ShopResult<&Variant> {
        self.product(product_id)?
            .variants
            .iter()
            .find(|v| v.id == variant_id)
            .ok_or_else(|| ShopError::VariantNotFound {
                product_id: product_id.to_string(),
                variant_id: variant_id.to_string(),
            })
    }
}

/// Ascending, non-overlapping, and only the last band open-ended.
pub fn tiers_are_ordered(tiers: &[PricingTier]) -> bool {
    tiers.windows(2).all(|w| match w[0].max_quantity {
        Some(max) => max < w[1].min_quantity && w[0].min_quantity <= max,
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "id": "flyers",
            "name": "Flyers A5",
            "variants": [
                {
                    "id": "a5-135g",
                    "label": "A5 135g",
                    "pricingTiers": [
                        { "minQuantity": 50,  "maxQuantity": 99,   "supplierCost": 4.50, "marginPercent": 60 },
                        { "minQuantity": 100, "maxQuantity": null, "supplierCost": "7.20", "marginPercent": 55 }
                    ]
                }
            ]
        }
    ]"#;

    #[test]
    fn parses_camel_case_catalog() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let variant = catalog.variant("flyers", "a5-135g").unwrap();
        assert_eq!(variant.pricing_tiers.len(), 2);
        assert_eq!(variant.pricing_tiers[1].max_quantity, None);
        assert_eq!(variant.pricing_tiers[1].supplier_cost.to_string(), "7.20");
        assert!(tiers_are_ordered(&variant.pricing_tiers));
    }

    #[test]
    fn unknown_variant_is_an_error() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert!(matches!(
            catalog.variant("flyers", "a4"),
            Err(ShopError::VariantNotFound { .. })
        ));
        assert!(matches!(
            catalog.product("posters"),
            Err(ShopError::ProductNotFound { .. })
        ));
    }
}
