use crate::{
    catalog::{Catalog, PricingTier, Product, Variant},
    commission::CommissionDefaults,
    vat::VatSettings,
};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
struct BillingConfigFile {
    vat:        VatSettings,
    commission: CommissionDefaults,
}

#[derive(Debug, Clone)]
pub struct ShopConfig {
    pub catalog:    Catalog,
    pub vat:        VatSettings,
    pub commission: CommissionDefaults,
}

impl ShopConfig {
    /// Load from the data/ directory.
    /// In tests, use ShopConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let product_path = format!("{data_dir}/products/products.json");
        let product_content = std::fs::read_to_string(&product_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {product_path}: {e}"))?;
        let catalog = Catalog::from_json(&product_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {product_path}: {e}"))?;

        let billing_path = format!("{data_dir}/billing/billing_config.json");
        let billing_content = std::fs::read_to_string(&billing_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {billing_path}: {e}"))?;
        let billing: BillingConfigFile = serde_json::from_str(&billing_content)?;

        log::info!(
            "config: loaded {} products, VAT {}% ({})",
            catalog.products.len(),
            billing.vat.standard_rate,
            billing.vat.seller_country
        );

        Ok(Self {
            catalog,
            vat: billing.vat,
            commission: billing.commission,
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let flyers = Product {
            id: "flyers".into(),
            name: "Flyers".into(),
            category: "print".into(),
            variants: vec![Variant {
                id: "a5-135g".into(),
                label: "A5 135g couché".into(),
                pricing_tiers: vec![
                    PricingTier {
                        min_quantity:   50,
                        max_quantity:   Some(99),
                        supplier_cost:  Decimal::new(450, 2),
                        margin_percent: Decimal::from(60),
                    },
                    PricingTier {
                        min_quantity:   100,
                        max_quantity:   Some(249),
                        supplier_cost:  Decimal::new(720, 2),
                        margin_percent: Decimal::from(55),
                    },
                    PricingTier {
                        min_quantity:   250,
                        max_quantity:   None,
                        supplier_cost:  Decimal::new(1500, 2),
                        margin_percent: Decimal::from(50),
                    },
                ],
            }],
        };

        let cards = Product {
            id: "business-cards".into(),
            name: "Cartes de visite".into(),
            category: "print".into(),
            variants: vec![Variant {
                id: "standard".into(),
                label: "85x55 350g".into(),
                pricing_tiers: vec![],
            }],
        };

        Self {
            catalog: Catalog::new(vec![flyers, cards]),
            vat: VatSettings::default(),
            commission: CommissionDefaults::default(),
        }
    }
}
