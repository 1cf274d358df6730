//! VAT calculator: Luxembourg-seller perspective.
//!
//! Three outcomes only:
//!   - reverse charge (EU company outside LU with a well-formed VAT number)
//!   - customer responsibility (private buyer outside LU handling VAT)
//!   - standard rate for everything else
//!
//! A malformed VAT number never blocks a sale. It is reported as
//! `InvalidFormat` and the customer is charged the standard rate.

use crate::{
    tier_pricing::round_total,
    types::{CountryCode, Money},
};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    Private,
    Company,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub country:              CountryCode,
    #[serde(default)]
    pub vat_number:           Option<String>,
    pub customer_type:        CustomerType,
    #[serde(default)]
    pub customer_handles_vat: bool,
}

impl Customer {
    pub fn private(country: &str) -> Self {
        Self {
            country: country.to_string(),
            vat_number: None,
            customer_type: CustomerType::Private,
            customer_handles_vat: false,
        }
    }

    pub fn company(country: &str, vat_number: &str) -> Self {
        Self {
            country: country.to_string(),
            vat_number: Some(vat_number.to_string()),
            customer_type: CustomerType::Company,
            customer_handles_vat: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatNumberStatus {
    Missing,
    Valid,
    InvalidFormat,
}

impl VatNumberStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Missing       => "",
            Self::Valid         => "Format valide",
            Self::InvalidFormat => "Format invalide",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatResult {
    pub vat_label:               String,
    /// Applied rate in percent (17 or 0).
    pub vat_rate:                Decimal,
    pub vat_amount:              Money,
    pub amount_ht:               Money,
    pub amount_ttc:              Money,
    pub reverse_charge:          bool,
    pub customer_responsibility: bool,
    pub vat_number_status:       VatNumberStatus,
    /// Set when the amounts could not be computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning:                 Option<String>,
}

pub const AMOUNT_OUT_OF_RANGE: &str = "Montant hors limites";

impl VatResult {
    /// Degraded result for an amount too large to tax. No VAT is charged
    /// and `warning` is set; callers must not invoice it as is.
    pub fn out_of_range(amount_ht: Money, vat_number_status: VatNumberStatus) -> Self {
        log::warn!("vat: amount {amount_ht} out of range, VAT not computed");
        Self {
            vat_label: "TVA non calculée".into(),
            vat_rate: Decimal::ZERO,
            vat_amount: Decimal::ZERO,
            amount_ht,
            amount_ttc: amount_ht,
            reverse_charge: false,
            customer_responsibility: false,
            vat_number_status,
            warning: Some(AMOUNT_OUT_OF_RANGE.to_string()),
        }
    }
}

/// Seller-side VAT parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatSettings {
    pub seller_country: CountryCode,
    /// Standard rate in percent.
    pub standard_rate:  Decimal,
}

impl Default for VatSettings {
    fn default() -> Self {
        Self {
            seller_country: "LU".into(),
            standard_rate:  Decimal::from(17),
        }
    }
}

// Body patterns, prefix stripped. Greece uses "EL" on VAT numbers.
static VAT_PATTERNS: Lazy<HashMap<&'static str, (&'static str, Regex)>> = Lazy::new(|| {
    [
        ("AT", "AT", r"U\d{8}"),
        ("BE", "BE", r"[01]\d{9}"),
        ("BG", "BG", r"\d{9,10}"),
        ("CY", "CY", r"\d{8}[A-Z]"),
        ("CZ", "CZ", r"\d{8,10}"),
        ("DE", "DE", r"\d{9}"),
        ("DK", "DK", r"\d{8}"),
        ("EE", "EE", r"\d{9}"),
        ("GR", "EL", r"\d{9}"),
        ("ES", "ES", r"[A-Z0-9]\d{7}[A-Z0-9]"),
        ("FI", "FI", r"\d{8}"),
        ("FR", "FR", r"[0-9A-Z]{2}\d{9}"),
        ("HR", "HR", r"\d{11}"),
        ("HU", "HU", r"\d{8}"),
        ("IE", "IE", r"\d{7}[A-W][A-I]?|\d[A-Z+*]\d{5}[A-W]"),
        ("IT", "IT", r"\d{11}"),
        ("LT", "LT", r"\d{9}|\d{12}"),
        ("LU", "LU", r"\d{8}"),
        ("LV", "LV", r"\d{11}"),
        ("MT", "MT", r"\d{8}"),
        ("NL", "NL", r"\d{9}B\d{2}"),
        ("PL", "PL", r"\d{10}"),
        ("PT", "PT", r"\d{9}"),
        ("RO", "RO", r"\d{2,10}"),
        ("SE", "SE", r"\d{10}01"),
        ("SI", "SI", r"\d{8}"),
        ("SK", "SK", r"\d{10}"),
    ]
    .into_iter()
    .map(|(country, prefix, body)| {
        let re = Regex::new(&format!("^(?:{body})$")).expect("static VAT pattern");
        (country, (prefix, re))
    })
    .collect()
});

fn has_foreign_prefix(cleaned: &str) -> bool {
    let lead = cleaned.get(..2).unwrap_or("");
    lead.chars().all(|c| c.is_ascii_alphabetic())
        && VAT_PATTERNS.values().any(|(prefix, _)| *prefix == lead)
}

fn normalize_country(country: &str) -> String {
    country.trim().to_ascii_uppercase()
}

/// Check a VAT number's format against its country's pattern.
///
/// Spaces, dots and dashes are ignored. The country's own prefix is
/// optional; a number carrying another member state's prefix is invalid.
/// No online (VIES) check is performed.
pub fn validate_vat_number(country: &str, vat_number: Option<&str>) -> VatNumberStatus {
    let raw = match vat_number {
        Some(n) if !n.trim().is_empty() => n,
        _ => return VatNumberStatus::Missing,
    };

    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '-')
        .collect::<String>()
        .to_ascii_uppercase();

    let country = normalize_country(country);
    let Some((prefix, re)) = VAT_PATTERNS.get(country.as_str()) else {
        return VatNumberStatus::InvalidFormat;
    };

    let body = match cleaned.strip_prefix(prefix) {
        Some(rest) => rest,
        // Another member state's prefix never validates here.
        None if has_foreign_prefix(&cleaned) => return VatNumberStatus::InvalidFormat,
        None => cleaned.as_str(),
    };
    if re.is_match(body) {
        VatNumberStatus::Valid
    } else {
        VatNumberStatus::InvalidFormat
    }
}

impl VatSettings {
    /// Determine VAT treatment for `amount_ht` sold to `customer`.
    pub fn compute(&self, amount_ht: Money, customer: &Customer) -> VatResult {
        let domestic = normalize_country(&customer.country) == normalize_country(&self.seller_country);
        let number_status = validate_vat_number(&customer.country, customer.vat_number.as_deref());

        if !domestic
            && customer.customer_type == CustomerType::Company
            && number_status == VatNumberStatus::Valid
        {
            return self.zero_rated(
                amount_ht,
                "TVA autoliquidation (0%)",
                true,
                false,
                number_status,
            );
        }

        if !domestic
            && customer.customer_type == CustomerType::Private
            && customer.customer_handles_vat
        {
            return self.zero_rated(
                amount_ht,
                "TVA à la charge du client (0%)",
                false,
                true,
                number_status,
            );
        }

        if number_status == VatNumberStatus::InvalidFormat {
            log::debug!(
                "vat: {} number for {} has invalid format, applying standard rate",
                customer.country,
                match customer.customer_type {
                    CustomerType::Company => "company",
                    CustomerType::Private => "private customer",
                }
            );
        }

        let amounts = amount_ht
            .checked_mul(self.standard_rate)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .map(round_total)
            .and_then(|vat| Some((vat, amount_ht.checked_add(vat)?)));
        let Some((vat_amount, amount_ttc)) = amounts else {
            return VatResult::out_of_range(amount_ht, number_status);
        };

        VatResult {
            vat_label: format!("TVA {}%", self.standard_rate.normalize()),
            vat_rate: self.standard_rate,
            vat_amount,
            amount_ht,
            amount_ttc,
            reverse_charge: false,
            customer_responsibility: false,
            vat_number_status: number_status,
            warning: None,
        }
    }

    fn zero_rated(
        &self,
        amount_ht: Money,
        label: &str,
        reverse_charge: bool,
        customer_responsibility: bool,
        vat_number_status: VatNumberStatus,
    ) -> VatResult {
        VatResult {
            vat_label: label.to_string(),
            vat_rate: Decimal::ZERO,
            vat_amount: Decimal::ZERO,
            amount_ht,
            amount_ttc: amount_ht,
            reverse_charge,
            customer_responsibility,
            vat_number_status,
            warning: None,
        }
    }
}

/// `VatSettings::compute` with the default Luxembourg settings.
pub fn compute_vat(amount_ht: Money, customer: &Customer) -> VatResult {
    VatSettings::default().compute(amount_ht, customer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vat_number_normalization() {
        assert_eq!(validate_vat_number("LU", Some("LU 1234.5678")), VatNumberStatus::Valid);
        assert_eq!(validate_vat_number("lu", Some("12345678")), VatNumberStatus::Valid);
        assert_eq!(validate_vat_number("BE", Some("be-0123456789")), VatNumberStatus::Valid);
        assert_eq!(validate_vat_number("GR", Some("EL123456789")), VatNumberStatus::Valid);
        assert_eq!(validate_vat_number("NL", Some("NL123456789B01")), VatNumberStatus::Valid);
    }

    #[test]
    fn vat_number_rejections() {
        assert_eq!(validate_vat_number("FR", None), VatNumberStatus::Missing);
        assert_eq!(validate_vat_number("FR", Some("   ")), VatNumberStatus::Missing);
        assert_eq!(validate_vat_number("FR", Some("FR123")), VatNumberStatus::InvalidFormat);
        assert_eq!(validate_vat_number("FR", Some("DE123456789")), VatNumberStatus::InvalidFormat);
        assert_eq!(validate_vat_number("US", Some("123456789")), VatNumberStatus::InvalidFormat);
        assert_eq!(validate_vat_number("FR", Some("EL123456789")), VatNumberStatus::InvalidFormat);
    }

    #[test]
    fn bare_french_body_with_letter_key_is_valid() {
        // "AB" is not a member-state prefix, so it is read as the FR key.
        assert_eq!(validate_vat_number("FR", Some("AB123456789")), VatNumberStatus::Valid);
        assert_eq!(validate_vat_number("FR", Some("FRAB123456789")), VatNumberStatus::Valid);
    }

    #[test]
    fn huge_amount_degrades_instead_of_panicking() {
        let result = compute_vat(Decimal::MAX, &Customer::private("LU"));
        assert_eq!(result.warning.as_deref(), Some(AMOUNT_OUT_OF_RANGE));
        assert_eq!(result.vat_amount, Decimal::ZERO);
        assert_eq!(result.amount_ttc, Decimal::MAX);
    }

    #[test]
    fn label_uses_plain_rate() {
        let result = compute_vat(Decimal::from(10), &Customer::private("LU"));
        assert_eq!(result.vat_label, "TVA 17%");
        assert_eq!(VatNumberStatus::InvalidFormat.label(), "Format invalide");
    }
}
