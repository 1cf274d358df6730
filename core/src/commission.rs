//! Commission calculator: RIVEGO billing dashboard.
//!
//! Each client is billed under exactly one commission mode. The raw
//! settings stored per client are loose (every field optional); they are
//! resolved into a `CommissionConfig` once, with documented defaults,
//! before any arithmetic happens.

use crate::{
    tier_pricing::round_total,
    types::{EntityId, Money},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CommissionConfig {
    /// Flat `base_fee` below `threshold`, percentage of revenue above it.
    Hybrid {
        base_fee:  Money,
        percent:   Decimal,
        threshold: Money,
    },
    LegacyPercent {
        percent: Decimal,
    },
    LegacyFixed {
        fixed_amount: Money,
    },
}

impl CommissionConfig {
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::Hybrid { .. }        => "hybrid",
            Self::LegacyPercent { .. } => "legacy_percent",
            Self::LegacyFixed { .. }   => "legacy_fixed",
        }
    }
}

/// Fallback values used when a client's stored settings are incomplete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionDefaults {
    pub base_fee:    Money,
    pub percent:     Decimal,
    pub threshold:   Money,
    /// Flat monthly add-on for clients hosted by us.
    pub hosting_fee: Money,
}

impl Default for CommissionDefaults {
    fn default() -> Self {
        Self {
            base_fee:    Decimal::from(60),
            percent:     Decimal::from(6),
            threshold:   Decimal::from(1000),
            hosting_fee: Decimal::from(25),
        }
    }
}

/// Commission settings as stored on a client record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommissionSettings {
    #[serde(default, rename = "commission_mode")]
    pub mode:         Option<String>,
    #[serde(default)]
    pub base_fee:     Option<Money>,
    #[serde(default)]
    pub percent:      Option<Decimal>,
    #[serde(default)]
    pub threshold:    Option<Money>,
    #[serde(default)]
    pub fixed_amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCommission {
    pub config:   CommissionConfig,
    pub warnings: Vec<String>,
}

impl CommissionSettings {
    /// Turn loose settings into a single mode. Never fails: every missing
    /// field is replaced from `defaults` and noted in `warnings`.
    pub fn resolve(&self, defaults: &CommissionDefaults) -> ResolvedCommission {
        let mut warnings = Vec::new();
        let mode = match self.mode.as_deref() {
            Some(m @ ("hybrid" | "legacy_percent" | "legacy_fixed")) => m,
            Some(unknown) => {
                warnings.push(format!("unknown mode '{unknown}', using hybrid"));
                "hybrid"
            }
            None => {
                warnings.push("mode missing, using hybrid".to_string());
                "hybrid"
            }
        };

        let mut pick = |value: Option<Decimal>, fallback: Decimal, field: &str| {
            value.unwrap_or_else(|| {
                warnings.push(format!("{field} missing, using default {fallback}"));
                fallback
            })
        };

        let config = match mode {
            "legacy_percent" => CommissionConfig::LegacyPercent {
                percent: pick(self.percent, defaults.percent, "percent"),
            },
            "legacy_fixed" => CommissionConfig::LegacyFixed {
                fixed_amount: pick(self.fixed_amount, defaults.base_fee, "fixed_amount"),
            },
            _ => CommissionConfig::Hybrid {
                base_fee:  pick(self.base_fee, defaults.base_fee, "base_fee"),
                percent:   pick(self.percent, defaults.percent, "percent"),
                threshold: pick(self.threshold, defaults.threshold, "threshold"),
            },
        };

        ResolvedCommission { config, warnings }
    }
}

impl From<&CommissionConfig> for CommissionSettings {
    /// Switching modes keeps only the active mode's parameters.
    fn from(config: &CommissionConfig) -> Self {
        let mode = Some(config.mode_name().to_string());
        match *config {
            CommissionConfig::Hybrid { base_fee, percent, threshold } => Self {
                mode,
                base_fee: Some(base_fee),
                percent: Some(percent),
                threshold: Some(threshold),
                fixed_amount: None,
            },
            CommissionConfig::LegacyPercent { percent } => Self {
                mode,
                percent: Some(percent),
                ..Self::default()
            },
            CommissionConfig::LegacyFixed { fixed_amount } => Self {
                mode,
                fixed_amount: Some(fixed_amount),
                ..Self::default()
            },
        }
    }
}

pub const COMMISSION_OUT_OF_RANGE: &str = "commission out of range, billed as 0";

fn percent_of(amount: Money, percent: Decimal) -> Option<Money> {
    amount.checked_mul(percent)?.checked_div(Decimal::ONE_HUNDRED)
}

/// Commission owed for one month of `monthly_revenue`, or None when the
/// amount falls outside Decimal's range.
///
/// Hybrid above threshold rounds to whole euros, not cents.
pub fn checked_commission(config: &CommissionConfig, monthly_revenue: Money) -> Option<Money> {
    match *config {
        CommissionConfig::Hybrid { base_fee, percent, threshold } => {
            if monthly_revenue < threshold {
                Some(base_fee)
            } else {
                percent_of(monthly_revenue, percent)
                    .map(|c| c.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            }
        }
        CommissionConfig::LegacyPercent { percent } => {
            percent_of(monthly_revenue, percent).map(round_total)
        }
        CommissionConfig::LegacyFixed { fixed_amount } => Some(fixed_amount),
    }
}

/// Commission owed for one month of `monthly_revenue`.
///
/// An out-of-range amount yields zero; see `checked_commission`.
pub fn compute_commission(config: &CommissionConfig, monthly_revenue: Money) -> Money {
    checked_commission(config, monthly_revenue).unwrap_or_else(|| {
        log::warn!("commission: {} on {monthly_revenue} out of range", config.mode_name());
        Decimal::ZERO
    })
}

/// A client record as fetched by the billing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientBilling {
    pub client_id:       EntityId,
    pub name:            String,
    #[serde(default)]
    pub commission:      CommissionSettings,
    #[serde(default)]
    pub has_hosting:     bool,
    #[serde(default)]
    pub monthly_revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingLine {
    pub client_id:       EntityId,
    pub name:            String,
    pub mode:            String,
    pub monthly_revenue: Money,
    pub commission:      Money,
    pub hosting:         Money,
    pub total_due:       Money,
    pub warnings:        Vec<String>,
}

/// Commission plus the flat hosting add-on, for one client.
pub fn client_total_due(client: &ClientBilling, defaults: &CommissionDefaults) -> BillingLine {
    let ResolvedCommission { config, mut warnings } = client.commission.resolve(defaults);
    let hosting = if client.has_hosting {
        defaults.hosting_fee
    } else {
        Decimal::ZERO
    };

    let (commission, total_due) = match checked_commission(&config, client.monthly_revenue)
        .and_then(|c| Some((c, c.checked_add(hosting)?)))
    {
        Some(amounts) => amounts,
        None => {
            log::warn!("commission: client {} out of range", client.client_id);
            warnings.push(COMMISSION_OUT_OF_RANGE.to_string());
            (Decimal::ZERO, hosting)
        }
    };

    for w in &warnings {
        log::debug!("commission: client {}: {w}", client.client_id);
    }

    BillingLine {
        client_id: client.client_id.clone(),
        name: client.name.clone(),
        mode: config.mode_name().to_string(),
        monthly_revenue: client.monthly_revenue,
        commission,
        hosting,
        total_due,
        warnings,
    }
}

/// Dashboard aggregate over every client for one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingReport {
    pub lines:                  Vec<BillingLine>,
    pub total_revenue:          Money,
    pub total_commission:       Money,
    pub total_hosting:          Money,
    pub grand_total:            Money,
    pub hybrid_clients:         usize,
    pub legacy_percent_clients: usize,
    pub legacy_fixed_clients:   usize,
    /// Set once a running total leaves Decimal's range; the totals then
    /// stop accumulating and must not be trusted.
    #[serde(default)]
    pub totals_overflowed:      bool,
}

impl BillingReport {
    fn accumulate(&mut self, line: &BillingLine) -> Option<()> {
        let revenue = self.total_revenue.checked_add(line.monthly_revenue)?;
        let commission = self.total_commission.checked_add(line.commission)?;
        let hosting = self.total_hosting.checked_add(line.hosting)?;
        let grand = self.grand_total.checked_add(line.total_due)?;
        self.total_revenue = revenue;
        self.total_commission = commission;
        self.total_hosting = hosting;
        self.grand_total = grand;
        Some(())
    }

    pub fn build(clients: &[ClientBilling], defaults: &CommissionDefaults) -> Self {
        let mut report = Self::default();
        for client in clients {
            let line = client_total_due(client, defaults);
            if !report.totals_overflowed && report.accumulate(&line).is_none() {
                log::warn!("commission: report totals out of range at client {}", line.client_id);
                report.totals_overflowed = true;
            }
            match line.mode.as_str() {
                "hybrid"         => report.hybrid_clients += 1,
                "legacy_percent" => report.legacy_percent_clients += 1,
                _                => report.legacy_fixed_clients += 1,
            }
            report.lines.push(line);
        }
        log::info!(
            "commission: report over {} clients, grand total {}",
            report.lines.len(),
            report.grand_total
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_resolve_to_default_hybrid() {
        let resolved = CommissionSettings::default().resolve(&CommissionDefaults::default());
        assert_eq!(
            resolved.config,
            CommissionConfig::Hybrid {
                base_fee:  Decimal::from(60),
                percent:   Decimal::from(6),
                threshold: Decimal::from(1000),
            }
        );
        assert_eq!(resolved.warnings.len(), 4);
    }

    #[test]
    fn switching_mode_drops_other_parameters() {
        let config = CommissionConfig::LegacyFixed { fixed_amount: Decimal::from(90) };
        let settings = CommissionSettings::from(&config);
        assert_eq!(settings.mode.as_deref(), Some("legacy_fixed"));
        assert!(settings.base_fee.is_none());
        assert!(settings.percent.is_none());
        assert!(settings.threshold.is_none());
    }

    #[test]
    fn huge_revenue_bills_zero_commission() {
        let config = CommissionConfig::LegacyPercent { percent: Decimal::from(6) };
        assert_eq!(checked_commission(&config, Decimal::MAX), None);
        assert_eq!(compute_commission(&config, Decimal::MAX), Decimal::ZERO);

        let hybrid = CommissionConfig::Hybrid {
            base_fee:  Decimal::from(60),
            percent:   Decimal::from(6),
            threshold: Decimal::from(1000),
        };
        assert_eq!(compute_commission(&hybrid, Decimal::MAX), Decimal::ZERO);
    }

    #[test]
    fn out_of_range_client_is_flagged_not_panicking() {
        let client = ClientBilling {
            client_id:       "c-big".into(),
            name:            "Big".into(),
            commission:      CommissionSettings {
                mode: Some("legacy_percent".into()),
                percent: Some(Decimal::from(6)),
                ..CommissionSettings::default()
            },
            has_hosting:     true,
            monthly_revenue: Decimal::MAX,
        };
        let line = client_total_due(&client, &CommissionDefaults::default());
        assert_eq!(line.commission, Decimal::ZERO);
        assert_eq!(line.total_due, Decimal::from(25));
        assert!(line.warnings.iter().any(|w| w == COMMISSION_OUT_OF_RANGE));

        let report = BillingReport::build(&[client.clone(), client], &CommissionDefaults::default());
        assert!(report.totals_overflowed);
        assert_eq!(report.total_revenue, Decimal::MAX);
        assert_eq!(report.legacy_percent_clients, 2);
    }

    #[test]
    fn config_serializes_with_mode_tag() {
        let config = CommissionConfig::LegacyPercent { percent: Decimal::from(5) };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["mode"], "legacy_percent");
    }
}
