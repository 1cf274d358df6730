//! Quote builder: one-time and monthly lines for a client proposal.

use crate::{
    tier_pricing::round_total,
    types::Money,
    vat::{Customer, VatNumberStatus, VatResult, VatSettings},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    OneTime,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub label:    String,
    /// Unit amount HT.
    pub amount:   Money,
    #[serde(default = "one")]
    pub quantity: u32,
    pub kind:     LineKind,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteTotals {
    pub one_time: VatResult,
    pub monthly:  VatResult,
}

impl Quote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn one_time(mut self, label: &str, amount: Money) -> Self {
        self.lines.push(QuoteLine {
            label: label.to_string(),
            amount,
            quantity: 1,
            kind: LineKind::OneTime,
        });
        self
    }

    pub fn monthly(mut self, label: &str, amount: Money) -> Self {
        self.lines.push(QuoteLine {
            label: label.to_string(),
            amount,
            quantity: 1,
            kind: LineKind::Monthly,
        });
        self
    }

    /// HT sum of the lines of one kind, rounded to cents.
    /// None when the sum leaves Decimal's range.
    pub fn subtotal(&self, kind: LineKind) -> Option<Money> {
        self.lines
            .iter()
            .filter(|l| l.kind == kind)
            .try_fold(Decimal::ZERO, |acc, l| {
                acc.checked_add(l.amount.checked_mul(Decimal::from(l.quantity))?)
            })
            .map(round_total)
    }

    pub fn totals(&self, settings: &VatSettings, customer: &Customer) -> QuoteTotals {
        let side = |kind| match self.subtotal(kind) {
            Some(ht) => settings.compute(ht, customer),
            None => VatResult::out_of_range(Decimal::ZERO, VatNumberStatus::Missing),
        };
        QuoteTotals {
            one_time: side(LineKind::OneTime),
            monthly:  side(LineKind::Monthly),
        }
    }
}
