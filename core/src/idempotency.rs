//! Idempotency keys for payment-charge requests.
//!
//! RULE: one fresh key per logical charge attempt. A retry of the same
//! attempt reuses its key; a new attempt never does. Deduplication is
//! the payment processor's job (stood in for by `ShopStore::record_charge`).

use crate::types::{EntityId, Money};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a key received from a caller (e.g. a retried request).
    pub fn from_existing(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub key:      IdempotencyKey,
    pub order_id: EntityId,
    pub amount:   Money,
    pub currency: String,
}

impl ChargeRequest {
    /// A new charge attempt for `order_id`, with its own key.
    pub fn new(order_id: &str, amount: Money) -> Self {
        Self::with_key(IdempotencyKey::generate(), order_id, amount)
    }

    /// Rebuild a request under a key the caller already holds, e.g. one
    /// echoed back by a client resending after a lost response.
    pub fn with_key(key: IdempotencyKey, order_id: &str, amount: Money) -> Self {
        Self {
            key,
            order_id: order_id.to_string(),
            amount,
            currency: "EUR".into(),
        }
    }

    /// Same attempt, re-sent after a timeout or network failure.
    pub fn retry(&self) -> Self {
        self.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeOutcome {
    Accepted,
    Duplicate,
}
