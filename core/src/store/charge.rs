use super::ShopStore;
use crate::{
    error::ShopResult,
    idempotency::{ChargeOutcome, ChargeRequest},
};
use rusqlite::params;

impl ShopStore {
    // ── Charge attempts ───────────────────────────────────────────

    /// Record a charge attempt. A key already seen is a retry: it is
    /// counted but never charged twice.
    pub fn record_charge(&self, req: &ChargeRequest) -> ShopResult<ChargeOutcome> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO charge_attempt (idempotency_key, order_id, amount, currency)
             VALUES (?1, ?2, ?3, ?4)",
            params![req.key.as_str(), &req.order_id, req.amount.to_string(), &req.currency],
        )?;

        if inserted == 1 {
            log::info!("charge: {} accepted for order {} ({} {})",
                req.key, req.order_id, req.amount, req.currency);
            return Ok(ChargeOutcome::Accepted);
        }

        self.conn.execute(
            "UPDATE charge_attempt SET attempts = attempts + 1 WHERE idempotency_key = ?1",
            params![req.key.as_str()],
        )?;
        log::warn!("charge: duplicate attempt {} for order {}", req.key, req.order_id);
        Ok(ChargeOutcome::Duplicate)
    }

    /// Number of times `key` was submitted, 0 if never.
    pub fn charge_attempts(&self, key: &str) -> ShopResult<i64> {
        let mut stmt = self.conn.prepare(
            "SELECT attempts FROM charge_attempt WHERE idempotency_key = ?1",
        )?;
        let attempts = stmt
            .query_map(params![key], |row| row.get::<_, i64>(0))?
            .next()
            .transpose()?
            .unwrap_or(0);
        Ok(attempts)
    }

    /// Number of distinct charges accepted for `order_id`.
    pub fn charges_for_order(&self, order_id: &str) -> ShopResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM charge_attempt WHERE order_id = ?1",
            params![order_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
