use super::ShopStore;
use crate::{
    cart::{CartItem, CartStore, Order},
    error::ShopResult,
};
use rusqlite::{params, OptionalExtension};

impl ShopStore {
    // ── Orders ────────────────────────────────────────────────────

    pub fn order(&self, order_id: &str) -> ShopResult<Option<Order>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM shop_order WHERE order_id = ?1",
                params![order_id],
                |row| row.get(0),
            )
            .optional()?;
        match payload {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }

    pub fn order_count(&self) -> ShopResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM shop_order WHERE cart_id = ?1",
            params![self.cart_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl CartStore for ShopStore {
    fn get(&self) -> ShopResult<Vec<CartItem>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT items_json FROM cart WHERE cart_id = ?1",
                params![self.cart_id],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(j) => Ok(serde_json::from_str(&j)?),
            None => Ok(Vec::new()),
        }
    }

    fn set(&mut self, items: &[CartItem]) -> ShopResult<()> {
        let json = serde_json::to_string(items)?;
        self.conn.execute(
            "INSERT INTO cart (cart_id, items_json) VALUES (?1, ?2)
             ON CONFLICT(cart_id) DO UPDATE SET items_json = excluded.items_json",
            params![self.cart_id, json],
        )?;
        Ok(())
    }

    fn commit_order(&mut self, order: &Order) -> ShopResult<()> {
        let payload = serde_json::to_string(order)?;
        // Dropping `tx` before commit rolls both statements back.
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO cart (cart_id, items_json) VALUES (?1, '[]')
             ON CONFLICT(cart_id) DO UPDATE SET items_json = excluded.items_json",
            params![&self.cart_id],
        )?;
        tx.execute(
            "INSERT INTO shop_order (order_id, cart_id, created_at, subtotal_ht, total_ttc, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &order.order_id,
                &self.cart_id,
                order.created_at.to_rfc3339(),
                order.subtotal_ht.to_string(),
                order.total_ttc.to_string(),
                payload,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn last_order(&self) -> ShopResult<Option<Order>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM shop_order WHERE cart_id = ?1
                 ORDER BY rowid DESC LIMIT 1",
                params![self.cart_id],
                |row| row.get(0),
            )
            .optional()?;
        match payload {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }
}
