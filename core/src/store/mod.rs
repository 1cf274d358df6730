//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! Calculators never touch it; checkout reaches it through `CartStore`.

use crate::error::ShopResult;
use rusqlite::Connection;

mod cart;
mod charge;

pub const DEFAULT_CART_ID: &str = "default";

pub struct ShopStore {
    conn:    Connection,
    cart_id: String,
}

impl ShopStore {
    /// Open (or create) the shop database at `path`.
    pub fn open(path: &str) -> ShopResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL only applies to real files; in-memory databases ignore it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            cart_id: DEFAULT_CART_ID.to_string(),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ShopResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            cart_id: DEFAULT_CART_ID.to_string(),
        })
    }

    /// Scope cart and order reads/writes to one visitor's cart.
    pub fn with_cart(mut self, cart_id: &str) -> Self {
        self.cart_id = cart_id.to_string();
        self
    }

    pub fn cart_id(&self) -> &str {
        &self.cart_id
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ShopResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_shop.sql"))?;
        Ok(())
    }
}
