use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Quantity of '{name}' exceeds the maximum per line")]
    QuantityOverflow { name: String },

    #[error("Order amount out of range")]
    AmountOutOfRange,

    #[error("Product '{product_id}' not found")]
    ProductNotFound { product_id: String },

    #[error("Variant '{variant_id}' not found on product '{product_id}'")]
    VariantNotFound { product_id: String, variant_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ShopResult<T> = Result<T, ShopError>;
