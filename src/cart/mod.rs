//! Per-user shopping carts.
//!
//! `product_id` is the merge key of a cart: adding a product already present
//! increments its quantity instead of adding a second line.

#[cfg(test)]
pub mod memory;
mod repository;
mod service;

pub use repository::*;
pub use service::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Result, ServerError};

/// Largest quantity accepted for a single line of a request.
pub const MAX_QUANTITY: i32 = 9_999;

/// `(product_id, color_id, quantity)` tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CartLine {
    #[validate(length(min = 1, max = 255))]
    pub product_id: String,
    #[validate(length(min = 1, max = 255))]
    pub color_id: String,
    #[validate(range(
        min = 1,
        max = MAX_QUANTITY,
        message = "Quantity must be between 1 and 9999."
    ))]
    pub quantity: i32,
}

/// Cart of a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub user_id_fk: String,
    /// Lines in insertion order.
    pub cart: Vec<CartLine>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Merge `incoming` lines into `lines`.
///
/// Quantities of a known `product_id` are added and the stored color is
/// kept. Unknown products are appended in the order they come.
///
/// `lines` is left untouched when a merged quantity would overflow.
pub fn consolidate(
    lines: &mut Vec<CartLine>,
    incoming: impl IntoIterator<Item = CartLine>,
) -> Result<()> {
    let mut merged = lines.clone();
    for line in incoming {
        match merged.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(|| {
                        ServerError::invalid_field(
                            "quantity",
                            "range",
                            "Quantity is too large.",
                        )
                    })?;
            },
            None => merged.push(line),
        }
    }

    *lines = merged;
    Ok(())
}
