//! In-memory [`CartRepository`] used by tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::cart::{Cart, CartLine, CartRepository, consolidate};
use crate::error::Result;

/// Every mutation runs under one lock, so merges never interleave.
#[derive(Debug, Default)]
pub struct MemoryCartRepository {
    carts: Mutex<HashMap<String, Cart>>,
}

impl MemoryCartRepository {
    fn carts(&self) -> std::sync::MutexGuard<'_, HashMap<String, Cart>> {
        self.carts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CartRepository for MemoryCartRepository {
    async fn find(&self, user_id: &str) -> Result<Option<Cart>> {
        Ok(self.carts().get(user_id).cloned())
    }

    async fn merge(
        &self,
        user_id: &str,
        lines: Vec<CartLine>,
        now: DateTime<Utc>,
    ) -> Result<Cart> {
        let mut carts = self.carts();
        let mut merged = carts
            .get(user_id)
            .map(|cart| cart.cart.clone())
            .unwrap_or_default();
        consolidate(&mut merged, lines)?;

        let cart = carts.entry(user_id.to_owned()).or_insert_with(|| Cart {
            id: uuid::Uuid::new_v4().to_string(),
            user_id_fk: user_id.to_owned(),
            cart: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        cart.cart = merged;
        cart.updated_at = now;

        Ok(cart.clone())
    }

    async fn replace(
        &self,
        user_id: &str,
        lines: Vec<CartLine>,
        now: DateTime<Utc>,
    ) -> Result<Option<Cart>> {
        Ok(self.carts().get_mut(user_id).map(|cart| {
            cart.cart = lines;
            cart.updated_at = now;
            cart.clone()
        }))
    }

    async fn remove_line(&self, user_id: &str, product_id: &str) -> Result<u64> {
        let mut carts = self.carts();
        let Some(cart) = carts.get_mut(user_id) else {
            return Ok(0);
        };

        let before = cart.cart.len();
        cart.cart.retain(|line| line.product_id != product_id);
        Ok((before - cart.cart.len()) as u64)
    }
}
