//! Cart consolidation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::cart::{Cart, CartLine, CartRepository, consolidate};
use crate::clock::Clock;
use crate::error::{Result, ServerError};
use crate::product::{Product, ProductCatalog};

/// Lines to add to the cart of `user_id_fk`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddToCart {
    #[validate(length(min = 1, max = 255))]
    pub user_id_fk: String,
    #[validate(length(min = 1, message = "Cart must not be empty."), nested)]
    pub cart: Vec<CartLine>,
}

/// Partial cart. Present fields overwrite the stored ones.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CartUpdate {
    #[validate(nested)]
    pub cart: Option<Vec<CartLine>>,
}

/// Cart with its lines resolved against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub products: Vec<Product>,
}

#[derive(Clone)]
pub struct CartService {
    repo: Arc<dyn CartRepository>,
    catalog: Arc<dyn ProductCatalog>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl CartService {
    /// Create a new [`CartService`].
    pub fn new(
        repo: Arc<dyn CartRepository>,
        catalog: Arc<dyn ProductCatalog>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            repo,
            catalog,
            clock,
            timeout,
        }
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ServerError::Timeout)?
    }

    /// Merge `lines` into the cart of `user_id`, creating it if needed.
    pub async fn add_to_cart(
        &self,
        user_id: &str,
        lines: Vec<CartLine>,
    ) -> Result<Cart> {
        let mut incoming = Vec::with_capacity(lines.len());
        consolidate(&mut incoming, lines)?;

        let cart = self
            .bounded(self.repo.merge(user_id, incoming, self.clock.now()))
            .await?;

        tracing::debug!(user_id, lines = cart.cart.len(), "cart merged");

        Ok(cart)
    }

    /// Cart of `user_id` and the products it references.
    pub async fn get_by_user(&self, user_id: &str) -> Result<Option<CartView>> {
        let Some(cart) = self.bounded(self.repo.find(user_id)).await? else {
            return Ok(None);
        };

        let ids: Vec<String> =
            cart.cart.iter().map(|line| line.product_id.clone()).collect();
        let products = self.bounded(self.catalog.find_by_ids(&ids)).await?;

        Ok(Some(CartView { cart, products }))
    }

    /// Overwrite the fields present in `update`.
    pub async fn update_cart(
        &self,
        user_id: &str,
        update: CartUpdate,
    ) -> Result<Cart> {
        let cart = match update.cart {
            Some(lines) => {
                let mut replacement = Vec::with_capacity(lines.len());
                consolidate(&mut replacement, lines)?;
                self.bounded(self.repo.replace(user_id, replacement, self.clock.now()))
                    .await?
            },
            None => self.bounded(self.repo.find(user_id)).await?,
        };

        cart.ok_or(ServerError::NotFound("cart not found"))
    }

    /// Remove the lines of `product_id`. Missing lines are not an error.
    pub async fn remove_line(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> Result<u64> {
        let removed = self
            .bounded(self.repo.remove_line(user_id, product_id))
            .await?;

        tracing::debug!(user_id, product_id, removed, "cart line removed");

        Ok(removed)
    }
}
