//! Handle cart database requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, Pool, Postgres};

use crate::cart::{Cart, CartLine};
use crate::error::Result;

/// Cart store access.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find(&self, user_id: &str) -> Result<Option<Cart>>;

    /// Atomically merge already consolidated `lines` into the cart of
    /// `user_id`, creating the cart when missing.
    async fn merge(
        &self,
        user_id: &str,
        lines: Vec<CartLine>,
        now: DateTime<Utc>,
    ) -> Result<Cart>;

    /// Replace every line of an existing cart. `None` when there is no cart.
    async fn replace(
        &self,
        user_id: &str,
        lines: Vec<CartLine>,
        now: DateTime<Utc>,
    ) -> Result<Option<Cart>>;

    /// Delete lines of `product_id`, returning how many were removed.
    async fn remove_line(&self, user_id: &str, product_id: &str) -> Result<u64>;
}

#[derive(Debug, FromRow)]
struct CartRow {
    id: String,
    user_id_fk: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartRow {
    fn with_lines(self, cart: Vec<CartLine>) -> Cart {
        Cart {
            id: self.id,
            user_id_fk: self.user_id_fk,
            cart,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    product_id: String,
    color_id: String,
    quantity: i32,
}

impl From<LineRow> for CartLine {
    fn from(row: LineRow) -> Self {
        CartLine {
            product_id: row.product_id,
            color_id: row.color_id,
            quantity: row.quantity,
        }
    }
}

/// PostgreSQL-backed [`CartRepository`].
#[derive(Clone)]
pub struct PgCartRepository {
    pool: Pool<Postgres>,
}

impl PgCartRepository {
    /// Create a new [`PgCartRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

async fn lines(conn: &mut PgConnection, user_id: &str) -> Result<Vec<CartLine>> {
    let rows = sqlx::query_as::<_, LineRow>(
        r#"SELECT product_id, color_id, quantity FROM cart_lines
            WHERE user_id_fk = $1 ORDER BY position"#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(CartLine::from).collect())
}

async fn insert_lines(
    conn: &mut PgConnection,
    user_id: &str,
    lines: &[CartLine],
    merge: bool,
) -> Result<()> {
    let query = if merge {
        r#"INSERT INTO cart_lines (user_id_fk, product_id, color_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id_fk, product_id)
            DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity"#
    } else {
        r#"INSERT INTO cart_lines (user_id_fk, product_id, color_id, quantity)
            VALUES ($1, $2, $3, $4)"#
    };

    for line in lines {
        sqlx::query(query)
            .bind(user_id)
            .bind(&line.product_id)
            .bind(&line.color_id)
            .bind(line.quantity)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn find(&self, user_id: &str) -> Result<Option<Cart>> {
        let mut conn = self.pool.acquire().await?;

        let Some(row) = sqlx::query_as::<_, CartRow>(
            r#"SELECT id, user_id_fk, created_at, updated_at
                FROM shopping_carts WHERE user_id_fk = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        else {
            return Ok(None);
        };

        let lines = lines(&mut conn, user_id).await?;
        Ok(Some(row.with_lines(lines)))
    }

    async fn merge(
        &self,
        user_id: &str,
        lines: Vec<CartLine>,
        now: DateTime<Utc>,
    ) -> Result<Cart> {
        let mut tx = self.pool.begin().await?;

        // Upserting the cart row locks it until commit, so writers of the
        // same cart run one after another.
        let row = sqlx::query_as::<_, CartRow>(
            r#"INSERT INTO shopping_carts (id, user_id_fk, created_at, updated_at)
                VALUES ($1, $2, $3, $3)
                ON CONFLICT (user_id_fk) DO UPDATE SET updated_at = EXCLUDED.updated_at
                RETURNING id, user_id_fk, created_at, updated_at"#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        insert_lines(&mut tx, user_id, &lines, true).await?;
        let lines = self::lines(&mut tx, user_id).await?;

        tx.commit().await?;

        Ok(row.with_lines(lines))
    }

    async fn replace(
        &self,
        user_id: &str,
        lines: Vec<CartLine>,
        now: DateTime<Utc>,
    ) -> Result<Option<Cart>> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query_as::<_, CartRow>(
            r#"UPDATE shopping_carts SET updated_at = $2 WHERE user_id_fk = $1
                RETURNING id, user_id_fk, created_at, updated_at"#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM cart_lines WHERE user_id_fk = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        insert_lines(&mut tx, user_id, &lines, false).await?;
        let lines = self::lines(&mut tx, user_id).await?;

        tx.commit().await?;

        Ok(Some(row.with_lines(lines)))
    }

    async fn remove_line(&self, user_id: &str, product_id: &str) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM cart_lines WHERE user_id_fk = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
