//! Handle database requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};

use crate::error::{Result, ServerError};
use crate::user::{Role, User};

/// Credential store access.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new [`User`]. Fails with `Conflict` on a duplicate key.
    async fn insert(&self, user: &User) -> Result<()>;

    /// Find a user using `id` field, whatever its status.
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Find a user using `email` field, whatever its status.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find every user whose id is listed.
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>>;

    /// Find every active user.
    async fn find_all_active(&self) -> Result<Vec<User>>;

    /// Whether `email` or `account` is already taken.
    async fn exists(&self, email: &str, account: &str) -> Result<bool>;

    /// Write every mutable column of an existing user.
    async fn save(&self, user: &User) -> Result<()>;

    /// Soft-delete listed active users, returning how many were modified.
    async fn deactivate(&self, ids: &[String], now: DateTime<Utc>)
    -> Result<u64>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    firstname: Option<String>,
    lastname: Option<String>,
    role: String,
    isd_code: Option<i32>,
    phone: Option<i64>,
    email: String,
    account: String,
    password: Option<String>,
    status: bool,
    permission: bool,
    birthday: Option<String>,
    verified: bool,
    remark: Option<String>,
    otp: Option<i32>,
    otp_expiry: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = ServerError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = row.role.parse::<Role>().map_err(|_| {
            ServerError::Internal {
                details: format!("unknown role `{}` on user {}", row.role, row.id),
                source: None,
            }
        })?;

        Ok(User {
            id: row.id,
            name: row.name,
            firstname: row.firstname,
            lastname: row.lastname,
            role,
            isd_code: row.isd_code,
            phone: row.phone,
            email: row.email,
            account: row.account,
            password: row.password,
            status: row.status,
            permission: row.permission,
            birthday: row.birthday,
            verified: row.verified,
            remark: row.remark,
            otp: row.otp.map(|code| code as u32),
            otp_expiry: row.otp_expiry,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COLUMNS: &str = r#"id, name, firstname, lastname, role, isd_code, phone,
    email, account, password, status, permission, birthday, verified, remark,
    otp, otp_expiry, created_at, updated_at"#;

/// PostgreSQL-backed [`UserRepository`].
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new [`PgUserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn find_by(&self, field: Field, value: &str) -> Result<Option<User>> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE {field} = $1");

        sqlx::query_as::<_, UserRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn fetch_all(&self, query: &str, ids: Option<&[String]>) -> Result<Vec<User>> {
        let mut query = sqlx::query_as::<_, UserRow>(query);
        if let Some(ids) = ids {
            query = query.bind(ids);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Id,
    Email,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Field::Id => write!(f, "id"),
            Field::Email => write!(f, "email"),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users (id, name, firstname, lastname, role, isd_code,
                phone, email, account, password, status, permission, birthday,
                verified, remark, otp, otp_expiry, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19)"#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(user.role.as_str())
        .bind(user.isd_code)
        .bind(user.phone)
        .bind(&user.email)
        .bind(&user.account)
        .bind(&user.password)
        .bind(user.status)
        .bind(user.permission)
        .bind(&user.birthday)
        .bind(user.verified)
        .bind(&user.remark)
        .bind(user.otp.map(|code| code as i32))
        .bind(user.otp_expiry)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.find_by(Field::Id, id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_by(Field::Email, email).await
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE id = ANY($1) ORDER BY created_at"
        );
        self.fetch_all(&query, Some(ids)).await
    }

    async fn find_all_active(&self) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE status = TRUE ORDER BY created_at"
        );
        self.fetch_all(&query, None).await
    }

    async fn exists(&self, email: &str, account: &str) -> Result<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR account = $2)",
        )
        .bind(email)
        .bind(account)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    async fn save(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"UPDATE users
                SET name = $1, firstname = $2, lastname = $3, isd_code = $4,
                    phone = $5, account = $6, password = $7, birthday = $8,
                    remark = $9, verified = $10, otp = $11, otp_expiry = $12,
                    updated_at = $13
                WHERE id = $14"#,
        )
        .bind(&user.name)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(user.isd_code)
        .bind(user.phone)
        .bind(&user.account)
        .bind(&user.password)
        .bind(&user.birthday)
        .bind(&user.remark)
        .bind(user.verified)
        .bind(user.otp.map(|code| code as i32))
        .bind(user.otp_expiry)
        .bind(user.updated_at)
        .bind(&user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound("user not found"));
        }

        Ok(())
    }

    async fn deactivate(
        &self,
        ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"UPDATE users SET status = FALSE, updated_at = $1
                WHERE id = ANY($2) AND status = TRUE"#,
        )
        .bind(now)
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
