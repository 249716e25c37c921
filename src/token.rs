//! Manage json web tokens.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::user::{Role, User};

pub const ACCESS_EXPIRATION: u64 = 60 * 15; // 15 minutes.
pub const REFRESH_EXPIRATION: u64 = 60 * 60 * 24 * 3; // 3 days.

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Display name of the user.
    pub username: String,
    /// User ID.
    pub sub: String,
    /// Single role granted to the user.
    pub roles: Role,
    /// Identifies the time at which the JWT was issued.
    pub iat: u64,
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
}

/// Manage JWT tokens.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_expiration: u64,
    refresh_expiration: u64,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("algorithm", &self.algorithm)
            .field("access_expiration", &self.access_expiration)
            .field("refresh_expiration", &self.refresh_expiration)
            .finish_non_exhaustive()
    }
}

fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

impl TokenManager {
    /// Create a new [`TokenManager`] signing with a shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_expiration: ACCESS_EXPIRATION,
            refresh_expiration: REFRESH_EXPIRATION,
        }
    }

    /// Override token lifetimes, in seconds.
    pub fn expiration(mut self, access: Option<u64>, refresh: Option<u64>) -> Self {
        self.access_expiration = access.unwrap_or(ACCESS_EXPIRATION);
        self.refresh_expiration = refresh.unwrap_or(REFRESH_EXPIRATION);
        self
    }

    /// Create a short-lived access token for `user`.
    pub fn create_access(&self, user: &User) -> Result<String> {
        self.sign(&user.name, &user.id, user.role, now(), self.access_expiration)
    }

    /// Create a long-lived refresh token for `user`.
    pub fn create_refresh(&self, user: &User) -> Result<String> {
        self.sign(&user.name, &user.id, user.role, now(), self.refresh_expiration)
    }

    /// Create a fresh access token carrying the identity of `claims`.
    pub fn renew_access(&self, claims: &Claims) -> Result<String> {
        self.sign(
            &claims.username,
            &claims.sub,
            claims.roles,
            now(),
            self.access_expiration,
        )
    }

    fn sign(
        &self,
        username: &str,
        sub: &str,
        roles: Role,
        iat: u64,
        lifetime: u64,
    ) -> Result<String> {
        let claims = Claims {
            username: username.to_owned(),
            sub: sub.to_owned(),
            roles,
            iat,
            exp: iat + lifetime,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|err| ServerError::internal("cannot sign token", err))
    }

    /// Decode and check a token.
    ///
    /// Bad signature, expiry or malformed payload all yield `InvalidToken`.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "token rejected");
                ServerError::InvalidToken
            })
    }
}
