//! Authorization guard.
//!
//! [`Authenticated`] verifies the bearer token before the handler runs, then
//! handlers call [`authorize`] with the roles the route accepts.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;

use crate::error::{Result, ServerError};
use crate::token::{Claims, TokenManager};
use crate::user::Role;

const BEARER: &str = "Bearer ";

/// Verified claims of the caller.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    TokenManager: FromRef<S>,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix(BEARER))
            .ok_or(ServerError::Unauthorized)?;

        TokenManager::from_ref(state)
            .decode(token.trim())
            .map(Authenticated)
            .map_err(|_| ServerError::Unauthorized)
    }
}

/// Allow the caller only if its role is listed.
pub fn authorize(claims: &Claims, required: &[Role]) -> Result<()> {
    if required.contains(&claims.roles) {
        Ok(())
    } else {
        tracing::warn!(user_id = claims.sub, role = %claims.roles, "access denied");
        Err(ServerError::Forbidden)
    }
}
