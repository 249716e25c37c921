//! Read user profiles.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use super::MEMBERS;
use crate::guard::{Authenticated, authorize};
use crate::router::split_ids;
use crate::user::User;
use crate::{AppState, ServerError};

#[derive(Debug, Deserialize)]
pub struct Ids {
    ids: Option<String>,
}

/// Profile of the caller.
pub async fn me(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
) -> Result<Json<User>, ServerError> {
    authorize(&claims, MEMBERS)?;

    Ok(Json(state.accounts.find_one(&claims.sub).await?))
}

/// Listed users, or every active user without `ids`.
pub async fn list(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
    Query(query): Query<Ids>,
) -> Result<Json<Vec<User>>, ServerError> {
    authorize(&claims, MEMBERS)?;

    let users = match query.ids.as_deref().map(split_ids) {
        Some(ids) if !ids.is_empty() => state.accounts.find_by_ids(&ids).await?,
        _ => state.accounts.find_all().await?,
    };

    Ok(Json(users))
}
