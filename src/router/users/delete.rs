//! Soft-delete users.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::ADMINS;
use crate::guard::{Authenticated, authorize};
use crate::router::split_ids;
use crate::{AppState, ServerError};

#[derive(Debug, Deserialize)]
pub struct Ids {
    ids: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub modified: u64,
}

pub async fn handler(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
    Query(query): Query<Ids>,
) -> Result<Json<Response>, ServerError> {
    authorize(&claims, ADMINS)?;

    let ids = query.ids.as_deref().map(split_ids).unwrap_or_default();
    if ids.is_empty() {
        return Err(ServerError::invalid_field(
            "ids",
            "missing_ids",
            "At least one id is required.",
        ));
    }

    let modified = state.accounts.deactivate(&ids).await?;

    Ok(Json(Response { modified }))
}
