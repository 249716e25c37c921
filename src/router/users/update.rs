//! Update user profile.

use axum::Json;
use axum::extract::{Path, State};

use super::MEMBERS;
use crate::guard::{Authenticated, authorize};
use crate::router::Valid;
use crate::user::{ProfileUpdate, User};
use crate::{AppState, ServerError};

pub async fn handler(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
    Path(id): Path<String>,
    body: Result<Valid<ProfileUpdate>, ServerError>,
) -> Result<Json<User>, ServerError> {
    // Role is checked before the body.
    authorize(&claims, MEMBERS)?;
    let Valid(body) = body?;

    Ok(Json(state.accounts.update(&id, body).await?))
}
