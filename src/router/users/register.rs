use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::Registration;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub result: String,
}

/// Handler to register a user. The OTP challenge is sent by mail.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Registration>,
) -> Result<(StatusCode, Json<Response>)> {
    state.accounts.register(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(Response {
            result: "success".to_owned(),
        }),
    ))
}
