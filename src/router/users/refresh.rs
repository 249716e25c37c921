//! Get a new access token with a refresh token.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::router::Valid;
use crate::{AppState, ServerError};

#[derive(Debug, Validate, Deserialize)]
pub struct Body {
    #[validate(length(min = 1, message = "Missing refresh token."))]
    refresh_token: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub access_token: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>, ServerError> {
    let access_token = state.accounts.refresh(&body.refresh_token)?;

    Ok(Json(Response { access_token }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::json;

    use super::Response;
    use crate::user::{Role, UserBuilder};
    use crate::*;

    #[tokio::test]
    async fn test_refresh_handler() {
        let (state, _) = test_state();
        let app = app(state.clone());
        let user = UserBuilder::new()
            .email("alice@example.com")
            .name("Alice")
            .role(Role::Vip)
            .build(Utc::now());
        let refresh_token = state.token.create_refresh(&user).unwrap();

        let body = json!({ "refresh_token": refresh_token });
        let response = make_request(
            app.clone(),
            Method::POST,
            "/users/refresh",
            body.to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        let claims = state.token.decode(&body.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.roles, Role::Vip);

        let body = json!({ "refresh_token": "forged.token.value" });
        let response = make_request(
            app,
            Method::POST,
            "/users/refresh",
            body.to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
