use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use crate::router::Valid;
use crate::user::User;
use crate::{AppState, ServerError};

/// OTP as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Code {
    Number(u32),
    Text(String),
}

impl Code {
    fn value(&self) -> Option<u32> {
        match self {
            Code::Number(code) => Some(*code),
            Code::Text(code) => code.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Validate, Deserialize)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    email: String,
    otp: Code,
}

pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<User>, ServerError> {
    let code = body.otp.value().ok_or(ServerError::InvalidCredential)?;
    let user = state.accounts.verify_otp(&body.email, code).await?;

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use crate::*;

    #[tokio::test]
    async fn test_verify_handler() {
        let (state, _) = test_state();
        let app = app(state);

        let body = json!({ "name": "Alice", "email": "alice@example.com" });
        make_request(app.clone(), Method::POST, "/users/register", body.to_string(), None).await;

        let body = json!({ "email": "alice@example.com", "otp": "000000" });
        let response = make_request(
            app.clone(),
            Method::POST,
            "/users/verify-otp",
            body.to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = json!({ "email": "alice@example.com", "otp": "482913" });
        let response = make_request(
            app,
            Method::POST,
            "/users/verify-otp",
            body.to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["verified"], true);
        assert!(body.get("otp").is_none());
        assert!(body.get("otpExpiry").is_none());
        assert!(body.get("password").is_none());
    }
}
