use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use crate::router::Valid;
use crate::user::Session;
use crate::{AppState, ServerError};

#[derive(Debug, Validate, Deserialize)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    email: String,
    #[validate(length(max = 255))]
    password: Option<String>,
}

pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Session>, ServerError> {
    let session = state
        .accounts
        .login(&body.email, body.password.as_deref())
        .await?;

    Ok(Json(session))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use crate::*;

    /// Full journey: register, verify, login, then read the profile.
    #[tokio::test]
    async fn test_login_journey() {
        let (state, mailer) = test_state();
        let app = app(state.clone());

        let body = json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": "pw123456",
        });
        make_request(app.clone(), Method::POST, "/users/register", body.to_string(), None).await;
        assert!(mailer.sent()[0].2.contains("482913"));

        let login = json!({ "email": "alice@example.com", "password": "pw123456" });
        let response = make_request(
            app.clone(),
            Method::POST,
            "/users/login",
            login.to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = json!({ "email": "alice@example.com", "otp": 482913 });
        let response = make_request(
            app.clone(),
            Method::POST,
            "/users/verify-otp",
            body.to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = make_request(
            app.clone(),
            Method::POST,
            "/users/login",
            login.to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["user"]["email"], "alice@example.com");
        assert!(body["user"].get("password").is_none());
        assert!(body["refresh_token"].is_string());
        let access_token = body["access_token"].as_str().unwrap();

        let claims = state.token.decode(access_token).unwrap();
        assert_eq!(claims.exp - claims.iat, 15 * 60);

        let response = make_request(
            app,
            Method::GET,
            "/users/me",
            String::default(),
            Some(access_token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["name"], "Alice");
        assert_eq!(body["role"], "MEMBER");
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let (state, _) = test_state();
        let app = app(state);

        let login = json!({ "email": "nobody@example.com", "password": "pw123456" });
        let response = make_request(
            app,
            Method::POST,
            "/users/login",
            login.to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["title"], "Invalid email, password or code.");
    }
}
