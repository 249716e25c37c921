//! Storefront backend: accounts, authorization and shopping carts.

#![forbid(unsafe_code)]
pub mod cart;
pub mod clock;
pub mod config;
pub mod crypto;
mod database;
pub mod error;
pub mod guard;
pub mod mail;
pub mod otp;
pub mod product;
mod router;
pub mod telemetry;
pub mod token;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::FromRef;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub token: token::TokenManager,
    pub accounts: user::AccountService,
    pub carts: cart::CartService,
}

impl FromRef<AppState> for token::TokenManager {
    fn from_ref(state: &AppState) -> token::TokenManager {
        state.token.clone()
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, state.config.timeout() * 2))
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        .nest("/users", router::users::router())
        .nest("/shopping_cart", router::cart::router())
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let timeout = config.timeout();

    let Some(postgres) = &config.postgres else {
        return Err("missing `postgres` entry on `config.yaml` file".into());
    };
    let pool = database::connect(postgres, timeout).await?;

    // execute migrations scripts on start.
    sqlx::migrate!().run(&pool).await?;

    // handle jwt.
    let token = match &config.token {
        Some(token) if !token.secret.is_empty() => {
            token::TokenManager::new(&token.secret)
                .expiration(token.access_expiration, token.refresh_expiration)
        },
        _ => return Err("missing token secret, set `token.secret` or `JWT_SECRET`".into()),
    };

    // handle mail sender.
    let mail = if let Some(cfg) = &config.mail {
        mail::MailManager::new(cfg).await?
    } else {
        tracing::warn!("missing `mail` entry on `config.yaml` file, mails are only logged");
        mail::MailManager::default()
    };

    let otp = otp::OtpManager::new(
        config
            .otp
            .as_ref()
            .and_then(|otp| otp.expiration)
            .unwrap_or(otp::DEFAULT_EXPIRATION),
    );
    let clock: Arc<dyn clock::Clock> = Arc::new(clock::SystemClock);

    let accounts = user::AccountService::new(
        Arc::new(user::PgUserRepository::new(pool.clone())),
        Arc::new(crypto::PasswordManager::new(config.argon2.clone())?),
        token.clone(),
        otp,
        Arc::new(mail),
        Arc::clone(&clock),
        timeout,
    );
    let carts = cart::CartService::new(
        Arc::new(cart::PgCartRepository::new(pool.clone())),
        Arc::new(product::PgProductCatalog::new(pool)),
        clock,
        timeout,
    );

    Ok(AppState {
        config,
        token,
        accounts,
        carts,
    })
}

/// In-memory state, recording sent mails. OTP codes are always `482913`.
/// MUST NEVER be used in production.
#[cfg(test)]
pub fn test_state() -> (AppState, Arc<mail::RecordingMailer>) {
    let config = Arc::new(config::Configuration::default());
    let token = token::TokenManager::new("secret");
    let mailer = Arc::new(mail::RecordingMailer::default());
    let clock: Arc<dyn clock::Clock> = Arc::new(clock::SystemClock);

    let accounts = user::AccountService::new(
        Arc::new(user::memory::MemoryUserRepository::default()),
        Arc::new(crypto::PasswordManager::insecure()),
        token.clone(),
        otp::OtpManager::default().with_generator(|| 482_913),
        mailer.clone(),
        Arc::clone(&clock),
        config.timeout(),
    );
    let catalog = product::MemoryCatalog::new(vec![product::Product {
        id: "P1".into(),
        details: serde_json::Map::new(),
    }]);
    let carts = cart::CartService::new(
        Arc::new(cart::memory::MemoryCartRepository::default()),
        Arc::new(catalog),
        clock,
        config.timeout(),
    );

    let state = AppState {
        config,
        token,
        accounts,
        carts,
    };
    (state, mailer)
}

/// Insert a verified user and return it with an access token.
#[cfg(test)]
pub async fn seed_user(
    state: &AppState,
    email: &str,
    role: user::Role,
) -> (user::User, String) {
    let user = user::UserBuilder::new()
        .email(email)
        .name(email.split('@').next().unwrap_or(email))
        .role(role)
        .verified(true)
        .build(chrono::Utc::now());
    state.accounts.repository().insert(&user).await.unwrap();
    let token = state.token.create_access(&user).unwrap();
    (user, token)
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
    token: Option<&str>,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;

    #[tokio::test]
    async fn test_status() {
        let (state, _) = test_state();
        let response =
            make_request(app(state), Method::GET, "/status.json", String::default(), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["name"], "storefront");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (state, _) = test_state();
        let response =
            make_request(app(state), Method::GET, "/nothing", String::default(), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
