//! Users-related HTTP API.
mod delete;
mod get;
mod login;
mod refresh;
mod register;
mod update;
mod verify;

use axum::Router;
use axum::routing::{get, post, put};

use crate::AppState;
use crate::user::Role;

/// Roles allowed on profile routes.
const MEMBERS: &[Role] = &[Role::Member, Role::Vip];
/// Roles allowed on administration routes.
const ADMINS: &[Role] = &[Role::AdminMaster];

pub fn router() -> Router<AppState> {
    Router::new()
        // `POST /users/register` goes to `register`.
        .route("/register", post(register::handler))
        .route("/verify-otp", post(verify::handler))
        .route("/login", post(login::handler))
        .route("/refresh", post(refresh::handler))
        // Authorization required below.
        .route("/me", get(get::me))
        .route("/", get(get::list).delete(delete::handler))
        .route("/update/{id}", put(update::handler))
}
