//! Shopping cart HTTP API.

use axum::Json;
use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::cart::{AddToCart, Cart, CartUpdate, CartView};
use crate::router::Valid;
use crate::{AppState, ServerError};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Removed {
    pub removed: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add))
        .route("/{user_id_fk}", get(find).put(update))
        .route("/{user_id_fk}/{product_id}", delete(remove))
}

async fn add(
    State(state): State<AppState>,
    Valid(body): Valid<AddToCart>,
) -> Result<Json<Cart>, ServerError> {
    let cart = state.carts.add_to_cart(&body.user_id_fk, body.cart).await?;
    Ok(Json(cart))
}

/// `null` when the user has no cart.
async fn find(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Option<CartView>>, ServerError> {
    Ok(Json(state.carts.get_by_user(&user_id).await?))
}

async fn update(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Valid(body): Valid<CartUpdate>,
) -> Result<Json<Cart>, ServerError> {
    Ok(Json(state.carts.update_cart(&user_id, body).await?))
}

async fn remove(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Result<Json<Removed>, ServerError> {
    let removed = state.carts.remove_line(&user_id, &product_id).await?;
    Ok(Json(Removed { removed }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use super::Removed;
    use crate::*;

    async fn json(response: axum::http::Response<axum::body::Body>) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_cart_lifecycle() {
        let (state, _) = test_state();
        let app = app(state);

        let response =
            make_request(app.clone(), Method::GET, "/shopping_cart/u1", String::default(), None)
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, Value::Null);

        let add = json!({
            "user_id_fk": "u1",
            "cart": [{ "product_id": "P1", "color_id": "C1", "quantity": 2 }],
        });
        let response =
            make_request(app.clone(), Method::POST, "/shopping_cart", add.to_string(), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let add = json!({
            "user_id_fk": "u1",
            "cart": [{ "product_id": "P1", "color_id": "C1", "quantity": 3 }],
        });
        let response =
            make_request(app.clone(), Method::POST, "/shopping_cart", add.to_string(), None).await;
        let body = json(response).await;
        assert_eq!(body["cart"].as_array().unwrap().len(), 1);
        assert_eq!(body["cart"][0]["quantity"], 5);

        let response =
            make_request(app.clone(), Method::GET, "/shopping_cart/u1", String::default(), None)
                .await;
        let body = json(response).await;
        assert_eq!(body["cart"]["user_id_fk"], "u1");
        assert_eq!(body["products"][0]["id"], "P1");

        let update = json!({
            "cart": [{ "product_id": "P2", "color_id": "C2", "quantity": 1 }],
        });
        let response = make_request(
            app.clone(),
            Method::PUT,
            "/shopping_cart/u1",
            update.to_string(),
            None,
        )
        .await;
        let body = json(response).await;
        assert_eq!(body["cart"][0]["product_id"], "P2");

        for expected in [1, 0] {
            let response = make_request(
                app.clone(),
                Method::DELETE,
                "/shopping_cart/u1/P2",
                String::default(),
                None,
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            let body: Removed = serde_json::from_value(json(response).await).unwrap();
            assert_eq!(body, Removed { removed: expected });
        }
    }

    #[tokio::test]
    async fn test_cart_validation() {
        let (state, _) = test_state();
        let app = app(state);

        for add in [
            json!({ "user_id_fk": "u1", "cart": [] }),
            json!({
                "user_id_fk": "u1",
                "cart": [{ "product_id": "P1", "color_id": "C1", "quantity": 0 }],
            }),
            json!({
                "user_id_fk": "u1",
                "cart": [
                    { "product_id": "P1", "color_id": "C1", "quantity": i32::MAX },
                    { "product_id": "P1", "color_id": "C1", "quantity": 1 },
                ],
            }),
        ] {
            let response =
                make_request(app.clone(), Method::POST, "/shopping_cart", add.to_string(), None)
                    .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = make_request(
            app,
            Method::PUT,
            "/shopping_cart/nobody",
            json!({}).to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
