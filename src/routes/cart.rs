use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};

use crate::{
    dto::cart::{CartList, SetQuantityRequest},
    error::AppResult,
    models::{CartLine, NewCartLine},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_to_cart).delete(clear_cart))
        .route("/{id}", patch(update_quantity).delete(remove_from_cart))
}

fn cart_response(state: &AppState, message: &str) -> ApiResponse<CartList> {
    let snapshot = state.cart.snapshot();
    let meta = Meta::totals(
        snapshot.lines().len() as i64,
        snapshot.total_items(),
        snapshot.total_price(),
    );
    let data = CartList {
        items: snapshot.lines().to_vec(),
    };
    ApiResponse::success(message, data, Some(meta))
}

#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Local cart lines with totals", body = ApiResponse<CartList>)
    ),
    tag = "Cart"
)]
pub async fn cart_list(State(state): State<AppState>) -> Json<ApiResponse<CartList>> {
    Json(cart_response(&state, "OK"))
}

#[utoipa::path(
    post,
    path = "/cart",
    request_body = NewCartLine,
    responses(
        (status = 200, description = "Line added or merged", body = ApiResponse<CartLine>),
        (status = 400, description = "Bad request"),
        (status = 502, description = "Server rejected the add; local cart rolled back"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Json(payload): Json<NewCartLine>,
) -> AppResult<Json<ApiResponse<CartLine>>> {
    let authenticated = state.session.is_authenticated();
    let line = state.cart.add(payload, authenticated).await?;
    Ok(Json(ApiResponse::success("OK", line, None)))
}

#[utoipa::path(
    patch,
    path = "/cart/{id}",
    params(("id" = String, Path, description = "Cart line ID")),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Quantity set; zero or less removes the line", body = ApiResponse<CartList>),
        (status = 404, description = "Cart line not found"),
    ),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SetQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let authenticated = state.session.is_authenticated();
    state
        .cart
        .update_quantity(&id, payload.quantity, authenticated)
        .await?;
    Ok(Json(cart_response(&state, "Updated")))
}

#[utoipa::path(
    delete,
    path = "/cart/{id}",
    params(("id" = String, Path, description = "Cart line ID")),
    responses(
        (status = 200, description = "OK", body = ApiResponse<CartList>),
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let authenticated = state.session.is_authenticated();
    state.cart.remove(&id, authenticated).await?;
    Ok(Json(cart_response(&state, "Removed from cart")))
}

#[utoipa::path(
    delete,
    path = "/cart",
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<CartList>),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(State(state): State<AppState>) -> AppResult<Json<ApiResponse<CartList>>> {
    let authenticated = state.session.is_authenticated();
    state.cart.clear(authenticated).await?;
    Ok(Json(cart_response(&state, "Cart cleared")))
}
