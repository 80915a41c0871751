use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod doc;
pub mod health;
pub mod notifications;

// Build the local router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/cart", cart::router())
        .nest("/notifications", notifications::router())
        .nest("/categories", catalog::categories_router())
        .nest("/orders", catalog::orders_router())
        .nest("/profile", catalog::profile_router())
}
