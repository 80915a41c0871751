use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};

use crate::{
    dto::{
        auth::{SessionSnapshot, UpdateProfileRequest},
        catalog::{CategoryList, CategoryRequest},
        orders::OrderList,
    },
    error::AppResult,
    middleware::auth::{CurrentUser, ensure_admin},
    models::{Category, Order},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn categories_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

pub fn orders_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/{id}", get(get_order))
}

pub fn profile_router() -> Router<AppState> {
    Router::new().route("/", patch(update_profile))
}

#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "All categories", body = ApiResponse<CategoryList>)),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let items = state.api.list_categories().await?;
    let meta = Meta::count(items.len() as i64);
    Ok(Json(ApiResponse::success("OK", CategoryList { items }, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = ApiResponse<Category>),
        (status = 404, description = "Not found"),
    ),
    tag = "Catalog"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let category = state.api.get_category(&id).await?;
    Ok(Json(ApiResponse::success("OK", category, None)))
}

#[utoipa::path(
    post,
    path = "/categories",
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Created", body = ApiResponse<Category>),
        (status = 403, description = "Admins only"),
    ),
    tag = "Catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    ensure_admin(&user)?;
    let category = state.api.create_category(&payload).await?;
    tracing::info!(category_id = %category.id, "category created");
    Ok(Json(ApiResponse::success("Created", category, None)))
}

#[utoipa::path(
    put,
    path = "/categories/{id}",
    params(("id" = String, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<Category>),
        (status = 403, description = "Admins only"),
    ),
    tag = "Catalog"
)]
pub async fn update_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    ensure_admin(&user)?;
    let category = state.api.update_category(&id, &payload).await?;
    Ok(Json(ApiResponse::success("Updated", category, None)))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Admins only"),
    ),
    tag = "Catalog"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;
    state.api.delete_category(&id).await?;
    tracing::info!(category_id = %id, "category deleted");
    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "Orders of the signed-in user", body = ApiResponse<OrderList>),
        (status = 401, description = "No session"),
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let items = state.api.list_orders().await?;
    let meta = Meta::count(items.len() as i64);
    Ok(Json(ApiResponse::success("OK", OrderList { items }, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<Order>),
        (status = 404, description = "Not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.api.get_order(&id).await?;
    Ok(Json(ApiResponse::success("OK", order, None)))
}

#[utoipa::path(
    patch,
    path = "/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated and session refreshed", body = ApiResponse<SessionSnapshot>),
        (status = 401, description = "No session"),
    ),
    tag = "Auth"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<SessionSnapshot>>> {
    let updated = state.api.update_profile(&user.id, &payload).await?;
    state.session.update_user(updated)?;
    Ok(Json(ApiResponse::success(
        "Profile updated",
        state.session.snapshot(),
        None,
    )))
}
