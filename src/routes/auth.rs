use axum::{
    Json, Router,
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
};

use crate::{
    dto::auth::{OAuthCallbackQuery, SessionSnapshot},
    error::AppResult,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Where a failed OAuth round trip lands.
pub const LOGIN_ERROR_PATH: &str = "/login?error=oauth_failed";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/callback", get(oauth_callback))
        .route("/logout", post(logout))
        .route("/session", get(session))
}

#[utoipa::path(
    get,
    path = "/auth/callback",
    params(OAuthCallbackQuery),
    responses(
        (status = 303, description = "Signed in, redirect to the landing page for the user's role"),
    ),
    tag = "Auth"
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Redirect {
    match state.session.complete_oauth(query).await {
        Ok(redirect) => Redirect::to(&redirect.location),
        Err(err) => {
            tracing::warn!(error = %err, "oauth callback rejected");
            Redirect::to(LOGIN_ERROR_PATH)
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session cleared, local cart kept", body = ApiResponse<SessionSnapshot>),
    ),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SessionSnapshot>>> {
    state.session.logout().await?;
    Ok(Json(ApiResponse::success(
        "Logged out",
        state.session.snapshot(),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Current session", body = ApiResponse<SessionSnapshot>),
    ),
    tag = "Auth"
)]
pub async fn session(State(state): State<AppState>) -> Json<ApiResponse<SessionSnapshot>> {
    Json(ApiResponse::success("OK", state.session.snapshot(), None))
}
