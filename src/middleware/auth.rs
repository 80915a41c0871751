use axum::extract::FromRequestParts;

use crate::{
    error::AppError,
    models::{Role, SessionUser},
    state::AppState,
};

/// The signed-in user of the local session. Rejects with 401 when the
/// session is anonymous or still loading.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

pub fn ensure_role(user: &SessionUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &SessionUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.session.is_authenticated() {
            return Err(AppError::Unauthorized);
        }
        state
            .session
            .user()
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
