use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{Role, SessionPhase, SessionUser, validate_token},
};

/// Query string of the OAuth redirect. `user` arrives url-encoded and is
/// already decoded by the extractor.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OAuthCallbackQuery {
    pub token: Option<String>,
    pub user: Option<String>,
    pub error: Option<String>,
}

impl OAuthCallbackQuery {
    pub fn into_credentials(self) -> AppResult<(SessionUser, String)> {
        if let Some(error) = self.error {
            return Err(AppError::BadRequest(format!("provider returned {error}")));
        }
        let token = self
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("missing token".into()))?;
        validate_token(&token)?;
        let raw_user = self
            .user
            .ok_or_else(|| AppError::BadRequest("missing user".into()))?;
        let user = SessionUser::decode(&raw_user)?;
        Ok((user, token))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub user: Option<SessionUser>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

/// Body of `PATCH /users/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginRedirect {
    pub role: Role,
    pub location: String,
}
