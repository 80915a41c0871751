//! HTTP client for the remote storefront API.
//!
//! One `ApiClient` is shared by every gateway. The bearer token lives in a
//! shared slot that the session store fills on login and clears on logout,
//! so requests pick up the current credentials without being rebuilt.

pub mod cart;
pub mod catalog;
pub mod notifications;

use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, AppResult};

pub use cart::CartGateway;
pub use notifications::NotificationGateway;

/// Longest slice of an error body kept in `AppError::Api`.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct BearerToken(Arc<RwLock<Option<String>>>);

impl BearerToken {
    pub fn set(&self, token: impl Into<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: BearerToken,
}

impl ApiClient {
    pub fn new(base_url: &str, token: BearerToken, timeout: Duration) -> AppResult<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::BadRequest(format!("invalid API base URL: {e}")))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                token,
            }),
        })
    }

    pub fn token(&self) -> &BearerToken {
        &self.inner.token
    }

    fn url(&self, path: &str) -> AppResult<Url> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::BadRequest(format!("invalid API path {path}: {e}")))
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> AppResult<RequestBuilder> {
        let url = self.url(path)?;
        let builder = self.inner.client.request(method, url);
        Ok(match self.inner.token.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> AppResult<T> {
        let response = check_status(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> AppResult<()> {
        check_status(request.send().await?).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        reqwest::StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized),
        reqwest::StatusCode::NOT_FOUND => Err(AppError::NotFound),
        _ => {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(
                status = %status,
                body = %body,
                "storefront API returned non-success status"
            );
            Err(AppError::Api {
                status: status.as_u16(),
                message: body.chars().take(ERROR_BODY_LIMIT).collect(),
            })
        }
    }
}
