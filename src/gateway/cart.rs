use async_trait::async_trait;
use reqwest::Method;

use crate::{
    dto::cart::{AddToCartRequest, SyncCartItem, SyncCartRequest, UpdateCartItemRequest},
    error::AppResult,
    models::{CartItemRecord, ServerCartLine},
};

use super::ApiClient;

/// Remote cart endpoints. The cart store and the reconciler only ever see
/// this trait, so tests can substitute a recording fake.
#[async_trait]
pub trait CartGateway: Send + Sync {
    async fn fetch_cart(&self) -> AppResult<Vec<ServerCartLine>>;
    async fn add_item(&self, request: &AddToCartRequest) -> AppResult<CartItemRecord>;
    async fn update_item(&self, id: &str, quantity: u32) -> AppResult<()>;
    async fn remove_item(&self, id: &str) -> AppResult<()>;
    async fn clear(&self) -> AppResult<()>;
    /// Replace the server cart with exactly `items` and return the stored
    /// lines, carrying their server ids.
    async fn sync(&self, items: &[SyncCartItem]) -> AppResult<Vec<ServerCartLine>>;
}

#[async_trait]
impl CartGateway for ApiClient {
    async fn fetch_cart(&self) -> AppResult<Vec<ServerCartLine>> {
        let request = self.request(Method::GET, "cart")?;
        self.send_json(request).await
    }

    async fn add_item(&self, request: &AddToCartRequest) -> AppResult<CartItemRecord> {
        let request = self.request(Method::POST, "cart")?.json(request);
        self.send_json(request).await
    }

    async fn update_item(&self, id: &str, quantity: u32) -> AppResult<()> {
        let request = self
            .request(Method::PATCH, &format!("cart/{id}"))?
            .json(&UpdateCartItemRequest { quantity });
        self.send_empty(request).await
    }

    async fn remove_item(&self, id: &str) -> AppResult<()> {
        let request = self.request(Method::DELETE, &format!("cart/{id}"))?;
        self.send_empty(request).await
    }

    async fn clear(&self) -> AppResult<()> {
        let request = self.request(Method::DELETE, "cart")?;
        self.send_empty(request).await
    }

    async fn sync(&self, items: &[SyncCartItem]) -> AppResult<Vec<ServerCartLine>> {
        let body = SyncCartRequest {
            items: items.to_vec(),
        };
        let request = self.request(Method::POST, "cart/sync")?.json(&body);
        self.send_json(request).await
    }
}
