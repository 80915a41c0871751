use async_trait::async_trait;
use reqwest::Method;

use crate::{dto::notifications::UnreadCount, error::AppResult, models::Notification};

use super::ApiClient;

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn unread_count(&self) -> AppResult<u64>;
    async fn list(&self) -> AppResult<Vec<Notification>>;
    async fn mark_read(&self, id: &str) -> AppResult<()>;
    async fn mark_all_read(&self) -> AppResult<()>;
    async fn delete(&self, id: &str) -> AppResult<()>;
}

#[async_trait]
impl NotificationGateway for ApiClient {
    async fn unread_count(&self) -> AppResult<u64> {
        let request = self.request(Method::GET, "notifications/unread-count")?;
        let body: UnreadCount = self.send_json(request).await?;
        Ok(body.count)
    }

    async fn list(&self) -> AppResult<Vec<Notification>> {
        let request = self.request(Method::GET, "notifications")?;
        self.send_json(request).await
    }

    async fn mark_read(&self, id: &str) -> AppResult<()> {
        let request = self.request(Method::PATCH, &format!("notifications/{id}/read"))?;
        self.send_empty(request).await
    }

    async fn mark_all_read(&self) -> AppResult<()> {
        let request = self.request(Method::PATCH, "notifications/read-all")?;
        self.send_empty(request).await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let request = self.request(Method::DELETE, &format!("notifications/{id}"))?;
        self.send_empty(request).await
    }
}
