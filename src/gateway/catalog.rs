//! Read-through access to categories, orders and the user profile. These
//! endpoints carry no client-side state, so they are plain methods rather
//! than a substitutable trait.

use reqwest::Method;

use crate::{
    dto::{auth::UpdateProfileRequest, catalog::CategoryRequest},
    error::AppResult,
    models::{Category, Order, SessionUser},
};

use super::ApiClient;

impl ApiClient {
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let request = self.request(Method::GET, "categories")?;
        self.send_json(request).await
    }

    pub async fn get_category(&self, id: &str) -> AppResult<Category> {
        let request = self.request(Method::GET, &format!("categories/{id}"))?;
        self.send_json(request).await
    }

    pub async fn create_category(&self, payload: &CategoryRequest) -> AppResult<Category> {
        let request = self.request(Method::POST, "categories")?.json(payload);
        self.send_json(request).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        payload: &CategoryRequest,
    ) -> AppResult<Category> {
        let request = self
            .request(Method::PUT, &format!("categories/{id}"))?
            .json(payload);
        self.send_json(request).await
    }

    pub async fn delete_category(&self, id: &str) -> AppResult<()> {
        let request = self.request(Method::DELETE, &format!("categories/{id}"))?;
        self.send_empty(request).await
    }

    pub async fn list_orders(&self) -> AppResult<Vec<Order>> {
        let request = self.request(Method::GET, "orders")?;
        self.send_json(request).await
    }

    pub async fn get_order(&self, id: &str) -> AppResult<Order> {
        let request = self.request(Method::GET, &format!("orders/{id}"))?;
        self.send_json(request).await
    }

    /// `PATCH /users/:id`; the server answers with the updated user.
    pub async fn update_profile(
        &self,
        user_id: &str,
        payload: &UpdateProfileRequest,
    ) -> AppResult<SessionUser> {
        let request = self
            .request(Method::PATCH, &format!("users/{user_id}"))?
            .json(payload);
        self.send_json(request).await
    }
}
