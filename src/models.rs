use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
    Support,
}

impl Role {
    /// Where a freshly signed-in user of this role is sent.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Support => "/support",
            Role::User => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl SessionUser {
    /// Decode a user from untrusted JSON (persisted storage or a callback
    /// query parameter). Anything that does not validate is rejected.
    pub fn decode(raw: &str) -> AppResult<Self> {
        let user: SessionUser = serde_json::from_str(raw)
            .map_err(|e| AppError::InvalidSession(format!("user is not valid JSON: {e}")))?;
        user.validate()?;
        Ok(user)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.id.trim().is_empty() {
            return Err(AppError::InvalidSession("user id is empty".into()));
        }
        if !self.email.contains('@') {
            return Err(AppError::InvalidSession("user email is malformed".into()));
        }
        Ok(())
    }
}

/// Bearer tokens are opaque, but must be a single non-empty header-safe word.
pub fn validate_token(token: &str) -> AppResult<()> {
    if token.is_empty() || token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AppError::InvalidSession("token is malformed".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
}

impl SessionPhase {
    pub fn can_transition_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, next),
            (Uninitialized, Loading)
                | (Loading, Authenticated)
                | (Loading, Anonymous)
                | (Authenticated, Anonymous)
                | (Anonymous, Authenticated)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    pub product_id: String,
    pub name: String,
    /// Unit price in minor currency units, captured when the line was added.
    pub price: i64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity, saturating at the bounds of `i64`.
    pub fn subtotal(&self) -> i64 {
        self.price.saturating_mul(i64::from(self.quantity))
    }

    pub fn matches(&self, product_id: &str, size: Option<&str>, color: Option<&str>) -> bool {
        self.product_id == product_id
            && self.size.as_deref() == size
            && self.color.as_deref() == color
    }
}

/// A line as requested by "add to cart", before it has an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCartLine {
    pub product_id: String,
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub quantity: u32,
}

impl NewCartLine {
    pub fn into_line(self, id: String) -> CartLine {
        CartLine {
            id,
            product_id: self.product_id,
            name: self.name,
            price: self.price,
            image: self.image,
            size: self.size,
            color: self.color,
            quantity: self.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Cart line as returned by `GET /cart`, with the product embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerCartLine {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub product: ProductSnapshot,
}

impl From<ServerCartLine> for CartLine {
    fn from(line: ServerCartLine) -> Self {
        CartLine {
            id: line.id,
            product_id: line.product_id,
            name: line.product.name,
            price: line.product.price,
            image: line.product.images.into_iter().next(),
            size: line.size,
            color: line.color,
            quantity: line.quantity,
        }
    }
}

/// Cart row returned by `POST /cart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRecord {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub total_amount: i64,
    pub status: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub price: i64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
