use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Notification;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCount {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationFeed {
    pub items: Vec<Notification>,
    pub unread_count: u64,
    pub error: Option<String>,
}
