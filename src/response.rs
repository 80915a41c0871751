use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Meta {
    pub total: Option<i64>,
    pub total_items: Option<u64>,
    pub total_price: Option<i64>,
}

impl Meta {
    pub fn totals(total: i64, total_items: u64, total_price: i64) -> Self {
        Self {
            total: Some(total),
            total_items: Some(total_items),
            total_price: Some(total_price),
        }
    }

    pub fn count(total: i64) -> Self {
        Self {
            total: Some(total),
            total_items: None,
            total_price: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            total: None,
            total_items: None,
            total_price: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}
