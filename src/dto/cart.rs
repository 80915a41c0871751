use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CartLine, NewCartLine};

/// Body of `POST /cart` on the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl From<&NewCartLine> for AddToCartRequest {
    fn from(line: &NewCartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            size: line.size.clone(),
            color: line.color.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

/// Local surface body for `PATCH /cart/{id}`. Signed so that zero and
/// negative values can be routed to removal.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

/// One line of a bulk replace. Price and id are never sent; the server
/// prices lines itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncCartItem {
    pub product_id: String,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl From<&CartLine> for SyncCartItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            size: line.size.clone(),
            color: line.color.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncCartRequest {
    pub items: Vec<SyncCartItem>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CartList {
    #[schema(value_type = Vec<CartLine>)]
    pub items: Vec<CartLine>,
}
