use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{SessionSnapshot, UpdateProfileRequest},
        cart::{CartList, SetQuantityRequest},
        catalog::{CategoryList, CategoryRequest},
        notifications::{NotificationFeed, UnreadCount},
        orders::OrderList,
    },
    models::{
        CartLine, Category, NewCartLine, Notification, Order, OrderItem, Role, SessionPhase,
        SessionUser,
    },
    response::{ApiResponse, Meta},
    routes::{auth, cart, catalog, health, notifications},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::oauth_callback,
        auth::logout,
        auth::session,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        cart::clear_cart,
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        catalog::list_categories,
        catalog::get_category,
        catalog::create_category,
        catalog::update_category,
        catalog::delete_category,
        catalog::list_orders,
        catalog::get_order,
        catalog::update_profile
    ),
    components(
        schemas(
            CartLine,
            NewCartLine,
            Category,
            Notification,
            Order,
            OrderItem,
            Role,
            SessionPhase,
            SessionUser,
            SessionSnapshot,
            UpdateProfileRequest,
            CartList,
            SetQuantityRequest,
            CategoryList,
            CategoryRequest,
            NotificationFeed,
            UnreadCount,
            OrderList,
            health::HealthData,
            Meta,
            ApiResponse<CartList>,
            ApiResponse<CartLine>,
            ApiResponse<SessionSnapshot>,
            ApiResponse<NotificationFeed>,
            ApiResponse<OrderList>,
            ApiResponse<CategoryList>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Session and OAuth callback endpoints"),
        (name = "Cart", description = "Local cart endpoints"),
        (name = "Notifications", description = "Notification endpoints"),
        (name = "Catalog", description = "Category endpoints"),
        (name = "Orders", description = "Order endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
