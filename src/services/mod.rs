pub mod cart_store;
pub mod notification_service;
pub mod reconcile;
pub mod session_store;
