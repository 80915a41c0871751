use std::sync::Arc;

use crate::{
    gateway::{ApiClient, CartGateway, NotificationGateway},
    services::{
        cart_store::LocalCartStore,
        notification_service::NotificationCenter,
        reconcile::{CartReconciler, SessionEpoch},
        session_store::AuthSessionStore,
    },
    storage::DurableStorage,
};

#[derive(Clone)]
pub struct AppState {
    pub cart: Arc<LocalCartStore>,
    pub session: Arc<AuthSessionStore>,
    pub notifications: Arc<NotificationCenter>,
    pub api: ApiClient,
}

impl AppState {
    /// Wire every store against the real API client.
    pub fn new(storage: Arc<dyn DurableStorage>, api: ApiClient) -> Self {
        let cart_gateway: Arc<dyn CartGateway> = Arc::new(api.clone());
        let notification_gateway: Arc<dyn NotificationGateway> = Arc::new(api.clone());
        Self::with_gateways(storage, api, cart_gateway, notification_gateway)
    }

    pub fn with_gateways(
        storage: Arc<dyn DurableStorage>,
        api: ApiClient,
        cart_gateway: Arc<dyn CartGateway>,
        notification_gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        let cart = Arc::new(LocalCartStore::open(storage.clone(), cart_gateway.clone()));
        let reconciler = CartReconciler::new(cart.clone(), cart_gateway, SessionEpoch::default());
        let session = Arc::new(AuthSessionStore::new(
            storage,
            api.token().clone(),
            reconciler,
        ));
        let notifications = Arc::new(NotificationCenter::new(notification_gateway));

        Self {
            cart,
            session,
            notifications,
            api,
        }
    }
}
