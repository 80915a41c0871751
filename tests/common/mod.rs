#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use storefront_sync::{
    dto::cart::{AddToCartRequest, SyncCartItem},
    error::{AppError, AppResult},
    gateway::{BearerToken, CartGateway, NotificationGateway},
    models::{
        CartItemRecord, NewCartLine, Notification, ProductSnapshot, Role, ServerCartLine,
        SessionUser,
    },
    services::{
        cart_store::LocalCartStore,
        reconcile::{CartReconciler, SessionEpoch},
        session_store::AuthSessionStore,
    },
    storage::{DurableStorage, MemoryStorage},
};

#[derive(Debug, Clone, PartialEq)]
pub enum CartCall {
    Fetch,
    Add(AddToCartRequest),
    Update(String, u32),
    Remove(String),
    Clear,
    Sync(Vec<SyncCartItem>),
}

/// Cart gateway that records every call and can be told to fail.
#[derive(Default)]
pub struct FakeCartGateway {
    calls: Mutex<Vec<CartCall>>,
    server_cart: Mutex<Vec<ServerCartLine>>,
    fail: AtomicBool,
    next_id: AtomicU64,
    /// When set, `fetch_cart` signals `fetch_started` and then waits here.
    fetch_gate: Mutex<Option<Arc<Notify>>>,
    pub fetch_started: Notify,
}

impl FakeCartGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_server_cart(lines: Vec<ServerCartLine>) -> Arc<Self> {
        let gateway = Self::default();
        *gateway.server_cart.lock().unwrap() = lines;
        Arc::new(gateway)
    }

    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn hold_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<CartCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, CartCall::Fetch)).count()
    }

    pub fn sync_calls(&self) -> Vec<Vec<SyncCartItem>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                CartCall::Sync(items) => Some(items),
                _ => None,
            })
            .collect()
    }

    pub fn server_cart(&self) -> Vec<ServerCartLine> {
        self.server_cart.lock().unwrap().clone()
    }

    fn record(&self, call: CartCall) -> AppResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Api {
                status: 503,
                message: "unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CartGateway for FakeCartGateway {
    async fn fetch_cart(&self) -> AppResult<Vec<ServerCartLine>> {
        self.record(CartCall::Fetch)?;
        let gate = self.fetch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.fetch_started.notify_one();
            gate.notified().await;
        }
        Ok(self.server_cart())
    }

    async fn add_item(&self, request: &AddToCartRequest) -> AppResult<CartItemRecord> {
        self.record(CartCall::Add(request.clone()))?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CartItemRecord {
            id: format!("srv-{id}"),
            product_id: request.product_id.clone(),
            quantity: request.quantity,
            size: request.size.clone(),
            color: request.color.clone(),
        })
    }

    async fn update_item(&self, id: &str, quantity: u32) -> AppResult<()> {
        self.record(CartCall::Update(id.to_string(), quantity))
    }

    async fn remove_item(&self, id: &str) -> AppResult<()> {
        self.record(CartCall::Remove(id.to_string()))
    }

    async fn clear(&self) -> AppResult<()> {
        self.record(CartCall::Clear)
    }

    async fn sync(&self, items: &[SyncCartItem]) -> AppResult<Vec<ServerCartLine>> {
        self.record(CartCall::Sync(items.to_vec()))?;
        let lines = items
            .iter()
            .enumerate()
            .map(|(i, item)| ServerCartLine {
                id: format!("synced-{i}"),
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                size: item.size.clone(),
                color: item.color.clone(),
                product: ProductSnapshot {
                    id: Some(item.product_id.clone()),
                    name: item.product_id.clone(),
                    price: 0,
                    images: Vec::new(),
                },
            })
            .collect::<Vec<_>>();
        *self.server_cart.lock().unwrap() = lines.clone();
        Ok(lines)
    }
}

#[derive(Default)]
pub struct FakeNotificationGateway {
    pub unread: AtomicU64,
    pub unread_calls: AtomicUsize,
    pub items: Mutex<Vec<Notification>>,
    fail: AtomicBool,
}

impl FakeNotificationGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn unread_calls(&self) -> usize {
        self.unread_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Api {
                status: 500,
                message: "boom".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for FakeNotificationGateway {
    async fn unread_count(&self) -> AppResult<u64> {
        self.unread_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.unread.load(Ordering::SeqCst))
    }

    async fn list(&self) -> AppResult<Vec<Notification>> {
        self.check()?;
        Ok(self.items.lock().unwrap().clone())
    }

    async fn mark_read(&self, _id: &str) -> AppResult<()> {
        self.check()
    }

    async fn mark_all_read(&self) -> AppResult<()> {
        self.check()
    }

    async fn delete(&self, _id: &str) -> AppResult<()> {
        self.check()
    }
}

pub fn new_line(
    product_id: &str,
    size: &str,
    color: &str,
    quantity: u32,
    price: i64,
) -> NewCartLine {
    NewCartLine {
        product_id: product_id.to_string(),
        name: format!("Product {product_id}"),
        price,
        image: None,
        size: Some(size.to_string()),
        color: Some(color.to_string()),
        quantity,
    }
}

pub fn server_line(id: &str, product_id: &str, price: i64, quantity: u32) -> ServerCartLine {
    ServerCartLine {
        id: id.to_string(),
        product_id: product_id.to_string(),
        quantity,
        size: Some("L".to_string()),
        color: Some("White".to_string()),
        product: ProductSnapshot {
            id: Some(product_id.to_string()),
            name: format!("Server {product_id}"),
            price,
            images: vec![format!("https://img.example.com/{product_id}.jpg")],
        },
    }
}

pub fn user(role: Role) -> SessionUser {
    SessionUser {
        id: "u-1".to_string(),
        email: "shopper@example.com".to_string(),
        name: "Shopper".to_string(),
        role,
        phone: None,
        address: None,
    }
}

pub fn notification(id: &str, read: bool) -> Notification {
    Notification {
        id: id.to_string(),
        title: format!("Notice {id}"),
        message: "Your order shipped".to_string(),
        read,
        created_at: Utc::now(),
    }
}

/// Cart store, reconciler and session store wired against fakes.
pub struct Harness {
    pub storage: Arc<MemoryStorage>,
    pub gateway: Arc<FakeCartGateway>,
    pub token: BearerToken,
    pub cart: Arc<LocalCartStore>,
    pub session: Arc<AuthSessionStore>,
}

impl Harness {
    pub fn new(gateway: Arc<FakeCartGateway>) -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()), gateway)
    }

    pub fn with_storage(storage: Arc<MemoryStorage>, gateway: Arc<FakeCartGateway>) -> Self {
        let dyn_storage: Arc<dyn DurableStorage> = storage.clone();
        let dyn_gateway: Arc<dyn CartGateway> = gateway.clone();
        let cart = Arc::new(LocalCartStore::open(dyn_storage.clone(), dyn_gateway.clone()));
        let reconciler = CartReconciler::new(cart.clone(), dyn_gateway, SessionEpoch::default());
        let token = BearerToken::default();
        let session = Arc::new(AuthSessionStore::new(dyn_storage, token.clone(), reconciler));
        Self {
            storage,
            gateway,
            token,
            cart,
            session,
        }
    }

    /// Take the session from UNINITIALIZED to ANONYMOUS with nothing stored.
    pub async fn boot_anonymous(&self) {
        self.session.restore().await.unwrap();
    }
}
