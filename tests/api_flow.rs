// End-to-end flow against an in-process fake of the storefront API:
// anonymous cart -> OAuth callback -> push -> authenticated edits -> logout.
mod common;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    routing::{get, patch, post},
};
use reqwest::redirect::Policy;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use common::{new_line, user};
use storefront_sync::{
    dto::cart::{AddToCartRequest, SyncCartRequest, UpdateCartItemRequest},
    error::AppError,
    gateway::{ApiClient, BearerToken, CartGateway, NotificationGateway},
    models::{CartItemRecord, ProductSnapshot, Role, ServerCartLine},
    routes::{create_api_router, health},
    state::AppState,
    storage::{DurableStorage, MemoryStorage},
};

const TOKEN: &str = "tok-live";

#[derive(Default)]
struct FakeApi {
    cart: Vec<ServerCartLine>,
    syncs: Vec<SyncCartRequest>,
    next_id: u32,
}

type Shared = Arc<Mutex<FakeApi>>;

fn authorize(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn get_cart(
    State(api): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Vec<ServerCartLine>>, StatusCode> {
    authorize(&headers)?;
    Ok(Json(api.lock().unwrap().cart.clone()))
}

async fn add_item(
    State(api): State<Shared>,
    headers: HeaderMap,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartItemRecord>, (StatusCode, String)> {
    authorize(&headers).map_err(|s| (s, String::new()))?;
    if req.product_id == "boom" {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "database exploded".into()));
    }
    let mut api = api.lock().unwrap();
    api.next_id += 1;
    let id = format!("row-{}", api.next_id);
    api.cart.push(ServerCartLine {
        id: id.clone(),
        product_id: req.product_id.clone(),
        quantity: req.quantity,
        size: req.size.clone(),
        color: req.color.clone(),
        product: ProductSnapshot {
            id: Some(req.product_id.clone()),
            name: format!("Remote {}", req.product_id),
            price: 999,
            images: Vec::new(),
        },
    });
    Ok(Json(CartItemRecord {
        id,
        product_id: req.product_id,
        quantity: req.quantity,
        size: req.size,
        color: req.color,
    }))
}

async fn update_item(
    State(api): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&headers)?;
    let mut api = api.lock().unwrap();
    let line = api.cart.iter_mut().find(|l| l.id == id).ok_or(StatusCode::NOT_FOUND)?;
    line.quantity = req.quantity;
    Ok(Json(json!({ "ok": true })))
}

async fn remove_item(
    State(api): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    authorize(&headers)?;
    api.lock().unwrap().cart.retain(|l| l.id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_cart(
    State(api): State<Shared>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    authorize(&headers)?;
    api.lock().unwrap().cart.clear();
    Ok(StatusCode::NO_CONTENT)
}

async fn sync_cart(
    State(api): State<Shared>,
    headers: HeaderMap,
    Json(req): Json<SyncCartRequest>,
) -> Result<(StatusCode, Json<Vec<ServerCartLine>>), StatusCode> {
    authorize(&headers)?;
    let mut api = api.lock().unwrap();
    api.cart = req
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| ServerCartLine {
            id: format!("sync-{i}"),
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            size: item.size.clone(),
            color: item.color.clone(),
            product: ProductSnapshot {
                id: None,
                name: item.product_id.clone(),
                price: 999,
                images: Vec::new(),
            },
        })
        .collect();
    api.syncs.push(req);
    Ok((StatusCode::CREATED, Json(api.cart.clone())))
}

async fn unread_count(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    authorize(&headers)?;
    Ok(Json(json!({ "count": 7 })))
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_fake_api() -> (Shared, String) {
    let shared: Shared = Arc::default();
    let api = Router::new()
        .route("/cart", get(get_cart).post(add_item).delete(clear_cart))
        .route("/cart/sync", post(sync_cart))
        .route("/cart/{id}", patch(update_item).delete(remove_item))
        .route("/notifications/unread-count", get(unread_count))
        .with_state(shared.clone());
    let base = serve(Router::new().nest("/api", api)).await;
    (shared, format!("{base}/api"))
}

fn client(base: &str) -> ApiClient {
    ApiClient::new(base, BearerToken::default(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let (_api, base) = spawn_fake_api().await;
    let client = client(&base);

    let err = client.fetch_cart().await.unwrap_err();

    assert!(matches!(err, AppError::Unauthorized));
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let (_api, base) = spawn_fake_api().await;
    let client = client(&base);
    client.token().set(TOKEN);

    let err = client.update_item("nope", 2).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let request = AddToCartRequest {
        product_id: "boom".into(),
        quantity: 1,
        size: None,
        color: None,
    };
    match client.add_item(&request).await.unwrap_err() {
        AppError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database exploded");
        }
        other => panic!("unexpected error {other:?}"),
    }

    assert_eq!(client.unread_count().await.unwrap(), 7);
}

#[tokio::test]
async fn anonymous_cart_is_pushed_on_login_and_edits_follow_the_server() {
    let (api, base) = spawn_fake_api().await;
    let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());
    let state = AppState::new(storage, client(&base));
    state.session.restore().await.unwrap();

    state.cart.add(new_line("p1", "M", "Black", 2, 1500), false).await.unwrap();
    state.session.login(user(Role::User), TOKEN.into()).await.unwrap();

    {
        let api = api.lock().unwrap();
        assert_eq!(api.syncs.len(), 1);
        assert_eq!(api.syncs[0].items.len(), 1);
        assert_eq!(api.cart[0].product_id, "p1");
        assert_eq!(api.cart[0].quantity, 2);
    }

    let added = state
        .cart
        .add(new_line("p2", "S", "Red", 1, 500), state.session.is_authenticated())
        .await
        .unwrap();
    assert_eq!(added.id, "row-1");

    state.cart.update_quantity(&added.id, 4, true).await.unwrap();
    assert_eq!(
        api.lock().unwrap().cart.iter().find(|l| l.id == "row-1").unwrap().quantity,
        4
    );

    state.cart.remove(&added.id, true).await.unwrap();
    assert!(api.lock().unwrap().cart.iter().all(|l| l.id != "row-1"));

    state.session.logout().await.unwrap();
    assert_eq!(state.api.token().get(), None);
    assert_eq!(state.cart.lines().len(), 1);
}

#[tokio::test]
async fn edits_to_pushed_lines_reach_the_server() {
    let (api, base) = spawn_fake_api().await;
    let state = AppState::new(Arc::new(MemoryStorage::new()), client(&base));
    state.session.restore().await.unwrap();
    let local = state.cart.add(new_line("p1", "M", "Black", 2, 1500), false).await.unwrap();
    state.cart.add(new_line("p2", "S", "Red", 1, 500), false).await.unwrap();

    state.session.login(user(Role::User), TOKEN.into()).await.unwrap();

    let pushed = state.cart.lines();
    assert_eq!(pushed[0].id, "sync-0");
    assert_eq!(pushed[1].id, "sync-1");
    assert_ne!(pushed[0].id, local.id);

    state.cart.update_quantity(&pushed[0].id, 5, true).await.unwrap();
    state.cart.remove(&pushed[1].id, true).await.unwrap();

    let api = api.lock().unwrap();
    assert_eq!(api.cart.len(), 1);
    assert_eq!(api.cart[0].id, "sync-0");
    assert_eq!(api.cart[0].quantity, 5);
    assert_eq!(api.syncs.len(), 1);
}

#[tokio::test]
async fn pull_decodes_camel_case_server_lines() {
    let (api, base) = spawn_fake_api().await;
    let raw = json!([{
        "id": "c-1",
        "productId": "p2",
        "quantity": 3,
        "size": "L",
        "color": null,
        "product": { "id": "p2", "name": "Hoodie", "price": 10, "images": ["a.jpg", "b.jpg"] }
    }]);
    api.lock().unwrap().cart = serde_json::from_value(raw).unwrap();

    let state = AppState::new(Arc::new(MemoryStorage::new()), client(&base));
    state.session.restore().await.unwrap();
    state.session.login(user(Role::User), TOKEN.into()).await.unwrap();

    let lines = state.cart.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].name, "Hoodie");
    assert_eq!(lines[0].price, 10);
    assert_eq!(lines[0].quantity, 3);
    assert_eq!(lines[0].image.as_deref(), Some("a.jpg"));
    assert_eq!(lines[0].color, None);
}

async fn spawn_local_surface(base: &str) -> (AppState, String) {
    let state = AppState::new(Arc::new(MemoryStorage::new()), client(base));
    state.session.restore().await.unwrap();
    let app = Router::new()
        .route("/health", get(health::health_check))
        .merge(create_api_router())
        .with_state(state.clone());
    let local = serve(app).await;
    (state, local)
}

#[tokio::test]
async fn oauth_callback_redirects_by_role_or_to_login_error() {
    let (_api, base) = spawn_fake_api().await;
    let (state, local) = spawn_local_surface(&base).await;
    let http = reqwest::Client::builder().redirect(Policy::none()).build().unwrap();

    let bad = http
        .get(format!("{local}/auth/callback?token={TOKEN}"))
        .send()
        .await
        .unwrap();
    assert!(bad.status().is_redirection());
    assert_eq!(
        bad.headers()[header::LOCATION.as_str()],
        "/login?error=oauth_failed"
    );
    assert!(!state.session.is_authenticated());

    let user_json = serde_json::to_string(&user(Role::Admin)).unwrap();
    let url = Url::parse_with_params(
        &format!("{local}/auth/callback"),
        &[("token", TOKEN), ("user", user_json.as_str())],
    )
    .unwrap();
    let ok = http.get(url).send().await.unwrap();
    assert!(ok.status().is_redirection());
    assert_eq!(ok.headers()[header::LOCATION.as_str()], "/admin");
    assert!(state.session.is_authenticated());

    let session: Value = http
        .get(format!("{local}/auth/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["data"]["phase"], "AUTHENTICATED");
    assert_eq!(session["data"]["user"]["role"], "ADMIN");
}

#[tokio::test]
async fn local_cart_endpoints_report_totals() {
    let (_api, base) = spawn_fake_api().await;
    let (_state, local) = spawn_local_surface(&base).await;
    let http = reqwest::Client::new();

    let added: Value = http
        .post(format!("{local}/cart"))
        .json(&json!({
            "productId": "p1", "name": "Tee", "price": 1200,
            "size": "M", "color": "Black", "quantity": 2
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = added["data"]["id"].as_str().unwrap().to_string();

    let cart: Value = http
        .patch(format!("{local}/cart/{id}"))
        .json(&json!({ "quantity": 3 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["meta"]["total_items"], 3);
    assert_eq!(cart["meta"]["total_price"], 3600);

    let cart: Value = http
        .patch(format!("{local}/cart/{id}"))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["data"].as_array().map(Vec::len), Some(0));

    let health: Value = http
        .get(format!("{local}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["data"]["status"], "ok");
    assert_eq!(health["data"]["session"], "ANONYMOUS");

    let orders = http.get(format!("{local}/orders")).send().await.unwrap();
    assert_eq!(orders.status(), reqwest::StatusCode::UNAUTHORIZED);
}
