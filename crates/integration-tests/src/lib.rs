//! End-to-end tests for the ElectroStore storefront.
//!
//! The harness runs two in-process servers: a mock commerce backend that
//! mirrors the real API's wire contract, and the storefront itself pointed
//! at it. Tests drive the storefront over HTTP with a cookie-holding
//! client, the way a browser would.
//!
//! The mock is deliberately strict where the contract has sharp edges: it
//! rejects empty-string filter parameters and zero quantities, so a test
//! passing means the storefront never put those on the wire.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::json;

use electro_storefront::config::StorefrontConfig;
use electro_storefront::state::AppState;

// =============================================================================
// Mock Backend State
// =============================================================================

#[derive(Clone, serde::Serialize)]
pub struct MockProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image_url: String,
    pub stock: u32,
    pub rating: f64,
}

struct MockUser {
    id: String,
    email: String,
    password: String,
    full_name: String,
}

struct StoredCartItem {
    id: String,
    product_id: String,
    quantity: u32,
}

/// Shared backend state, inspectable from tests.
pub struct MockState {
    users: Vec<MockUser>,
    /// token -> user id
    tokens: HashMap<String, String>,
    /// user id -> cart lines
    carts: HashMap<String, Vec<StoredCartItem>>,
    products: Vec<MockProduct>,
    me_calls: u32,
    fail_products: bool,
    fail_cart: bool,
}

impl MockState {
    fn seed() -> Self {
        let product = |name: &str, description: &str, price: f64, category: &str| MockProduct {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            price,
            category: category.to_string(),
            image_url: format!("https://img.example/{}.jpg", name.replace(' ', "-")),
            stock: 25,
            rating: 4.4,
        };

        Self {
            users: Vec::new(),
            tokens: HashMap::new(),
            carts: HashMap::new(),
            products: vec![
                product(
                    "Nova X5 Smartphone",
                    "Flagship phone with a three-lens camera",
                    999.99,
                    "Smartphones",
                ),
                product(
                    "AeroBook 14 Laptop",
                    "Thin and light 14-inch laptop",
                    1299.00,
                    "Laptops",
                ),
                product(
                    "Desk Phone Stand",
                    "Aluminium stand for phones and tablets",
                    10.00,
                    "Accessories",
                ),
                product(
                    "USB-C Cable 2m",
                    "Braided charging cable",
                    3.50,
                    "Accessories",
                ),
            ],
            me_calls: 0,
            fail_products: false,
            fail_cart: false,
        }
    }

    fn user_for_token(&self, headers: &HeaderMap) -> Option<&MockUser> {
        let token = headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let user_id = self.tokens.get(token)?;
        self.users.iter().find(|u| &u.id == user_id)
    }
}

type SharedState = Arc<Mutex<MockState>>;

/// Test-side handle for inspecting and perturbing the mock backend.
#[derive(Clone)]
pub struct MockBackendHandle {
    state: SharedState,
}

impl MockBackendHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock")
    }

    /// Number of `GET /me` requests the backend has seen.
    pub fn me_calls(&self) -> u32 {
        self.lock().me_calls
    }

    /// Make `GET /products` fail with a 500 until reset.
    pub fn set_fail_products(&self, fail: bool) {
        self.lock().fail_products = fail;
    }

    /// Make `GET /cart` fail with a 500 until reset.
    pub fn set_fail_cart(&self, fail: bool) {
        self.lock().fail_cart = fail;
    }

    /// Invalidate every issued token, as a backend restart would.
    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// Look up a seeded product's ID by name.
    pub fn product_id(&self, name: &str) -> String {
        self.lock()
            .products
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id.clone())
            .expect("seeded product")
    }

    /// The cart lines for a user, as `(product name, quantity)` pairs.
    pub fn cart_of(&self, email: &str) -> Vec<(String, u32)> {
        let state = self.lock();
        let Some(user) = state.users.iter().find(|u| u.email == email) else {
            return Vec::new();
        };
        state
            .carts
            .get(&user.id)
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        let name = state
                            .products
                            .iter()
                            .find(|p| p.id == item.product_id)
                            .map(|p| p.name.clone())
                            .unwrap_or_default();
                        (name, item.quantity)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The backend-assigned line ID for a user's cart line.
    pub fn line_id(&self, email: &str, product_name: &str) -> String {
        let state = self.lock();
        let user = state
            .users
            .iter()
            .find(|u| u.email == email)
            .expect("registered user");
        let product = state
            .products
            .iter()
            .find(|p| p.name == product_name)
            .expect("seeded product");
        state
            .carts
            .get(&user.id)
            .and_then(|items| items.iter().find(|i| i.product_id == product.id))
            .map(|i| i.id.clone())
            .expect("cart line")
    }

    /// Insert a cart line directly, bypassing the storefront.
    pub fn push_cart_line(&self, email: &str, product_name: &str, quantity: u32) {
        let mut state = self.lock();
        let user_id = state
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.id.clone())
            .expect("registered user");
        let product_id = state
            .products
            .iter()
            .find(|p| p.name == product_name)
            .map(|p| p.id.clone())
            .expect("seeded product");
        state.carts.entry(user_id).or_default().push(StoredCartItem {
            id: uuid::Uuid::new_v4().to_string(),
            product_id,
            quantity,
        });
    }
}

// =============================================================================
// Mock Backend Handlers
// =============================================================================

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn mock_login(State(state): State<SharedState>, Json(body): Json<LoginRequest>) -> Response {
    let mut state = state.lock().expect("mock state lock");

    let Some(user_id) = state
        .users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
        .map(|u| u.id.clone())
    else {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
    };

    let token = uuid::Uuid::new_v4().to_string();
    state.tokens.insert(token.clone(), user_id);

    Json(json!({ "access_token": token, "token_type": "bearer" })).into_response()
}

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    full_name: String,
}

async fn mock_register(
    State(state): State<SharedState>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    let mut state = state.lock().expect("mock state lock");

    if state.users.iter().any(|u| u.email == body.email) {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }

    let id = uuid::Uuid::new_v4().to_string();
    state.users.push(MockUser {
        id: id.clone(),
        email: body.email,
        password: body.password,
        full_name: body.full_name,
    });
    state.carts.insert(id.clone(), Vec::new());

    Json(json!({ "id": id })).into_response()
}

async fn mock_me(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = state.lock().expect("mock state lock");
    state.me_calls += 1;

    match state.user_for_token(&headers) {
        Some(user) => Json(json!({
            "id": user.id,
            "email": user.email,
            "full_name": user.full_name,
        }))
        .into_response(),
        None => detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"),
    }
}

async fn mock_products(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    // An empty-string filter is a contract violation; a correct client
    // omits the parameter instead.
    if params.values().any(|v| v.is_empty()) {
        return detail(StatusCode::BAD_REQUEST, "Empty filter parameter");
    }

    let state = state.lock().expect("mock state lock");
    if state.fail_products {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Catalog unavailable");
    }

    let search = params.get("search").map(|s| s.to_lowercase());
    let category = params.get("category");

    let products: Vec<&MockProduct> = state
        .products
        .iter()
        .filter(|p| {
            search.as_ref().is_none_or(|s| {
                p.name.to_lowercase().contains(s) || p.description.to_lowercase().contains(s)
            })
        })
        .filter(|p| category.is_none_or(|c| &p.category == c))
        .collect();

    Json(products).into_response()
}

async fn mock_product(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let state = state.lock().expect("mock state lock");

    match state.products.iter().find(|p| p.id == id) {
        Some(product) => Json(product.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn mock_categories(State(state): State<SharedState>) -> Response {
    let state = state.lock().expect("mock state lock");

    let mut categories: Vec<String> = Vec::new();
    for product in &state.products {
        if !categories.contains(&product.category) {
            categories.push(product.category.clone());
        }
    }

    Json(json!({ "categories": categories })).into_response()
}

fn cart_json(state: &MockState, user_id: &str) -> Response {
    let items: Vec<serde_json::Value> = state
        .carts
        .get(user_id)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let product = state.products.iter().find(|p| p.id == item.product_id)?;
                    Some(json!({
                        "id": item.id,
                        "product": product,
                        "quantity": item.quantity,
                    }))
                })
                .collect()
        })
        .unwrap_or_default();

    Json(items).into_response()
}

async fn mock_get_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = state.lock().expect("mock state lock");

    if state.fail_cart {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Cart unavailable");
    }

    match state.user_for_token(&headers) {
        Some(user) => {
            let user_id = user.id.clone();
            cart_json(&state, &user_id)
        }
        None => detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"),
    }
}

#[derive(Deserialize)]
struct AddCartRequest {
    product_id: String,
    quantity: u32,
}

async fn mock_add_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<AddCartRequest>,
) -> Response {
    let mut state = state.lock().expect("mock state lock");

    let Some(user_id) = state.user_for_token(&headers).map(|u| u.id.clone()) else {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    };

    if !state.products.iter().any(|p| p.id == body.product_id) {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    }

    let items = state.carts.entry(user_id).or_default();
    if let Some(existing) = items.iter_mut().find(|i| i.product_id == body.product_id) {
        existing.quantity += body.quantity;
    } else {
        items.push(StoredCartItem {
            id: uuid::Uuid::new_v4().to_string(),
            product_id: body.product_id,
            quantity: body.quantity,
        });
    }

    Json(json!({ "message": "Added to cart" })).into_response()
}

#[derive(Deserialize)]
struct QuantityQuery {
    quantity: u32,
}

async fn mock_update_cart(
    State(state): State<SharedState>,
    Path(item_id): Path<String>,
    Query(query): Query<QuantityQuery>,
    headers: HeaderMap,
) -> Response {
    if query.quantity == 0 {
        return detail(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    }

    let mut state = state.lock().expect("mock state lock");

    let Some(user_id) = state.user_for_token(&headers).map(|u| u.id.clone()) else {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    };

    let Some(item) = state
        .carts
        .entry(user_id)
        .or_default()
        .iter_mut()
        .find(|i| i.id == item_id)
    else {
        return detail(StatusCode::NOT_FOUND, "Cart item not found");
    };

    item.quantity = query.quantity;
    Json(json!({ "message": "Updated" })).into_response()
}

async fn mock_remove_cart(
    State(state): State<SharedState>,
    Path(item_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().expect("mock state lock");

    let Some(user_id) = state.user_for_token(&headers).map(|u| u.id.clone()) else {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    };

    let items = state.carts.entry(user_id).or_default();
    let before = items.len();
    items.retain(|i| i.id != item_id);

    if items.len() == before {
        return detail(StatusCode::NOT_FOUND, "Cart item not found");
    }

    Json(json!({ "message": "Removed" })).into_response()
}

async fn mock_clear_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = state.lock().expect("mock state lock");

    let Some(user_id) = state.user_for_token(&headers).map(|u| u.id.clone()) else {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    };

    state.carts.insert(user_id, Vec::new());
    Json(json!({ "message": "Cleared" })).into_response()
}

fn mock_router(state: SharedState) -> Router {
    Router::new()
        .route("/login", post(mock_login))
        .route("/register", post(mock_register))
        .route("/me", get(mock_me))
        .route("/products", get(mock_products))
        .route("/products/{id}", get(mock_product))
        .route("/categories", get(mock_categories))
        .route("/cart", get(mock_get_cart).post(mock_add_cart).delete(mock_clear_cart))
        .route(
            "/cart/{id}",
            put(mock_update_cart).delete(mock_remove_cart),
        )
        .with_state(state)
}

/// Start the mock backend on an ephemeral port.
pub async fn spawn_backend() -> (String, MockBackendHandle) {
    let state: SharedState = Arc::new(Mutex::new(MockState::seed()));
    let router = mock_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock backend");
    });

    (format!("http://{addr}"), MockBackendHandle { state })
}

// =============================================================================
// Test Context
// =============================================================================

/// A running storefront wired to a fresh mock backend.
pub struct TestContext {
    /// Cookie-holding client that follows redirects, like a browser.
    pub client: reqwest::Client,
    /// Same cookie jar, but redirects are not followed; used to assert on
    /// `Location` headers.
    pub raw: reqwest::Client,
    pub storefront_url: String,
    pub backend: MockBackendHandle,
}

impl TestContext {
    /// Spawn the mock backend and the storefront, both on ephemeral ports.
    pub async fn spawn() -> Self {
        let (backend_url, backend) = spawn_backend().await;

        let config = StorefrontConfig {
            backend_url,
            host: "127.0.0.1".parse().expect("loopback addr"),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            sentry_dsn: None,
        };

        let app = electro_storefront::app(AppState::new(config));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind storefront");
        let addr = listener.local_addr().expect("storefront addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("storefront server");
        });

        let jar = Arc::new(reqwest::cookie::Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .expect("build client");
        let raw = reqwest::Client::builder()
            .cookie_provider(jar)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("build raw client");

        Self {
            client,
            raw,
            storefront_url: format!("http://{addr}"),
            backend,
        }
    }

    /// Build an absolute storefront URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// Register an account through the storefront form and leave the
    /// session logged in.
    pub async fn register_and_login(&self, email: &str, password: &str, full_name: &str) {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .form(&[
                ("full_name", full_name),
                ("email", email),
                ("password", password),
            ])
            .send()
            .await
            .expect("register request");
        assert!(response.status().is_success(), "registration should land on a page");
    }

    /// Fetch a page and return its body text.
    pub async fn page(&self, path: &str) -> String {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("page request")
            .text()
            .await
            .expect("page body")
    }
}
