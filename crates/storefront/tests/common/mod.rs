//! Shared integration test harness.
//!
//! Spawns a stub Nexus backend (an axum router that records every call it
//! receives) and the real storefront app on ephemeral ports, plus a
//! cookie-keeping reqwest client that does not follow redirects so tests
//! can assert on them.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use nexus_storefront::config::StorefrontConfig;
use nexus_storefront::routes;
use nexus_storefront::state::AppState;

pub const SHOPPER_EMAIL: &str = "ada@example.com";
pub const ADMIN_EMAIL: &str = "root@example.com";
pub const SUPER_EMAIL: &str = "boss@example.com";
pub const PASSWORD: &str = "secret-pass-1";

pub const SHOPPER_TOKEN: &str = "tok-user";
pub const ADMIN_TOKEN: &str = "tok-admin";
pub const SUPER_TOKEN: &str = "tok-super";

// =============================================================================
// Stub backend
// =============================================================================

struct StubUser {
    id: String,
    name: String,
    email: String,
    password: String,
    role: String,
    token: String,
}

#[derive(Clone)]
struct StubLine {
    id: String,
    product_id: String,
    quantity: u32,
}

struct StubInner {
    calls: Vec<String>,
    users: Vec<StubUser>,
    products: Vec<Value>,
    carts: HashMap<String, Vec<StubLine>>,
    revoked: HashSet<String>,
    next_line: u32,
    next_product: u32,
    next_user: u32,
}

/// Handle to the stub backend's state, shared with its router.
#[derive(Clone)]
pub struct StubBackend {
    inner: Arc<Mutex<StubInner>>,
}

fn stub_user(id: &str, name: &str, email: &str, role: &str, token: &str) -> StubUser {
    StubUser {
        id: id.to_owned(),
        name: name.to_owned(),
        email: email.to_owned(),
        password: PASSWORD.to_owned(),
        role: role.to_owned(),
        token: token.to_owned(),
    }
}

impl StubBackend {
    fn new() -> Self {
        let inner = StubInner {
            calls: Vec::new(),
            users: vec![
                stub_user("u1", "Ada", SHOPPER_EMAIL, "user", SHOPPER_TOKEN),
                stub_user("u2", "Root", ADMIN_EMAIL, "admin", ADMIN_TOKEN),
                stub_user("u3", "Boss", SUPER_EMAIL, "superadmin", SUPER_TOKEN),
            ],
            products: vec![
                json!({
                    "id": "p1",
                    "name": "Widget",
                    "description": "A very good widget",
                    "price": "19.99",
                    "stock": 5,
                    "imageUrl": "/uploads/widget.png"
                }),
                json!({
                    "id": "p2",
                    "name": "Gadget",
                    "description": "Currently sold out",
                    "price": "5.00",
                    "stock": 0
                }),
            ],
            carts: HashMap::new(),
            revoked: HashSet::new(),
            next_line: 1,
            next_product: 3,
            next_user: 4,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Calls against the remote cart service only.
    pub fn cart_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.contains("/api/cart"))
            .collect()
    }

    pub fn count_calls(&self, needle: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.contains(needle))
            .count()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    /// Make a token fail `/users/me` from now on (expired session).
    pub fn revoke(&self, token: &str) {
        self.inner.lock().unwrap().revoked.insert(token.to_owned());
    }

    /// Change a user's display name server-side.
    pub fn rename_user(&self, email: &str, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter_mut().find(|u| u.email == email) {
            user.name = name.to_owned();
        }
    }

    /// Put a line directly into a user's server-side cart.
    pub fn seed_cart_line(&self, email: &str, line_id: &str, product_id: &str, quantity: u32) {
        let mut inner = self.inner.lock().unwrap();
        let user_id = inner
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.id.clone())
            .unwrap();
        inner.carts.entry(user_id).or_default().push(StubLine {
            id: line_id.to_owned(),
            product_id: product_id.to_owned(),
            quantity,
        });
    }

    fn record(&self, method: &str, path: &str) {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push(format!("{method} {path}"));
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

fn user_json(user: &StubUser) -> Value {
    json!({
        "id": user.id.clone(),
        "name": user.name.clone(),
        "email": user.email.clone(),
        "role": user.role.clone(),
    })
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))).into_response()
}

fn line_json(inner: &StubInner, line: &StubLine) -> Value {
    let product = inner
        .products
        .iter()
        .find(|p| p["id"] == Value::String(line.product_id.clone()))
        .cloned()
        .unwrap_or_else(|| {
            json!({"id": line.product_id.clone(), "name": "?", "price": "0", "stock": 0})
        });
    json!({
        "id": line.id.clone(),
        "productId": line.product_id.clone(),
        "quantity": line.quantity,
        "Product": product,
    })
}

async fn login(
    State(stub): State<StubBackend>,
    Json(body): Json<Value>,
) -> Response {
    stub.record("POST", "/api/auth/login");
    let inner = stub.inner.lock().unwrap();
    let found = inner.users.iter().find(|u| {
        Some(u.email.as_str()) == body["email"].as_str()
            && Some(u.password.as_str()) == body["password"].as_str()
    });

    match found {
        Some(user) => {
            Json(json!({"token": user.token.clone(), "user": user_json(user)})).into_response()
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid email or password"})),
        )
            .into_response(),
    }
}

async fn register(State(stub): State<StubBackend>, Json(body): Json<Value>) -> Response {
    stub.record("POST", "/api/auth/register");
    let mut inner = stub.inner.lock().unwrap();

    let email = body["email"].as_str().unwrap_or_default().to_owned();
    if inner.users.iter().any(|u| u.email == email) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "Email already registered"})),
        )
            .into_response();
    }

    let id = format!("u{}", inner.next_user);
    inner.next_user += 1;
    let token = format!("tok-{id}");
    inner.users.push(StubUser {
        id,
        name: body["name"].as_str().unwrap_or_default().to_owned(),
        email,
        password: body["password"].as_str().unwrap_or_default().to_owned(),
        role: "user".to_owned(),
        token,
    });

    (StatusCode::CREATED, Json(json!({"message": "ok"}))).into_response()
}

async fn create_admin(
    State(stub): State<StubBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    stub.record("POST", "/api/auth/create-admin");
    let mut inner = stub.inner.lock().unwrap();

    let is_super = bearer(&headers)
        .and_then(|token| inner.users.iter().find(|u| u.token == token).map(|u| u.role.clone()))
        == Some("superadmin".to_owned());
    if !is_super {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Forbidden"})),
        )
            .into_response();
    }

    let id = format!("u{}", inner.next_user);
    inner.next_user += 1;
    let token = format!("tok-{id}");
    inner.users.push(StubUser {
        id,
        name: body["name"].as_str().unwrap_or_default().to_owned(),
        email: body["email"].as_str().unwrap_or_default().to_owned(),
        password: body["password"].as_str().unwrap_or_default().to_owned(),
        role: "admin".to_owned(),
        token,
    });

    (StatusCode::CREATED, Json(json!({"message": "ok"}))).into_response()
}

async fn me(State(stub): State<StubBackend>, headers: HeaderMap) -> Response {
    stub.record("GET", "/api/users/me");
    let inner = stub.inner.lock().unwrap();

    let Some(token) = bearer(&headers) else {
        return unauthorized();
    };
    if inner.revoked.contains(&token) {
        return unauthorized();
    }

    match inner.users.iter().find(|u| u.token == token) {
        Some(user) => Json(user_json(user)).into_response(),
        None => unauthorized(),
    }
}

async fn all_users(State(stub): State<StubBackend>, headers: HeaderMap) -> Response {
    stub.record("GET", "/api/users/all");
    let inner = stub.inner.lock().unwrap();

    let caller = bearer(&headers).and_then(|t| inner.users.iter().find(|u| u.token == t));
    if caller.map(|u| u.role.as_str()) != Some("superadmin") {
        return unauthorized();
    }

    let users: Vec<Value> = inner.users.iter().map(user_json).collect();
    Json(json!({"data": users})).into_response()
}

async fn customers(State(stub): State<StubBackend>, headers: HeaderMap) -> Response {
    stub.record("GET", "/api/users/customers");
    let inner = stub.inner.lock().unwrap();

    let caller = bearer(&headers).and_then(|t| inner.users.iter().find(|u| u.token == t));
    if !matches!(caller.map(|u| u.role.as_str()), Some("admin" | "superadmin")) {
        return unauthorized();
    }

    let users: Vec<Value> = inner
        .users
        .iter()
        .filter(|u| u.role == "user")
        .map(user_json)
        .collect();
    Json(json!({"data": users})).into_response()
}

async fn products(State(stub): State<StubBackend>) -> Response {
    stub.record("GET", "/api/products");
    let inner = stub.inner.lock().unwrap();
    Json(json!({"data": inner.products.clone()})).into_response()
}

async fn create_product(State(stub): State<StubBackend>, Json(body): Json<Value>) -> Response {
    stub.record("POST", "/api/products");
    let mut inner = stub.inner.lock().unwrap();
    let id = format!("p{}", inner.next_product);
    inner.next_product += 1;
    let mut product = body;
    product["id"] = Value::String(id);
    inner.products.push(product);
    (StatusCode::CREATED, Json(json!({"message": "ok"}))).into_response()
}

async fn update_product(
    State(stub): State<StubBackend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    stub.record("PUT", &format!("/api/products/{id}"));
    let mut inner = stub.inner.lock().unwrap();
    if let Some(product) = inner
        .products
        .iter_mut()
        .find(|p| p["id"] == Value::String(id.clone()))
    {
        let mut updated = body;
        updated["id"] = Value::String(id);
        *product = updated;
    }
    Json(json!({"message": "ok"})).into_response()
}

async fn delete_product(State(stub): State<StubBackend>, Path(id): Path<String>) -> Response {
    stub.record("DELETE", &format!("/api/products/{id}"));
    let mut inner = stub.inner.lock().unwrap();
    inner.products.retain(|p| p["id"] != Value::String(id.clone()));
    Json(json!({"message": "ok"})).into_response()
}

async fn my_cart(State(stub): State<StubBackend>, headers: HeaderMap) -> Response {
    stub.record("GET", "/api/cart");
    let inner = stub.inner.lock().unwrap();

    let Some(user) = bearer(&headers).and_then(|t| inner.users.iter().find(|u| u.token == t))
    else {
        return unauthorized();
    };

    let lines: Vec<Value> = inner
        .carts
        .get(&user.id)
        .map(|lines| lines.iter().map(|l| line_json(&inner, l)).collect())
        .unwrap_or_default();
    Json(json!({"data": lines})).into_response()
}

async fn user_cart(
    State(stub): State<StubBackend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    stub.record("GET", &format!("/api/cart/{id}"));
    let inner = stub.inner.lock().unwrap();

    let caller = bearer(&headers).and_then(|t| inner.users.iter().find(|u| u.token == t));
    if !matches!(caller.map(|u| u.role.as_str()), Some("admin" | "superadmin")) {
        return unauthorized();
    }

    let lines: Vec<Value> = inner
        .carts
        .get(&id)
        .map(|lines| lines.iter().map(|l| line_json(&inner, l)).collect())
        .unwrap_or_default();
    Json(json!({"data": lines})).into_response()
}

async fn all_carts(State(stub): State<StubBackend>, headers: HeaderMap) -> Response {
    stub.record("GET", "/api/cart/all");
    let inner = stub.inner.lock().unwrap();

    let caller = bearer(&headers).and_then(|t| inner.users.iter().find(|u| u.token == t));
    if caller.map(|u| u.role.as_str()) != Some("superadmin") {
        return unauthorized();
    }

    let mut items = Vec::new();
    for (user_id, lines) in &inner.carts {
        let Some(owner) = inner.users.iter().find(|u| &u.id == user_id) else {
            continue;
        };
        for line in lines {
            let mut item = line_json(&inner, line);
            item["User"] = user_json(owner);
            items.push(item);
        }
    }
    Json(json!({"data": items})).into_response()
}

async fn add_to_cart(
    State(stub): State<StubBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    stub.record("POST", "/api/cart/add");
    let mut inner = stub.inner.lock().unwrap();

    let Some(user_id) = bearer(&headers)
        .and_then(|t| inner.users.iter().find(|u| u.token == t))
        .map(|u| u.id.clone())
    else {
        return unauthorized();
    };

    let product_id = body["productId"].as_str().unwrap_or_default().to_owned();
    #[allow(clippy::cast_possible_truncation)]
    let quantity = body["quantity"].as_u64().unwrap_or(1) as u32;

    let line_id = format!("c{}", inner.next_line);
    inner.next_line += 1;

    let lines = inner.carts.entry(user_id).or_default();
    // The server merges additions into an existing line of the same product
    if let Some(existing) = lines.iter_mut().find(|l| l.product_id == product_id) {
        existing.quantity += quantity;
    } else {
        lines.push(StubLine {
            id: line_id,
            product_id,
            quantity,
        });
    }

    (StatusCode::CREATED, Json(json!({"message": "ok"}))).into_response()
}

async fn update_line(
    State(stub): State<StubBackend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    stub.record("PUT", &format!("/api/cart/{id}"));
    let mut inner = stub.inner.lock().unwrap();

    #[allow(clippy::cast_possible_truncation)]
    let quantity = body["quantity"].as_u64().unwrap_or(1) as u32;
    for lines in inner.carts.values_mut() {
        if let Some(line) = lines.iter_mut().find(|l| l.id == id) {
            line.quantity = quantity;
        }
    }
    Json(json!({"message": "ok"})).into_response()
}

async fn remove_line(State(stub): State<StubBackend>, Path(id): Path<String>) -> Response {
    stub.record("DELETE", &format!("/api/cart/{id}"));
    let mut inner = stub.inner.lock().unwrap();
    for lines in inner.carts.values_mut() {
        lines.retain(|l| l.id != id);
    }
    Json(json!({"message": "ok"})).into_response()
}

fn stub_router(stub: StubBackend) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/create-admin", post(create_admin))
        .route("/api/users/me", get(me))
        .route("/api/users/all", get(all_users))
        .route("/api/users/customers", get(customers))
        .route("/api/products", get(products).post(create_product))
        .route(
            "/api/products/{id}",
            axum::routing::put(update_product).delete(delete_product),
        )
        .route("/api/cart", get(my_cart))
        .route("/api/cart/all", get(all_carts))
        .route("/api/cart/add", post(add_to_cart))
        .route(
            "/api/cart/{id}",
            get(user_cart).put(update_line).delete(remove_line),
        )
        .with_state(stub)
}

// =============================================================================
// Test application
// =============================================================================

pub struct TestApp {
    pub base: String,
    pub backend: StubBackend,
    pub client: reqwest::Client,
}

/// Spawn the stub backend and the storefront with default configuration.
pub async fn spawn() -> TestApp {
    spawn_with(false).await
}

/// Spawn with the legacy open-routes flag set as given.
pub async fn spawn_with(legacy_open_routes: bool) -> TestApp {
    let backend = StubBackend::new();
    let backend_router = stub_router(backend.clone());
    let backend_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend_addr = backend_listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(backend_listener, backend_router).await.unwrap();
    });

    let config = StorefrontConfig {
        backend_url: format!("http://{backend_addr}/api"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        legacy_open_routes,
        sentry_dsn: None,
    };

    let app = routes::router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        base: format!("http://{addr}"),
        backend,
        client,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Log in with the shared test password and return the redirect response.
    pub async fn login_as(&self, email: &str) -> reqwest::Response {
        self.post_form("/login", &[("email", email), ("password", PASSWORD)])
            .await
    }
}

/// The `Location` header of a redirect response.
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .expect("response should be a redirect")
        .to_str()
        .unwrap()
        .to_owned()
}
