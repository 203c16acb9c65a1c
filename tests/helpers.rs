#![allow(dead_code)]

use async_trait::async_trait;
use finance_client::client::REFRESH_PATH;
use finance_client::models::User;
use finance_client::transport::{ApiRequest, ApiResponse, RequestBody, Transport};
use finance_client::{ApiClient, ApiResult, AppState, SessionStore};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the fake server answers `POST /api/auth/refresh/`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshMode {
    /// Issue `fresh-<n>` where n counts refresh calls
    Issue,
    /// Answer with this status and no token
    Reject(u16),
    /// Answer 200 without an `access` field
    MissingAccess,
}

struct Route {
    method: Method,
    path: String,
    response: ApiResponse,
    /// Served without checking the bearer token
    public: bool,
}

/// Scripted in-memory API.
///
/// Protected routes answer 401 unless the request carries the currently valid
/// access token. Every request is recorded for later assertions.
pub struct FakeApi {
    valid_token: Mutex<Option<String>>,
    refresh_mode: Mutex<RefreshMode>,
    refresh_delay: Duration,
    refresh_calls: AtomicUsize,
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            valid_token: Mutex::new(None),
            refresh_mode: Mutex::new(RefreshMode::Issue),
            refresh_delay: Duration::from_millis(0),
            refresh_calls: AtomicUsize::new(0),
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Hold refresh answers back so concurrent callers pile up
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn with_refresh_mode(self, mode: RefreshMode) -> Self {
        *self.refresh_mode.lock().unwrap() = mode;
        self
    }

    pub fn with_valid_token(self, token: &str) -> Self {
        *self.valid_token.lock().unwrap() = Some(token.to_string());
        self
    }

    /// Invalidate the current access token
    pub fn expire_token(&self) {
        *self.valid_token.lock().unwrap() = None;
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.refresh_mode.lock().unwrap() = mode;
    }

    /// Register a route that requires a valid bearer token
    pub fn route(&self, method: Method, path: &str, status: u16, body: Value) {
        self.add_route(method, path, status, body, false);
    }

    /// Register a route answered regardless of the bearer token
    pub fn public_route(&self, method: Method, path: &str, status: u16, body: Value) {
        self.add_route(method, path, status, body, true);
    }

    fn add_route(&self, method: Method, path: &str, status: u16, body: Value, public: bool) {
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_string(),
            response: ApiResponse::json_body(status, &body),
            public,
        });
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Recorded requests to `path`, refresh calls excluded unless asked for
    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    async fn answer_refresh(&self) -> ApiResponse {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }

        let mode = *self.refresh_mode.lock().unwrap();
        match mode {
            RefreshMode::Issue => {
                let token = format!("fresh-{}", n);
                *self.valid_token.lock().unwrap() = Some(token.clone());
                ApiResponse::json_body(200, &json!({ "access": token }))
            }
            RefreshMode::Reject(status) => {
                ApiResponse::json_body(status, &json!({ "detail": "Refresh token invalid" }))
            }
            RefreshMode::MissingAccess => ApiResponse::json_body(200, &json!({})),
        }
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if request.method == Method::POST && request.path == REFRESH_PATH {
            return Ok(self.answer_refresh().await);
        }

        let routes = self.routes.lock().unwrap();
        let Some(route) = routes
            .iter()
            .find(|r| r.method == request.method && r.path == request.path)
        else {
            return Ok(ApiResponse::json_body(404, &json!({ "detail": "Not found." })));
        };

        let authorized = {
            let valid = self.valid_token.lock().unwrap();
            valid.is_some() && *valid == request.bearer
        };
        if !route.public && !authorized {
            return Ok(ApiResponse::json_body(
                401,
                &json!({ "detail": "Given token not valid for any token type" }),
            ));
        }

        Ok(route.response.clone())
    }
}

/// Client wired to a fake server, with handles to both sides
pub struct TestApi {
    pub fake: Arc<FakeApi>,
    pub client: Arc<ApiClient>,
}

impl TestApi {
    pub fn new(fake: FakeApi) -> Self {
        let fake = Arc::new(fake);
        let client = Arc::new(ApiClient::new(fake.clone(), SessionStore::new()));
        Self { fake, client }
    }

    pub fn session(&self) -> &SessionStore {
        self.client.session()
    }

    /// Put a user with the given token into the session
    pub async fn sign_in(&self, token: &str) {
        self.session().set_auth(token.to_string(), test_user()).await;
    }
}

/// Full application state over a fake server
pub fn test_state(fake: FakeApi) -> (Arc<FakeApi>, AppState) {
    let fake = Arc::new(fake);
    let state = AppState::new(ApiClient::new(fake.clone(), SessionStore::new()));
    (fake, state)
}

pub fn test_user() -> User {
    User {
        id: 7,
        username: "somchai".to_string(),
        email: "somchai@example.com".to_string(),
        profile: None,
    }
}

pub fn user_json() -> Value {
    json!({
        "id": 7,
        "username": "somchai",
        "email": "somchai@example.com",
        "profile": { "base_currency": "THB" }
    })
}

pub fn transaction_json(id: i64, tx_type: &str, amount: &str) -> Value {
    json!({
        "id": id,
        "type": tx_type,
        "occurred_at": "2024-02-10T09:30:00Z",
        "amount": amount,
        "merchant": "7-Eleven",
        "note": "",
        "receipt_url": null,
        "base_amount": amount,
        "fx_rate": "1",
        "wallet": { "id": 1, "name": "Cash" },
        "currency": { "code": "THB" },
        "category": { "id": 3, "name": "Food", "type": "expense" }
    })
}

/// Query value of a recorded request
pub fn query_value<'a>(request: &'a ApiRequest, key: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// JSON body of a recorded request
pub fn json_body(request: &ApiRequest) -> Option<&Value> {
    match &request.body {
        RequestBody::Json(value) => Some(value),
        _ => None,
    }
}
