// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mock storefront backend for integration tests.
//!
//! Serves the auth endpoints on an ephemeral port and records everything the
//! client sends: refresh call counts and the Authorization headers seen on
//! the profile endpoint, in arrival order.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};

use shopfront::credential::refresh::HttpRefresher;
use shopfront::credential::store::{KeyValueStore, MemoryStore};
use shopfront::{ClientConfig, Session};

/// How the mock refresh endpoint answers.
pub enum RefreshBehavior {
    Grant { access: String, refresh: Option<String> },
    Reject { status: u16, detail: String },
}

pub struct BackendState {
    /// Access tokens the protected endpoints accept. Nothing is accepted
    /// implicitly; tests opt tokens in.
    pub accepted: Mutex<HashSet<String>>,
    pub refresh_calls: AtomicU32,
    pub me_calls: AtomicU32,
    /// Authorization headers seen on `/auth/me/`, in arrival order.
    pub me_auth_seen: Mutex<Vec<String>>,
    pub refresh_delay: Duration,
    pub refresh_behavior: RefreshBehavior,
}

impl BackendState {
    pub fn new(refresh_behavior: RefreshBehavior) -> Self {
        Self {
            accepted: Mutex::new(HashSet::new()),
            refresh_calls: AtomicU32::new(0),
            me_calls: AtomicU32::new(0),
            me_auth_seen: Mutex::new(Vec::new()),
            refresh_delay: Duration::ZERO,
            refresh_behavior,
        }
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// Opt an access token into the protected endpoints.
    pub fn accept(&self, token: &str) {
        if let Ok(mut accepted) = self.accepted.lock() {
            accepted.insert(token.to_owned());
        }
    }

    pub fn refresh_calls(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn me_calls(&self) -> u32 {
        self.me_calls.load(Ordering::SeqCst)
    }

    pub fn me_auth_headers(&self) -> Vec<String> {
        self.me_auth_seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    fn is_accepted(&self, headers: &HeaderMap) -> bool {
        let Some(token) = bearer(headers) else { return false };
        self.accepted.lock().map(|accepted| accepted.contains(&token)).unwrap_or(false)
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
}

/// Serve the mock backend on an ephemeral port.
pub async fn spawn_backend(state: BackendState) -> MockBackend {
    let shared = Arc::new(state);
    let router = Router::new()
        .route("/api/v1/auth/token/", post(login))
        .route("/api/v1/auth/token/refresh/", post(refresh))
        .route("/api/v1/auth/register/", post(register))
        .route("/api/v1/auth/me/", get(me))
        .route("/api/v1/ping", get(ping))
        .route("/api/v1/teapot", get(teapot))
        .with_state(Arc::clone(&shared));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    MockBackend { base_url: format!("http://{addr}/api/v1"), state: shared }
}

async fn login(Json(body): Json<serde_json::Value>) -> (StatusCode, Json<serde_json::Value>) {
    let username = body.get("username").and_then(|v| v.as_str()).unwrap_or_default();
    let password = body.get("password").and_then(|v| v.as_str()).unwrap_or_default();
    if username == "ada" && password == "secret" {
        (StatusCode::OK, Json(serde_json::json!({ "access": "a1", "refresh": "r1" })))
    } else {
        let detail = "No active account found with the given credentials";
        (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "detail": detail })))
    }
}

async fn refresh(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if !state.refresh_delay.is_zero() {
        tokio::time::sleep(state.refresh_delay).await;
    }
    if body.get("refresh").and_then(|v| v.as_str()).is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "detail": "refresh field is required" })),
        );
    }
    match &state.refresh_behavior {
        RefreshBehavior::Grant { access, refresh } => {
            let mut body = serde_json::json!({ "access": access });
            if let Some(rotated) = refresh {
                body["refresh"] = serde_json::Value::String(rotated.clone());
            }
            (StatusCode::OK, Json(body))
        }
        RefreshBehavior::Reject { status, detail } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST),
            Json(serde_json::json!({ "detail": detail })),
        ),
    }
}

async fn register(Json(body): Json<serde_json::Value>) -> (StatusCode, Json<serde_json::Value>) {
    let username = body.get("username").and_then(|v| v.as_str()).unwrap_or_default();
    if username == "taken" {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "username": ["A user with that username already exists."],
            })),
        )
    } else {
        (StatusCode::CREATED, Json(serde_json::json!({ "id": 2, "username": username })))
    }
}

async fn me(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut seen) = state.me_auth_seen.lock() {
        let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or("");
        seen.push(auth.to_owned());
    }
    if state.is_accepted(&headers) {
        (StatusCode::OK, Json(serde_json::json!({ "id": 1, "username": "ada" })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "detail": "Given token not valid" })))
    }
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "pong": true }))
}

async fn teapot() -> (StatusCode, &'static str) {
    (StatusCode::IM_A_TEAPOT, "short and stout")
}

pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        api_url: base_url.to_owned(),
        request_timeout_ms: 5000,
        refresh_timeout_ms: 2000,
        state_dir: None,
    }
}

/// Session over an in-memory store against the given backend. The store is
/// returned so tests can seed and inspect credentials directly.
pub fn session_against(base_url: &str) -> (Session, Arc<MemoryStore>) {
    // reqwest is built against the provider-less rustls backend; install the
    // ring provider once for the test process, mirroring the CLI entrypoint.
    let _ = rustls::crypto::ring::default_provider().install_default();
    let config = test_config(base_url);
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(HttpRefresher::new(base_url, Duration::from_secs(5)));
    let session =
        Session::with_parts(&config, Arc::clone(&store) as Arc<dyn KeyValueStore>, transport);
    (session, store)
}
