// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session surface: login, registration, logout, and profile fetch.

use std::sync::Arc;

use reqwest::Method;
use tokio::sync::broadcast;

use crate::api::client::ApiClient;
use crate::config::ClientConfig;
use crate::credential::claims;
use crate::credential::coordinator::RefreshCoordinator;
use crate::credential::refresh::{HttpRefresher, RefreshTransport};
use crate::credential::store::{FileStore, KeyValueStore};
use crate::credential::{SessionEvent, TokenPair};
use crate::error::ClientError;

/// Display hint decoded from the access token payload. Optimistic only;
/// the authoritative profile comes from [`Session::me`].
#[derive(Debug, Clone)]
pub struct UserHint {
    pub id: Option<String>,
    pub username: Option<String>,
    pub exp: Option<u64>,
}

/// A logged-in (or loggable-in) client session.
pub struct Session {
    api: ApiClient,
    coordinator: Arc<RefreshCoordinator>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Session with file-backed credential storage under the configured
    /// state directory.
    pub fn new(config: &ClientConfig) -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.state_dir()));
        let transport: Arc<dyn RefreshTransport> =
            Arc::new(HttpRefresher::new(&config.api_url, config.request_timeout()));
        Self::with_parts(config, store, transport)
    }

    /// Session over explicit store and refresh transport implementations.
    pub fn with_parts(
        config: &ClientConfig,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn RefreshTransport>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(16);
        let coordinator = Arc::new(RefreshCoordinator::new(
            store,
            transport,
            config.refresh_timeout(),
            event_tx.clone(),
        ));
        let api = ApiClient::new(config, Arc::clone(&coordinator));
        Self { api, coordinator, event_tx }
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// The underlying authenticated client, for arbitrary endpoints.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Stored credential pair, if logged in.
    pub fn current_pair(&self) -> Option<TokenPair> {
        self.coordinator.current_pair()
    }

    /// Obtain a credential pair and install it.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ClientError> {
        let body = serde_json::json!({ "username": username, "password": password });
        let resp = self.api.send(Method::POST, "/auth/token/", Some(&body)).await?;
        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api { status: status.as_u16(), body: flatten_api_error(&raw) });
        }
        let pair: TokenPair = resp
            .json()
            .await
            .map_err(|err| ClientError::Decode(format!("no access token returned: {err}")))?;
        self.coordinator.install(&pair);
        tracing::info!(username, "logged in");
        Ok(pair)
    }

    /// Create an account. Does not log in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let body = serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
            "password2": password,
        });
        let resp = self.api.send(Method::POST, "/auth/register/", Some(&body)).await?;
        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api { status: status.as_u16(), body: flatten_api_error(&raw) });
        }
        let bytes = resp.bytes().await.map_err(ClientError::Transport)?;
        if bytes.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
    }

    /// Clear stored credentials. Client-side only; the backend holds no
    /// session to tear down.
    pub fn logout(&self) {
        self.coordinator.clear();
        tracing::info!("logged out");
    }

    /// Fetch the authoritative profile. Goes through the wrapper, so a stale
    /// access credential is refreshed and retried once like any request.
    pub async fn me(&self) -> Result<serde_json::Value, ClientError> {
        self.api.get_json("/auth/me/").await
    }

    /// Decode the stored access token for an instant identity hint.
    ///
    /// An undecodable stored token is treated as logged out and cleared.
    pub fn current_user_hint(&self) -> Option<UserHint> {
        let pair = self.coordinator.current_pair()?;
        match claims::decode_unverified(&pair.access) {
            Some(c) => Some(UserHint { id: c.subject(), username: c.username, exp: c.exp }),
            None => {
                tracing::warn!("stored access token is undecodable, clearing credentials");
                self.coordinator.clear();
                None
            }
        }
    }
}

/// Flatten a backend error body into a readable one-line message.
///
/// Handles the two shapes the storefront backend produces: a `detail`
/// string, and a field → list-of-strings validation map.
fn flatten_api_error(raw: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return raw.to_owned();
    };
    let Some(map) = value.as_object() else {
        return raw.to_owned();
    };
    if let Some(detail) = map.get("detail").and_then(|v| v.as_str()) {
        return detail.to_owned();
    }
    let mut parts = Vec::with_capacity(map.len());
    for (field, errors) in map {
        let joined = match errors {
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_owned).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join(" "),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        parts.push(format!("{field}: {joined}"));
    }
    if parts.is_empty() {
        raw.to_owned()
    } else {
        parts.join(" | ")
    }
}
