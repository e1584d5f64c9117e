// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client wrapper: bearer injection with one-shot 401-driven recovery.

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode};

use crate::config::ClientConfig;
use crate::credential::coordinator::RefreshCoordinator;
use crate::error::{ClientError, RefreshError};

/// Dispatches requests against the storefront API with the current access
/// credential attached. Never writes credentials itself; recovery goes
/// through the [`RefreshCoordinator`].
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    coordinator: Arc<RefreshCoordinator>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, coordinator: Arc<RefreshCoordinator>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_default();
        Self { base_url: config.api_url.trim_end_matches('/').to_owned(), http, coordinator }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Dispatch a request, injecting `Authorization: Bearer <access>` when a
    /// credential is stored.
    ///
    /// Any non-401 response passes through verbatim. On a 401 that has not
    /// been retried yet, one refresh is obtained from the coordinator and
    /// the request is re-issued once with the new access value; a second 401
    /// is returned as-is. A missing refresh credential returns the original
    /// 401. Transport errors never trigger refresh logic.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, ClientError> {
        let mut bearer = self.coordinator.current_access();
        let mut retried = false;
        loop {
            let mut req = self.http.request(method.clone(), self.url(path));
            if let Some(json) = body {
                req = req.json(json);
            }
            if let Some(token) = &bearer {
                req = req.bearer_auth(token);
            }
            let resp = req.send().await.map_err(ClientError::Transport)?;

            if resp.status() != StatusCode::UNAUTHORIZED || retried {
                return Ok(resp);
            }

            match self.coordinator.obtain_fresh_access().await {
                Ok(access) => {
                    tracing::debug!(path, "retrying request with refreshed credential");
                    bearer = Some(access);
                    retried = true;
                }
                // No refresh credential stored: fail with the original 401.
                Err(RefreshError::NoRefreshCredential) => return Ok(resp),
                Err(err) => return Err(ClientError::Refresh(err)),
            }
        }
    }

    /// GET a JSON body.
    pub async fn get_json(&self, path: &str) -> Result<serde_json::Value, ClientError> {
        let resp = self.send(Method::GET, path, None).await?;
        Self::into_json(resp).await
    }

    /// POST JSON and return the response body.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let resp = self.send(Method::POST, path, Some(body)).await?;
        Self::into_json(resp).await
    }

    /// Convert a response into JSON, mapping non-success statuses to
    /// [`ClientError::Api`] with the body carried verbatim.
    async fn into_json(resp: Response) -> Result<serde_json::Value, ClientError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api { status: status.as_u16(), body });
        }
        let bytes = resp.bytes().await.map_err(ClientError::Transport)?;
        if bytes.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
    }
}
