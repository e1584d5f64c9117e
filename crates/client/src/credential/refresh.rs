// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single network refresh call, behind a transport seam so the
//! coordinator's state machine is testable without a server.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::RefreshError;

/// Successful refresh response. A new access value is required; a body
/// without one counts as a rejection. The refresh value is optional and,
/// when present, rotates the stored refresh credential.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshGrant {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Issues one refresh call. Implemented over HTTP in production and by
/// mocks in coordinator tests.
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    async fn refresh(&self, refresh: &str) -> Result<RefreshGrant, RefreshError>;
}

/// HTTP refresh against the storefront's refresh endpoint.
pub struct HttpRefresher {
    http: reqwest::Client,
    refresh_url: String,
}

impl HttpRefresher {
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Self {
        let http = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        let refresh_url = format!("{}/auth/token/refresh/", base_url.trim_end_matches('/'));
        Self { http, refresh_url }
    }
}

#[async_trait]
impl RefreshTransport for HttpRefresher {
    async fn refresh(&self, refresh: &str) -> Result<RefreshGrant, RefreshError> {
        let resp = self
            .http
            .post(&self.refresh_url)
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected { status: status.as_u16(), body });
        }

        match resp.json::<RefreshGrant>().await {
            Ok(grant) => Ok(grant),
            Err(err) => Err(RefreshError::Rejected {
                status: status.as_u16(),
                body: format!("malformed refresh response: {err}"),
            }),
        }
    }
}
