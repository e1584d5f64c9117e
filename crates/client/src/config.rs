// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the shopfront client.
#[derive(Debug, Clone, clap::Args)]
pub struct ClientConfig {
    /// Base URL of the storefront API.
    #[arg(long, default_value = "http://127.0.0.1:8000/api/v1", env = "SHOPFRONT_API_URL")]
    pub api_url: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 10000, env = "SHOPFRONT_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Upper bound on a single in-flight refresh call in milliseconds.
    /// On expiry the refresh fails and every queued request is released
    /// with a timeout error.
    #[arg(long, default_value_t = 15000, env = "SHOPFRONT_REFRESH_TIMEOUT_MS")]
    pub refresh_timeout_ms: u64,

    /// Directory for persisted credentials. Defaults to the platform
    /// state directory (see [`crate::credential::state_dir`]).
    #[arg(long, env = "SHOPFRONT_STATE_DIR")]
    pub state_dir: Option<std::path::PathBuf>,
}

impl ClientConfig {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.refresh_timeout_ms)
    }

    /// Resolved state directory for this client.
    pub fn state_dir(&self) -> std::path::PathBuf {
        match &self.state_dir {
            Some(dir) => dir.clone(),
            None => crate::credential::state_dir(),
        }
    }
}
