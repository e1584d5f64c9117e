// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential lifecycle: durable token storage, unverified claims hints,
//! and the refresh coordinator.
//!
//! The stored [`TokenPair`] is owned exclusively by the
//! [`coordinator::RefreshCoordinator`]; everything else reads it through
//! the coordinator's API.

pub mod claims;
pub mod coordinator;
pub mod refresh;
pub mod store;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Store key under which the serialized pair lives.
pub const TOKENS_KEY: &str = "tokens";

/// Access/refresh credential pair.
///
/// Absence of the pair means "logged out". On refresh the new access value
/// overwrites the old one; the refresh value carries over unless the server
/// rotates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token attached to individual requests.
    pub access: String,
    /// Longer-lived token exchanged for a new access value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

/// Session lifecycle events emitted by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A fresh access credential was installed after login.
    LoggedIn,
    /// The in-flight refresh settled successfully.
    Refreshed,
    /// A refresh episode failed.
    #[serde(rename = "refresh:failed")]
    RefreshFailed { error: String },
    /// The stored pair was cleared.
    LoggedOut,
}

/// Resolve the state directory for shopfront data.
///
/// Checks `SHOPFRONT_STATE_DIR`, then `$XDG_STATE_HOME/shopfront`,
/// then `$HOME/.local/state/shopfront`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SHOPFRONT_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("shopfront");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/shopfront");
    }
    PathBuf::from(".shopfront")
}
