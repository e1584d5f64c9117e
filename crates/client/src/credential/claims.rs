// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort decode of the access token payload, without signature
//! verification.
//!
//! The decoded claims are a display hint only (instant "who am I" before the
//! profile endpoint answers). Authorization decisions are always enforced
//! server-side; nothing in this crate trusts these values.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;

/// Claims the storefront backend puts in its access tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub username: Option<String>,
    /// Expiry as epoch seconds.
    #[serde(default)]
    pub exp: Option<u64>,
}

impl AccessClaims {
    /// Subject identifier: `user_id` with `id` as fallback, normalized to a
    /// string.
    pub fn subject(&self) -> Option<String> {
        let value = self.user_id.as_ref().or(self.id.as_ref())?;
        match value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Decode the payload segment of a JWT-shaped access token.
///
/// Returns `None` for anything that is not three dot-separated segments with
/// a base64url JSON payload. Callers treat an undecodable stored token as
/// "logged out".
pub fn decode_unverified(access: &str) -> Option<AccessClaims> {
    let payload = access.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
#[path = "claims_tests.rs"]
mod tests;
