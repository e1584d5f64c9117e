// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Outcome of a refresh episode, broadcast to every queued waiter.
///
/// Cloneable so a single in-flight refresh can fail all of its waiters
/// with the same error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// No refresh credential is stored; nothing to exchange.
    NoRefreshCredential,
    /// The backend refused the refresh call (expired/invalid refresh
    /// credential). Triggers a full logout.
    Rejected { status: u16, body: String },
    /// The refresh call produced no HTTP response.
    Transport(String),
    /// The refresh call exceeded the configured bound. The stored pair
    /// is kept.
    TimedOut,
}

impl fmt::Display for RefreshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRefreshCredential => f.write_str("no refresh credential available"),
            Self::Rejected { status, body } => write!(f, "refresh rejected ({status}): {body}"),
            Self::Transport(msg) => write!(f, "refresh transport error: {msg}"),
            Self::TimedOut => f.write_str("refresh timed out"),
        }
    }
}

impl std::error::Error for RefreshError {}

/// Errors surfaced by the client to callers.
#[derive(Debug)]
pub enum ClientError {
    /// Server answered with a non-success status. Carries the body verbatim.
    Api { status: u16, body: String },
    /// The refresh machinery failed; the caller must re-authenticate.
    Refresh(RefreshError),
    /// No response received. Never triggers refresh logic.
    Transport(reqwest::Error),
    /// The server answered successfully with a body the client could not read.
    Decode(String),
}

impl ClientError {
    /// HTTP status of the failure, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Refresh(RefreshError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// True when the caller's only recourse is to log in again.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::Refresh(_)) || self.status() == Some(401)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api { status, body } => write!(f, "api error ({status}): {body}"),
            Self::Refresh(err) => write!(f, "{err}"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::Decode(msg) => write!(f, "undecodable response: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Refresh(err) => Some(err),
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RefreshError> for ClientError {
    fn from(err: RefreshError) -> Self {
        Self::Refresh(err)
    }
}
