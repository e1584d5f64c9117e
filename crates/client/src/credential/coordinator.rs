// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Refresh coordinator: serializes refresh attempts and broadcasts their
//! outcome.
//!
//! State machine with two states, Idle and Refreshing. The first caller
//! after Idle performs the network refresh; every caller that arrives while
//! it is in flight is queued and released, in arrival order, with the same
//! outcome. Exactly one refresh call exists per episode regardless of how
//! many callers joined it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot, Mutex};

use crate::credential::refresh::RefreshTransport;
use crate::credential::store::{self, KeyValueStore};
use crate::credential::{SessionEvent, TokenPair};
use crate::error::RefreshError;

type Waiter = oneshot::Sender<Result<String, RefreshError>>;

struct Inner {
    refreshing: bool,
    /// Invariant: non-empty only while `refreshing` is set. Drained exactly
    /// once, in FIFO order, when the in-flight refresh settles.
    waiters: Vec<Waiter>,
}

/// Owns the stored [`TokenPair`]; all credential writes go through here.
pub struct RefreshCoordinator {
    store: Arc<dyn KeyValueStore>,
    transport: Arc<dyn RefreshTransport>,
    refresh_timeout: Duration,
    event_tx: broadcast::Sender<SessionEvent>,
    inner: Mutex<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn RefreshTransport>,
        refresh_timeout: Duration,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            store,
            transport,
            refresh_timeout,
            event_tx,
            inner: Mutex::new(Inner { refreshing: false, waiters: Vec::new() }),
        }
    }

    /// Current stored pair, if any. Malformed storage reads as logged out.
    pub fn current_pair(&self) -> Option<TokenPair> {
        store::load_pair(self.store.as_ref())
    }

    /// Current access credential for bearer injection.
    pub fn current_access(&self) -> Option<String> {
        self.current_pair().map(|pair| pair.access)
    }

    /// Install a pair obtained from login.
    pub fn install(&self, pair: &TokenPair) {
        store::save_pair(self.store.as_ref(), pair);
        let _ = self.event_tx.send(SessionEvent::LoggedIn);
    }

    /// Drop the stored pair (logout).
    pub fn clear(&self) {
        store::clear_pair(self.store.as_ref());
        let _ = self.event_tx.send(SessionEvent::LoggedOut);
    }

    /// Obtain a fresh access credential.
    ///
    /// The first caller after Idle issues the refresh call; concurrent
    /// callers suspend until it settles and share its outcome. Rejects
    /// immediately, without a state transition, when no refresh credential
    /// is stored.
    pub async fn obtain_fresh_access(&self) -> Result<String, RefreshError> {
        // Leader/waiter decision and the transition out of Idle happen under
        // one lock, so a second caller cannot start a second refresh.
        let refresh = {
            let mut inner = self.inner.lock().await;
            if inner.refreshing {
                let (tx, rx) = oneshot::channel();
                inner.waiters.push(tx);
                drop(inner);
                return match rx.await {
                    Ok(outcome) => outcome,
                    // The draining side never drops a queued waiter; this arm
                    // only fires if the leader task was itself cancelled.
                    Err(_) => Err(RefreshError::Transport("refresh abandoned".to_owned())),
                };
            }
            let Some(refresh) = self.current_pair().and_then(|pair| pair.refresh) else {
                return Err(RefreshError::NoRefreshCredential);
            };
            inner.refreshing = true;
            refresh
        };

        let call = self.transport.refresh(&refresh);
        let outcome = match tokio::time::timeout(self.refresh_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RefreshError::TimedOut),
        };
        let outcome = self.settle(outcome.map(|grant| (grant.access, grant.refresh)));

        // Leave Refreshing and drain the queue in FIFO order, every waiter
        // with the same outcome.
        let waiters = {
            let mut inner = self.inner.lock().await;
            inner.refreshing = false;
            std::mem::take(&mut inner.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        outcome
    }

    /// Apply the episode outcome to the stored pair and emit events.
    fn settle(
        &self,
        outcome: Result<(String, Option<String>), RefreshError>,
    ) -> Result<String, RefreshError> {
        match outcome {
            Ok((access, rotated)) => {
                let mut pair = self
                    .current_pair()
                    .unwrap_or(TokenPair { access: String::new(), refresh: None });
                pair.access = access.clone();
                if rotated.is_some() {
                    pair.refresh = rotated;
                }
                store::save_pair(self.store.as_ref(), &pair);
                let _ = self.event_tx.send(SessionEvent::Refreshed);
                tracing::info!("access credential refreshed");
                Ok(access)
            }
            Err(err) => {
                // Only a server verdict logs the user out; a timeout keeps
                // the stored pair.
                if !matches!(err, RefreshError::TimedOut) {
                    store::clear_pair(self.store.as_ref());
                }
                let _ = self.event_tx.send(SessionEvent::RefreshFailed { error: err.to_string() });
                tracing::warn!(err = %err, "credential refresh failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
