// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication session state.
//!
//! `SessionState` is created by the caller and handed to whatever needs it
//! (the API client, guards). It starts out loading until the auth provider
//! reports either a session or the absence of one.

pub mod guard;

pub use guard::{guard, GuardDecision, RouteAccess};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// The user embedded in an auth session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Tokens issued by the auth provider. Treated as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry (Unix timestamp, seconds)
    pub expires_at: i64,
    pub user: SessionUser,
}

impl AuthSession {
    /// Whether the access token has expired at `now` (Unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

/// Point-in-time view of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub loading: bool,
    pub user: Option<SessionUser>,
    pub session: Option<AuthSession>,
}

impl AuthSnapshot {
    /// Initial state before the auth provider has answered.
    pub fn loading() -> Self {
        Self {
            loading: true,
            user: None,
            session: None,
        }
    }

    /// Resolved state with the given session (or none).
    pub fn resolved(session: Option<AuthSession>) -> Self {
        Self {
            loading: false,
            user: session.as_ref().map(|s| s.user.clone()),
            session,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.session.is_some()
    }
}

/// Observable session state.
///
/// Cloning shares the underlying state; updates are seen by every clone and
/// every subscriber.
#[derive(Clone)]
pub struct SessionState {
    tx: watch::Sender<AuthSnapshot>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Create a session state in the loading phase.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthSnapshot::loading());
        Self { tx }
    }

    /// Create an already-resolved session state.
    pub fn with_session(session: Option<AuthSession>) -> Self {
        let (tx, _rx) = watch::channel(AuthSnapshot::resolved(session));
        Self { tx }
    }

    /// Current state.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    /// Current user, if signed in.
    pub fn user(&self) -> Option<SessionUser> {
        self.tx.borrow().user.clone()
    }

    /// Current access token, if signed in.
    pub fn access_token(&self) -> Option<String> {
        self.tx
            .borrow()
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Store a new session (sign-in or token refresh).
    pub fn set_session(&self, session: AuthSession) {
        tracing::debug!(user_id = %session.user.id, "Session updated");
        self.tx.send_replace(AuthSnapshot::resolved(Some(session)));
    }

    /// Drop the session.
    pub fn sign_out(&self) {
        tracing::debug!("Session cleared");
        self.tx.send_replace(AuthSnapshot::resolved(None));
    }

    /// Mark the initial lookup as finished without a session, keeping any
    /// session already set.
    pub fn finish_loading(&self) {
        self.tx.send_if_modified(|state| {
            if state.loading {
                state.loading = false;
                true
            } else {
                false
            }
        });
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }
}
