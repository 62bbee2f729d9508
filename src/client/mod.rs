// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed client for the Kaiwa Tutor API.
//!
//! Queries are cached per user and only run while the session has a
//! signed-in user. Failures are logged and reported as `None`; nothing is
//! retried.

pub mod cache;

pub use cache::{QueryCache, QueryKey};

use crate::models::{Persona, UserProfile, VocabStats};
use crate::session::{SessionState, SessionUser};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

/// Query names used as cache keys.
pub mod queries {
    pub const USER_PROFILE: &str = "user_profile";
    pub const VOCAB_STATS: &str = "vocab_stats";
    pub const PERSONAS: &str = "personas";
}

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Not signed in")]
    NoSession,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            ClientError::NoSession => None,
        }
    }
}

/// API client bound to one session.
pub struct KaiwaClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionState,
    cache: QueryCache,
}

impl KaiwaClient {
    pub fn new(base_url: &str, session: SessionState) -> Self {
        Self::with_cache(base_url, session, QueryCache::default())
    }

    pub fn with_cache(base_url: &str, session: SessionState, cache: QueryCache) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            cache,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // ─── Queries ─────────────────────────────────────────────────

    /// The signed-in user's profile.
    ///
    /// A fresh fetch also counts today's visit towards the streak; the
    /// streak-updated profile is returned when that succeeds.
    pub async fn user_profile(&self) -> Option<UserProfile> {
        let user = self.session.user()?;
        let key = QueryKey::new(queries::USER_PROFILE, user.id);
        if let Some(profile) = self.cache.get(&key) {
            return Some(profile);
        }

        let profile: UserProfile = match self.get_json("/api/profile").await {
            Ok(profile) => profile,
            Err(e) => {
                log_failure(queries::USER_PROFILE, &user, &e);
                return None;
            }
        };

        let profile = match self
            .post_json::<UserProfile, _>("/api/profile/streak", &json!({}))
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Streak update failed");
                profile
            }
        };

        self.cache.insert(key, &profile);
        Some(profile)
    }

    /// Words seen per JLPT level.
    pub async fn vocab_stats(&self) -> Option<Vec<VocabStats>> {
        let user = self.session.user()?;
        self.cached_get(queries::VOCAB_STATS, &user, "/api/vocab/stats")
            .await
    }

    /// Available tutors; an empty catalogue is an empty list.
    pub async fn personas(&self) -> Option<Vec<Persona>> {
        let user = self.session.user()?;
        let key = QueryKey::new(queries::PERSONAS, user.id);
        if let Some(personas) = self.cache.get(&key) {
            return Some(personas);
        }

        match self.get_json::<Vec<Persona>>("/api/personas").await {
            Ok(personas) => {
                self.cache.insert(key, &personas);
                Some(personas)
            }
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => Some(Vec::new()),
            Err(e) => {
                log_failure(queries::PERSONAS, &user, &e);
                None
            }
        }
    }

    // ─── Mutations ───────────────────────────────────────────────

    /// Award experience points and drop the cached profile.
    pub async fn add_xp(&self, points: i64) -> Option<UserProfile> {
        let user = self.session.user()?;

        match self
            .post_json::<UserProfile, _>("/api/profile/xp", &json!({ "points": points }))
            .await
        {
            Ok(profile) => {
                self.cache.invalidate(queries::USER_PROFILE);
                Some(profile)
            }
            Err(e) => {
                log_failure("add_xp", &user, &e);
                None
            }
        }
    }

    // ─── HTTP helpers ────────────────────────────────────────────

    async fn cached_get<T>(&self, name: &'static str, user: &SessionUser, path: &str) -> Option<T>
    where
        T: DeserializeOwned + Serialize,
    {
        let key = QueryKey::new(name, user.id);
        if let Some(value) = self.cache.get(&key) {
            return Some(value);
        }

        match self.get_json::<T>(path).await {
            Ok(value) => {
                self.cache.insert(key, &value);
                Some(value)
            }
            Err(e) => {
                log_failure(name, user, &e);
                None
            }
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ClientError> {
        let token = self.session.access_token().ok_or(ClientError::NoSession)?;
        Ok(builder.bearer_auth(token))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let request = self.authorized(self.http.get(format!("{}{}", self.base_url, path)))?;
        check_response_json(request.send().await?).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self.authorized(self.http.post(format!("{}{}", self.base_url, path)))?;
        check_response_json(request.json(body).send().await?).await
    }
}

fn log_failure(query: &str, user: &SessionUser, error: &ClientError) {
    tracing::error!(query = query, user_id = %user.id, error = %error, "Query failed");
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status { status, body });
    }

    Ok(response.json().await?)
}
