// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie routes.
//!
//! Sign-in itself happens against Supabase Auth in the browser; these
//! routes only mirror the resulting access token into an HttpOnly cookie
//! so that page requests can be guarded on the server.

use crate::config::DataBackend;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, verify_token, SESSION_COOKIE};
use crate::models::UserProfile;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", post(set_session))
        .route("/auth/logout", post(logout))
        .route("/auth/dev/session", post(dev_session))
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

#[derive(Debug, Deserialize)]
struct SessionRequest {
    access_token: String,
}

/// Store a Supabase access token in the session cookie.
async fn set_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<SessionRequest>,
) -> Result<(CookieJar, StatusCode)> {
    let user = verify_token(&req.access_token, &state.config.jwt_signing_key)
        .ok_or(AppError::InvalidToken)?;

    tracing::info!(user_id = %user.user_id, "Session cookie set");

    let secure = state.config.data_backend == DataBackend::Supabase;
    Ok((
        jar.add(session_cookie(req.access_token, secure)),
        StatusCode::NO_CONTENT,
    ))
}

/// Clear the session cookie. Removal attributes match the ones it was set with.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let secure = state.config.data_backend == DataBackend::Supabase;
    (
        jar.remove(session_cookie(String::new(), secure)),
        StatusCode::NO_CONTENT,
    )
}

#[derive(Debug, Deserialize, Validate)]
struct DevSessionRequest {
    #[validate(email)]
    email: String,
}

#[derive(Serialize)]
struct DevSessionResponse {
    access_token: String,
    user: UserProfile,
}

/// Sign in as `email` without a password. Only on the in-memory backend.
async fn dev_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<DevSessionRequest>,
) -> Result<Response> {
    if state.config.data_backend != DataBackend::Memory {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }
    req.validate()?;

    let profile = match state.db.find_profile_by_email(&req.email).await? {
        Some(profile) => profile,
        None => {
            let now = chrono::Utc::now().to_rfc3339();
            let profile = UserProfile::new(uuid::Uuid::new_v4(), Some(req.email.clone()), &now);
            state.db.create_user_profile(&profile).await?
        }
    };

    let token = create_jwt(profile.id, profile.email.as_deref(), &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(user_id = %profile.id, "Development session issued");

    Ok((
        jar.add(session_cookie(token.clone(), false)),
        Json(DevSessionResponse {
            access_token: token,
            user: profile,
        }),
    )
        .into_response())
}
