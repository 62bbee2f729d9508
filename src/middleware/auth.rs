// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase access-token authentication.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Cookie carrying the access token for page requests.
pub const SESSION_COOKIE: &str = "kaiwa_token";

/// Audience Supabase Auth puts in tokens for signed-in users.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Claims of a Supabase access token (only the ones we read).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (auth user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Authenticated user extracted from the access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    /// Token expiry (Unix timestamp)
    pub expires_at: i64,
}

/// Raw tokens offered by a request: the session cookie first, then the
/// `Authorization` header.
pub fn extract_tokens(jar: &CookieJar, headers: &HeaderMap) -> Vec<String> {
    let cookie = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    cookie.into_iter().chain(bearer).collect()
}

/// First offered token that verifies, with its user.
///
/// A stale session cookie does not shadow a fresh bearer token.
pub fn authenticate(
    jar: &CookieJar,
    headers: &HeaderMap,
    signing_key: &[u8],
) -> Option<(String, AuthUser)> {
    extract_tokens(jar, headers)
        .into_iter()
        .find_map(|token| verify_token(&token, signing_key).map(|user| (token, user)))
}

/// Verify a token and return the user it was issued to.
pub fn verify_token(token: &str, signing_key: &[u8]) -> Option<AuthUser> {
    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    let user_id = Uuid::parse_str(&token_data.claims.sub).ok()?;

    Some(AuthUser {
        user_id,
        email: token_data.claims.email,
        expires_at: token_data.claims.exp as i64,
    })
}

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (_, auth_user) = authenticate(&jar, request.headers(), &state.config.jwt_signing_key)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    tracing::Span::current().record("user_id", tracing::field::display(auth_user.user_id));
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Mint an access token in the shape Supabase Auth issues.
///
/// Used by the development session endpoint and tests.
pub fn create_jwt(
    user_id: Uuid,
    email: Option<&str>,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + 60 * 60, // 1 hour, like Supabase
        aud: AUTHENTICATED_AUDIENCE.to_string(),
        email: email.map(str::to_string),
        role: Some("authenticated".to_string()),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
