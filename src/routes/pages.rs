// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-page app shell with server-side route guards.
//!
//! Every client route is served the same `index.html`, but only after the
//! guard for that route has passed; otherwise the browser is redirected.

use crate::middleware::auth::authenticate;
use crate::session::{guard, AuthSession, AuthSnapshot, GuardDecision, RouteAccess, SessionUser};
use crate::AppState;
use axum::{
    extract::{OriginalUri, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, MethodRouter},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use std::sync::Arc;

/// Served when no built frontend is present.
const FALLBACK_SHELL: &str = r#"<!doctype html>
<html lang="ja">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Kaiwa Tutor</title>
  </head>
  <body>
    <div id="root"></div>
  </body>
</html>
"#;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        // Signed-out only
        .route("/", page(RouteAccess::PublicOnly))
        .route("/login", page(RouteAccess::PublicOnly))
        .route("/signup", page(RouteAccess::PublicOnly))
        // Signed-in only
        .route("/dashboard", page(RouteAccess::Protected))
        .route("/tutor-selection", page(RouteAccess::Protected))
        .route(
            "/scenario-selection/{persona_id}",
            page(RouteAccess::Protected),
        )
        .route("/scenarios", page(RouteAccess::Protected))
        .route("/chat/{conversation_id}", page(RouteAccess::Protected))
        .route("/history", page(RouteAccess::Protected))
        .route("/transcripts", page(RouteAccess::Protected))
        .route("/vocabulary", page(RouteAccess::Protected))
        .route("/settings", page(RouteAccess::Protected))
        // Anyone
        .route("/furigana-demo", page(RouteAccess::Open))
        .fallback(not_found)
}

fn page(access: RouteAccess) -> MethodRouter<Arc<AppState>> {
    get(
        move |State(state): State<Arc<AppState>>, jar: CookieJar, headers: HeaderMap| async move {
            render_page(&state, access, &jar, &headers).await
        },
    )
}

/// Auth state as seen from a page request.
pub fn request_snapshot(state: &AppState, jar: &CookieJar, headers: &HeaderMap) -> AuthSnapshot {
    let session = authenticate(jar, headers, &state.config.jwt_signing_key).map(|(token, user)| {
        AuthSession {
            access_token: token,
            // The refresh token never leaves the browser
            refresh_token: String::new(),
            expires_at: user.expires_at,
            user: SessionUser {
                id: user.user_id,
                email: user.email,
            },
        }
    });

    AuthSnapshot::resolved(session)
}

async fn render_page(
    state: &AppState,
    access: RouteAccess,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Response {
    let snapshot = request_snapshot(state, jar, headers);

    match guard(access, &snapshot) {
        GuardDecision::Redirect(to) => Redirect::to(to).into_response(),
        // A server-side snapshot is always resolved
        GuardDecision::Render | GuardDecision::Loading => shell(state, StatusCode::OK).await,
    }
}

/// The built `index.html`, or a minimal built-in shell.
async fn shell(state: &AppState, status: StatusCode) -> Response {
    let path = state.config.static_dir.join("index.html");
    let body = match tokio::fs::read_to_string(&path).await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Using built-in shell");
            FALLBACK_SHELL.to_string()
        }
    };

    (status, Html(body)).into_response()
}

async fn not_found(State(state): State<Arc<AppState>>, OriginalUri(uri): OriginalUri) -> Response {
    if uri.path().starts_with("/api/") {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "details": uri.path() })),
        )
            .into_response();
    }

    shell(&state, StatusCode::NOT_FOUND).await
}
