// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guards on page requests.
//!
//! These tests verify that:
//! 1. Signed-out users are sent to /login from protected pages
//! 2. Signed-in users are sent to /dashboard from public-only pages
//! 3. Everything else gets the app shell

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use kaiwa_tutor::config::Config;
use kaiwa_tutor::middleware::auth::SESSION_COOKIE;
use tower::ServiceExt;
use uuid::Uuid;

mod common;

fn page(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token));
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    let (app, _, _) = common::create_test_app();

    for uri in ["/dashboard", "/chat/12", "/vocabulary", "/settings", "/history"] {
        let response = app.clone().oneshot(page(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/login", "{}", uri);
    }
}

#[tokio::test]
async fn test_public_only_pages_redirect_to_dashboard() {
    let (app, _, _) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4());

    for uri in ["/", "/login", "/signup"] {
        let response = app.clone().oneshot(page(uri, Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/dashboard", "{}", uri);
    }
}

#[tokio::test]
async fn test_signed_in_user_gets_protected_shell() {
    let (app, _, _) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4());

    let response = app.oneshot(page("/dashboard", Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(common::body_text(response).await.contains("<div id=\"root\">"));
}

#[tokio::test]
async fn test_signed_out_user_gets_login_shell() {
    let (app, _, _) = common::create_test_app();

    let response = app.oneshot(page("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_cookie_counts_as_signed_out() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(page("/settings", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_open_page_renders_for_everyone() {
    let (app, _, _) = common::create_test_app();
    let token = common::create_test_jwt(Uuid::new_v4());

    let response = app.clone().oneshot(page("/furigana-demo", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(page("/furigana-demo", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_page_is_404_shell_and_unknown_api_is_json() {
    let (app, _, _) = common::create_test_app();

    let response = app.clone().oneshot(page("/nope", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(common::body_text(response).await.contains("<html"));

    let response = app.oneshot(page("/api/nope", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(common::body_json(response).await["error"], "not_found");
}

#[tokio::test]
async fn test_serves_built_index_html() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>built frontend</html>").unwrap();

    let config = Config {
        static_dir: dir.path().to_path_buf(),
        ..Config::test_default()
    };
    let (app, _, _) = common::create_test_app_with_config(config);

    let response = app.oneshot(page("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::body_text(response).await,
        "<html>built frontend</html>"
    );
}
