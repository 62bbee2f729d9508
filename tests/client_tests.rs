// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client hooks against a live server on an ephemeral port.

use kaiwa_tutor::client::{queries, KaiwaClient, QueryKey};
use kaiwa_tutor::db::MemoryDb;
use kaiwa_tutor::session::{AuthSession, SessionState, SessionUser};
use uuid::Uuid;

mod common;

/// Serve the test app and return its base URL and store.
async fn spawn_server() -> (String, MemoryDb) {
    let (app, db, _) = common::create_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), db)
}

fn signed_in(user_id: Uuid) -> SessionState {
    SessionState::with_session(Some(AuthSession {
        access_token: common::create_test_jwt(user_id),
        refresh_token: "refresh".to_string(),
        expires_at: i64::MAX,
        user: SessionUser {
            id: user_id,
            email: Some("learner@example.com".to_string()),
        },
    }))
}

#[tokio::test]
async fn test_hooks_do_nothing_without_user() {
    let (base_url, db) = spawn_server().await;
    common::seed_persona(&db, 1, "Tanaka-sensei");
    let client = KaiwaClient::new(&base_url, SessionState::new());

    assert!(client.user_profile().await.is_none());
    assert!(client.vocab_stats().await.is_none());
    assert!(client.personas().await.is_none());
    assert!(client.add_xp(10).await.is_none());
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_user_profile_updates_streak_once() {
    let (base_url, db) = spawn_server().await;
    let user_id = common::seed_user(&db);
    let client = KaiwaClient::new(&base_url, signed_in(user_id));

    let profile = client.user_profile().await.expect("profile");
    assert_eq!(profile.id, user_id);
    assert_eq!(profile.streak_days, Some(1));
    assert!(client
        .cache()
        .get::<kaiwa_tutor::models::UserProfile>(&QueryKey::new(queries::USER_PROFILE, user_id))
        .is_some());

    // Served from cache the second time
    let again = client.user_profile().await.expect("profile");
    assert_eq!(again, profile);
}

#[tokio::test]
async fn test_user_profile_failure_is_none() {
    let (base_url, _) = spawn_server().await;
    // Signed in, but no profile row exists
    let client = KaiwaClient::new(&base_url, signed_in(Uuid::new_v4()));

    assert!(client.user_profile().await.is_none());
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_add_xp_invalidates_profile() {
    let (base_url, db) = spawn_server().await;
    let user_id = common::seed_user(&db);
    let client = KaiwaClient::new(&base_url, signed_in(user_id));

    client.user_profile().await.expect("profile");
    let updated = client.add_xp(30).await.expect("xp awarded");
    assert_eq!(updated.xp, Some(30));
    assert!(client.cache().is_empty());

    let refreshed = client.user_profile().await.expect("profile");
    assert_eq!(refreshed.xp, Some(30));
    assert_eq!(refreshed.streak_days, Some(1));
}

#[tokio::test]
async fn test_vocab_stats_lists_every_level() {
    let (base_url, db) = spawn_server().await;
    let user_id = common::seed_user(&db);
    let client = KaiwaClient::new(&base_url, signed_in(user_id));

    let stats = client.vocab_stats().await.expect("stats");
    let levels: Vec<&str> = stats.iter().map(|s| s.level.as_str()).collect();
    assert_eq!(levels, vec!["N1", "N2", "N3", "N4", "N5"]);
    assert!(stats.iter().all(|s| s.count == 0));
}

#[tokio::test]
async fn test_personas_empty_catalogue_is_empty_list() {
    let (base_url, db) = spawn_server().await;
    let client = KaiwaClient::new(&base_url, signed_in(Uuid::new_v4()));

    assert_eq!(client.personas().await, Some(Vec::new()));

    common::seed_persona(&db, 1, "Tanaka-sensei");
    let personas = client.personas().await.expect("personas");
    assert_eq!(personas.len(), 1);
    assert_eq!(personas[0].name, "Tanaka-sensei");
}

#[tokio::test]
async fn test_sign_out_stops_queries() {
    let (base_url, db) = spawn_server().await;
    let user_id = common::seed_user(&db);
    let session = signed_in(user_id);
    let client = KaiwaClient::new(&base_url, session.clone());

    assert!(client.vocab_stats().await.is_some());
    session.sign_out();
    assert!(client.vocab_stats().await.is_none());
}
