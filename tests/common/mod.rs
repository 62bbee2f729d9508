// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use kaiwa_tutor::config::Config;
use kaiwa_tutor::db::{MemoryDb, SupabaseDb};
use kaiwa_tutor::middleware::auth::create_jwt;
use kaiwa_tutor::models::{JlptVocab, Persona, PersonaType, UserProfile};
use kaiwa_tutor::routes::create_router;
use kaiwa_tutor::AppState;
use std::sync::Arc;
use uuid::Uuid;

/// Create a test app on the in-memory backend.
/// Returns the router, the backing store and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, MemoryDb, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, MemoryDb, Arc<AppState>) {
    let db = MemoryDb::new();
    let state = Arc::new(AppState::new(config, Arc::new(db.clone())));
    (create_router(state.clone()), db, state)
}

/// Create a test app whose Supabase client is offline: every query fails.
#[allow(dead_code)]
pub fn create_offline_app() -> axum::Router {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Arc::new(SupabaseDb::new_mock()),
    ));
    create_router(state)
}

/// Create a token for `user_id` signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: Uuid) -> String {
    create_jwt(
        user_id,
        Some("learner@example.com"),
        &Config::test_default().jwt_signing_key,
    )
    .unwrap()
}

/// Seed a profile and return its id.
#[allow(dead_code)]
pub fn seed_user(db: &MemoryDb) -> Uuid {
    let id = Uuid::new_v4();
    db.insert_profile(UserProfile::new(
        id,
        Some("learner@example.com".to_string()),
        "2026-01-01T00:00:00Z",
    ));
    id
}

#[allow(dead_code)]
pub fn seed_persona(db: &MemoryDb, id: i64, name: &str) {
    db.insert_persona(Persona {
        id,
        name: name.to_string(),
        persona_type: PersonaType::Teacher,
        avatar_url: Some(format!("/avatars/{}.png", id)),
        description: Some(format!("{} helps you practice polite Japanese", name)),
        personality: None,
        speaking_style: None,
        jlpt_level: Some("N5".to_string()),
        created_at: None,
    });
}

#[allow(dead_code)]
pub fn seed_word(db: &MemoryDb, id: i64, kanji: &str, hiragana: &str, meaning: &str, level: &str) {
    db.insert_vocab(JlptVocab {
        id,
        kanji: Some(kanji.to_string()),
        hiragana: hiragana.to_string(),
        romaji: None,
        english_meaning: meaning.to_string(),
        jlpt_level: Some(level.to_string()),
        word_type: None,
    });
}

/// GET with a bearer token.
#[allow(dead_code)]
pub fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Request with a JSON body and a bearer token.
#[allow(dead_code)]
pub fn authed_json(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
