// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: profile and vocabulary.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::MAX_XP_AWARD;
use crate::models::{
    EncounterSource, JlptVocab, ProfileUpdate, TrackedWord, UserProfile, VocabEncounter, VocabStats,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest accepted vocabulary search query, in characters.
const MAX_SEARCH_LEN: usize = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route(
            "/api/profile",
            get(get_profile).post(create_profile).patch(update_profile),
        )
        .route("/api/profile/streak", post(update_streak))
        .route("/api/profile/xp", post(add_xp))
        .route("/api/vocab/stats", get(get_vocab_stats))
        .route("/api/vocab/search", get(search_vocab))
        .route("/api/vocab/encounter", post(record_encounter))
        .route("/api/vocab-tracker", get(list_tracked_words))
        .route("/api/word-definition/{word}", get(word_definition))
}

fn profile_not_found(user_id: Uuid) -> AppError {
    AppError::NotFound(format!("Profile for user {} not found", user_id))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: Option<String>,
    /// `null` until the profile row exists
    pub profile: Option<UserProfile>,
}

/// Identity from the token plus the stored profile, if any.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let profile = state.db.get_user_profile(user.user_id).await?;

    Ok(Json(MeResponse {
        id: user.user_id,
        email: user.email,
        profile,
    }))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .get_user_profile(user.user_id)
        .await?
        .ok_or_else(|| profile_not_found(user.user_id))?;

    Ok(Json(profile))
}

/// Create the caller's profile. Existing profiles are returned unchanged.
async fn create_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<UserProfile>)> {
    if let Some(existing) = state.db.get_user_profile(user.user_id).await? {
        return Ok((StatusCode::OK, Json(existing)));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let profile = UserProfile::new(user.user_id, user.email.clone(), &now);
    let created = state.db.create_user_profile(&profile).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>> {
    update.validate()?;
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let profile = state
        .db
        .update_user_profile(user.user_id, &update)
        .await?
        .ok_or_else(|| profile_not_found(user.user_id))?;

    tracing::info!(user_id = %user.user_id, "Profile updated");
    Ok(Json(profile))
}

/// Count today's visit towards the daily streak.
async fn update_streak(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .update_streak(user.user_id)
        .await?
        .ok_or_else(|| profile_not_found(user.user_id))?;

    Ok(Json(profile))
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AddXpRequest {
    #[validate(range(min = 1, max = MAX_XP_AWARD))]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points: i64,
}

async fn add_xp(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AddXpRequest>,
) -> Result<Json<UserProfile>> {
    req.validate()?;

    let profile = state
        .db
        .add_xp(user.user_id, req.points)
        .await?
        .ok_or_else(|| profile_not_found(user.user_id))?;

    tracing::info!(user_id = %user.user_id, points = req.points, xp = ?profile.xp, "XP awarded");
    Ok(Json(profile))
}

// ─── Vocabulary ──────────────────────────────────────────────

async fn get_vocab_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<VocabStats>>> {
    Ok(Json(state.db.get_vocab_stats(user.user_id).await?))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

fn check_search_len(q: &str) -> Result<()> {
    if q.chars().count() > MAX_SEARCH_LEN {
        return Err(AppError::BadRequest(format!(
            "Search query longer than {} characters",
            MAX_SEARCH_LEN
        )));
    }
    Ok(())
}

async fn search_vocab(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<JlptVocab>>> {
    let q = params.q.trim();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }
    check_search_len(q)?;

    Ok(Json(state.db.search_vocab(q).await?))
}

/// The caller's tracked words with their vocabulary entries.
async fn list_tracked_words(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<TrackedWord>>> {
    Ok(Json(state.db.list_tracked_words(user.user_id).await?))
}

/// Dictionary entry shown when the learner hovers a word.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WordDefinition {
    /// Kanji form when there is one, else the reading
    pub word: String,
    pub reading: String,
    pub meaning: String,
    pub jlpt_level: Option<String>,
    pub word_type: Option<String>,
    /// Always "local": the entry came from the JLPT word list
    pub source: String,
}

impl From<JlptVocab> for WordDefinition {
    fn from(vocab: JlptVocab) -> Self {
        Self {
            word: vocab.kanji.unwrap_or_else(|| vocab.hiragana.clone()),
            reading: vocab.hiragana,
            meaning: vocab.english_meaning,
            jlpt_level: vocab.jlpt_level,
            word_type: vocab.word_type,
            source: "local".to_string(),
        }
    }
}

/// Look a word up in the JLPT word list; the first match wins.
async fn word_definition(
    State(state): State<Arc<AppState>>,
    Path(word): Path<String>,
) -> Result<Json<WordDefinition>> {
    let word = word.trim();
    if word.is_empty() {
        return Err(AppError::BadRequest("Word is required".to_string()));
    }
    check_search_len(word)?;

    let found = state
        .db
        .search_vocab(word)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("No definition for {}", word)))?;

    Ok(Json(found.into()))
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EncounterRequest {
    #[validate(range(min = 1))]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub word_id: i64,
    /// Defaults to a hover lookup
    #[serde(default)]
    pub source: Option<EncounterSource>,
}

/// Count a single encounter, e.g. when the learner hovers a word.
async fn record_encounter(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<EncounterRequest>,
) -> Result<Json<VocabEncounter>> {
    req.validate()?;
    let source = req.source.unwrap_or(EncounterSource::Hover);

    let encounter = state
        .db
        .increment_word_frequency(user.user_id, req.word_id, source)
        .await?;

    Ok(Json(encounter))
}
