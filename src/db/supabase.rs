// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase (PostgREST) client with typed operations.
//!
//! Tables are read and written through PostgREST filters; everything the
//! database computes itself (streaks, XP, conversation bookkeeping) goes
//! through named RPCs.

use crate::db::{rpc, tables, Backend};
use crate::error::AppError;
use crate::models::vocab::{normalize_level, sort_tracked};
use crate::models::{
    Conversation, EncounterSource, JlptVocab, Message, NewConversation, NewMessage,
    ProfileUpdate, TrackedWord, UserProfile, VocabEncounter, VocabStats,
};
use crate::text::safe_number;
use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// PostgREST media type for single-object responses.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Most rows returned by a vocabulary search.
const SEARCH_LIMIT: usize = 20;

/// Postgres SQLSTATE for a foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgREST error envelope.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Connection details for one Supabase project.
#[derive(Clone)]
struct SupabaseClient {
    http: reqwest::Client,
    rest_url: String,
    service_key: String,
}

/// Supabase database client.
#[derive(Clone)]
pub struct SupabaseDb {
    client: Option<SupabaseClient>,
}

impl SupabaseDb {
    /// Create a client for the project at `url`, authenticating with the
    /// service role key.
    pub fn new(url: &str, service_key: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("kaiwa-tutor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Database(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(url = url, "Using Supabase backend");

        Ok(Self {
            client: Some(SupabaseClient {
                http,
                rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
                service_key: service_key.to_string(),
            }),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&SupabaseClient, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AppError> {
        let client = self.get_client()?;
        Ok(client
            .http
            .request(method, format!("{}/{}", client.rest_url, path))
            .header("apikey", &client.service_key)
            .bearer_auth(&client.service_key))
    }

    /// Call an RPC. Failures carry the database's own message.
    async fn call_rpc<T: DeserializeOwned>(&self, name: &str, args: Value) -> Result<T, AppError> {
        self.call_rpc_with(name, args, |failure| AppError::Rpc(failure.message))
            .await
    }

    /// Call an RPC, choosing the error for a failed call.
    async fn call_rpc_with<T, F>(&self, name: &str, args: Value, on_failure: F) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        F: FnOnce(PostgrestError) -> AppError + Send,
    {
        let response = self
            .request(Method::POST, &format!("rpc/{}", name))?
            .json(&args)
            .send()
            .await
            .map_err(|e| AppError::Rpc(e.to_string()))?;

        if !response.status().is_success() {
            let failure = read_failure(response).await;
            tracing::warn!(rpc = name, code = ?failure.code, error = %failure.message, "RPC failed");
            return Err(on_failure(failure));
        }

        response.json().await.map_err(|e| AppError::Rpc(e.to_string()))
    }

    /// Call an RPC whose result we do not read.
    async fn call_rpc_void(&self, name: &str, args: Value) -> Result<(), AppError> {
        let response = self
            .request(Method::POST, &format!("rpc/{}", name))?
            .json(&args)
            .send()
            .await
            .map_err(|e| AppError::Rpc(e.to_string()))?;

        if !response.status().is_success() {
            let message = error_message(response).await;
            tracing::warn!(rpc = name, error = %message, "RPC failed");
            return Err(AppError::Rpc(message));
        }
        Ok(())
    }

    /// Read all rows matching `query` (a PostgREST query string).
    async fn select<T: DeserializeOwned>(&self, table: &str, query: &str) -> Result<Vec<T>, AppError> {
        let response = self
            .request(Method::GET, &format!("{}?{}", table, query))?
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        check_response_json(response).await
    }

    /// Read exactly one row; `None` when nothing matches.
    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Option<T>, AppError> {
        let response = self
            .request(Method::GET, &format!("{}?{}", table, query))?
            .header(header::ACCEPT, SINGLE_OBJECT)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // PostgREST answers 406 when the single-object query matched no rows
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            return Ok(None);
        }

        check_response_json(response).await.map(Some)
    }

    async fn insert<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let response = self
            .request(Method::POST, table)?
            .header(header::ACCEPT, SINGLE_OBJECT)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        check_response_json(response).await
    }

    async fn update<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        query: &str,
        body: &B,
    ) -> Result<Option<T>, AppError> {
        let response = self
            .request(Method::PATCH, &format!("{}?{}", table, query))?
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut rows: Vec<T> = check_response_json(response).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }
}

/// Error envelope of a failed response; bodies that are not an envelope
/// become the message.
async fn read_failure(response: reqwest::Response) -> PostgrestError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<PostgrestError>(&body) {
        Ok(err) => {
            tracing::debug!(
                code = ?err.code,
                details = ?err.details,
                hint = ?err.hint,
                "PostgREST error"
            );
            err
        }
        Err(_) => PostgrestError {
            message: format!("HTTP {}: {}", status, body),
            code: None,
            details: None,
            hint: None,
        },
    }
}

/// Best-effort human-readable message from a failed response.
async fn error_message(response: reqwest::Response) -> String {
    read_failure(response).await.message
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
    if !response.status().is_success() {
        return Err(AppError::Database(error_message(response).await));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Database(format!("Failed to parse response: {}", e)))
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", urlencoding::encode(&value.to_string()))
}

/// PostgREST `or` filter matching `query` against the searchable columns.
fn vocab_search_filter(query: &str) -> String {
    // Characters with meaning inside PostgREST filter syntax
    let term: String = query
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '"' | '\\' | '*' | '%'))
        .collect();
    let pattern = format!("\"*{}*\"", term);
    let filter = format!(
        "(hiragana.ilike.{p},kanji.ilike.{p},english_meaning.ilike.{p})",
        p = pattern
    );
    format!(
        "or={}&order=id.asc&limit={}",
        urlencoding::encode(&filter),
        SEARCH_LIMIT
    )
}

/// Fold `{level, count}` rows into the fixed N1..N5 list.
fn stats_from_rows(rows: &[Value]) -> Vec<VocabStats> {
    let mut stats = VocabStats::aggregate(std::iter::empty());
    for row in rows {
        let Some(level) = normalize_level(&row["level"]) else {
            continue;
        };
        let count = safe_number(&row["count"], 0.0).max(0.0) as u64;
        if let Some(entry) = stats.iter_mut().find(|s| s.level == level) {
            entry.count += count;
        }
    }
    stats
}

#[async_trait]
impl Backend for SupabaseDb {
    // ─── Personas ────────────────────────────────────────────────

    async fn get_personas(&self) -> Result<Vec<Value>, AppError> {
        self.call_rpc(rpc::GET_PERSONAS, json!({})).await
    }

    // ─── User Profiles ───────────────────────────────────────────

    async fn get_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        self.select_one(tables::USERS, &format!("id={}&select=*", eq(user_id)))
            .await
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        let mut rows: Vec<UserProfile> = self
            .select(tables::USERS, &format!("email={}&limit=1", eq(email)))
            .await?;
        Ok(rows.pop())
    }

    async fn create_user_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        let created: UserProfile = self.insert(tables::USERS, profile).await?;
        tracing::info!(user_id = %created.id, "Created user profile");
        Ok(created)
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, AppError> {
        let mut body = serde_json::to_value(update)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        if let Some(obj) = body.as_object_mut() {
            obj.insert(
                "updated_at".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }

        self.update(tables::USERS, &format!("id={}", eq(user_id)), &body)
            .await
    }

    async fn update_streak(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        self.call_rpc_void(rpc::UPDATE_STREAK, json!({ "user_id": user_id }))
            .await?;
        self.get_user_profile(user_id).await
    }

    async fn add_xp(&self, user_id: Uuid, points: i64) -> Result<Option<UserProfile>, AppError> {
        self.call_rpc_void(rpc::ADD_XP, json!({ "user_id": user_id, "points": points }))
            .await?;
        self.get_user_profile(user_id).await
    }

    // ─── Vocabulary ──────────────────────────────────────────────

    async fn get_vocab_stats(&self, user_id: Uuid) -> Result<Vec<VocabStats>, AppError> {
        let rows: Vec<Value> = self
            .call_rpc(rpc::GET_VOCAB_STATS, json!({ "user_id": user_id }))
            .await?;
        Ok(stats_from_rows(&rows))
    }

    async fn search_vocab(&self, query: &str) -> Result<Vec<JlptVocab>, AppError> {
        self.select(tables::JLPT_VOCAB, &vocab_search_filter(query))
            .await
    }

    async fn list_tracked_words(&self, user_id: Uuid) -> Result<Vec<TrackedWord>, AppError> {
        let mut words: Vec<TrackedWord> = self
            .select(
                tables::VOCAB_TRACKER,
                &format!(
                    "user_id={}&select=*,word:{}!inner(*)&order=frequency.desc",
                    eq(user_id),
                    tables::JLPT_VOCAB
                ),
            )
            .await?;
        sort_tracked(&mut words);
        Ok(words)
    }

    async fn increment_word_frequency(
        &self,
        user_id: Uuid,
        word_id: i64,
        source: EncounterSource,
    ) -> Result<VocabEncounter, AppError> {
        self.call_rpc_with(
            rpc::INCREMENT_WORD_FREQUENCY,
            json!({
                "user_id": user_id,
                "word_id": word_id,
                "source": source.as_str(),
            }),
            |failure| match failure.code.as_deref() {
                // The tracker row references a word that does not exist
                Some(FOREIGN_KEY_VIOLATION) => AppError::NotFound(format!("Word {}", word_id)),
                _ => AppError::Rpc(failure.message),
            },
        )
        .await
    }

    // ─── Conversations ───────────────────────────────────────────

    async fn create_conversation(
        &self,
        user_id: Uuid,
        new: &NewConversation,
    ) -> Result<Conversation, AppError> {
        let id: i64 = self
            .call_rpc(
                rpc::CREATE_CONVERSATION,
                json!({
                    "user_id": user_id,
                    "persona_id": new.persona_id,
                    "scenario_id": new.scenario_id,
                    "title": new.title,
                }),
            )
            .await?;

        self.get_conversation(id)
            .await?
            .ok_or_else(|| AppError::Database(format!("Conversation {} vanished after insert", id)))
    }

    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, AppError> {
        self.select(
            tables::CONVERSATIONS,
            &format!("user_id={}&order=started_at.desc", eq(user_id)),
        )
        .await
    }

    async fn get_conversation(
        &self,
        conversation_id: i64,
    ) -> Result<Option<Conversation>, AppError> {
        self.select_one(tables::CONVERSATIONS, &format!("id={}", eq(conversation_id)))
            .await
    }

    async fn add_message(
        &self,
        conversation_id: i64,
        new: &NewMessage,
    ) -> Result<Message, AppError> {
        let id: i64 = self
            .call_rpc(
                rpc::ADD_MESSAGE,
                json!({
                    "conversation_id": conversation_id,
                    "sender": new.sender,
                    "content": new.content,
                    "english": new.english,
                    "feedback": new.feedback,
                    "suggestions": new.suggestions,
                    "vocab_used": new.vocab_used,
                    "grammar_used": new.grammar_used,
                }),
            )
            .await?;

        self.select_one(tables::MESSAGES, &format!("id={}", eq(id)))
            .await?
            .ok_or_else(|| AppError::Database(format!("Message {} vanished after insert", id)))
    }

    async fn get_conversation_messages(
        &self,
        conversation_id: i64,
    ) -> Result<Vec<Message>, AppError> {
        self.call_rpc(
            rpc::GET_CONVERSATION_MESSAGES,
            json!({ "conversation_id": conversation_id }),
        )
        .await
    }

    async fn complete_conversation(&self, conversation_id: i64) -> Result<Conversation, AppError> {
        self.call_rpc_void(
            rpc::COMPLETE_CONVERSATION,
            json!({ "conversation_id": conversation_id }),
        )
        .await?;

        self.get_conversation(conversation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Conversation {}", conversation_id)))
    }
}
