// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversation routes: start, read, add messages, complete.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Conversation, EncounterSource, Message, NewConversation, NewMessage, Sender};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/conversations",
            get(list_active).post(create_conversation),
        )
        .route("/api/conversations/completed", get(list_completed))
        .route("/api/conversations/{id}", get(get_conversation))
        .route("/api/conversations/{id}/messages", post(add_message))
        .route("/api/conversations/{id}/complete", post(complete_conversation))
}

/// Conversation with its messages, oldest first.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// Load a conversation the caller owns.
///
/// Another user's conversation is reported as missing, not forbidden.
async fn owned_conversation(state: &AppState, user: &AuthUser, id: i64) -> Result<Conversation> {
    state
        .db
        .get_conversation(id)
        .await?
        .filter(|c| c.is_owned_by(user.user_id))
        .ok_or_else(|| AppError::NotFound(format!("Conversation {}", id)))
}

async fn list_active(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Conversation>>> {
    let conversations = state.db.list_conversations(user.user_id).await?;
    Ok(Json(
        conversations
            .into_iter()
            .filter(|c| !c.is_completed())
            .collect(),
    ))
}

async fn list_completed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Conversation>>> {
    let conversations = state.db.list_conversations(user.user_id).await?;
    Ok(Json(
        conversations
            .into_iter()
            .filter(Conversation::is_completed)
            .collect(),
    ))
}

async fn create_conversation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new): Json<NewConversation>,
) -> Result<(StatusCode, Json<Conversation>)> {
    new.validate()?;

    let conversation = state.db.create_conversation(user.user_id, &new).await?;
    tracing::info!(
        user_id = %user.user_id,
        conversation_id = conversation.id,
        persona_id = conversation.persona_id,
        "Conversation started"
    );

    Ok((StatusCode::CREATED, Json(conversation)))
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<ConversationDetail>> {
    let conversation = owned_conversation(&state, &user, id).await?;
    let messages = state.db.get_conversation_messages(id).await?;

    Ok(Json(ConversationDetail {
        conversation,
        messages,
    }))
}

/// Store a message, then count the vocabulary it contains.
async fn add_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(new): Json<NewMessage>,
) -> Result<(StatusCode, Json<Message>)> {
    new.validate()?;

    let conversation = owned_conversation(&state, &user, id).await?;
    if conversation.is_completed() {
        return Err(AppError::BadRequest(format!(
            "Conversation {} is already completed",
            id
        )));
    }

    let message = state.db.add_message(id, &new).await?;

    let source = match message.sender {
        Sender::User => EncounterSource::User,
        Sender::Ai => EncounterSource::Ai,
    };
    state
        .vocab
        .track_message(user.user_id, &message.content, source)
        .await;

    Ok((StatusCode::CREATED, Json(message)))
}

async fn complete_conversation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Conversation>> {
    owned_conversation(&state, &user, id).await?;

    let conversation = state.db.complete_conversation(id).await?;
    tracing::info!(user_id = %user.user_id, conversation_id = id, "Conversation completed");

    Ok(Json(conversation))
}
