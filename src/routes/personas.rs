// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tutor persona listing.

use crate::error::Result;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/personas", get(get_personas))
}

/// List all personas.
///
/// An empty list is reported as 404 so the client can show its
/// "no tutors" state; RPC failures pass the database message through.
async fn get_personas(State(state): State<Arc<AppState>>) -> Result<Response> {
    let personas = state.db.get_personas().await?;

    if personas.is_empty() {
        tracing::warn!("No personas returned");
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No tutors found" })),
        )
            .into_response());
    }

    tracing::debug!(count = personas.len(), "Returning personas");
    Ok(Json(personas).into_response())
}
