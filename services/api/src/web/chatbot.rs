//! services/api/src/web/chatbot.rs
//!
//! The chatbot query endpoint: resolves a free-text question into a
//! bounded summary lookup, then asks the narrative backend to phrase the
//! final answer over the resolved context.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use life_calendar_core::query::{chatbot_prompt, resolve_query};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{port_error_response, state::AppState};

#[derive(Deserialize, ToSchema)]
pub struct ChatQueryRequest {
    /// The user's question, e.g. "When did I start Project Alpha?".
    pub query_text: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatQueryResponse {
    pub answer: String,
}

/// POST /chatbot/query - Answer a question over the owner's summaries
#[utoipa::path(
    post,
    path = "/chatbot/query",
    request_body = ChatQueryRequest,
    responses(
        (status = 200, description = "Conversational answer", body = ChatQueryResponse),
        (status = 400, description = "Query text is required"),
        (status = 502, description = "The narrative backend failed"),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn chatbot_query_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<ChatQueryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.query_text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Query text is required".to_string(),
        ));
    }

    let context = resolve_query(state.db.as_ref(), user_id, &req.query_text)
        .await
        .map_err(port_error_response)?;

    let prompt = chatbot_prompt(&req.query_text, context.as_deref());
    let answer = state.narrative.generate(&prompt).await.map_err(|e| {
        error!("Chatbot answer generation failed: {:?}", e);
        (
            StatusCode::BAD_GATEWAY,
            "Unable to answer the question right now".to_string(),
        )
    })?;

    Ok(Json(ChatQueryResponse {
        answer: answer.trim().to_string(),
    }))
}
