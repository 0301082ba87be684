//! services/api/src/web/stories.rs
//!
//! Axum handlers for story generation and retrieval.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use life_calendar_core::domain::Story;
use life_calendar_core::story::synthesize_story;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{port_error_response, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GenerateStoryRequest {
    pub title: String,
    /// First day of the period (YYYY-MM-DD), inclusive.
    pub start_date: NaiveDate,
    /// Last day of the period (YYYY-MM-DD), inclusive.
    pub end_date: NaiveDate,
    /// Human description of the period, woven into the narrative prompt.
    pub period_description: String,
}

#[derive(Serialize, ToSchema)]
pub struct StoryResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub related_entry_ids: Vec<Uuid>,
    pub ai_model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Story> for StoryResponse {
    fn from(s: Story) -> Self {
        Self {
            id: s.id,
            title: s.title,
            content: s.content,
            start_date: s.start_date,
            end_date: s.end_date,
            related_entry_ids: s.related_entry_ids,
            ai_model: s.ai_model,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /stories/generate - Synthesize a story for a date range
///
/// A story already covering the exact same range is replaced, never
/// duplicated.
#[utoipa::path(
    post,
    path = "/stories/generate",
    request_body = GenerateStoryRequest,
    responses(
        (status = 201, description = "Story generated", body = StoryResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "No entries in the selected period"),
        (status = 502, description = "Generation failed"),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn generate_story_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<GenerateStoryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.title.trim().is_empty() || req.period_description.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Please provide title, startDate, endDate, and periodDescription".to_string(),
        ));
    }
    if req.end_date < req.start_date {
        return Err((
            StatusCode::BAD_REQUEST,
            "endDate must not be before startDate".to_string(),
        ));
    }

    let story = synthesize_story(
        state.db.as_ref(),
        state.narrative.as_ref(),
        user_id,
        req.title.trim(),
        req.start_date,
        req.end_date,
        req.period_description.trim(),
        &state.config.narrative_model,
    )
    .await
    .map_err(port_error_response)?;

    Ok((StatusCode::CREATED, Json(StoryResponse::from(story))))
}

/// GET /stories - List the owner's stories, most recent period first
#[utoipa::path(
    get,
    path = "/stories",
    responses(
        (status = 200, description = "List of stories", body = [StoryResponse]),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_stories_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let stories = state
        .db
        .list_stories(user_id)
        .await
        .map_err(port_error_response)?;
    let response: Vec<StoryResponse> = stories.into_iter().map(StoryResponse::from).collect();
    Ok(Json(response))
}

/// GET /stories/{id} - Fetch one story
#[utoipa::path(
    get,
    path = "/stories/{id}",
    params(("id" = Uuid, Path, description = "Story id")),
    responses(
        (status = 200, description = "Story details", body = StoryResponse),
        (status = 404, description = "Story not found"),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_story_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let story = state
        .db
        .get_story(user_id, id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(StoryResponse::from(story)))
}

/// DELETE /stories/{id} - Delete a story
#[utoipa::path(
    delete,
    path = "/stories/{id}",
    params(("id" = Uuid, Path, description = "Story id")),
    responses(
        (status = 204, description = "Story removed"),
        (status = 404, description = "Story not found"),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_story_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_story(user_id, id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
