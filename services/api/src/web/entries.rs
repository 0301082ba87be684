//! services/api/src/web/entries.rs
//!
//! Axum handlers for the daily-entry endpoints, including on-demand
//! summary regeneration. Re-derivation of summaries on write is explicit
//! orchestration delegated to the core write path.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use life_calendar_core::domain::{
    DailyEntry, EntryContent, EntryPatch, Meeting, Mood, Summary, Task,
};
use life_calendar_core::{entries, SummaryRefresh};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::{port_error_response, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, Deserialize, Clone, ToSchema)]
pub struct MeetingPayload {
    pub title: String,
    pub time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, ToSchema)]
pub struct TaskPayload {
    pub caption: String,
    pub url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateEntryRequest {
    /// The calendar day of the entry (YYYY-MM-DD).
    pub date: NaiveDate,
    pub meetings: Option<Vec<MeetingPayload>>,
    pub tasks: Option<Vec<TaskPayload>>,
    pub mood: Option<String>,
    pub journal_notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct PatchEntryRequest {
    pub date: Option<NaiveDate>,
    pub meetings: Option<Vec<MeetingPayload>>,
    pub tasks: Option<Vec<TaskPayload>>,
    pub mood: Option<String>,
    pub journal_notes: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct ListEntriesParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub entry_date: NaiveDate,
    pub text: String,
    pub ai_model: String,
    pub generated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Summary> for SummaryResponse {
    fn from(s: Summary) -> Self {
        Self {
            id: s.id,
            entry_id: s.entry_id,
            entry_date: s.entry_date,
            text: s.text,
            ai_model: s.ai_model,
            generated_at: s.generated_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EntryResponse {
    pub id: Uuid,
    pub date: NaiveDate,
    pub meetings: Vec<MeetingPayload>,
    pub tasks: Vec<TaskPayload>,
    pub mood: Option<String>,
    pub journal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryResponse>,
}

impl EntryResponse {
    fn from_entry(entry: DailyEntry, summary: Option<Summary>) -> Self {
        Self {
            id: entry.id,
            date: entry.entry_date,
            meetings: entry
                .content
                .meetings
                .into_iter()
                .map(|m| MeetingPayload {
                    title: m.title,
                    time: m.time,
                    notes: m.notes,
                })
                .collect(),
            tasks: entry
                .content
                .tasks
                .into_iter()
                .map(|t| TaskPayload {
                    caption: t.caption,
                    url: t.url,
                })
                .collect(),
            mood: entry.content.mood.map(|m| m.as_str().to_string()),
            journal_notes: entry.content.journal_notes,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            summary: summary.map(SummaryResponse::from),
        }
    }
}

//=========================================================================================
// Payload Validation Helpers
//=========================================================================================

fn parse_mood(mood: Option<String>) -> Result<Option<Mood>, (StatusCode, String)> {
    match mood {
        None => Ok(None),
        Some(label) => Mood::from_label(&label).map(Some).ok_or((
            StatusCode::BAD_REQUEST,
            format!("'{}' is not a valid mood", label),
        )),
    }
}

fn convert_meetings(
    meetings: Vec<MeetingPayload>,
) -> Result<Vec<Meeting>, (StatusCode, String)> {
    meetings
        .into_iter()
        .map(|m| {
            if m.title.trim().is_empty() {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "Every meeting must have a title".to_string(),
                ));
            }
            Ok(Meeting {
                title: m.title,
                time: m.time,
                notes: m.notes,
            })
        })
        .collect()
}

fn convert_tasks(tasks: Vec<TaskPayload>) -> Result<Vec<Task>, (StatusCode, String)> {
    tasks
        .into_iter()
        .map(|t| {
            if t.caption.trim().is_empty() {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "Every task must have a caption".to_string(),
                ));
            }
            Ok(Task {
                caption: t.caption,
                url: t.url,
            })
        })
        .collect()
}

fn reject_future_date(date: NaiveDate) -> Result<NaiveDate, (StatusCode, String)> {
    if date > Utc::now().date_naive() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Cannot create entries for future dates".to_string(),
        ));
    }
    Ok(date)
}

fn build_content(
    meetings: Option<Vec<MeetingPayload>>,
    tasks: Option<Vec<TaskPayload>>,
    mood: Option<String>,
    journal_notes: Option<String>,
) -> Result<EntryContent, (StatusCode, String)> {
    Ok(EntryContent {
        meetings: convert_meetings(meetings.unwrap_or_default())?,
        tasks: convert_tasks(tasks.unwrap_or_default())?,
        mood: parse_mood(mood)?,
        journal_notes,
    })
}

/// A failed derivation never fails the entry write; it is logged and the
/// stored summary (if any) is left stale.
fn log_refresh(refresh: &SummaryRefresh) {
    if let SummaryRefresh::Failed(detail) = refresh {
        warn!("Summary generation failed, entry write kept: {}", detail);
    }
}

fn refreshed_summary(refresh: Option<SummaryRefresh>) -> Option<Summary> {
    match refresh {
        Some(SummaryRefresh::Updated(summary)) => Some(summary),
        _ => None,
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /entries - Create a daily entry and derive its summary
#[utoipa::path(
    post,
    path = "/entries",
    request_body = CreateEntryRequest,
    responses(
        (status = 201, description = "Entry created", body = EntryResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "An entry already exists for this date"),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let date = reject_future_date(req.date)?;
    let content = build_content(req.meetings, req.tasks, req.mood, req.journal_notes)?;

    let (entry, refresh) = entries::create_entry(
        state.db.as_ref(),
        state.narrative.as_ref(),
        user_id,
        date,
        content,
        &state.config.narrative_model,
    )
    .await
    .map_err(port_error_response)?;

    log_refresh(&refresh);
    let summary = refreshed_summary(Some(refresh));
    Ok((
        StatusCode::CREATED,
        Json(EntryResponse::from_entry(entry, summary)),
    ))
}

/// GET /entries - List the owner's entries, newest first
#[utoipa::path(
    get,
    path = "/entries",
    params(ListEntriesParams),
    responses(
        (status = 200, description = "List of entries", body = [EntryResponse]),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_entries_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<ListEntriesParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entries = state
        .db
        .list_entries(user_id, params.start_date, params.end_date)
        .await
        .map_err(port_error_response)?;

    let response: Vec<EntryResponse> = entries
        .into_iter()
        .map(|e| EntryResponse::from_entry(e, None))
        .collect();
    Ok(Json(response))
}

/// GET /entries/{id} - Fetch one entry with its summary, if any
#[utoipa::path(
    get,
    path = "/entries/{id}",
    params(("id" = Uuid, Path, description = "Entry id")),
    responses(
        (status = 200, description = "Entry details", body = EntryResponse),
        (status = 404, description = "Entry not found"),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entry = state
        .db
        .get_entry(user_id, id)
        .await
        .map_err(port_error_response)?;
    let summary = state
        .db
        .get_summary_for_entry(entry.id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(EntryResponse::from_entry(entry, summary)))
}

/// PUT /entries/{id} - Fully replace an entry
#[utoipa::path(
    put,
    path = "/entries/{id}",
    params(("id" = Uuid, Path, description = "Entry id")),
    request_body = CreateEntryRequest,
    responses(
        (status = 200, description = "Entry updated", body = EntryResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "An entry already exists for the new date"),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let date = reject_future_date(req.date)?;
    let content = build_content(req.meetings, req.tasks, req.mood, req.journal_notes)?;

    let (entry, refresh) = entries::update_entry(
        state.db.as_ref(),
        state.narrative.as_ref(),
        user_id,
        id,
        date,
        content,
        &state.config.narrative_model,
    )
    .await
    .map_err(port_error_response)?;

    if let Some(refresh) = &refresh {
        log_refresh(refresh);
    }
    let summary = refreshed_summary(refresh);
    Ok(Json(EntryResponse::from_entry(entry, summary)))
}

/// PATCH /entries/{id} - Partially update an entry
#[utoipa::path(
    patch,
    path = "/entries/{id}",
    params(("id" = Uuid, Path, description = "Entry id")),
    request_body = PatchEntryRequest,
    responses(
        (status = 200, description = "Entry patched", body = EntryResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "An entry already exists for the new date"),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn patch_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
    Json(req): Json<PatchEntryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let patch = EntryPatch {
        entry_date: req.date.map(reject_future_date).transpose()?,
        meetings: req.meetings.map(convert_meetings).transpose()?,
        tasks: req.tasks.map(convert_tasks).transpose()?,
        mood: parse_mood(req.mood)?,
        journal_notes: req.journal_notes,
    };

    let (entry, refresh) = entries::patch_entry(
        state.db.as_ref(),
        state.narrative.as_ref(),
        user_id,
        id,
        patch,
        &state.config.narrative_model,
    )
    .await
    .map_err(port_error_response)?;

    if let Some(refresh) = &refresh {
        log_refresh(refresh);
    }
    let summary = refreshed_summary(refresh);
    Ok(Json(EntryResponse::from_entry(entry, summary)))
}

/// DELETE /entries/{id} - Delete an entry and its summary
#[utoipa::path(
    delete,
    path = "/entries/{id}",
    params(("id" = Uuid, Path, description = "Entry id")),
    responses(
        (status = 204, description = "Entry removed"),
        (status = 404, description = "Entry not found"),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    entries::delete_entry(state.db.as_ref(), user_id, id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /entries/{id}/summary - Regenerate the summary on demand
///
/// Unlike the write paths, a failed generation here is the caller's sole
/// purpose for the call and is surfaced as an error.
#[utoipa::path(
    post,
    path = "/entries/{id}/summary",
    params(("id" = Uuid, Path, description = "Entry id")),
    responses(
        (status = 200, description = "Summary regenerated", body = SummaryResponse),
        (status = 400, description = "Not enough content to summarize"),
        (status = 404, description = "Entry not found"),
        (status = 502, description = "Generation failed"),
        (status = 401, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn regenerate_summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let summary = entries::regenerate_summary(
        state.db.as_ref(),
        state.narrative.as_ref(),
        user_id,
        id,
        &state.config.narrative_model,
    )
    .await
    .map_err(port_error_response)?;
    Ok(Json(SummaryResponse::from(summary)))
}
