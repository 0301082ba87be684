//! crates/life_calendar_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    DailyEntry, EntryContent, NewStory, Story, Summary, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Duplicate record: {0}")]
    Duplicate(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Narrative generation failed: {0}")]
    GenerationFailed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Sort direction for date-ordered summary searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    Ascending,
    Descending,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User and Auth Management ---
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    /// Profile lookup for the authenticated owner.
    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    /// Invalidates a session. Fails with `Unauthorized` when no such
    /// session exists.
    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Daily Entry Management ---
    /// Inserts a new entry. Fails with `Duplicate` when the owner already
    /// has an entry for that calendar day.
    async fn create_entry(
        &self,
        user_id: Uuid,
        entry_date: NaiveDate,
        content: EntryContent,
    ) -> PortResult<DailyEntry>;

    /// Owner-scoped fetch: an id belonging to another owner is reported as
    /// `NotFound`, never leaking existence.
    async fn get_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<DailyEntry>;

    /// Lists the owner's entries, newest first, optionally bounded by
    /// start/end days (inclusive).
    async fn list_entries(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> PortResult<Vec<DailyEntry>>;

    /// Full replace of date + content. Fails with `Duplicate` when moving
    /// the entry onto a day that already has one.
    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        entry_date: NaiveDate,
        content: EntryContent,
    ) -> PortResult<DailyEntry>;

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()>;

    /// Entries within [start, end] (inclusive days), ascending by date,
    /// each joined with its summary if one exists.
    async fn entries_with_summaries_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<(DailyEntry, Option<Summary>)>>;

    // --- Summary Management ---
    /// Upsert keyed by entry id: updates text/date/model/timestamps when a
    /// summary already exists for the entry, inserts one otherwise.
    async fn upsert_summary(
        &self,
        entry_id: Uuid,
        user_id: Uuid,
        entry_date: NaiveDate,
        text: &str,
        ai_model: &str,
    ) -> PortResult<Summary>;

    async fn get_summary_for_entry(&self, entry_id: Uuid) -> PortResult<Option<Summary>>;

    async fn delete_summary_for_entry(&self, entry_id: Uuid) -> PortResult<()>;

    /// All of the owner's summaries whose entry date falls on the given
    /// calendar day, ascending.
    async fn summaries_for_day(&self, user_id: Uuid, day: NaiveDate) -> PortResult<Vec<Summary>>;

    /// Case-insensitive keyword search over the owner's summary text,
    /// ordered by entry date.
    async fn search_summaries(
        &self,
        user_id: Uuid,
        term: &str,
        order: DateOrder,
        limit: i64,
    ) -> PortResult<Vec<Summary>>;

    // --- Story Management ---
    async fn find_story_by_range(
        &self,
        user_id: Uuid,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> PortResult<Option<Story>>;

    async fn insert_story(&self, story: NewStory) -> PortResult<Story>;

    async fn list_stories(&self, user_id: Uuid) -> PortResult<Vec<Story>>;

    async fn get_story(&self, user_id: Uuid, story_id: Uuid) -> PortResult<Story>;

    async fn delete_story(&self, user_id: Uuid, story_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait NarrativeService: Send + Sync {
    /// Generates prose for a prompt. Implementations return the raw model
    /// text (possibly empty); callers classify soft failures, see
    /// [`crate::summary::is_soft_failure`].
    async fn generate(&self, prompt: &str) -> PortResult<String>;
}
