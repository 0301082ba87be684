//! crates/life_calendar_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format
//! (serde derives exist only because meetings/tasks are stored as JSON
//! documents by the persistence adapter).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// A meeting recorded inside a daily entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub title: String,
    pub time: Option<String>,
    pub notes: Option<String>,
}

/// A task recorded inside a daily entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub caption: String,
    pub url: Option<String>,
}

/// The fixed set of mood labels a user may attach to a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Neutral,
    Excited,
    Motivated,
    Stressed,
    Calm,
    Fun,
    Anxious,
    Grateful,
    Productive,
    Tired,
    Other,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Neutral => "neutral",
            Mood::Excited => "excited",
            Mood::Motivated => "motivated",
            Mood::Stressed => "stressed",
            Mood::Calm => "calm",
            Mood::Fun => "fun",
            Mood::Anxious => "anxious",
            Mood::Grateful => "grateful",
            Mood::Productive => "productive",
            Mood::Tired => "tired",
            Mood::Other => "other",
        }
    }

    /// Parses one of the fixed labels. Returns `None` for anything else.
    pub fn from_label(label: &str) -> Option<Mood> {
        match label {
            "happy" => Some(Mood::Happy),
            "sad" => Some(Mood::Sad),
            "neutral" => Some(Mood::Neutral),
            "excited" => Some(Mood::Excited),
            "motivated" => Some(Mood::Motivated),
            "stressed" => Some(Mood::Stressed),
            "calm" => Some(Mood::Calm),
            "fun" => Some(Mood::Fun),
            "anxious" => Some(Mood::Anxious),
            "grateful" => Some(Mood::Grateful),
            "productive" => Some(Mood::Productive),
            "tired" => Some(Mood::Tired),
            "other" => Some(Mood::Other),
            _ => None,
        }
    }
}

/// The summarizable content fields of a daily entry, grouped so the
/// summary pipeline and the write path can reason about them as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryContent {
    pub meetings: Vec<Meeting>,
    pub tasks: Vec<Task>,
    pub mood: Option<Mood>,
    pub journal_notes: Option<String>,
}

impl EntryContent {
    /// True when none of the four content fields carry anything worth
    /// summarizing.
    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
            && self.tasks.is_empty()
            && self.mood.is_none()
            && self
                .journal_notes
                .as_deref()
                .map_or(true, |n| n.trim().is_empty())
    }
}

/// One user's recorded day. Exactly one exists per (user, entry_date).
#[derive(Debug, Clone)]
pub struct DailyEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub content: EntryContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A field-level patch for a daily entry. Each field is independently
/// present or absent; absent fields are left untouched. This is never an
/// arbitrary dynamic merge.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub entry_date: Option<NaiveDate>,
    pub meetings: Option<Vec<Meeting>>,
    pub tasks: Option<Vec<Task>>,
    pub mood: Option<Mood>,
    pub journal_notes: Option<String>,
}

impl EntryPatch {
    /// True when the patch touches any field that feeds summarization.
    pub fn touches_content(&self) -> bool {
        self.meetings.is_some()
            || self.tasks.is_some()
            || self.mood.is_some()
            || self.journal_notes.is_some()
    }

    /// Applies the present fields on top of an existing date + content pair,
    /// returning the resulting state.
    pub fn apply(&self, entry_date: NaiveDate, content: &EntryContent) -> (NaiveDate, EntryContent) {
        let date = self.entry_date.unwrap_or(entry_date);
        let content = EntryContent {
            meetings: self.meetings.clone().unwrap_or_else(|| content.meetings.clone()),
            tasks: self.tasks.clone().unwrap_or_else(|| content.tasks.clone()),
            mood: self.mood.or(content.mood),
            journal_notes: self
                .journal_notes
                .clone()
                .or_else(|| content.journal_notes.clone()),
        };
        (date, content)
    }
}

/// AI-derived condensation of one entry's content. At most one exists per
/// entry; `entry_date` and `user_id` are denormalized copies kept in sync
/// with the owning entry on every regenerate.
#[derive(Debug, Clone)]
pub struct Summary {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub text: String,
    pub ai_model: String,
    pub generated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// AI-derived narrative spanning a date range of entries. At most one
/// exists per (owner, exact normalized start/end pair).
#[derive(Debug, Clone)]
pub struct Story {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub related_entry_ids: Vec<Uuid>,
    pub ai_model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields needed to persist a freshly generated story.
#[derive(Debug, Clone)]
pub struct NewStory {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub related_entry_ids: Vec<Uuid>,
    pub ai_model: String,
}
