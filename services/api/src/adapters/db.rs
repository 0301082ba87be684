//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use life_calendar_core::domain::{
    DailyEntry, EntryContent, Meeting, Mood, NewStory, Story, Summary, Task, User,
    UserCredentials,
};
use life_calendar_core::ports::{DatabaseService, DateOrder, PortError, PortResult};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// True when the error is a Postgres unique-constraint violation. Races on
/// the same key resolve here: one writer succeeds, the other gets this.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.id,
            email: self.email,
            hashed_password: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct EntryRecord {
    id: Uuid,
    user_id: Uuid,
    entry_date: NaiveDate,
    meetings: Json<Vec<Meeting>>,
    tasks: Json<Vec<Task>>,
    mood: Option<String>,
    journal_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl EntryRecord {
    fn to_domain(self) -> DailyEntry {
        DailyEntry {
            id: self.id,
            user_id: self.user_id,
            entry_date: self.entry_date,
            content: EntryContent {
                meetings: self.meetings.0,
                tasks: self.tasks.0,
                mood: self.mood.as_deref().and_then(Mood::from_label),
                journal_notes: self.journal_notes,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const ENTRY_COLUMNS: &str =
    "id, user_id, entry_date, meetings, tasks, mood, journal_notes, created_at, updated_at";

#[derive(FromRow)]
struct SummaryRecord {
    id: Uuid,
    entry_id: Uuid,
    user_id: Uuid,
    entry_date: NaiveDate,
    text: String,
    ai_model: String,
    generated_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl SummaryRecord {
    fn to_domain(self) -> Summary {
        Summary {
            id: self.id,
            entry_id: self.entry_id,
            user_id: self.user_id,
            entry_date: self.entry_date,
            text: self.text,
            ai_model: self.ai_model,
            generated_at: self.generated_at,
            updated_at: self.updated_at,
        }
    }
}

const SUMMARY_COLUMNS: &str =
    "id, entry_id, user_id, entry_date, text, ai_model, generated_at, updated_at";

#[derive(FromRow)]
struct StoryRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    related_entry_ids: Vec<Uuid>,
    ai_model: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl StoryRecord {
    fn to_domain(self) -> Story {
        Story {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            start_date: self.start_date,
            end_date: self.end_date,
            related_entry_ids: self.related_entry_ids,
            ai_model: self.ai_model,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const STORY_COLUMNS: &str =
    "id, user_id, title, content, start_date, end_date, related_entry_ids, ai_model, created_at, updated_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, username, email, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Duplicate("A user with this username or email already exists".to_string())
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(|(user_id,)| user_id).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::Unauthorized);
        }
        Ok(())
    }

    async fn create_entry(
        &self,
        user_id: Uuid,
        entry_date: NaiveDate,
        content: EntryContent,
    ) -> PortResult<DailyEntry> {
        let sql = format!(
            "INSERT INTO daily_entries (id, user_id, entry_date, meetings, tasks, mood, journal_notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ENTRY_COLUMNS}"
        );
        let record = sqlx::query_as::<_, EntryRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(entry_date)
            .bind(Json(content.meetings))
            .bind(Json(content.tasks))
            .bind(content.mood.map(|m| m.as_str()))
            .bind(content.journal_notes)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::Duplicate(
                        "An entry for this date already exists. You can update it instead."
                            .to_string(),
                    )
                } else {
                    unexpected(e)
                }
            })?;
        Ok(record.to_domain())
    }

    async fn get_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<DailyEntry> {
        let sql =
            format!("SELECT {ENTRY_COLUMNS} FROM daily_entries WHERE id = $1 AND user_id = $2");
        let record = sqlx::query_as::<_, EntryRecord>(&sql)
            .bind(entry_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Entry {} not found", entry_id))
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn list_entries(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> PortResult<Vec<DailyEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM daily_entries \
             WHERE user_id = $1 \
               AND ($2::date IS NULL OR entry_date >= $2) \
               AND ($3::date IS NULL OR entry_date <= $3) \
             ORDER BY entry_date DESC"
        );
        let records = sqlx::query_as::<_, EntryRecord>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        entry_date: NaiveDate,
        content: EntryContent,
    ) -> PortResult<DailyEntry> {
        let sql = format!(
            "UPDATE daily_entries \
             SET entry_date = $3, meetings = $4, tasks = $5, mood = $6, journal_notes = $7, \
                 updated_at = now() \
             WHERE id = $1 AND user_id = $2 RETURNING {ENTRY_COLUMNS}"
        );
        let record = sqlx::query_as::<_, EntryRecord>(&sql)
            .bind(entry_id)
            .bind(user_id)
            .bind(entry_date)
            .bind(Json(content.meetings))
            .bind(Json(content.tasks))
            .bind(content.mood.map(|m| m.as_str()))
            .bind(content.journal_notes)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::Duplicate(
                        "An entry for the new date already exists. Cannot change to this date."
                            .to_string(),
                    )
                } else if matches!(e, sqlx::Error::RowNotFound) {
                    PortError::NotFound(format!("Entry {} not found", entry_id))
                } else {
                    unexpected(e)
                }
            })?;
        Ok(record.to_domain())
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM daily_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Entry {} not found", entry_id)));
        }
        Ok(())
    }

    async fn entries_with_summaries_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<(DailyEntry, Option<Summary>)>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM daily_entries \
             WHERE user_id = $1 AND entry_date >= $2 AND entry_date <= $3 \
             ORDER BY entry_date ASC"
        );
        let entries = sqlx::query_as::<_, EntryRecord>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM summaries \
             WHERE user_id = $1 AND entry_date >= $2 AND entry_date <= $3"
        );
        let summaries = sqlx::query_as::<_, SummaryRecord>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        let mut summaries: Vec<Summary> = summaries.into_iter().map(|r| r.to_domain()).collect();

        Ok(entries
            .into_iter()
            .map(|record| {
                let entry = record.to_domain();
                let summary = summaries
                    .iter()
                    .position(|s| s.entry_id == entry.id)
                    .map(|i| summaries.swap_remove(i));
                (entry, summary)
            })
            .collect())
    }

    async fn upsert_summary(
        &self,
        entry_id: Uuid,
        user_id: Uuid,
        entry_date: NaiveDate,
        text: &str,
        ai_model: &str,
    ) -> PortResult<Summary> {
        let sql = format!(
            "INSERT INTO summaries (id, entry_id, user_id, entry_date, text, ai_model) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (entry_id) DO UPDATE SET \
                 entry_date = EXCLUDED.entry_date, \
                 text = EXCLUDED.text, \
                 ai_model = EXCLUDED.ai_model, \
                 generated_at = now(), \
                 updated_at = now() \
             RETURNING {SUMMARY_COLUMNS}"
        );
        let record = sqlx::query_as::<_, SummaryRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(entry_id)
            .bind(user_id)
            .bind(entry_date)
            .bind(text)
            .bind(ai_model)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_summary_for_entry(&self, entry_id: Uuid) -> PortResult<Option<Summary>> {
        let sql = format!("SELECT {SUMMARY_COLUMNS} FROM summaries WHERE entry_id = $1");
        let record = sqlx::query_as::<_, SummaryRecord>(&sql)
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn delete_summary_for_entry(&self, entry_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM summaries WHERE entry_id = $1")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn summaries_for_day(&self, user_id: Uuid, day: NaiveDate) -> PortResult<Vec<Summary>> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM summaries \
             WHERE user_id = $1 AND entry_date = $2 ORDER BY entry_date ASC"
        );
        let records = sqlx::query_as::<_, SummaryRecord>(&sql)
            .bind(user_id)
            .bind(day)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn search_summaries(
        &self,
        user_id: Uuid,
        term: &str,
        order: DateOrder,
        limit: i64,
    ) -> PortResult<Vec<Summary>> {
        let direction = match order {
            DateOrder::Ascending => "ASC",
            DateOrder::Descending => "DESC",
        };
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM summaries \
             WHERE user_id = $1 AND text ILIKE '%' || $2 || '%' \
             ORDER BY entry_date {direction} LIMIT $3"
        );
        let records = sqlx::query_as::<_, SummaryRecord>(&sql)
            .bind(user_id)
            .bind(term)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_story_by_range(
        &self,
        user_id: Uuid,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> PortResult<Option<Story>> {
        let sql = format!(
            "SELECT {STORY_COLUMNS} FROM stories \
             WHERE user_id = $1 AND start_date = $2 AND end_date = $3"
        );
        let record = sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(user_id)
            .bind(start_date)
            .bind(end_date)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn insert_story(&self, story: NewStory) -> PortResult<Story> {
        let sql = format!(
            "INSERT INTO stories (id, user_id, title, content, start_date, end_date, \
                                  related_entry_ids, ai_model) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {STORY_COLUMNS}"
        );
        let record = sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(story.user_id)
            .bind(story.title)
            .bind(story.content)
            .bind(story.start_date)
            .bind(story.end_date)
            .bind(story.related_entry_ids)
            .bind(story.ai_model)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::Duplicate("A story for this date range already exists".to_string())
                } else {
                    unexpected(e)
                }
            })?;
        Ok(record.to_domain())
    }

    async fn list_stories(&self, user_id: Uuid) -> PortResult<Vec<Story>> {
        let sql = format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE user_id = $1 ORDER BY start_date DESC"
        );
        let records = sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_story(&self, user_id: Uuid, story_id: Uuid) -> PortResult<Story> {
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = $1 AND user_id = $2");
        let record = sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(story_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Story {} not found", story_id))
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn delete_story(&self, user_id: Uuid, story_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1 AND user_id = $2")
            .bind(story_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Story {} not found", story_id)));
        }
        Ok(())
    }
}
