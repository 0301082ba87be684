//! Integration tests for the entry/summary/story pipelines and the query
//! resolver, driven against in-memory fakes of the database and narrative
//! ports.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use life_calendar_core::domain::{
    DailyEntry, EntryContent, EntryPatch, Mood, NewStory, Story, Summary, User, UserCredentials,
};
use life_calendar_core::ports::{
    DatabaseService, DateOrder, NarrativeService, PortError, PortResult,
};
use life_calendar_core::{entries, query, story};

//=========================================================================================
// In-memory fakes
//=========================================================================================

#[derive(Default)]
struct FakeState {
    users: Vec<(User, String)>,
    sessions: Vec<(String, Uuid, DateTime<Utc>)>,
    entries: Vec<DailyEntry>,
    summaries: Vec<Summary>,
    stories: Vec<Story>,
}

#[derive(Default)]
struct FakeDb {
    state: Mutex<FakeState>,
}

impl FakeDb {
    fn summary_count(&self) -> usize {
        self.state.lock().unwrap().summaries.len()
    }

    fn story_count(&self) -> usize {
        self.state.lock().unwrap().stories.len()
    }
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut state = self.state.lock().unwrap();
        if state
            .users
            .iter()
            .any(|(u, _)| u.username == username || u.email == email)
        {
            return Err(PortError::Duplicate(
                "a user with this username or email already exists".to_string(),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        state.users.push((user.clone(), hashed_password.to_string()));
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| UserCredentials {
                user_id: u.id,
                email: u.email.clone(),
                hashed_password: hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|(u, _)| u.id == user_id)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .push((session_id.to_string(), user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|(id, _, expires_at)| id == session_id && *expires_at > Utc::now())
            .map(|(_, user_id, _)| *user_id)
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.sessions.len();
        state.sessions.retain(|(id, _, _)| id != session_id);
        if state.sessions.len() == before {
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
        let mut state = self.state.lock().unwrap();
        if state
            .entries
            .iter()
            .any(|e| e.user_id == user_id && e.entry_date == entry_date)
        {
            return Err(PortError::Duplicate(
                "an entry for this date already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let entry = DailyEntry {
            id: Uuid::new_v4(),
            user_id,
            entry_date,
            content,
            created_at: now,
            updated_at: now,
        };
        state.entries.push(entry.clone());
        Ok(entry)
    }

    async fn get_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<DailyEntry> {
        self.state
            .lock()
            .unwrap()
            .entries
            .iter()
            .find(|e| e.id == entry_id && e.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Entry {} not found", entry_id)))
    }

    async fn list_entries(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> PortResult<Vec<DailyEntry>> {
        let mut entries: Vec<DailyEntry> = self
            .state
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| start.map_or(true, |s| e.entry_date >= s))
            .filter(|e| end.map_or(true, |s| e.entry_date <= s))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
        Ok(entries)
    }

    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        entry_date: NaiveDate,
        content: EntryContent,
    ) -> PortResult<DailyEntry> {
        let mut state = self.state.lock().unwrap();
        if state
            .entries
            .iter()
            .any(|e| e.user_id == user_id && e.entry_date == entry_date && e.id != entry_id)
        {
            return Err(PortError::Duplicate(
                "an entry for the new date already exists".to_string(),
            ));
        }
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id && e.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Entry {} not found", entry_id)))?;
        entry.entry_date = entry_date;
        entry.content = content;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.entries.len();
        state
            .entries
            .retain(|e| !(e.id == entry_id && e.user_id == user_id));
        if state.entries.len() == before {
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
        let state = self.state.lock().unwrap();
        let mut entries: Vec<DailyEntry> = state
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && e.entry_date >= start && e.entry_date <= end)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.entry_date);
        Ok(entries
            .into_iter()
            .map(|e| {
                let summary = state.summaries.iter().find(|s| s.entry_id == e.id).cloned();
                (e, summary)
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
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        if let Some(existing) = state.summaries.iter_mut().find(|s| s.entry_id == entry_id) {
            existing.entry_date = entry_date;
            existing.text = text.to_string();
            existing.ai_model = ai_model.to_string();
            existing.generated_at = now;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let summary = Summary {
            id: Uuid::new_v4(),
            entry_id,
            user_id,
            entry_date,
            text: text.to_string(),
            ai_model: ai_model.to_string(),
            generated_at: now,
            updated_at: now,
        };
        state.summaries.push(summary.clone());
        Ok(summary)
    }

    async fn get_summary_for_entry(&self, entry_id: Uuid) -> PortResult<Option<Summary>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .summaries
            .iter()
            .find(|s| s.entry_id == entry_id)
            .cloned())
    }

    async fn delete_summary_for_entry(&self, entry_id: Uuid) -> PortResult<()> {
        self.state
            .lock()
            .unwrap()
            .summaries
            .retain(|s| s.entry_id != entry_id);
        Ok(())
    }

    async fn summaries_for_day(&self, user_id: Uuid, day: NaiveDate) -> PortResult<Vec<Summary>> {
        let mut summaries: Vec<Summary> = self
            .state
            .lock()
            .unwrap()
            .summaries
            .iter()
            .filter(|s| s.user_id == user_id && s.entry_date == day)
            .cloned()
            .collect();
        summaries.sort_by_key(|s| s.entry_date);
        Ok(summaries)
    }

    async fn search_summaries(
        &self,
        user_id: Uuid,
        term: &str,
        order: DateOrder,
        limit: i64,
    ) -> PortResult<Vec<Summary>> {
        let needle = term.to_lowercase();
        let mut summaries: Vec<Summary> = self
            .state
            .lock()
            .unwrap()
            .summaries
            .iter()
            .filter(|s| s.user_id == user_id && s.text.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        match order {
            DateOrder::Ascending => summaries.sort_by_key(|s| s.entry_date),
            DateOrder::Descending => summaries.sort_by(|a, b| b.entry_date.cmp(&a.entry_date)),
        }
        summaries.truncate(limit as usize);
        Ok(summaries)
    }

    async fn find_story_by_range(
        &self,
        user_id: Uuid,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> PortResult<Option<Story>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .stories
            .iter()
            .find(|s| s.user_id == user_id && s.start_date == start_date && s.end_date == end_date)
            .cloned())
    }

    async fn insert_story(&self, story: NewStory) -> PortResult<Story> {
        let now = Utc::now();
        let story = Story {
            id: Uuid::new_v4(),
            user_id: story.user_id,
            title: story.title,
            content: story.content,
            start_date: story.start_date,
            end_date: story.end_date,
            related_entry_ids: story.related_entry_ids,
            ai_model: story.ai_model,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().stories.push(story.clone());
        Ok(story)
    }

    async fn list_stories(&self, user_id: Uuid) -> PortResult<Vec<Story>> {
        let mut stories: Vec<Story> = self
            .state
            .lock()
            .unwrap()
            .stories
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        stories.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(stories)
    }

    async fn get_story(&self, user_id: Uuid, story_id: Uuid) -> PortResult<Story> {
        self.state
            .lock()
            .unwrap()
            .stories
            .iter()
            .find(|s| s.id == story_id && s.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Story {} not found", story_id)))
    }

    async fn delete_story(&self, user_id: Uuid, story_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.stories.len();
        state
            .stories
            .retain(|s| !(s.id == story_id && s.user_id == user_id));
        if state.stories.len() == before {
            return Err(PortError::NotFound(format!("Story {} not found", story_id)));
        }
        Ok(())
    }
}

/// A narrative backend that replays scripted responses and counts calls.
#[derive(Default)]
struct FakeNarrative {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<u32>,
}

impl FakeNarrative {
    fn scripted(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            calls: Mutex::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl NarrativeService for FakeNarrative {
    async fn generate(&self, _prompt: &str) -> PortResult<String> {
        *self.calls.lock().unwrap() += 1;
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "A quiet, ordinary day.".to_string()))
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn notes(text: &str) -> EntryContent {
    EntryContent {
        journal_notes: Some(text.to_string()),
        ..Default::default()
    }
}

const MODEL: &str = "test-model";

//=========================================================================================
// Entry + summary pipeline
//=========================================================================================

#[tokio::test]
async fn empty_entry_creates_no_summary_and_skips_the_backend() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::default();
    let user = Uuid::new_v4();

    let (entry, _) = entries::create_entry(
        &db,
        &narrative,
        user,
        day(2025, 5, 1),
        EntryContent::default(),
        MODEL,
    )
    .await
    .unwrap();

    assert_eq!(narrative.call_count(), 0);
    assert_eq!(db.summary_count(), 0);
    assert!(db.get_summary_for_entry(entry.id).await.unwrap().is_none());
}

#[tokio::test]
async fn entry_with_content_gets_a_summary_with_matching_date() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::scripted(&["I ran 5k and felt great."]);
    let user = Uuid::new_v4();

    let content = EntryContent {
        mood: Some(Mood::Happy),
        journal_notes: Some("Ran 5k".to_string()),
        ..Default::default()
    };
    let (entry, _) = entries::create_entry(&db, &narrative, user, day(2025, 5, 1), content, MODEL)
        .await
        .unwrap();

    let summary = db.get_summary_for_entry(entry.id).await.unwrap().unwrap();
    assert_eq!(summary.entry_id, entry.id);
    assert_eq!(summary.user_id, user);
    assert_eq!(summary.entry_date, day(2025, 5, 1));
    assert_eq!(summary.text, "I ran 5k and felt great.");
}

#[tokio::test]
async fn duplicate_day_is_rejected_for_the_same_owner() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::default();
    let user = Uuid::new_v4();

    entries::create_entry(&db, &narrative, user, day(2025, 5, 1), notes("first"), MODEL)
        .await
        .unwrap();
    let err = entries::create_entry(&db, &narrative, user, day(2025, 5, 1), notes("second"), MODEL)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Duplicate(_)));

    // A different owner may use the same day.
    let other = Uuid::new_v4();
    entries::create_entry(&db, &narrative, other, day(2025, 5, 1), notes("theirs"), MODEL)
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_generation_is_swallowed_and_never_persisted() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::scripted(&["Generation was BLOCKED for safety reasons."]);
    let user = Uuid::new_v4();

    let (entry, refresh) =
        entries::create_entry(&db, &narrative, user, day(2025, 5, 1), notes("hello"), MODEL)
            .await
            .unwrap();

    // The entry write succeeded even though derivation failed.
    assert!(matches!(
        refresh,
        life_calendar_core::SummaryRefresh::Failed(_)
    ));
    assert!(db.get_entry(user, entry.id).await.is_ok());
    assert_eq!(db.summary_count(), 0);
}

#[tokio::test]
async fn regenerating_twice_upserts_rather_than_duplicates() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::scripted(&["Take one.", "Take two."]);
    let user = Uuid::new_v4();

    let (entry, _) =
        entries::create_entry(&db, &narrative, user, day(2025, 5, 1), notes("hello"), MODEL)
            .await
            .unwrap();
    let first = db.get_summary_for_entry(entry.id).await.unwrap().unwrap();

    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = entries::regenerate_summary(&db, &narrative, user, entry.id, MODEL)
        .await
        .unwrap();

    assert_eq!(db.summary_count(), 1);
    assert_eq!(second.entry_id, first.entry_id);
    assert_eq!(second.id, first.id);
    assert!(second.generated_at > first.generated_at);
    assert_eq!(second.text, "Take two.");
}

#[tokio::test]
async fn on_demand_regeneration_surfaces_failures() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::scripted(&["First take.", "An ERROR occurred upstream."]);
    let user = Uuid::new_v4();

    let (entry, _) =
        entries::create_entry(&db, &narrative, user, day(2025, 5, 1), notes("hello"), MODEL)
            .await
            .unwrap();

    let err = entries::regenerate_summary(&db, &narrative, user, entry.id, MODEL)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::GenerationFailed(_)));

    // The previously persisted summary is untouched.
    let kept = db.get_summary_for_entry(entry.id).await.unwrap().unwrap();
    assert_eq!(kept.text, "First take.");
}

#[tokio::test]
async fn changing_the_date_resyncs_the_denormalized_summary_date() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::default();
    let user = Uuid::new_v4();

    let (entry, _) =
        entries::create_entry(&db, &narrative, user, day(2025, 5, 1), notes("hello"), MODEL)
            .await
            .unwrap();

    let patch = EntryPatch {
        entry_date: Some(day(2025, 5, 2)),
        ..Default::default()
    };
    entries::patch_entry(&db, &narrative, user, entry.id, patch, MODEL)
        .await
        .unwrap();

    let summary = db.get_summary_for_entry(entry.id).await.unwrap().unwrap();
    assert_eq!(summary.entry_date, day(2025, 5, 2));
    assert_eq!(db.summary_count(), 1);
}

#[tokio::test]
async fn unchanged_full_update_skips_rederivation() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::default();
    let user = Uuid::new_v4();

    let (entry, _) =
        entries::create_entry(&db, &narrative, user, day(2025, 5, 1), notes("hello"), MODEL)
            .await
            .unwrap();
    assert_eq!(narrative.call_count(), 1);

    let (_, refresh) = entries::update_entry(
        &db,
        &narrative,
        user,
        entry.id,
        day(2025, 5, 1),
        notes("hello"),
        MODEL,
    )
    .await
    .unwrap();

    assert!(refresh.is_none());
    assert_eq!(narrative.call_count(), 1);
}

#[tokio::test]
async fn deleting_an_entry_cascades_to_its_summary() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::default();
    let user = Uuid::new_v4();

    let (entry, _) =
        entries::create_entry(&db, &narrative, user, day(2025, 5, 1), notes("hello"), MODEL)
            .await
            .unwrap();
    assert_eq!(db.summary_count(), 1);

    entries::delete_entry(&db, user, entry.id).await.unwrap();

    assert_eq!(db.summary_count(), 0);
    assert!(matches!(
        entries::delete_entry(&db, user, entry.id).await.unwrap_err(),
        PortError::NotFound(_)
    ));
}

#[tokio::test]
async fn another_owner_cannot_reach_the_entry() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::default();
    let owner_a = Uuid::new_v4();
    let owner_b = Uuid::new_v4();

    let (entry, _) = entries::create_entry(
        &db,
        &narrative,
        owner_a,
        day(2025, 5, 1),
        notes("Ran 5k"),
        MODEL,
    )
    .await
    .unwrap();

    assert!(matches!(
        db.get_entry(owner_b, entry.id).await.unwrap_err(),
        PortError::NotFound(_)
    ));
}

//=========================================================================================
// Story synthesis
//=========================================================================================

async fn seed_week(db: &FakeDb, narrative: &FakeNarrative, user: Uuid) {
    for d in 1..=3 {
        entries::create_entry(
            db,
            narrative,
            user,
            day(2025, 1, d),
            notes(&format!("day {}", d)),
            MODEL,
        )
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn regenerating_a_story_for_the_same_range_replaces_it() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::default();
    let user = Uuid::new_v4();
    seed_week(&db, &narrative, user).await;

    let first = story::synthesize_story(
        &db,
        &narrative,
        user,
        "Week one",
        day(2025, 1, 1),
        day(2025, 1, 7),
        "the first week of January",
        MODEL,
    )
    .await
    .unwrap();

    let second = story::synthesize_story(
        &db,
        &narrative,
        user,
        "Week one, revisited",
        day(2025, 1, 1),
        day(2025, 1, 7),
        "the first week of January",
        MODEL,
    )
    .await
    .unwrap();

    assert_eq!(db.story_count(), 1);
    assert_ne!(first.id, second.id);
    assert_eq!(
        db.get_story(user, second.id).await.unwrap().title,
        "Week one, revisited"
    );
    assert!(matches!(
        db.get_story(user, first.id).await.unwrap_err(),
        PortError::NotFound(_)
    ));
}

#[tokio::test]
async fn a_range_with_no_entries_creates_nothing() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::default();
    let user = Uuid::new_v4();

    let err = story::synthesize_story(
        &db,
        &narrative,
        user,
        "Empty week",
        day(2024, 6, 1),
        day(2024, 6, 7),
        "a quiet week",
        MODEL,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PortError::NotFound(_)));
    assert_eq!(narrative.call_count(), 0);
    assert_eq!(db.story_count(), 0);
}

#[tokio::test]
async fn a_failed_story_generation_leaves_the_old_story_in_place() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::default();
    let user = Uuid::new_v4();
    seed_week(&db, &narrative, user).await;

    let first = story::synthesize_story(
        &db,
        &narrative,
        user,
        "Week one",
        day(2025, 1, 1),
        day(2025, 1, 7),
        "the first week of January",
        MODEL,
    )
    .await
    .unwrap();

    let failing = FakeNarrative::scripted(&["Story generation was blocked by the AI."]);
    let err = story::synthesize_story(
        &db,
        &failing,
        user,
        "Week one again",
        day(2025, 1, 1),
        day(2025, 1, 7),
        "the first week of January",
        MODEL,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PortError::GenerationFailed(_)));
    assert_eq!(db.story_count(), 1);
    assert!(db.get_story(user, first.id).await.is_ok());
}

#[tokio::test]
async fn story_records_contributing_entries_in_date_order() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::default();
    let user = Uuid::new_v4();

    // Insert out of order; the story must still list them ascending.
    let (e2, _) =
        entries::create_entry(&db, &narrative, user, day(2025, 1, 2), notes("two"), MODEL)
            .await
            .unwrap();
    let (e1, _) =
        entries::create_entry(&db, &narrative, user, day(2025, 1, 1), notes("one"), MODEL)
            .await
            .unwrap();

    let story = story::synthesize_story(
        &db,
        &narrative,
        user,
        "Two days",
        day(2025, 1, 1),
        day(2025, 1, 7),
        "two early days",
        MODEL,
    )
    .await
    .unwrap();

    assert_eq!(story.related_entry_ids, vec![e1.id, e2.id]);
}

//=========================================================================================
// Query resolution
//=========================================================================================

#[tokio::test]
async fn a_date_token_triggers_an_exact_day_lookup() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::scripted(&["Planted tomatoes.", "Harvested tomatoes."]);
    let user = Uuid::new_v4();

    entries::create_entry(&db, &narrative, user, day(2025, 3, 5), notes("planting"), MODEL)
        .await
        .unwrap();
    entries::create_entry(&db, &narrative, user, day(2025, 3, 6), notes("harvest"), MODEL)
        .await
        .unwrap();

    let context = query::resolve_query(&db, user, "what about tomatoes on 2025-03-05?")
        .await
        .unwrap()
        .unwrap();

    assert!(context.contains("March 5, 2025"));
    assert!(context.contains("Planted tomatoes."));
    assert!(!context.contains("Harvested tomatoes."));
}

#[tokio::test]
async fn start_questions_surface_the_earliest_mention() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::scripted(&[
        "Continued marathon training with hill repeats.",
        "Started marathon training today.",
    ]);
    let user = Uuid::new_v4();

    entries::create_entry(&db, &narrative, user, day(2025, 4, 10), notes("hills"), MODEL)
        .await
        .unwrap();
    entries::create_entry(&db, &narrative, user, day(2025, 4, 1), notes("start"), MODEL)
        .await
        .unwrap();

    let context = query::resolve_query(&db, user, "When did I start the marathon training?")
        .await
        .unwrap()
        .unwrap();

    assert!(context.contains("April 1, 2025"));
    assert!(context.contains("Started marathon training today."));
}

#[tokio::test]
async fn empty_results_produce_an_explicit_nothing_found_context() {
    let db = FakeDb::default();
    let user = Uuid::new_v4();

    let context = query::resolve_query(&db, user, "tell me about skydiving")
        .await
        .unwrap()
        .unwrap();
    assert!(context.contains("No journal entries"));

    // A blank query means no search was applicable at all.
    let none = query::resolve_query(&db, user, "   ").await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn keyword_results_are_newest_first() {
    let db = FakeDb::default();
    let narrative = FakeNarrative::scripted(&[
        "Worked in the garden, planted roses.",
        "More garden work, built a trellis.",
    ]);
    let user = Uuid::new_v4();

    entries::create_entry(&db, &narrative, user, day(2025, 6, 1), notes("roses"), MODEL)
        .await
        .unwrap();
    entries::create_entry(&db, &narrative, user, day(2025, 6, 8), notes("trellis"), MODEL)
        .await
        .unwrap();

    let context = query::resolve_query(&db, user, "garden")
        .await
        .unwrap()
        .unwrap();

    let trellis_pos = context.find("trellis").unwrap();
    let roses_pos = context.find("roses").unwrap();
    assert!(trellis_pos < roses_pos);
}

//=========================================================================================
// Users and sessions
//=========================================================================================

#[tokio::test]
async fn a_created_user_profile_is_fetchable_by_id() {
    let db = FakeDb::default();

    let user = db
        .create_user("ada", "ada@example.com", "argon2-hash")
        .await
        .unwrap();

    let profile = db.get_user_by_id(user.id).await.unwrap();
    assert_eq!(profile.username, "ada");
    assert_eq!(profile.email, "ada@example.com");

    assert!(matches!(
        db.get_user_by_id(Uuid::new_v4()).await.unwrap_err(),
        PortError::NotFound(_)
    ));
}

#[tokio::test]
async fn logging_out_an_unknown_token_is_reported() {
    let db = FakeDb::default();
    let user = db
        .create_user("ada", "ada@example.com", "argon2-hash")
        .await
        .unwrap();

    db.create_auth_session("tok-1", user.id, Utc::now() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(db.validate_auth_session("tok-1").await.unwrap(), user.id);

    db.delete_auth_session("tok-1").await.unwrap();
    assert!(matches!(
        db.validate_auth_session("tok-1").await.unwrap_err(),
        PortError::Unauthorized
    ));

    // A second delete of the same token finds no session.
    assert!(matches!(
        db.delete_auth_session("tok-1").await.unwrap_err(),
        PortError::Unauthorized
    ));
}
