//! crates/life_calendar_core/src/entries.rs
//!
//! The daily-entry write path. Summary re-derivation and cleanup are
//! explicit orchestration steps here, not implicit hooks on the entity:
//! every mutation decides whether the derived summary must be refreshed,
//! and deletion removes the dependent summary before the entry itself.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{DailyEntry, EntryContent, EntryPatch, Summary};
use crate::ports::{DatabaseService, NarrativeService, PortError, PortResult};
use crate::summary::{refresh_summary, SummaryRefresh};

/// Creates a new entry for the owner's day and derives its summary.
///
/// A failed or skipped derivation does not fail the create: the entry
/// write already committed and the caller decides how to report the
/// refresh outcome.
pub async fn create_entry(
    db: &dyn DatabaseService,
    narrative: &dyn NarrativeService,
    user_id: Uuid,
    entry_date: NaiveDate,
    content: EntryContent,
    ai_model: &str,
) -> PortResult<(DailyEntry, SummaryRefresh)> {
    let entry = db.create_entry(user_id, entry_date, content).await?;
    let refresh = refresh_summary(db, narrative, &entry, ai_model).await?;
    Ok((entry, refresh))
}

/// Fully replaces an entry's date and content.
///
/// The summary is re-derived only when the replacement actually changes
/// the date or any summarizable field; an identical replacement leaves the
/// stored summary untouched and returns `None` for the refresh.
pub async fn update_entry(
    db: &dyn DatabaseService,
    narrative: &dyn NarrativeService,
    user_id: Uuid,
    entry_id: Uuid,
    entry_date: NaiveDate,
    content: EntryContent,
    ai_model: &str,
) -> PortResult<(DailyEntry, Option<SummaryRefresh>)> {
    let existing = db.get_entry(user_id, entry_id).await?;
    let changed = existing.entry_date != entry_date || existing.content != content;

    let entry = db
        .update_entry(user_id, entry_id, entry_date, content)
        .await?;

    let refresh = if changed {
        Some(refresh_summary(db, narrative, &entry, ai_model).await?)
    } else {
        None
    };
    Ok((entry, refresh))
}

/// Applies a field-level patch to an entry.
///
/// Any patch touching a summarizable field or the date triggers
/// re-derivation from the entry's resulting state.
pub async fn patch_entry(
    db: &dyn DatabaseService,
    narrative: &dyn NarrativeService,
    user_id: Uuid,
    entry_id: Uuid,
    patch: EntryPatch,
    ai_model: &str,
) -> PortResult<(DailyEntry, Option<SummaryRefresh>)> {
    let existing = db.get_entry(user_id, entry_id).await?;
    let needs_refresh =
        patch.touches_content() || patch.entry_date.is_some_and(|d| d != existing.entry_date);

    let (entry_date, content) = patch.apply(existing.entry_date, &existing.content);
    let entry = db
        .update_entry(user_id, entry_id, entry_date, content)
        .await?;

    let refresh = if needs_refresh {
        Some(refresh_summary(db, narrative, &entry, ai_model).await?)
    } else {
        None
    };
    Ok((entry, refresh))
}

/// Deletes an entry and its summary. The summary goes first so a partial
/// failure can never leave a summary pointing at a missing entry.
pub async fn delete_entry(
    db: &dyn DatabaseService,
    user_id: Uuid,
    entry_id: Uuid,
) -> PortResult<()> {
    let entry = db.get_entry(user_id, entry_id).await?;
    db.delete_summary_for_entry(entry.id).await?;
    db.delete_entry(user_id, entry.id).await
}

/// Explicit on-demand regeneration. Unlike the write paths above, this
/// call exists solely to produce a summary, so a failed or content-starved
/// generation is surfaced as an error rather than swallowed.
pub async fn regenerate_summary(
    db: &dyn DatabaseService,
    narrative: &dyn NarrativeService,
    user_id: Uuid,
    entry_id: Uuid,
    ai_model: &str,
) -> PortResult<Summary> {
    let entry = db.get_entry(user_id, entry_id).await?;
    match refresh_summary(db, narrative, &entry, ai_model).await? {
        SummaryRefresh::Updated(summary) => Ok(summary),
        SummaryRefresh::InsufficientContent => Err(PortError::Validation(
            "Not enough specific data provided to generate a meaningful summary".to_string(),
        )),
        SummaryRefresh::Failed(detail) => Err(PortError::GenerationFailed(detail)),
    }
}
