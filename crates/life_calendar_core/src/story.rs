//! crates/life_calendar_core/src/story.rs
//!
//! The story synthesis pipeline: collects the entries (with summaries) in
//! a normalized date range, builds one narrative prompt over per-day
//! blocks and replaces any prior story for the same range.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::{DailyEntry, NewStory, Story, Summary};
use crate::ports::{DatabaseService, NarrativeService, PortError, PortResult};
use crate::summary::is_soft_failure;

/// Normalizes an inclusive whole-day range: the start day at 00:00:00.000
/// UTC and the end day at 23:59:59.999 UTC. This pair is the story's
/// identity for a given owner.
pub fn normalize_range(start_day: NaiveDate, end_day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&start_day.and_hms_opt(0, 0, 0).unwrap_or_default());
    let end = Utc.from_utc_datetime(
        &end_day
            .and_hms_milli_opt(23, 59, 59, 999)
            .unwrap_or_default(),
    );
    (start, end)
}

/// Builds the narrative block for one day: prefer the summary text, fall
/// back to journal notes, else list meeting and task titles so the day is
/// still represented.
fn day_block(entry: &DailyEntry, summary: Option<&Summary>) -> String {
    let date = entry.entry_date.format("%A, %B %-d, %Y");

    if let Some(summary) = summary {
        return format!("\nOn {}:\n\"{}\"", date, summary.text);
    }
    if let Some(notes) = entry
        .content
        .journal_notes
        .as_deref()
        .filter(|n| !n.trim().is_empty())
    {
        return format!("\nOn {}:\n\"Journal: {}\"", date, notes.trim());
    }

    let mut lines = vec![format!("\nOn {}:", date)];
    for meeting in &entry.content.meetings {
        lines.push(format!("- Meeting: {}", meeting.title));
    }
    for task in &entry.content.tasks {
        lines.push(format!("- Task: {}", task.caption));
    }
    lines.join("\n")
}

/// Builds the single prompt spanning every per-day block, instructing a
/// reflective first-person "storybook chapter" synthesis for the period.
pub fn build_story_prompt(
    days: &[(DailyEntry, Option<Summary>)],
    period_description: &str,
) -> String {
    let mut parts = vec![
        format!(
            "You are a reflective personal chronicler. Your task is to write, in the first \
             person, a narrative based on the following daily summaries from {}. Keep it \
             concise, engaging, not too long, and reflective of my personal journey during \
             this period.",
            period_description
        ),
        "Focus on personal growth, significant moments, recurring themes, overall mood \
         progression, and any observed patterns. Make it feel like a personal storybook \
         chapter. Keep the tone reflective and insightful. Highlight key achievements and \
         challenges if mentioned."
            .to_string(),
    ];

    for (entry, summary) in days {
        parts.push(day_block(entry, summary.as_ref()));
    }

    parts.push("\nNow, please synthesize these daily notes into a flowing narrative for the period.".to_string());
    parts.join("\n---\n")
}

/// Synthesizes and persists a story for the owner's entries in the given
/// day range.
///
/// A range with zero entries fails with `NotFound` and writes nothing; a
/// soft-failed generation fails with `GenerationFailed` carrying the raw
/// backend text and writes nothing. When a story already exists for this
/// exact normalized range it is deleted before the new one is inserted:
/// the range, not the title, determines identity.
pub async fn synthesize_story(
    db: &dyn DatabaseService,
    narrative: &dyn NarrativeService,
    user_id: Uuid,
    title: &str,
    start_day: NaiveDate,
    end_day: NaiveDate,
    period_description: &str,
    ai_model: &str,
) -> PortResult<Story> {
    let (start_date, end_date) = normalize_range(start_day, end_day);

    let days = db
        .entries_with_summaries_in_range(user_id, start_day, end_day)
        .await?;
    if days.is_empty() {
        return Err(PortError::NotFound(
            "No entries found for the selected period to generate a story".to_string(),
        ));
    }

    let prompt = build_story_prompt(&days, period_description);
    let content = match narrative.generate(&prompt).await {
        Ok(text) if is_soft_failure(&text) => return Err(PortError::GenerationFailed(text)),
        Ok(text) => text.trim().to_string(),
        Err(e) => return Err(PortError::GenerationFailed(e.to_string())),
    };

    if let Some(existing) = db.find_story_by_range(user_id, start_date, end_date).await? {
        db.delete_story(user_id, existing.id).await?;
    }

    let related_entry_ids = days.iter().map(|(entry, _)| entry.id).collect();
    db.insert_story(NewStory {
        user_id,
        title: title.to_string(),
        content,
        start_date,
        end_date,
        related_entry_ids,
        ai_model: ai_model.to_string(),
    })
    .await
}
