//! crates/life_calendar_core/src/summary.rs
//!
//! The summary derivation pipeline: builds the per-entry prompt, invokes
//! the narrative backend once, classifies the response and upserts the
//! resulting summary keyed by entry id.

use crate::domain::{DailyEntry, EntryContent, Summary};
use crate::ports::{DatabaseService, NarrativeService, PortResult};

/// The outcome of asking the narrative backend for a daily summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated(String),
    /// None of the content fields carried anything; the backend was not
    /// called and nothing should be persisted.
    InsufficientContent,
    /// The backend returned empty, blocked or error-marked text. Carries
    /// the raw response for logging or error detail.
    Failed(String),
}

/// The result of refreshing the persisted summary for an entry.
#[derive(Debug, Clone)]
pub enum SummaryRefresh {
    Updated(Summary),
    InsufficientContent,
    Failed(String),
}

/// Classifies a narrative backend response as a soft failure. Blocked or
/// errored generations come back as marker text rather than transport
/// errors, and must never be persisted as a valid artifact.
pub fn is_soft_failure(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lower = trimmed.to_lowercase();
    lower.contains("error") || lower.contains("blocked")
}

/// Builds the structured summarization prompt: first-person, concise and
/// non-dramatic, enumerating every meeting and task and weaving in mood
/// and journal notes as separate clauses.
pub fn build_summary_prompt(content: &EntryContent) -> String {
    let mut parts = vec![
        "Please provide a comprehensive, detailed first-person summary of the following \
         daily activities for my personal life calendar. I want you to be thorough and \
         mention ALL tasks I worked on, include details about meetings. The summary should \
         be concise. Don't include any personal information or sensitive data. Do not make \
         the summary dramatic. Keep it simple and official."
            .to_string(),
    ];

    if let Some(notes) = content.journal_notes.as_deref().filter(|n| !n.trim().is_empty()) {
        parts.push(format!("\nMy journal notes for the day: \"{}\"", notes.trim()));
    }
    if let Some(mood) = content.mood {
        parts.push(format!(
            "\nOverall, I felt: {}. Please elaborate on this emotional state in the summary.",
            mood.as_str()
        ));
    }
    if !content.meetings.is_empty() {
        parts.push("\nMeetings I attended (mention each one in detail):".to_string());
        for meeting in &content.meetings {
            let mut line = format!("- {}", meeting.title);
            if let Some(time) = &meeting.time {
                line.push_str(&format!(" at {}", time));
            }
            if let Some(notes) = &meeting.notes {
                line.push_str(&format!(" (Notes: {})", notes));
            }
            parts.push(line);
        }
    }
    if !content.tasks.is_empty() {
        parts.push("\nTasks I worked on (ensure ALL tasks are mentioned in detail):".to_string());
        for task in &content.tasks {
            let mut line = format!("- {}", task.caption);
            if let Some(url) = &task.url {
                line.push_str(&format!(" (related link: {})", url));
            }
            parts.push(line);
        }
    }

    parts.push(
        "\nWhen writing the summary, please ensure it includes specific details about every \
         task mentioned above, my accomplishments, and how I felt throughout the day. Make it \
         brief."
            .to_string(),
    );

    parts.join("\n")
}

/// Derives a summary for the given content fields. The backend is invoked
/// at most once, and only when at least one field carries content. A
/// transport error from the backend is treated the same as error-marked
/// text: a failed generation, not a hard error.
pub async fn derive_summary(
    narrative: &dyn NarrativeService,
    content: &EntryContent,
) -> SummaryOutcome {
    if content.is_empty() {
        return SummaryOutcome::InsufficientContent;
    }

    let prompt = build_summary_prompt(content);
    match narrative.generate(&prompt).await {
        Ok(text) => {
            if is_soft_failure(&text) {
                SummaryOutcome::Failed(text)
            } else {
                SummaryOutcome::Generated(text.trim().to_string())
            }
        }
        Err(e) => SummaryOutcome::Failed(e.to_string()),
    }
}

/// Regenerates the persisted summary for an entry from its current fields.
///
/// On a successful generation the summary is upserted keyed by entry id,
/// which also re-syncs the denormalized entry date. Failed generations are
/// reported, never persisted; only storage errors propagate as `Err`.
pub async fn refresh_summary(
    db: &dyn DatabaseService,
    narrative: &dyn NarrativeService,
    entry: &DailyEntry,
    ai_model: &str,
) -> PortResult<SummaryRefresh> {
    match derive_summary(narrative, &entry.content).await {
        SummaryOutcome::Generated(text) => {
            let summary = db
                .upsert_summary(entry.id, entry.user_id, entry.entry_date, &text, ai_model)
                .await?;
            Ok(SummaryRefresh::Updated(summary))
        }
        SummaryOutcome::InsufficientContent => Ok(SummaryRefresh::InsufficientContent),
        SummaryOutcome::Failed(detail) => Ok(SummaryRefresh::Failed(detail)),
    }
}
