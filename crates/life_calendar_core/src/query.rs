//! crates/life_calendar_core/src/query.rs
//!
//! The chatbot query resolver: a small set of deterministic pattern and
//! date matchers that turn a free-text question into a bounded database
//! lookup over stored summaries, plus the context formatting handed to the
//! narrative backend for the final prose answer.

use chrono::NaiveDate;
use regex::Regex;
use uuid::Uuid;

use crate::ports::{DatabaseService, DateOrder, PortResult};

/// Hard cap on how many summaries feed a single chatbot answer.
const RESULT_LIMIT: i64 = 10;

/// The deterministic intent a free-text question resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    /// An explicit calendar day was named: exact-day lookup, ascending.
    ExactDay(NaiveDate),
    /// "when did i start/begin ..." : keyword search, earliest match wins.
    EarliestMention(String),
    /// Keyword search over the whole query, most recent first.
    Keyword(String),
}

/// Parses a question into an intent. Matchers are evaluated in priority
/// order and the first match wins; a date search always replaces keyword
/// search.
pub fn parse_query(text: &str) -> QueryIntent {
    let lower = text.to_lowercase();

    // 1. An explicit date token anywhere in the text wins outright.
    if let Some(day) = find_date_token(&lower) {
        return QueryIntent::ExactDay(day);
    }

    // 2. "when did i start/begin ..." extracts the trailing noun phrase.
    if lower.contains("when did i start") || lower.contains("when did i begin") {
        let re = Regex::new(r"(?:start|begin)\s+(?:my\s+|work\s+on\s+|on\s+|the\s+)?(.+)").unwrap();
        if let Some(caps) = re.captures(&lower) {
            let term = clean_term(&caps[1]);
            if !term.is_empty() {
                return QueryIntent::EarliestMention(term);
            }
        }
    }

    // 3. "what did i do on ..." style phrases followed by a date expression.
    for phrase in ["what did i do on", "summary for", "what happened on"] {
        if let Some(pos) = lower.find(phrase) {
            let rest = clean_term(&lower[pos + phrase.len()..]);
            if let Some(day) = parse_natural_date(&rest) {
                return QueryIntent::ExactDay(day);
            }
        }
    }

    // 4. Default: full-text keyword search with the whole query.
    QueryIntent::Keyword(clean_term(text))
}

/// Finds the first valid `YYYY-M-D` or `M/D/YYYY` token in the text.
fn find_date_token(text: &str) -> Option<NaiveDate> {
    let iso = Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap();
    for caps in iso.captures_iter(text) {
        if let Some(day) = ymd(&caps[1], &caps[2], &caps[3]) {
            return Some(day);
        }
    }

    let us = Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap();
    for caps in us.captures_iter(text) {
        if let Some(day) = ymd(&caps[3], &caps[1], &caps[2]) {
            return Some(day);
        }
    }

    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year = year.parse().ok()?;
    let month = month.parse().ok()?;
    let day = day.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Attempts to parse a natural-language date expression such as
/// "May 5, 2025" or "5 May 2025". Deterministic format list, no NLU.
fn parse_natural_date(text: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%m/%d/%Y",
        "%B %d, %Y",
        "%B %d %Y",
        "%d %B %Y",
        "%b %d, %Y",
        "%b %d %Y",
        "%d %b %Y",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Strips trailing punctuation and surrounding whitespace from an
/// extracted search term.
fn clean_term(term: &str) -> String {
    term.trim()
        .trim_end_matches(['?', '.', '!', ','])
        .trim()
        .to_string()
}

fn format_day(day: NaiveDate) -> String {
    day.format("%B %-d, %Y").to_string()
}

/// Resolves a question into a formatted context string for the chatbot
/// prompt.
///
/// Returns `None` when no search was applicable (blank query); an empty
/// result set produces an explicit "nothing found" context instead, since
/// the two cases are phrased differently for the narrative backend.
pub async fn resolve_query(
    db: &dyn DatabaseService,
    user_id: Uuid,
    text: &str,
) -> PortResult<Option<String>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let context = match parse_query(text) {
        QueryIntent::ExactDay(day) => {
            let summaries = db.summaries_for_day(user_id, day).await?;
            if summaries.is_empty() {
                format!("No journal summaries were found for {}.", format_day(day))
            } else {
                let lines: Vec<String> = summaries
                    .iter()
                    .map(|s| format!("- \"{}\"", s.text))
                    .collect();
                format!("Entries from {}:\n{}", format_day(day), lines.join("\n"))
            }
        }
        QueryIntent::EarliestMention(term) => {
            let summaries = db
                .search_summaries(user_id, &term, DateOrder::Ascending, RESULT_LIMIT)
                .await?;
            match summaries.first() {
                Some(first) => format!(
                    "Regarding your question about starting \"{}\", the earliest mention \
                     found was on {}: \"{}\"",
                    term,
                    format_day(first.entry_date),
                    first.text
                ),
                None => format!("No journal entries mentioning \"{}\" were found.", term),
            }
        }
        QueryIntent::Keyword(term) => {
            let summaries = db
                .search_summaries(user_id, &term, DateOrder::Descending, RESULT_LIMIT)
                .await?;
            if summaries.is_empty() {
                format!("No journal entries matching \"{}\" were found.", term)
            } else {
                let lines: Vec<String> = summaries
                    .iter()
                    .map(|s| format!("On {}: \"{}\"", format_day(s.entry_date), s.text))
                    .collect();
                format!(
                    "Here's what I found related to \"{}\":\n{}",
                    term,
                    lines.join("\n---\n")
                )
            }
        }
    };

    Ok(Some(context))
}

/// Builds the final chatbot prompt. The context variant instructs the
/// model to answer only from the provided context; the no-context variant
/// asks for a polite acknowledgement that nothing was found.
pub fn chatbot_prompt(query: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!(
            "The user asked: \"{}\"\n\
             Based on their life calendar entries, the following information was found:\n\
             {}\n\n\
             Please provide a helpful and conversational answer to the user's question based \
             *only* on this provided context. If the context doesn't directly answer the \
             question, say that you couldn't find specific information related to their query \
             in the provided context. Be concise.",
            query, context
        ),
        None => format!(
            "The user asked: \"{}\"\n\
             No specific entries were found in their life calendar that seem to directly \
             match this query.\n\
             Please provide a polite and helpful response acknowledging their query and \
             stating that no specific information was found. You can suggest they try \
             rephrasing or checking their entries.",
            query
        ),
    }
}
