//! Session summarization and memory context rendering
//!
//! Everything here is pure: a finished transcript goes in, a synopsis and a
//! topic list come out, and stored summaries are rendered into the context
//! block that prefixes every model call.

use std::fmt::{self, Write};

use crate::conversation::{Role, Turn};

use super::memory::SessionSummary;

/// Synopsis stored for a session without any user turns
pub const EMPTY_SESSION: &str = "Empty session";

/// Number of leading characters quoted from a turn in the synopsis
const QUOTE_CHARS: usize = 50;

/// Number of summaries rendered into the context block
pub const CONTEXT_WINDOW: usize = 3;

/// Closed keyword vocabulary for topic extraction
pub const TOPIC_VOCABULARY: &[&str] = &[
    "learn",
    "code",
    "explain",
    "how",
    "what",
    "why",
    "python",
    "javascript",
    "math",
    "science",
    "history",
    "language",
];

fn user_turns(transcript: &[Turn]) -> impl Iterator<Item = &str> {
    transcript
        .iter()
        .filter(|t| t.role == Role::User)
        .map(|t| t.content.as_str())
}

fn leading_chars(text: &str) -> String {
    text.chars().take(QUOTE_CHARS).collect()
}

/// Summarize a transcript from its user turns
pub fn summarize_transcript(transcript: &[Turn]) -> String {
    let questions: Vec<&str> = user_turns(transcript).collect();

    let (Some(first), Some(last)) = (questions.first(), questions.last()) else {
        return EMPTY_SESSION.to_string();
    };

    format!(
        "{} questions asked starting with \"{}...\" and ending with \"{}...\"",
        questions.len(),
        leading_chars(first),
        leading_chars(last)
    )
}

/// Vocabulary terms appearing anywhere in the user turns, in discovery order
pub fn extract_topics(transcript: &[Turn]) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();

    for turn in user_turns(transcript) {
        let lower = turn.to_lowercase();
        for keyword in TOPIC_VOCABULARY {
            if lower.contains(keyword) && !topics.iter().any(|t| t == keyword) {
                topics.push(keyword.to_string());
            }
        }
    }

    topics
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "User"
    } else {
        name
    }
}

/// Render the memory context block for the model
///
/// Only the last [`CONTEXT_WINDOW`] summaries are listed, oldest first.
/// Summaries with a blank title or synopsis are skipped.
pub fn build_context(name: &str, interests: &[String], recent: &[SessionSummary]) -> String {
    match write_context(name, interests, recent) {
        Ok(context) => context,
        Err(e) => {
            tracing::error!("Failed to build memory context: {}", e);
            format!("User Information:\n- Name: {}\n", display_name(name))
        }
    }
}

fn write_context(
    name: &str,
    interests: &[String],
    recent: &[SessionSummary],
) -> Result<String, fmt::Error> {
    let mut context = String::from("User Information:\n");
    writeln!(context, "- Name: {}", display_name(name))?;

    if !interests.is_empty() {
        writeln!(context, "- Interests: {}", interests.join(", "))?;
    }

    if !recent.is_empty() {
        context.push_str("\nRecent Conversation History:\n");

        let start = recent.len().saturating_sub(CONTEXT_WINDOW);
        for session in &recent[start..] {
            if session.title.is_empty() || session.summary.is_empty() {
                continue;
            }
            writeln!(
                context,
                "- {}: {}",
                session.date.format("%-m/%-d/%Y"),
                session.title
            )?;
            writeln!(context, "  Topics: {}", session.topics.join(", "))?;
            writeln!(context, "  Summary: {}", session.summary)?;
        }
    }

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn summary(title: &str, text: &str, day: u32) -> SessionSummary {
        SessionSummary {
            session_id: format!("session-{}", day),
            title: title.to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            personality: "tutor".to_string(),
            summary: text.to_string(),
            topics: vec!["how".to_string(), "code".to_string()],
        }
    }

    #[test]
    fn test_summary_counts_user_turns() {
        let transcript = vec![
            Turn::user("hi"),
            Turn::assistant("Hello! How can I help?"),
            Turn::user("explain recursion please"),
        ];

        let text = summarize_transcript(&transcript);
        assert_eq!(
            text,
            "2 questions asked starting with \"hi...\" and ending with \"explain recursion please...\""
        );
    }

    #[test]
    fn test_summary_single_turn_repeats_quote() {
        let long = "a".repeat(70);
        let text = summarize_transcript(&[Turn::user(long)]);
        let quote = "a".repeat(50);
        assert_eq!(
            text,
            format!(
                "1 questions asked starting with \"{}...\" and ending with \"{}...\"",
                quote, quote
            )
        );
    }

    #[test]
    fn test_summary_without_user_turns() {
        assert_eq!(summarize_transcript(&[]), EMPTY_SESSION);
        assert_eq!(
            summarize_transcript(&[Turn::assistant("anyone there?")]),
            EMPTY_SESSION
        );
    }

    #[test]
    fn test_topics_substring_and_dedup() {
        let transcript = vec![
            Turn::user("hi"),
            Turn::user("Explain recursion please"),
            Turn::user("explain it again"),
            Turn::assistant("python is great"),
        ];

        let topics = extract_topics(&transcript);
        assert_eq!(topics, vec!["explain".to_string()]);
    }

    #[test]
    fn test_topics_discovery_order() {
        let transcript = vec![Turn::user("Why does Python code look like that? show me how")];
        let topics = extract_topics(&transcript);
        assert_eq!(topics, vec!["code", "how", "why", "python"]);
    }

    #[test]
    fn test_context_name_only() {
        assert_eq!(
            build_context("Alice", &[], &[]),
            "User Information:\n- Name: Alice\n"
        );
    }

    #[test]
    fn test_context_defaults_blank_name() {
        assert_eq!(build_context("", &[], &[]), "User Information:\n- Name: User\n");
    }

    #[test]
    fn test_context_lists_last_three() {
        let recent: Vec<SessionSummary> = (1..=4)
            .map(|i| summary(&format!("Chat {}", i), &format!("summary {}", i), i))
            .collect();
        let interests = vec!["rust".to_string(), "chess".to_string()];

        let context = build_context("Alice", &interests, &recent);

        assert_eq!(
            context,
            "User Information:\n\
             - Name: Alice\n\
             - Interests: rust, chess\n\
             \n\
             Recent Conversation History:\n\
             - 3/2/2024: Chat 2\n  Topics: how, code\n  Summary: summary 2\n\
             - 3/3/2024: Chat 3\n  Topics: how, code\n  Summary: summary 3\n\
             - 3/4/2024: Chat 4\n  Topics: how, code\n  Summary: summary 4\n"
        );
    }

    #[test]
    fn test_context_skips_partial_entries() {
        let recent = vec![summary("", "orphan", 1), summary("Kept", "fine", 2)];
        let context = build_context("Bob", &[], &recent);

        assert!(context.contains("Kept"));
        assert!(!context.contains("orphan"));
    }
}
