//! Reviewer decision parsing.
//!
//! Reviewers are instructed to answer with exactly `CONTINUE` or
//! `REVISE: <feedback>`. Anything else is a protocol violation and is
//! reported as an error rather than guessed at.

use serde::{Deserialize, Serialize};

/// Token a reviewer emits to approve the document.
pub const CONTINUE_TOKEN: &str = "CONTINUE";

/// Token a reviewer emits to request a revision.
pub const REVISE_TOKEN: &str = "REVISE:";

/// Maximum number of characters of a malformed response quoted in the error.
pub const EXCERPT_CHARS: usize = 100;

/// Outcome of a single review call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Approve and move on to the next reviewer
    Continue,

    /// Ask the writer for a revision (feedback is never empty)
    Revise { feedback: String },

    /// The response did not follow the protocol
    Error { message: String },
}

/// Parse a raw reviewer response.
pub fn parse(raw: &str) -> ReviewDecision {
    let text = raw.trim_start();

    if text.starts_with(CONTINUE_TOKEN) {
        return ReviewDecision::Continue;
    }

    if let Some(rest) = text.strip_prefix(REVISE_TOKEN) {
        let feedback = rest.trim();
        if feedback.is_empty() {
            return ReviewDecision::Error {
                message: "reviewer requested revision but supplied no feedback".to_string(),
            };
        }
        return ReviewDecision::Revise { feedback: feedback.to_string() };
    }

    ReviewDecision::Error {
        message: format!(
            "unexpected response format, expected {} or {} ..., got: {}",
            CONTINUE_TOKEN,
            REVISE_TOKEN,
            excerpt(text, EXCERPT_CHARS)
        ),
    }
}

/// First `max_chars` characters of `text`, never splitting a character.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
