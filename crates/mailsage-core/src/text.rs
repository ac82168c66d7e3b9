//! Text tokenization rules for mailbox questions.
//!
//! Every regex-driven extraction rule lives here as a pure function so its
//! behavior is verifiable without the rest of the pipeline: keyword
//! extraction, target-name extraction from a "send to <name>" clause, and
//! email-literal matching.

use std::sync::OnceLock;

use regex::Regex;

use crate::defaults::{KEYWORD_LIMIT, TARGET_TOKEN_LIMIT};

/// Stopwords dropped from keyword and target-name tokens: articles,
/// prepositions, interrogatives, and mailbox-generic terms that would match
/// every message.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "then", "so", "of", "in", "on", "at", "to",
    "from", "for", "with", "about", "into", "over", "after", "before", "between", "during",
    "under", "around", "among", "out", "up", "is", "are", "was", "were", "be", "been", "am",
    "do", "does", "did", "have", "has", "had", "will", "would", "can", "could", "should",
    "may", "might", "me", "my", "mine", "you", "your", "we", "our", "us", "it", "its",
    "this", "that", "these", "those", "any", "all", "some", "what", "which", "who", "whom",
    "when", "where", "how", "why", "please", "show", "find", "search", "look", "get",
    "give", "tell", "list", "email", "emails", "mail", "mails", "mailbox", "inbox",
    "message", "messages", "sent", "received", "send", "regarding", "latest", "recent",
    "new", "old", "last", "first", "yesterday", "today", "week", "month", "day", "days",
    "saying", "asking",
];

/// Words that terminate a captured to/from name clause.
const CLAUSE_STOP: &[&str] = &[
    "about", "regarding", "saying", "asking", "that", "on", "with", "for", "the",
];

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

fn word_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9@._\-]+").expect("valid regex"))
}

fn target_clause_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:to|from)\s+([a-z][a-z0-9 .'\-]{1,40})").expect("valid regex")
    })
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}").expect("valid regex")
    })
}

/// Collapse runs of whitespace and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters, on a character boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Extract salient query tokens from a question.
///
/// Lowercases, splits on non `[a-z0-9@._-]`, drops stopwords and tokens
/// shorter than 2 chars, caps at 5 tokens, preserves first-seen order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    for raw in word_split_re().split(&lower) {
        let token = raw.trim_matches(|c| c == '.' || c == '_' || c == '-');
        if token.len() < 2 || is_stopword(token) {
            continue;
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
        if tokens.len() == KEYWORD_LIMIT {
            break;
        }
    }
    tokens
}

/// Extract target-name tokens from a "to <name>" / "from <name>" clause.
///
/// Used only for participant scoring, never to constrain the primary search
/// (a name filter would bias retrieval toward unrelated historical threads).
pub fn extract_target_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let Some(caps) = target_clause_re().captures(&lower) else {
        return Vec::new();
    };

    let mut tokens = Vec::new();
    for word in caps[1].split_whitespace() {
        if CLAUSE_STOP.contains(&word) {
            break;
        }
        let token = word.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if token.len() < 2 || is_stopword(token) {
            continue;
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
        if tokens.len() == TARGET_TOKEN_LIMIT {
            break;
        }
    }
    tokens
}

/// Find the first email literal in a question, if any.
pub fn find_email_literal(text: &str) -> Option<String> {
    email_re().find(text).map(|m| m.as_str().to_lowercase())
}

/// Whether a string is a plausible bare email address.
pub fn is_valid_email(value: &str) -> bool {
    email_re()
        .find(value)
        .map(|m| m.as_str().len() == value.trim().len())
        .unwrap_or(false)
}
