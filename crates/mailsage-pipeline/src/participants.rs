//! Fuzzy participant matching.
//!
//! Scores how well a From/To header value matches the target-name tokens
//! extracted from the question. Scores are an integer gate for enrichment
//! (threshold `>= 3`), not a primary ranking signal for normal retrieval.

use std::sync::OnceLock;

use regex::Regex;

fn name_email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*"?([^"<]*)"?\s*<([^>]+)>"#).expect("valid regex"))
}

/// Split a header value into a lowercased display name and email address.
/// Prefers the `"Name" <email>` form; a bare value is treated as an email
/// when it contains `@`, as a name otherwise.
fn split_header(header: &str) -> (String, String) {
    if let Some(caps) = name_email_re().captures(header) {
        let name = caps[1].trim().trim_matches('"').to_lowercase();
        let email = caps[2].trim().to_lowercase();
        (name, email)
    } else if header.contains('@') {
        (String::new(), header.trim().to_lowercase())
    } else {
        (header.trim().to_lowercase(), String::new())
    }
}

fn name_tokens(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn email_local_tokens(email: &str) -> Vec<String> {
    let local = email.split('@').next().unwrap_or_default();
    local
        .split(['.', '_', '-'])
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Score a header value against target tokens.
///
/// Per target token: `+3` for a display-name token match, `+2` for an
/// email-local token match, `+1` when the normalized name merely contains
/// the token as a substring. Adding a matching token never decreases the
/// score.
pub fn score_header(header_value: &str, target_tokens: &[String]) -> i32 {
    if header_value.is_empty() || target_tokens.is_empty() {
        return 0;
    }

    let (name, email) = split_header(header_value);
    let names = name_tokens(&name);
    let locals = email_local_tokens(&email);

    let mut score = 0;
    for token in target_tokens {
        let mut matched = false;
        if names.iter().any(|t| t == token) {
            score += 3;
            matched = true;
        }
        if locals.iter().any(|t| t == token) {
            score += 2;
            matched = true;
        }
        if !matched && name.contains(token.as_str()) {
            score += 1;
        }
    }
    score
}

/// The participant score of a message: the better of its From and To
/// header scores.
pub fn best_score(from: &str, to: &str, target_tokens: &[String]) -> i32 {
    score_header(from, target_tokens).max(score_header(to, target_tokens))
}
