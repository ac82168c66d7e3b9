//! Action inference.
//!
//! Classifies explicit send intent against mailbox-query intent, and fills
//! recipient/subject/body through a priority chain. The system never
//! guesses a recipient with zero signal: without an email literal in the
//! question or a usable address on the top result, the action collapses
//! back to none.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use mailsage_core::text::{find_email_literal, is_valid_email, truncate_chars};
use mailsage_core::{
    defaults, AskAction, CandidateMessage, DraftAnswer, ScheduleAction, SendAction,
};

use crate::config::PipelineConfig;
use crate::summary::ForcedSummary;

/// Intent-disambiguation states. Only `ResolvedSend` carries a payload;
/// every other state maps to [`AskAction::None`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionState {
    None,
    Question,
    CandidateSend,
    ResolvedSend(SendAction),
}

fn mailbox_question_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(what|which|who|whom|when|where|how|did|do|does|is|are|was|were|have|has|show|find|list|any)\b.*\b(email|emails|mail|mails|inbox|message|messages|thread|threads)\b",
        )
        .expect("valid regex")
    })
}

fn send_verb_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(send|draft|compose|write|reply|forward)\b").expect("valid regex")
    })
}

fn mail_to_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\be-?mail\s+to\b|\bmail\s+to\b").expect("valid regex"))
}

/// Interrogative phrasing about mailbox contents.
pub fn is_mailbox_question(text: &str) -> bool {
    mailbox_question_re().is_match(&text.to_lowercase())
}

/// Explicit send intent: a send verb, or an "email/mail to" phrase.
pub fn explicit_send_intent(text: &str) -> bool {
    let lower = text.to_lowercase();
    send_verb_re().is_match(&lower) || mail_to_re().is_match(&lower)
}

/// Email address inside a From/To header value, if any.
fn email_of_header(header: &str) -> Option<String> {
    find_email_literal(header)
}

fn default_subject(
    forced: Option<&ForcedSummary>,
    top: Option<&CandidateMessage>,
) -> String {
    if let Some(forced) = forced {
        if !forced.subject.is_empty() {
            return format!("Summary: {}", forced.subject);
        }
    }
    if let Some(top) = top {
        if !top.subject.is_empty() {
            let stripped = top
                .subject
                .trim()
                .trim_start_matches("Re:")
                .trim_start_matches("RE:")
                .trim_start_matches("re:")
                .trim();
            return format!("Re: {}", stripped);
        }
    }
    defaults::DEFAULT_SEND_SUBJECT.to_string()
}

fn default_body(
    forced: Option<&ForcedSummary>,
    answer: &str,
    config: &PipelineConfig,
) -> String {
    if let Some(forced) = forced {
        if !forced.summary.is_empty() {
            return forced.summary.clone();
        }
    }
    let answer = answer.trim();
    if !answer.is_empty() && answer.chars().count() < config.answer_body_limit {
        return answer.to_string();
    }
    defaults::DEFAULT_SEND_BODY.to_string()
}

/// Promote a model-returned draft action when it is fully specified.
fn model_resolved_action(
    draft: Option<&DraftAnswer>,
    forced: Option<&ForcedSummary>,
    top: Option<&CandidateMessage>,
    answer: &str,
    config: &PipelineConfig,
) -> Option<AskAction> {
    let draft = draft?;
    match draft.action.as_deref() {
        Some("send") => {
            let send = draft.send.as_ref()?;
            if !is_valid_email(&send.to_email) {
                return None;
            }
            let subject = if send.subject.trim().is_empty() {
                default_subject(forced, top)
            } else {
                send.subject.clone()
            };
            let body = if send.body.trim().is_empty() {
                default_body(forced, answer, config)
            } else {
                send.body.clone()
            };
            Some(AskAction::Send(SendAction {
                to_email: send.to_email.to_lowercase(),
                subject,
                body,
            }))
        }
        Some("schedule") => {
            let schedule = draft.schedule.as_ref()?;
            if !is_valid_email(&schedule.to_email) || schedule.when.trim().is_empty() {
                return None;
            }
            let subject = if schedule.subject.trim().is_empty() {
                default_subject(forced, top)
            } else {
                schedule.subject.clone()
            };
            let body = if schedule.body.trim().is_empty() {
                default_body(forced, answer, config)
            } else {
                schedule.body.clone()
            };
            Some(AskAction::Schedule(ScheduleAction {
                when: schedule.when.clone(),
                timezone: schedule.timezone.clone(),
                to_email: schedule.to_email.to_lowercase(),
                subject,
                body,
            }))
        }
        _ => None,
    }
}

/// Step the intent state machine for one request.
pub fn infer_state(
    question: &str,
    draft: Option<&DraftAnswer>,
    top: Option<&CandidateMessage>,
    forced: Option<&ForcedSummary>,
    answer: &str,
    config: &PipelineConfig,
) -> ActionState {
    // The model already returned a fully-specified action.
    if let Some(action) = model_resolved_action(draft, forced, top, answer, config) {
        return match action {
            AskAction::Send(send) => ActionState::ResolvedSend(send),
            // Schedule is carried through infer_action; here it counts as
            // resolved-but-not-send.
            _ => ActionState::None,
        };
    }

    if is_mailbox_question(question) {
        return ActionState::Question;
    }
    if !explicit_send_intent(question) {
        return ActionState::None;
    }

    // CandidateSend: resolve a recipient or collapse back to none.
    let recipient = find_email_literal(question)
        .or_else(|| top.and_then(|t| email_of_header(&t.from)))
        .or_else(|| top.and_then(|t| email_of_header(&t.to)));

    match recipient {
        Some(to_email) => ActionState::ResolvedSend(SendAction {
            to_email,
            subject: truncate_chars(&default_subject(forced, top), 200),
            body: default_body(forced, answer, config),
        }),
        None => {
            debug!("Send intent detected but no recipient signal; leaving action unset");
            ActionState::None
        }
    }
}

/// Infer the final action for the answer payload.
pub fn infer_action(
    question: &str,
    draft: Option<&DraftAnswer>,
    top: Option<&CandidateMessage>,
    forced: Option<&ForcedSummary>,
    answer: &str,
    config: &PipelineConfig,
) -> AskAction {
    // Model-provided schedule passes through when fully specified.
    if let Some(action) = model_resolved_action(draft, forced, top, answer, config) {
        return action;
    }

    match infer_state(question, draft, top, forced, answer, config) {
        ActionState::ResolvedSend(send) => AskAction::Send(send),
        _ => AskAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailsage_core::DraftSend;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    fn top() -> CandidateMessage {
        CandidateMessage {
            id: "m1".to_string(),
            subject: "Re: Invoice #102".to_string(),
            from: "Billing <billing@acme.example>".to_string(),
            to: "user@example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_mailbox_question_classifier() {
        assert!(is_mailbox_question("what emails came in yesterday?"));
        assert!(is_mailbox_question("show me yesterday's emails about invoice"));
        assert!(is_mailbox_question("did any messages arrive from priya?"));
        assert!(!is_mailbox_question("send an email to priya@example.com saying thanks"));
        assert!(!is_mailbox_question("thanks for the help"));
    }

    #[test]
    fn test_send_intent_classifier() {
        assert!(explicit_send_intent("send an email to priya@example.com"));
        assert!(explicit_send_intent("draft a note for the team"));
        assert!(explicit_send_intent("reply to bob"));
        assert!(explicit_send_intent("e-mail to accounting about this"));
        assert!(!explicit_send_intent("what emails came in yesterday?"));
    }

    #[test]
    fn test_email_literal_resolves_recipient() {
        let action = infer_action(
            "send an email to priya@example.com saying thanks",
            None,
            None,
            None,
            "thanks!",
            &config(),
        );
        let send = action.send().expect("send action");
        assert_eq!(send.to_email, "priya@example.com");
        assert_eq!(send.subject, "Quick note");
        assert_eq!(send.body, "thanks!");
    }

    #[test]
    fn test_top_result_resolves_recipient() {
        let action = infer_action(
            "reply to the billing team",
            None,
            Some(&top()),
            None,
            "answer",
            &config(),
        );
        let send = action.send().expect("send action");
        assert_eq!(send.to_email, "billing@acme.example");
        assert_eq!(send.subject, "Re: Invoice #102");
    }

    #[test]
    fn test_no_signal_collapses_to_none() {
        let action = infer_action("send it over please", None, None, None, "", &config());
        assert_eq!(action, AskAction::None);
    }

    #[test]
    fn test_mailbox_question_never_becomes_send() {
        // Interrogative mailbox phrasing wins even with "sent" nearby.
        let action = infer_action(
            "what emails did priya@example.com send me?",
            None,
            Some(&top()),
            None,
            "answer",
            &config(),
        );
        assert_eq!(action, AskAction::None);
    }

    #[test]
    fn test_forced_summary_drives_subject_and_body() {
        let forced = ForcedSummary {
            subject: "HDFC statement".to_string(),
            summary: "July statement summary.".to_string(),
        };
        let action = infer_action(
            "send that to priya@example.com",
            None,
            None,
            Some(&forced),
            "",
            &config(),
        );
        let send = action.send().expect("send action");
        assert_eq!(send.subject, "Summary: HDFC statement");
        assert_eq!(send.body, "July statement summary.");
    }

    #[test]
    fn test_long_answer_falls_back_to_default_body() {
        let long_answer = "x".repeat(900);
        let action = infer_action(
            "send an email to priya@example.com",
            None,
            None,
            None,
            &long_answer,
            &config(),
        );
        assert_eq!(action.send().unwrap().body, "Thank you!");
    }

    #[test]
    fn test_model_resolved_send_passes_through() {
        let draft = DraftAnswer {
            answer: "done".to_string(),
            action: Some("send".to_string()),
            send: Some(DraftSend {
                to_email: "Priya@Example.com".to_string(),
                subject: "Ping".to_string(),
                body: "Hello".to_string(),
            }),
            ..Default::default()
        };
        let action = infer_action("whatever", Some(&draft), None, None, "done", &config());
        let send = action.send().expect("send action");
        assert_eq!(send.to_email, "priya@example.com");
        assert_eq!(send.subject, "Ping");
    }

    #[test]
    fn test_model_send_with_invalid_email_is_dropped() {
        let draft = DraftAnswer {
            action: Some("send".to_string()),
            send: Some(DraftSend {
                to_email: "not-an-email".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let action = infer_action(
            "what emails came in yesterday?",
            Some(&draft),
            None,
            None,
            "",
            &config(),
        );
        assert_eq!(action, AskAction::None);
    }

    #[test]
    fn test_resolved_send_always_has_valid_email() {
        let cases = [
            ("send an email to priya@example.com", None),
            ("reply to billing", Some(top())),
        ];
        for (question, top) in cases {
            let action = infer_action(question, None, top.as_ref(), None, "a", &config());
            if let Some(send) = action.send() {
                assert!(is_valid_email(&send.to_email), "{}", question);
            }
        }
        // And well-formedness holds by construction.
        let action = infer_action(
            "send an email to priya@example.com",
            None,
            None,
            None,
            "a",
            &config(),
        );
        assert!(action.is_well_formed());
    }

    #[test]
    fn test_state_machine_labels() {
        assert_eq!(
            infer_state("what emails came in yesterday?", None, None, None, "", &config()),
            ActionState::Question
        );
        assert_eq!(
            infer_state("thanks!", None, None, None, "", &config()),
            ActionState::None
        );
        assert!(matches!(
            infer_state(
                "send an email to a@b.example",
                None,
                None,
                None,
                "",
                &config()
            ),
            ActionState::ResolvedSend(_)
        ));
    }
}
