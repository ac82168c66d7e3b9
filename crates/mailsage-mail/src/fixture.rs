//! Deterministic in-memory mailbox for tests.
//!
//! `FixtureMailbox` implements [`MailProvider`] over a fixed message set
//! with naive query evaluation: `after:`/`before:` clauses filter by parsed
//! message date, `in:` scopes are ignored (folder scoping comes from the
//! `folder` argument), and any remaining term, `from:`/`to:`/`subject:`
//! qualified or bare, matches a message if it appears in the corresponding
//! field (OR semantics). That is deliberately looser than a real provider;
//! tests construct mailboxes where it does not matter.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use mailsage_core::{
    parse_message_date, Error, FetchFormat, Header, MailFolder, MailProvider, MessagePart,
    ProviderMessage, Result,
};

/// An image part attached to a fixture message.
#[derive(Debug, Clone)]
pub struct FixtureImage {
    pub mime_type: String,
    /// Inline base64 data, if the part is inline.
    pub data: Option<String>,
    /// Attachment id resolvable through `get_attachment`.
    pub attachment_id: Option<String>,
}

/// One message in the fixture mailbox.
#[derive(Debug, Clone)]
pub struct FixtureMessage {
    pub id: String,
    pub thread_id: String,
    pub folder: MailFolder,
    pub subject: String,
    pub from: String,
    pub to: String,
    /// RFC 2822 or RFC 3339 date header value.
    pub date: String,
    pub snippet: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
    pub images: Vec<FixtureImage>,
}

impl FixtureMessage {
    pub fn new(id: impl Into<String>, folder: MailFolder) -> Self {
        let id = id.into();
        Self {
            thread_id: format!("t-{}", id),
            id,
            folder,
            subject: String::new(),
            from: String::new(),
            to: String::new(),
            date: String::new(),
            snippet: String::new(),
            body_text: None,
            body_html: None,
            images: Vec::new(),
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = to.into();
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn body_text(mut self, body: impl Into<String>) -> Self {
        self.body_text = Some(body.into());
        self
    }

    pub fn body_html(mut self, body: impl Into<String>) -> Self {
        self.body_html = Some(body.into());
        self
    }

    pub fn image(mut self, image: FixtureImage) -> Self {
        self.images.push(image);
        self
    }

    fn haystack(&self, field: QueryField) -> String {
        match field {
            QueryField::From => self.from.to_lowercase(),
            QueryField::To => self.to.to_lowercase(),
            QueryField::Subject => self.subject.to_lowercase(),
            QueryField::Any => format!(
                "{} {} {} {} {}",
                self.subject,
                self.from,
                self.to,
                self.snippet,
                self.body_text.as_deref().unwrap_or_default()
            )
            .to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum QueryField {
    From,
    To,
    Subject,
    Any,
}

/// In-memory [`MailProvider`] implementation.
#[derive(Default)]
pub struct FixtureMailbox {
    messages: Vec<FixtureMessage>,
    attachments: HashMap<String, String>,
    fail_substrings: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl FixtureMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: FixtureMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Register an attachment body (base64) under an id.
    pub fn with_attachment(mut self, id: impl Into<String>, base64: impl Into<String>) -> Self {
        self.attachments.insert(id.into(), base64.into());
        self
    }

    /// Make every list call whose query contains `needle` fail.
    pub fn fail_when_query_contains(mut self, needle: impl Into<String>) -> Self {
        self.fail_substrings.push(needle.into());
        self
    }

    /// All recorded provider calls, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("fixture call log").clone()
    }

    /// How many full-format fetches have been made.
    pub fn full_fetch_count(&self) -> usize {
        self.count_calls_with("get:full:")
    }

    /// How many metadata fetches have been made.
    pub fn metadata_fetch_count(&self) -> usize {
        self.count_calls_with("get:metadata:")
    }

    fn count_calls_with(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .expect("fixture call log")
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("fixture call log").push(call);
    }

    fn matches_query(&self, message: &FixtureMessage, query: &str) -> bool {
        let mut after: Option<NaiveDate> = None;
        let mut before: Option<NaiveDate> = None;
        let mut terms: Vec<(QueryField, String)> = Vec::new();

        for raw in query.to_lowercase().split_whitespace() {
            let token = raw.trim_matches(|c| c == '(' || c == ')');
            if token.is_empty() || token == "or" || token == "and" {
                continue;
            }
            if let Some(value) = token.strip_prefix("after:") {
                after = NaiveDate::parse_from_str(value, "%Y/%m/%d").ok();
            } else if let Some(value) = token.strip_prefix("before:") {
                before = NaiveDate::parse_from_str(value, "%Y/%m/%d").ok();
            } else if token.starts_with("in:") {
                // Scope comes from the folder argument.
            } else if let Some(value) = token.strip_prefix("from:") {
                terms.push((QueryField::From, value.to_string()));
            } else if let Some(value) = token.strip_prefix("to:") {
                terms.push((QueryField::To, value.to_string()));
            } else if let Some(value) = token.strip_prefix("subject:") {
                terms.push((QueryField::Subject, value.to_string()));
            } else {
                terms.push((QueryField::Any, token.to_string()));
            }
        }

        if after.is_some() || before.is_some() {
            let Some(date) = parse_message_date(&message.date) else {
                return false;
            };
            let day = date.date_naive();
            if let Some(a) = after {
                if day < a {
                    return false;
                }
            }
            if let Some(b) = before {
                if day >= b {
                    return false;
                }
            }
        }

        if terms.is_empty() {
            return true;
        }
        terms
            .iter()
            .any(|(field, needle)| message.haystack(*field).contains(needle))
    }

    fn build_payload(&self, message: &FixtureMessage, format: FetchFormat) -> MessagePart {
        let mut root = MessagePart {
            mime_type: "multipart/mixed".to_string(),
            headers: vec![
                Header::new("Subject", message.subject.clone()),
                Header::new("From", message.from.clone()),
                Header::new("To", message.to.clone()),
                Header::new("Date", message.date.clone()),
            ],
            ..Default::default()
        };

        if format == FetchFormat::Full {
            if let Some(text) = &message.body_text {
                root.parts.push(MessagePart {
                    mime_type: "text/plain".to_string(),
                    data: Some(text.clone()),
                    ..Default::default()
                });
            }
            if let Some(html) = &message.body_html {
                root.parts.push(MessagePart {
                    mime_type: "text/html".to_string(),
                    data: Some(html.clone()),
                    ..Default::default()
                });
            }
            for image in &message.images {
                root.parts.push(MessagePart {
                    mime_type: image.mime_type.clone(),
                    filename: Some("image".to_string()),
                    data: image.data.clone(),
                    attachment_id: image.attachment_id.clone(),
                    ..Default::default()
                });
            }
        }

        root
    }
}

#[async_trait]
impl MailProvider for FixtureMailbox {
    async fn list_message_ids(
        &self,
        query: &str,
        folder: Option<MailFolder>,
        max_results: usize,
    ) -> Result<Vec<String>> {
        self.record(format!(
            "list:{}:{}",
            folder.map(|f| f.label()).unwrap_or("ANY"),
            query
        ));

        if self
            .fail_substrings
            .iter()
            .any(|needle| query.contains(needle.as_str()))
        {
            return Err(Error::Provider(format!("query rejected: {}", query)));
        }

        let mut matching: Vec<&FixtureMessage> = self
            .messages
            .iter()
            .filter(|m| folder.map(|f| m.folder == f).unwrap_or(true))
            .filter(|m| self.matches_query(m, query))
            .collect();
        // Most recent first, like a real provider listing.
        matching.sort_by_key(|m| std::cmp::Reverse(parse_message_date(&m.date)));
        matching.truncate(max_results);
        Ok(matching.iter().map(|m| m.id.clone()).collect())
    }

    async fn get_message(&self, id: &str, format: FetchFormat) -> Result<ProviderMessage> {
        let label = match format {
            FetchFormat::Full => "full",
            FetchFormat::Metadata => "metadata",
        };
        self.record(format!("get:{}:{}", label, id));

        let message = self
            .messages
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| Error::Provider(format!("message not found: {}", id)))?;

        Ok(ProviderMessage {
            id: message.id.clone(),
            thread_id: message.thread_id.clone(),
            snippet: message.snippet.clone(),
            internal_date: parse_message_date(&message.date),
            payload: Some(self.build_payload(message, format)),
        })
    }

    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String> {
        self.record(format!("attachment:{}:{}", message_id, attachment_id));
        self.attachments
            .get(attachment_id)
            .cloned()
            .ok_or_else(|| Error::Provider(format!("attachment not found: {}", attachment_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailbox() -> FixtureMailbox {
        FixtureMailbox::new()
            .with_message(
                FixtureMessage::new("m1", MailFolder::Inbox)
                    .subject("Invoice #102")
                    .from("Billing <billing@acme.com>")
                    .to("user@example.com")
                    .date("Wed, 5 Aug 2026 10:00:00 +0000")
                    .snippet("Your invoice is attached")
                    .body_text("Please find invoice #102 attached."),
            )
            .with_message(
                FixtureMessage::new("m2", MailFolder::Sent)
                    .subject("Re: standup")
                    .from("user@example.com")
                    .to("team@acme.com")
                    .date("Tue, 4 Aug 2026 09:00:00 +0000")
                    .body_text("Works for me."),
            )
    }

    #[tokio::test]
    async fn test_list_scoped_to_folder() {
        let mb = mailbox();
        let inbox = mb
            .list_message_ids("", Some(MailFolder::Inbox), 50)
            .await
            .unwrap();
        assert_eq!(inbox, vec!["m1"]);

        let any = mb.list_message_ids("", None, 50).await.unwrap();
        assert_eq!(any.len(), 2);
    }

    #[tokio::test]
    async fn test_list_orders_recent_first() {
        let mb = mailbox();
        let ids = mb.list_message_ids("", None, 50).await.unwrap();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_query_term_matching() {
        let mb = mailbox();
        let ids = mb
            .list_message_ids("subject:invoice", Some(MailFolder::Inbox), 50)
            .await
            .unwrap();
        assert_eq!(ids, vec!["m1"]);

        let none = mb
            .list_message_ids("subject:payroll", Some(MailFolder::Inbox), 50)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_date_clause_filters() {
        let mb = mailbox();
        let ids = mb
            .list_message_ids("after:2026/08/05 before:2026/08/06", None, 50)
            .await
            .unwrap();
        assert_eq!(ids, vec!["m1"]);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let mb = mailbox().fail_when_query_contains("boom");
        assert!(mb
            .list_message_ids("boom", Some(MailFolder::Inbox), 50)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_metadata_fetch_has_no_body_parts() {
        let mb = mailbox();
        let msg = mb.get_message("m1", FetchFormat::Metadata).await.unwrap();
        let payload = msg.payload.unwrap();
        assert!(payload.parts.is_empty());
        assert_eq!(payload.header("Subject"), Some("Invoice #102"));
        assert_eq!(mb.metadata_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_full_fetch_includes_bodies() {
        let mb = mailbox();
        let msg = mb.get_message("m1", FetchFormat::Full).await.unwrap();
        let payload = msg.payload.unwrap();
        assert_eq!(payload.parts.len(), 1);
        assert_eq!(payload.parts[0].mime_type, "text/plain");
        assert_eq!(mb.full_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_attachment_lookup() {
        let mb = mailbox().with_attachment("a1", "aGVsbG8=");
        assert_eq!(mb.get_attachment("m1", "a1").await.unwrap(), "aGVsbG8=");
        assert!(mb.get_attachment("m1", "missing").await.is_err());
    }
}
