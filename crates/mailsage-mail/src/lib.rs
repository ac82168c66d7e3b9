//! # mailsage-mail
//!
//! Mailbox-payload utilities for the mailsage ask pipeline: MIME part
//! traversal and body extraction, HTML-to-text conversion, image-part
//! collection for the OCR fallback, and a deterministic in-memory fixture
//! mailbox used as the workspace's mail test double.

pub mod body;
pub mod fixture;

pub use body::{collect_image_parts, extract_bodies, html_to_text, ExtractedBody};
pub use fixture::{FixtureImage, FixtureMailbox, FixtureMessage};
