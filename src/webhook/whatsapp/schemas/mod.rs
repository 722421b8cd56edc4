//! # WhatsApp Message Schemas
//!
//! - `incoming`: webhook envelope posted by WhatsApp, every field optional
//! - `outgoing`: payloads for the send-message endpoint

pub mod incoming;
pub mod outgoing;

pub use incoming::{Message, MessageContent, Metadata, WebhookPayload};
pub use outgoing::OutgoingMessage;
