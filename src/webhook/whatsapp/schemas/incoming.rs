//! # WhatsApp Webhook Schemas
//!
//! Data structures for the JSON payload WhatsApp posts when webhook events
//! occur. Every nested field is optional: the platform sends several event
//! shapes on the same endpoint, and a missing piece means "nothing to do"
//! rather than a parse failure.

use serde::{Deserialize, Serialize};

/// Root webhook payload from WhatsApp
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WebhookPayload {
    /// The object type, typically "whatsapp_business_account"
    #[serde(default)]
    pub object: Option<String>,
    /// Array of entry objects containing the actual data
    #[serde(default)]
    pub entry: Vec<Entry>,
}

/// Entry object containing changes and metadata
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Entry {
    /// Business Account ID
    #[serde(default)]
    pub id: Option<String>,
    /// Array of changes that occurred
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// Change object containing the actual webhook data
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Change {
    /// The field that changed (e.g., "messages")
    #[serde(default)]
    pub field: Option<String>,
    /// The value containing the actual data
    #[serde(default)]
    pub value: Option<ChangeValue>,
}

/// Value object containing messages and metadata
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChangeValue {
    /// Messaging product (e.g., "whatsapp")
    #[serde(default)]
    pub messaging_product: Option<String>,
    /// Metadata about the business phone number receiving the event
    #[serde(default)]
    pub metadata: Option<Metadata>,
    /// Array of messages received, absent for status updates
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

/// Metadata about the WhatsApp Business phone number
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Metadata {
    /// Display name of the business phone number
    #[serde(default)]
    pub display_phone_number: Option<String>,
    /// Phone number ID
    #[serde(default)]
    pub phone_number_id: Option<String>,
}

/// Message object
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Message {
    /// Sender's WhatsApp ID (phone number)
    #[serde(default)]
    pub from: Option<String>,
    /// Message ID
    #[serde(default)]
    pub id: Option<String>,
    /// Timestamp of the message
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Message type (text, image, video, document, etc.)
    #[serde(rename = "type", default)]
    pub msg_type: Option<String>,
    /// Text message content (if type is "text")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextMessage>,
}

/// Text message content
#[derive(Debug, Deserialize, Serialize)]
pub struct TextMessage {
    /// The text body of the message
    pub body: String,
}

/// What a message carries, as far as this service cares.
#[derive(Debug, PartialEq, Eq)]
pub enum MessageContent<'a> {
    /// A plain text message with its body
    Text(&'a str),
    /// Anything else, tagged with the type the platform reported
    Unsupported(&'a str),
}

impl Message {
    /// Classifies the message by its type tag.
    ///
    /// A `text` message without a `text.body` is reported as unsupported
    /// instead of failing.
    pub fn content(&self) -> MessageContent<'_> {
        match (self.msg_type.as_deref(), &self.text) {
            (Some("text"), Some(text)) => MessageContent::Text(&text.body),
            (Some(kind), _) => MessageContent::Unsupported(kind),
            (None, _) => MessageContent::Unsupported("unknown"),
        }
    }
}
