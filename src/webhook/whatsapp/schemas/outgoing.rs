//! # WhatsApp Outgoing Message Schemas
//!
//! Payloads sent to the `/messages` endpoint of the WhatsApp Business API.

use serde::Serialize;

/// Message to send to WhatsApp
#[derive(Debug, Serialize)]
pub struct OutgoingMessage {
    /// Messaging product, always "whatsapp"
    pub messaging_product: String,
    /// Recipient's WhatsApp ID (phone number)
    pub to: String,
    /// Type tag plus the matching content object
    #[serde(flatten)]
    pub content: OutgoingContent,
}

/// Serialized as `"type": "<kind>"` next to a `"<kind>": {...}` object.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutgoingContent {
    Text { text: OutgoingTextContent },
    Template { template: TemplateContent },
}

/// Text content for outgoing messages
#[derive(Debug, Serialize)]
pub struct OutgoingTextContent {
    /// Message body text
    pub body: String,
}

/// Pre-approved template reference
#[derive(Debug, Serialize)]
pub struct TemplateContent {
    /// Template name as registered in the Meta dashboard
    pub name: String,
    /// Template language
    pub language: TemplateLanguage,
    /// Header/body/button components, passed through as given
    pub components: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct TemplateLanguage {
    /// Locale code, e.g. "en_US" or "es_MX"
    pub code: String,
}

impl OutgoingMessage {
    /// Creates a new text message
    pub fn new_text(to: String, body: String) -> Self {
        Self {
            messaging_product: "whatsapp".to_string(),
            to,
            content: OutgoingContent::Text {
                text: OutgoingTextContent { body },
            },
        }
    }

    /// Creates a new template message
    pub fn new_template(
        to: String,
        name: String,
        language_code: String,
        components: Vec<serde_json::Value>,
    ) -> Self {
        Self {
            messaging_product: "whatsapp".to_string(),
            to,
            content: OutgoingContent::Template {
                template: TemplateContent {
                    name,
                    language: TemplateLanguage {
                        code: language_code,
                    },
                    components,
                },
            },
        }
    }
}
