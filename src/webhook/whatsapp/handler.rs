//! # WhatsApp Webhook Handler
//!
//! Business logic run on a body that already passed signature verification:
//! find the first user message and echo its text back to the sender.

use super::{
    client::MessageSender,
    errors::WebhookError,
    schemas::{Message, MessageContent, Metadata, WebhookPayload},
};
use crate::metric;
use ntex::web;
use serde_json::Value;

/// Plain-text acknowledgment WhatsApp expects for every delivered event
pub const ACK_BODY: &str = "Webhook received successfully";

/// How a verified event was handled
#[derive(Debug, PartialEq)]
pub enum WebhookOutcome {
    /// Nothing to reply to (no message, self-sent echo, unsupported type)
    Acknowledged,
    /// Echo sent; holds the WhatsApp API response
    Echoed(Value),
    /// Echo could not be sent
    EchoFailed(String),
}

impl WebhookOutcome {
    pub fn into_response(self) -> web::HttpResponse {
        match self {
            WebhookOutcome::Acknowledged => web::HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(ACK_BODY),
            WebhookOutcome::Echoed(data) => web::HttpResponse::Ok().json(&serde_json::json!({
                "success": true,
                "data": data,
            })),
            WebhookOutcome::EchoFailed(error) => web::HttpResponse::InternalServerError().json(
                &serde_json::json!({
                    "success": false,
                    "error": error,
                }),
            ),
        }
    }
}

/// Finds the message this service acts on.
///
/// Only `entry[0].changes[0]` is looked at, and only the first message of a
/// batch. Returns `None` when the change is not a `messages` change or
/// carries no message.
pub fn first_message(payload: &WebhookPayload) -> Option<(&Message, Option<&Metadata>)> {
    let change = payload.entry.first()?.changes.first()?;

    match (change.field.as_deref(), change.value.as_ref()) {
        (Some("messages"), Some(value)) => {
            let message = value.messages.as_deref()?.first()?;
            Some((message, value.metadata.as_ref()))
        }
        _ => None,
    }
}

fn acknowledged() -> Result<WebhookOutcome, WebhookError> {
    metric::incr_webhook_event_statds("acknowledged");
    Ok(WebhookOutcome::Acknowledged)
}

/// Main webhook processor
///
/// Parses the trusted body and, when it holds a text message from someone
/// other than the business number itself, echoes the text back.
///
/// # Errors
///
/// `MalformedPayload` when the body is not JSON at all. Valid JSON in an
/// unexpected shape is acknowledged. Send failures are not errors here; they
/// become [`WebhookOutcome::EchoFailed`].
pub async fn process_webhook(
    body: &[u8],
    sender: &dyn MessageSender,
) -> Result<WebhookOutcome, WebhookError> {
    let json: Value = serde_json::from_slice(body).map_err(|e| {
        logfire::error!(
            "Failed to parse webhook payload: {error}",
            error = e.to_string()
        );
        WebhookError::MalformedPayload(e.to_string())
    })?;

    let payload = match serde_json::from_value::<WebhookPayload>(json) {
        Ok(payload) => payload,
        Err(e) => {
            logfire::warn!(
                "Unexpected webhook envelope acknowledged: {error}",
                error = e.to_string()
            );
            return acknowledged();
        }
    };

    let Some((message, metadata)) = first_message(&payload) else {
        logfire::info!("Webhook without user messages acknowledged");
        return acknowledged();
    };

    let Some(from) = message.from.as_deref() else {
        logfire::warn!("Message without sender acknowledged");
        return acknowledged();
    };

    let business_number = metadata.and_then(|m| m.phone_number_id.as_deref());
    if business_number == Some(from) {
        logfire::info!("Ignoring message sent by the business number itself");
        return acknowledged();
    }

    let text = match message.content() {
        MessageContent::Text(text) => text,
        MessageContent::Unsupported(kind) => {
            logfire::warn!(
                "Unsupported message type received: {type}",
                r#type = kind.to_string()
            );
            return acknowledged();
        }
    };

    match sender.send_text_message(from, text).await {
        Ok(data) => {
            logfire::info!("Echo reply sent");
            metric::incr_webhook_event_statds("echo_sent");
            Ok(WebhookOutcome::Echoed(data))
        }
        Err(e) => {
            logfire::error!("Failed to send echo reply: {error}", error = e.to_string());
            metric::incr_webhook_event_statds("echo_failed");
            Ok(WebhookOutcome::EchoFailed(e.to_string()))
        }
    }
}
