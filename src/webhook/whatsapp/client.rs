//! # WhatsApp API Client
//!
//! This module provides a client for sending messages to WhatsApp Business API.
//! It handles authentication and message sending for text and template messages.
//! Nothing here retries: a failed send is reported to the caller as is.

use super::schemas::OutgoingMessage;
use crate::config::WhatsAppConfig;
use async_trait::async_trait;
use derive_more::{Display, Error};
use reqwest::{Method, header};
use serde_json::Value;

/// Endpoint suffix of the synchronous send-message API
pub const MESSAGES_ENDPOINT: &str = "/messages";

#[derive(Debug, Display, Error)]
pub enum ClientError {
    /// A required caller-supplied field is missing or empty
    #[display("missing required field: {_0}")]
    Validation(#[error(not(source))] &'static str),
    /// WhatsApp answered with a non-success status
    #[display("Error: {status} - {message}")]
    RemoteApi { status: u16, message: String },
    /// The request never got a response (DNS, TLS, timeout...)
    #[display("Failed to send request to WhatsApp API: {_0}")]
    Transport(reqwest::Error),
    /// Success status but the body is not JSON
    #[display("Failed to parse WhatsApp API response: {_0}")]
    InvalidResponse(#[error(not(source))] String),
}

/// Outbound side of the webhook, the seam used to swap the real client in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSender {
    /// Sends a free-form text message.
    async fn send_text_message(&self, recipient: &str, text: &str) -> Result<Value, ClientError>;

    /// Sends a pre-approved template message. Pass an empty `components`
    /// list for templates without parameters.
    async fn send_template_message(
        &self,
        recipient: &str,
        template_name: &str,
        language_code: &str,
        components: Vec<Value>,
    ) -> Result<Value, ClientError>;
}

pub type ImplMessageSender = Box<dyn MessageSender>;

/// WhatsApp API client for sending messages
#[derive(Clone)]
pub struct WhatsAppClient {
    /// HTTP client for making API requests
    client: reqwest::Client,
    /// Graph API base, without trailing slash
    api_base: String,
    /// WhatsApp Business phone number ID
    phone_number_id: String,
    /// Authentication token
    auth_token: String,
}

impl WhatsAppClient {
    /// Creates a new WhatsApp client
    pub fn new(config: &WhatsAppConfig) -> anyhow::Result<Self> {
        let phone_number_id = config.whatsapp_business_phone_number_id.trim();
        if phone_number_id.is_empty() {
            anyhow::bail!("whatsapp phone number id is required");
        }
        let auth_token = config.whatsapp_business_auth.trim();
        if auth_token.is_empty() {
            anyhow::bail!("whatsapp access token is required");
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_base: config.whatsapp_api_base.trim_end_matches('/').to_string(),
            phone_number_id: phone_number_id.to_string(),
            auth_token: auth_token.to_string(),
        })
    }

    /// Sends `payload` to `{api_base}/{phone_number_id}{endpoint_suffix}`.
    ///
    /// The response body is parsed as JSON whatever the status. On success it
    /// is returned verbatim; otherwise the remote `error.message` (or
    /// "Unknown error") is carried in [`ClientError::RemoteApi`].
    #[tracing::instrument(skip(self, payload))]
    pub async fn send<T: serde::Serialize + Sync + ?Sized>(
        &self,
        endpoint_suffix: &str,
        method: Method,
        payload: &T,
    ) -> Result<Value, ClientError> {
        let url = format!(
            "{base}/{id}{suffix}",
            base = self.api_base,
            id = self.phone_number_id,
            suffix = endpoint_suffix
        );

        let response = self
            .client
            .request(method, &url)
            .bearer_auth(&self.auth_token)
            .header(header::CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = response.status();
        let raw_body = response.bytes().await.map_err(ClientError::Transport)?;
        let body = serde_json::from_slice::<Value>(&raw_body).ok();

        if !status.is_success() {
            let message = body
                .as_ref()
                .and_then(|b| b.pointer("/error/message"))
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();

            logfire::warn!(
                "WhatsApp API returned error status {status}: {message}",
                status = i64::from(status.as_u16()),
                message = message.clone()
            );
            return Err(ClientError::RemoteApi {
                status: status.as_u16(),
                message,
            });
        }

        body.ok_or_else(|| {
            ClientError::InvalidResponse(String::from_utf8_lossy(&raw_body).into_owned())
        })
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ClientError> {
    if value.is_empty() {
        return Err(ClientError::Validation(field));
    }
    Ok(value)
}

#[async_trait]
impl MessageSender for WhatsAppClient {
    async fn send_text_message(&self, recipient: &str, text: &str) -> Result<Value, ClientError> {
        let to = required(recipient, "recipient")?;
        required(text, "text")?;

        let message = OutgoingMessage::new_text(to.to_string(), text.to_string());
        self.send(MESSAGES_ENDPOINT, Method::POST, &message).await
    }

    async fn send_template_message(
        &self,
        recipient: &str,
        template_name: &str,
        language_code: &str,
        components: Vec<Value>,
    ) -> Result<Value, ClientError> {
        let to = required(recipient, "recipient")?;
        let name = required(template_name, "template_name")?;
        let code = required(language_code, "language_code")?;

        let message = OutgoingMessage::new_template(
            to.to_string(),
            name.to_string(),
            code.to_string(),
            components,
        );
        self.send(MESSAGES_ENDPOINT, Method::POST, &message).await
    }
}
