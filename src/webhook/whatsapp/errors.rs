//! Rejections produced while gating and processing a webhook request.

use derive_more::{Display, Error};
use ntex::{http, web};

#[derive(Debug, Display, Error)]
pub enum WebhookError {
    /// Unsupported method, or a POST without the signature header
    #[display("Invalid request")]
    InvalidRequest,
    /// Handshake with a wrong mode, wrong token or missing parameters
    #[display("Verification failed: invalid mode or verify token")]
    VerificationFailed,
    /// Body does not match `X-Hub-Signature-256`
    #[display("Invalid signature")]
    InvalidSignature,
    /// HMAC key setup failed; the detail is logged, never returned
    #[display("Internal Server Error")]
    Crypto(#[error(not(source))] String),
    /// Signed body is not a JSON webhook envelope
    #[display("Malformed payload: {_0}")]
    MalformedPayload(#[error(not(source))] String),
}

impl web::error::WebResponseError for WebhookError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        match self {
            WebhookError::Crypto(detail) => {
                logfire::error!("Signature computation failed: {detail}", detail = detail.clone());
            }
            _ => {
                logfire::warn!("Webhook rejected: {reason}", reason = self.to_string());
            }
        }

        match self {
            WebhookError::MalformedPayload(_) => {
                web::HttpResponse::build(self.status_code()).json(&serde_json::json!({
                    "success": false,
                    "error": self.to_string(),
                }))
            }
            _ => web::HttpResponse::build(self.status_code())
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
        }
    }

    fn status_code(&self) -> http::StatusCode {
        match *self {
            WebhookError::InvalidRequest | WebhookError::MalformedPayload(_) => {
                http::StatusCode::BAD_REQUEST
            }
            WebhookError::VerificationFailed | WebhookError::InvalidSignature => {
                http::StatusCode::UNAUTHORIZED
            }
            WebhookError::Crypto(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
