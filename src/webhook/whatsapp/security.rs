//! Security utilities for WhatsApp webhook verification
//!
//! Every request reaching the webhook goes through [`verify_request`] before
//! any business logic runs:
//!
//! - `GET` is the subscription handshake. Only the verify token is consulted.
//! - `POST` carries an event. Meta signs the raw body with HMAC-SHA256 keyed
//!   by the app secret and sends it as `X-Hub-Signature-256: sha256=<hex>`.
//!   The body is only handed back once the signature matches.
//! - Anything else is rejected.
//!
//! # Important Notes
//!
//! - The signature MUST be computed on the raw request body bytes, not parsed JSON
//! - The comparison must be constant-time to prevent timing attacks
//! - The header format is `sha256=<signature>` (lowercase)

use super::errors::WebhookError;
use crate::config::WhatsAppConfig;
use hmac::{Hmac, Mac};
use ntex::{http::Method, util::Bytes, web};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Query parameters for webhook verification.
///
/// All optional so a half-filled query is a failed handshake, not a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    /// The mode parameter, should be "subscribe"
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    /// The verification token from WhatsApp
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    /// The challenge string to echo back
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// What a request turned out to be once it passed the gate.
#[derive(Debug, PartialEq)]
pub enum Verification {
    /// Successful handshake; respond with the challenge verbatim
    Handshake(String),
    /// Signed event; the raw body is now trusted
    Payload(Bytes),
}

/// Gates an inbound webhook request.
pub fn verify_request(
    req: &web::HttpRequest,
    body: Bytes,
    config: &WhatsAppConfig,
) -> Result<Verification, WebhookError> {
    match *req.method() {
        Method::GET => {
            let query = web::types::Query::<VerifyQuery>::from_query(req.query_string())
                .map(web::types::Query::into_inner)
                .unwrap_or_default();

            verify_subscription(&query, &config.whatsapp_verify_token).map(Verification::Handshake)
        }
        Method::POST => {
            let signature_header = req
                .headers()
                .get(SIGNATURE_HEADER)
                .ok_or(WebhookError::InvalidRequest)?
                .to_str()
                .map_err(|_| WebhookError::InvalidSignature)?;

            verify_signature(signature_header, &body, &config.whatsapp_app_secret)?;

            Ok(Verification::Payload(body))
        }
        _ => Err(WebhookError::InvalidRequest),
    }
}

/// Checks the handshake query and returns the challenge to echo back.
pub fn verify_subscription(
    query: &VerifyQuery,
    expected_token: &str,
) -> Result<String, WebhookError> {
    if query.mode.as_deref() != Some("subscribe") {
        logfire::warn!("Webhook verification failed: mode is not 'subscribe'");
        return Err(WebhookError::VerificationFailed);
    }

    let token_matches = query
        .verify_token
        .as_deref()
        .is_some_and(|token| bool::from(token.as_bytes().ct_eq(expected_token.as_bytes())));
    if !token_matches {
        logfire::warn!("Webhook verification failed: invalid verify token");
        return Err(WebhookError::VerificationFailed);
    }

    let Some(challenge) = query.challenge.clone() else {
        logfire::warn!("Webhook verification failed: missing hub.challenge");
        return Err(WebhookError::VerificationFailed);
    };

    logfire::info!("Webhook verification successful");
    Ok(challenge)
}

/// Computes the raw HMAC-SHA256 of `payload` keyed by `app_secret`.
pub fn compute_signature(payload: &[u8], app_secret: &str) -> Result<Vec<u8>, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|e| WebhookError::Crypto(e.to_string()))?;

    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verifies the X-Hub-Signature-256 header against the request payload
///
/// # Arguments
///
/// * `signature_header` - The value of the X-Hub-Signature-256 header (e.g., "sha256=abc123...")
/// * `payload` - The raw request body bytes
/// * `app_secret` - Your WhatsApp/Facebook app secret
///
/// # Errors
///
/// * `InvalidSignature` when the prefix is missing, the hex is invalid or
///   the digests differ
/// * `Crypto` when the HMAC can't be keyed
pub fn verify_signature(
    signature_header: &str,
    payload: &[u8],
    app_secret: &str,
) -> Result<(), WebhookError> {
    let Some(signature_hex) = signature_header.strip_prefix("sha256=") else {
        logfire::warn!("Invalid signature header format: expected 'sha256=' prefix");
        return Err(WebhookError::InvalidSignature);
    };

    let expected_signature = hex::decode(signature_hex).map_err(|e| {
        logfire::warn!(
            "Failed to decode signature hex: {error}",
            error = e.to_string()
        );
        WebhookError::InvalidSignature
    })?;

    let computed_signature = compute_signature(payload, app_secret)?;

    // ct_eq on slices of different length is false
    if !bool::from(computed_signature.ct_eq(&expected_signature[..])) {
        logfire::warn!("Webhook signature verification failed: signatures do not match");
        return Err(WebhookError::InvalidSignature);
    }

    logfire::info!("Webhook signature verified");
    Ok(())
}
