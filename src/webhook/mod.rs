//! Webhook handlers for external integrations
//!
//! ## Modules
//!
//! - [`whatsapp`] - WhatsApp Business API webhook: handshake, signature
//!   verification and the echo reply

pub mod routes;
pub mod whatsapp;

use crate::config;

/// Read-only state shared by every webhook request
pub struct AppState {
    pub whatsapp_config: config::WhatsAppConfig,
    pub message_sender: whatsapp::client::ImplMessageSender,
}
