//! WhatsApp webhook integration module
//!
//! ## Submodules
//!
//! - [`security`] - Handshake and `X-Hub-Signature-256` verification
//! - [`handler`] - Business logic run on verified events (the echo reply)
//! - [`routes`] - HTTP endpoint tying both together
//! - [`schemas`] - Data structures for WhatsApp payloads (incoming and outgoing)
//! - [`client`] - WhatsApp API client for sending messages
//! - [`errors`] - Rejections and their HTTP status codes

pub mod client;
pub mod errors;
pub mod handler;
pub mod routes;
pub mod schemas;
pub mod security;

pub use routes::webhook;
