//! Application configuration management with security considerations.
//!
//! All values are read once from the environment at start-up and handed to
//! the request handlers as read-only state.
//!
//! # Security Notes
//! - Sensitive fields are clearly marked and should never be logged
//! - Neither struct derives `Debug` so secrets can't leak through `{:?}`

use envconfig::Envconfig;

/// Server level configuration.
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(default = "0.0.0.0")]
    pub web_server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(default = "8080")]
    pub web_server_port: u16,

    /// Path to SSL private key file, only read in prod (SENSITIVE PATH)
    #[envconfig(default = "server.key")]
    pub private_key_path: String,

    /// Path to SSL certificate file, only read in prod (NON-SENSITIVE)
    #[envconfig(default = "server.crt")]
    pub certificate_path: String,

    /// 🔒 SENSITIVE: Logfire write token. Without it logs stay on the console.
    pub logfire_token: Option<String>,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }
}

/// Credentials for the WhatsApp Business Cloud API.
#[derive(Envconfig, Clone)]
pub struct WhatsAppConfig {
    /// WhatsApp Business phone number ID (SEMI-SENSITIVE)
    /// Security: Restrict access, don't log in production
    pub whatsapp_business_phone_number_id: String,

    /// 🔒 SENSITIVE: System user access token used as bearer auth
    pub whatsapp_business_auth: String,

    /// 🔒 SENSITIVE: App secret, key of the `X-Hub-Signature-256` HMAC
    pub whatsapp_app_secret: String,

    /// 🔒 SENSITIVE: Token configured in the Meta dashboard for the GET handshake
    pub whatsapp_verify_token: String,

    /// Graph API base URL (NON-SENSITIVE)
    #[envconfig(default = "https://graph.facebook.com/v22.0")]
    pub whatsapp_api_base: String,
}
