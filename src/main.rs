//! # WhatsApp Echo Relay
//!
//! Webhook receiver for the WhatsApp Business Cloud API. Verifies the
//! subscription handshake, authenticates events by their HMAC signature and
//! echoes user text messages back to the sender.

pub mod config;
pub mod metric;
pub mod webhook;

use anyhow::Context;
use envconfig::Envconfig;
use logfire::config::{MetricsOptions, SendToLogfire};
use ntex::web;
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    let app_config =
        config::AppConfig::init_from_env().context("failed to load app config from env")?;
    let whatsapp_config = config::WhatsAppConfig::init_from_env()
        .context("failed to load whatsapp config from env")?;

    // Initialize logging and metrics, console only when there is no token
    let mut logfire_config = logfire::configure()
        .install_panic_handler()
        .with_metrics(Some(MetricsOptions::default()))
        .send_to_logfire(SendToLogfire::IfTokenPresent);
    if let Some(token) = &app_config.logfire_token {
        logfire_config = logfire_config.with_token(token);
    }
    let shutdown_handler = logfire_config.finish()?;

    let whatsapp_client = webhook::whatsapp::client::WhatsAppClient::new(&whatsapp_config)?;

    configure_and_run_server(app_config, whatsapp_config, whatsapp_client).await?;

    shutdown_handler.shutdown()?;

    Ok(())
}

/// Configures SSL acceptor for production environments
fn setup_ssl_acceptor(
    app_config: &config::AppConfig,
) -> anyhow::Result<openssl::ssl::SslAcceptorBuilder> {
    let mut ssl_acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls_server())
        .map_err(|e| anyhow::anyhow!("Failed to create SSL acceptor: {}", e))?;

    ssl_acceptor
        .set_private_key_file(&app_config.private_key_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load private key from {}: {}",
                app_config.private_key_path,
                e
            )
        })?;

    ssl_acceptor
        .set_certificate_file(&app_config.certificate_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load certificate from {}: {}",
                app_config.certificate_path,
                e
            )
        })?;

    Ok(ssl_acceptor)
}

/// Creates application state, once per worker
fn create_app_state(
    whatsapp_config: config::WhatsAppConfig,
    whatsapp_client: webhook::whatsapp::client::WhatsAppClient,
) -> webhook::AppState {
    webhook::AppState {
        whatsapp_config,
        message_sender: Box::new(whatsapp_client),
    }
}

/// Configures and starts the web server with appropriate SSL settings
async fn configure_and_run_server(
    app_config: config::AppConfig,
    whatsapp_config: config::WhatsAppConfig,
    whatsapp_client: webhook::whatsapp::client::WhatsAppClient,
) -> anyhow::Result<()> {
    let server_addr = (
        app_config.web_server_host.clone(),
        app_config.web_server_port,
    );

    logfire::info!(
        "Starting webhook server on {host}:{port}",
        host = app_config.web_server_host.clone(),
        port = i64::from(app_config.web_server_port)
    );

    let server = web::server(move || {
        web::App::new()
            .wrap(web::middleware::Logger::default())
            .state(create_app_state(
                whatsapp_config.clone(),
                whatsapp_client.clone(),
            ))
            .configure(webhook::routes::whatsapp)
    });

    let bound_server = if app_config.is_prod() {
        let ssl_acceptor = setup_ssl_acceptor(&app_config)?;
        server.bind_openssl(server_addr, ssl_acceptor)?
    } else {
        server.bind(server_addr)?
    };

    bound_server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
