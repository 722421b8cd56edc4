use ntex::web;

/// Configures webhook routes for external integrations.
///
/// These routes are public endpoints: authenticity is established per
/// request by the handshake token or the payload signature.
///
/// # Routes
/// - `GET /webhook/whatsapp` - WhatsApp webhook verification
/// - `POST /webhook/whatsapp` - WhatsApp webhook receiver
/// - any other method on the same path answers 400
pub fn whatsapp(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhook/whatsapp")
            .service(web::resource("").to(super::whatsapp::webhook)),
    );
}
