//! WhatsApp webhook endpoint handler
//!
//! Every method on the webhook path lands in [`webhook`]. The request is
//! gated by [`security::verify_request`] first: a handshake or a rejection
//! is answered right away, a signed event goes on to [`handler::process_webhook`].
//!
//! WhatsApp gives us 20 seconds to respond, so the echo is sent inline.

use super::{
    handler,
    security::{self, Verification},
};
use crate::{metric, webhook::AppState};
use ntex::{util::Bytes, web};
use tracing::Instrument;

pub async fn webhook(
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> Result<web::HttpResponse, web::Error> {
    let verification = match security::verify_request(&req, body, &app_state.whatsapp_config) {
        Ok(verification) => verification,
        Err(e) => {
            metric::incr_webhook_event_statds("rejected");
            return Err(e.into());
        }
    };

    match verification {
        Verification::Handshake(challenge) => {
            metric::incr_webhook_event_statds("handshake");
            Ok(web::HttpResponse::Ok()
                .content_type("text/plain")
                .body(challenge))
        }
        Verification::Payload(body) => {
            let outcome = handler::process_webhook(&body, app_state.message_sender.as_ref())
                .instrument(logfire::span!("whatsapp_webhook"))
                .await?;

            Ok(outcome.into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::WhatsAppConfig,
        webhook::{
            self,
            whatsapp::client::{ClientError, MockMessageSender},
            whatsapp::handler::ACK_BODY,
            whatsapp::security::{SIGNATURE_HEADER, compute_signature},
        },
    };
    use mockall::predicate::*;
    use ntex::{http, web::test};
    use serde_json::{Value, json};

    const SECRET: &str = "app-secret";
    const BUSINESS_NUMBER: &str = "15557654321";

    fn test_state(mock_sender: MockMessageSender) -> AppState {
        AppState {
            whatsapp_config: WhatsAppConfig {
                whatsapp_business_phone_number_id: BUSINESS_NUMBER.into(),
                whatsapp_business_auth: "token".into(),
                whatsapp_app_secret: SECRET.into(),
                whatsapp_verify_token: "verify-me".into(),
                whatsapp_api_base: "http://localhost".into(),
            },
            message_sender: Box::new(mock_sender),
        }
    }

    fn sign(payload: &[u8]) -> String {
        format!(
            "sha256={}",
            hex::encode(compute_signature(payload, SECRET).unwrap())
        )
    }

    fn text_event(from: &str, body: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "123456",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": {
                            "display_phone_number": "15557654321",
                            "phone_number_id": BUSINESS_NUMBER
                        },
                        "messages": [{
                            "from": from,
                            "id": "wamid.1",
                            "timestamp": "1700000000",
                            "type": "text",
                            "text": {"body": body}
                        }]
                    }
                }]
            }]
        }))
        .unwrap()
    }

    fn signed_post(payload: &[u8]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/webhook/whatsapp")
            .header(SIGNATURE_HEADER, sign(payload).as_str())
            .set_payload(payload.to_vec())
    }

    macro_rules! init_app {
        ($mock_sender:expr) => {
            test::init_service(
                web::App::new()
                    .state(test_state($mock_sender))
                    .configure(webhook::routes::whatsapp),
            )
            .await
        };
    }

    #[ntex::test]
    async fn test_handshake_echoes_challenge() {
        let app = init_app!(MockMessageSender::new());

        let req = test::TestRequest::get()
            .uri("/webhook/whatsapp?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=1158201444")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(test::read_body(resp).await, Bytes::from_static(b"1158201444"));
    }

    #[ntex::test]
    async fn test_handshake_rejects_wrong_or_missing_token() {
        let app = init_app!(MockMessageSender::new());

        for uri in [
            "/webhook/whatsapp?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1",
            "/webhook/whatsapp?hub.mode=subscribe&hub.challenge=1",
            "/webhook/whatsapp",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), http::StatusCode::UNAUTHORIZED);
        }
    }

    #[ntex::test]
    async fn test_text_message_is_echoed() {
        let mut mock_sender = MockMessageSender::new();
        mock_sender
            .expect_send_text_message()
            .with(eq("15551234567"), eq("hi"))
            .times(1)
            .returning(|_, _| Ok(json!({"messages": [{"id": "wamid.2"}]})));
        let app = init_app!(mock_sender);

        let payload = text_event("15551234567", "hi");
        let resp = test::call_service(&app, signed_post(&payload).to_request()).await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["messages"][0]["id"], "wamid.2");
    }

    #[ntex::test]
    async fn test_invalid_signature_is_rejected() {
        let mut mock_sender = MockMessageSender::new();
        mock_sender.expect_send_text_message().never();
        let app = init_app!(mock_sender);

        let payload = text_event("15551234567", "hi");
        let req = test::TestRequest::post()
            .uri("/webhook/whatsapp")
            .header(SIGNATURE_HEADER, sign(b"something else").as_str())
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), http::StatusCode::UNAUTHORIZED);
        assert_eq!(
            test::read_body(resp).await,
            Bytes::from_static(b"Invalid signature")
        );
    }

    #[ntex::test]
    async fn test_missing_signature_header() {
        let mut mock_sender = MockMessageSender::new();
        mock_sender.expect_send_text_message().never();
        let app = init_app!(mock_sender);

        let req = test::TestRequest::post()
            .uri("/webhook/whatsapp")
            .set_payload(text_event("15551234567", "hi"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), http::StatusCode::BAD_REQUEST);
    }

    #[ntex::test]
    async fn test_other_methods_are_rejected() {
        let app = init_app!(MockMessageSender::new());

        let req = test::TestRequest::default()
            .method(http::Method::DELETE)
            .uri("/webhook/whatsapp")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), http::StatusCode::BAD_REQUEST);
    }

    #[ntex::test]
    async fn test_change_without_messages_is_acknowledged() {
        let mut mock_sender = MockMessageSender::new();
        mock_sender.expect_send_text_message().never();
        let app = init_app!(mock_sender);

        let payload = serde_json::to_vec(&json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "changes": [{
                    "field": "messages",
                    "value": {
                        "metadata": {"phone_number_id": BUSINESS_NUMBER},
                        "statuses": [{"id": "wamid.1", "status": "delivered"}]
                    }
                }]
            }]
        }))
        .unwrap();

        // same signed delivery twice gets the same answer
        for _ in 0..2 {
            let resp = test::call_service(&app, signed_post(&payload).to_request()).await;
            assert_eq!(resp.status(), http::StatusCode::OK);
            assert_eq!(test::read_body(resp).await, Bytes::from_static(ACK_BODY.as_bytes()));
        }
    }

    #[ntex::test]
    async fn test_self_message_is_not_echoed() {
        let mut mock_sender = MockMessageSender::new();
        mock_sender.expect_send_text_message().never();
        let app = init_app!(mock_sender);

        let payload = text_event(BUSINESS_NUMBER, "hi");
        let resp = test::call_service(&app, signed_post(&payload).to_request()).await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(test::read_body(resp).await, Bytes::from_static(ACK_BODY.as_bytes()));
    }

    #[ntex::test]
    async fn test_remote_failure_becomes_500_envelope() {
        let mut mock_sender = MockMessageSender::new();
        mock_sender
            .expect_send_text_message()
            .times(1)
            .returning(|_, _| {
                Err(ClientError::RemoteApi {
                    status: 429,
                    message: "rate limited".into(),
                })
            });
        let app = init_app!(mock_sender);

        let payload = text_event("15551234567", "hi");
        let resp = test::call_service(&app, signed_post(&payload).to_request()).await;

        assert_eq!(resp.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Error: 429 - rate limited");
    }

    #[ntex::test]
    async fn test_signed_malformed_payload() {
        let mut mock_sender = MockMessageSender::new();
        mock_sender.expect_send_text_message().never();
        let app = init_app!(mock_sender);

        let resp = test::call_service(&app, signed_post(b"{\"entry\": [").to_request()).await;

        assert_eq!(resp.status(), http::StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(body["success"], false);
    }

    #[ntex::test]
    async fn test_signed_envelope_of_unexpected_shape_is_acknowledged() {
        let mut mock_sender = MockMessageSender::new();
        mock_sender.expect_send_text_message().never();
        let app = init_app!(mock_sender);

        let payload = br#"{"object":"whatsapp_business_account","entry":{}}"#;
        let resp = test::call_service(&app, signed_post(payload).to_request()).await;

        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(test::read_body(resp).await, Bytes::from_static(ACK_BODY.as_bytes()));
    }
}
