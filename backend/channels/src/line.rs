/// LINE adapter — receives webhook events from LINE Messaging API.
/// Answers via the Reply and Push APIs through the dispatcher.
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use relaybot_core::BotError;
use tracing::{info, warn};

use crate::ChannelAdapter;
use crate::dispatch::{DispatchSummary, Dispatcher};
use crate::line_receive::{parse_events, verify_signature};

/// Header carrying base64(HMAC-SHA256(channel secret, body)).
pub const SIGNATURE_HEADER: &str = "x-line-signature";

pub struct LineConfig {
    pub channel_secret: String,
    pub webhook_path: String,
}

pub struct LineAdapter {
    config: LineConfig,
    dispatcher: Arc<Dispatcher>,
}

impl LineAdapter {
    pub fn new(config: LineConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }
}

#[derive(Clone)]
struct AppState {
    channel_secret: Arc<str>,
    dispatcher: Arc<Dispatcher>,
}

/// Verify, parse and dispatch one webhook delivery.
async fn process_webhook(
    state: &AppState,
    signature: Option<&str>,
    body: &[u8],
) -> Result<DispatchSummary, BotError> {
    let signature = signature.ok_or(BotError::InvalidSignature)?;
    verify_signature(&state.channel_secret, body, signature)?;
    let events = parse_events(body)?;
    info!(events = events.len(), "[LINE] Webhook received");
    Ok(state.dispatcher.dispatch(events).await)
}

async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match process_webhook(&state, signature, &body).await {
        Ok(summary) => {
            info!(
                text = summary.text,
                image = summary.image,
                skipped = summary.skipped,
                "[LINE] Webhook processed"
            );
            (StatusCode::OK, "OK").into_response()
        }
        Err(err) => {
            warn!(error = %err, "[LINE] Rejected webhook");
            let detail = match err {
                BotError::InvalidSignature => "Invalid signature",
                _ => "Malformed webhook body",
            };
            (StatusCode::BAD_REQUEST, detail).into_response()
        }
    }
}

#[async_trait]
impl ChannelAdapter for LineAdapter {
    fn name(&self) -> &str {
        "line"
    }

    fn build_router(&self) -> Router {
        let state = AppState {
            channel_secret: Arc::from(self.config.channel_secret.as_str()),
            dispatcher: self.dispatcher.clone(),
        };
        Router::new()
            .route(&self.config.webhook_path, post(webhook_handler))
            .with_state(state)
    }

    async fn start(&self) -> Result<()> {
        info!("[LINE] Adapter ready at {}", self.config.webhook_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_receive::sign_body;
    use crate::testing::{Call, FixedOcr, RecordingApi, RecordingLlm, settings};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use relaybot_core::ChatMessage;
    use tower::ServiceExt;

    const SECRET: &str = "test-channel-secret";

    struct Harness {
        router: Router,
        api: Arc<RecordingApi>,
        llm: Arc<RecordingLlm>,
        ocr: Arc<FixedOcr>,
    }

    fn harness(path: &str) -> Harness {
        let api = Arc::new(RecordingApi::default());
        let llm = Arc::new(RecordingLlm::default());
        let ocr = Arc::new(FixedOcr::ok("race card"));
        let dispatcher = Arc::new(Dispatcher::new(
            api.clone(),
            llm.clone(),
            ocr.clone(),
            settings(),
        ));
        let adapter = LineAdapter::new(
            LineConfig { channel_secret: SECRET.into(), webhook_path: path.into() },
            dispatcher,
        );
        Harness { router: adapter.build_router(), api, llm, ocr }
    }

    fn request(path: &str, body: &str, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json");
        if let Some(sig) = signature {
            builder = builder.header("X-Line-Signature", sig);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn valid_text_webhook_replies_with_completion() {
        let h = harness("/callback");
        let body = r#"{"events":[{"type":"message","message":{"type":"text","text":"hello"}}]}"#;
        let sig = sign_body(SECRET, body.as_bytes());

        let resp = h
            .router
            .oneshot(request("/callback", body, Some(&sig)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "OK");
        let requests = h.llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages, vec![ChatMessage::user("hello")]);
        assert_eq!(
            h.api.calls(),
            vec![Call::Reply { token: String::new(), text: "answer: hello".into() }]
        );
    }

    #[tokio::test]
    async fn invalid_signature_is_rejected_without_processing() {
        let h = harness("/callback");
        let body = r#"{"events":[{"type":"message","replyToken":"r","message":{"type":"text","text":"hello"}}]}"#;
        let forged = sign_body("wrong-secret", body.as_bytes());

        let resp = h
            .router
            .oneshot(request("/callback", body, Some(&forged)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(h.llm.requests().is_empty());
        assert!(h.api.calls().is_empty());
        assert_eq!(h.ocr.calls(), 0);
    }

    #[tokio::test]
    async fn missing_signature_header_is_rejected() {
        let h = harness("/callback");
        let resp = h
            .router
            .oneshot(request("/callback", r#"{"events":[]}"#, None))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(resp).await, "Invalid signature");
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_with_valid_signature_is_rejected() {
        let h = harness("/callback");
        let body = r#"{"events": "nope"}"#;
        let sig = sign_body(SECRET, body.as_bytes());

        let resp = h
            .router
            .oneshot(request("/callback", body, Some(&sig)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(resp).await, "Malformed webhook body");
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn image_webhook_on_custom_path_pushes_prediction() {
        let h = harness("/webhook");
        let body = serde_json::json!({
            "destination": "Ubot",
            "events": [{
                "type": "message",
                "replyToken": "r1",
                "source": { "type": "user", "userId": "U42" },
                "message": { "type": "image", "id": "555" }
            }]
        })
        .to_string();
        let sig = sign_body(SECRET, body.as_bytes());

        let resp = h
            .router
            .oneshot(request("/webhook", &body, Some(&sig)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            h.api.calls(),
            vec![
                Call::Reply { token: "r1".into(), text: "Image received. Processing...".into() },
                Call::Fetch { message_id: "555".into() },
                Call::Push { to: "U42".into(), text: "answer: race card".into() },
            ]
        );
    }

    #[tokio::test]
    async fn empty_event_batch_is_ok() {
        let h = harness("/callback");
        let body = r#"{"destination":"Ubot","events":[]}"#;
        let sig = sign_body(SECRET, body.as_bytes());

        let resp = h
            .router
            .oneshot(request("/callback", body, Some(&sig)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(h.api.calls().is_empty());
    }
}
