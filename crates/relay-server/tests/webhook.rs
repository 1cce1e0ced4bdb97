//! End-to-end tests: chat commands register instances, Grafana calls the
//! webhook, the card lands on a mocked chat webhook.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use relay_chat::WebhookConfig;
use relay_commands::CommandContext;
use relay_server::{ChatConfig, RelayConfig, RelayServer};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: RelayServer,
    chat: MockServer,
    _state: tempfile::TempDir,
}

async fn harness_with_status(status: u16) -> Harness {
    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&chat)
        .await;

    let state = tempfile::tempdir().unwrap();
    let config = RelayConfig {
        public_url: "https://relay.example.com".to_string(),
        state_dir: state.path().to_path_buf(),
        chat: ChatConfig::Webhook(
            WebhookConfig::new(format!("{}/hook", chat.uri()))
                .unwrap()
                .with_username("grafana"),
        ),
        ..RelayConfig::default()
    };

    Harness {
        server: RelayServer::from_config(&config).unwrap(),
        chat,
        _state: state,
    }
}

async fn harness() -> Harness {
    harness_with_status(200).await
}

impl Harness {
    async fn command(&self, line: &str) -> Vec<String> {
        self.server
            .commands()
            .dispatch(&CommandContext::new("#ops", "alice"), line)
            .await
            .lines
    }

    async fn token(&self, name: &str) -> String {
        self.server
            .registry()
            .read()
            .await
            .get(name)
            .unwrap()
            .token
            .clone()
    }

    async fn post_alert(&self, token: &str, body: &str) -> (StatusCode, String) {
        let response = self
            .server
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/grafana/{token}/alert"))
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn chat_messages(&self) -> Vec<Value> {
        self.chat
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    async fn last_chat_message(&self) -> Value {
        self.chat_messages().await.pop().unwrap()
    }
}

#[tokio::test]
async fn test_add_announces_and_prints_webhook_url() {
    let h = harness().await;

    let reply = h.command("grafana add prod --room #alerts").await;
    let token = h.token("prod").await;

    assert_eq!(
        reply[1],
        format!("Please config Grafana to call following webhook: https://relay.example.com/grafana/{token}/alert")
    );
    let announcement = h.last_chat_message().await;
    assert_eq!(announcement["channel"], "#alerts");
    assert_eq!(announcement["text"], "Registered Grafana instance prod for #alerts");
}

#[tokio::test]
async fn test_structured_alert_becomes_card() {
    let h = harness().await;
    h.command("grafana add prod").await;
    let token = h.token("prod").await;

    let (status, body) = h
        .post_alert(&token, r#"{"state":"ok","title":"t","message":"m"}"#)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    let card = h.last_chat_message().await;
    assert_eq!(card["channel"], "#ops");
    assert_eq!(card["username"], "grafana");
    let attachment = &card["attachments"][0];
    assert_eq!(attachment["title"], "[prod] t");
    assert_eq!(attachment["text"], "m");
    assert_eq!(attachment["color"], "#2eb886");
}

#[tokio::test]
async fn test_unknown_state_is_red() {
    let h = harness().await;
    h.command("grafana add prod").await;
    let token = h.token("prod").await;

    let (status, _) = h
        .post_alert(&token, r#"{"state":"exploded","title":"disk"}"#)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.last_chat_message().await["attachments"][0]["color"], "#d50200");
}

#[tokio::test]
async fn test_link_rewrite_and_images() {
    let h = harness().await;
    h.command(
        r#"grafana add prod --show-images false --link-regex-find "http://grafana.internal:3000/?orgId=1" --link-regex-replace "https://grafana.example.com/?orgId=1""#,
    )
    .await;
    let token = h.token("prod").await;

    h.post_alert(
        &token,
        r#"{"state":"alerting","title":"CPU","ruleUrl":"http://grafana.internal:3000/?orgId=1&d=abc","imageUrl":"http://img/x.png"}"#,
    )
    .await;

    let attachment = h.last_chat_message().await["attachments"][0].clone();
    assert_eq!(attachment["title_link"], "https://grafana.example.com/?orgId=1&d=abc");
    assert!(attachment.get("image_url").is_none());
    assert_eq!(attachment["color"], "#d50200");
}

#[tokio::test]
async fn test_unstructured_body_gets_fallback_text() {
    let h = harness().await;
    h.command("grafana add prod").await;
    let token = h.token("prod").await;

    let (status, _) = h.post_alert(&token, "this is not json").await;

    assert_eq!(status, StatusCode::OK);
    let message = h.last_chat_message().await;
    assert_eq!(message["text"], "Received unknown alert from Grafana prod");
    assert!(message.get("attachments").is_none());
}

#[tokio::test]
async fn test_unknown_token_is_forbidden() {
    let h = harness().await;
    h.command("grafana add prod").await;
    let before = h.chat_messages().await.len();

    for body in [r#"{"state":"ok"}"#, "garbage", ""] {
        let (status, text) = h.post_alert("not-a-token", body).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(text, "Forbidden");
    }
    assert_eq!(h.chat_messages().await.len(), before);
}

#[tokio::test]
async fn test_deleted_instance_token_stops_working() {
    let h = harness().await;
    h.command("grafana add prod").await;
    let token = h.token("prod").await;

    let reply = h.command("grafana delete prod").await;
    assert_eq!(reply, vec!["Deleted Grafana instance prod for #ops"]);

    let (status, _) = h.post_alert(&token, r#"{"state":"ok"}"#).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_chat_failure_is_internal_error() {
    let h = harness_with_status(500).await;
    let reply = h.command("grafana add prod").await;
    assert!(reply[0].starts_with("Could not post the announcement to #ops"));
    let token = h.token("prod").await;

    let (status, body) = h.post_alert(&token, r#"{"state":"ok","title":"t"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Error.");
}

#[tokio::test]
async fn test_health_counts_instances() {
    let h = harness().await;
    h.command("grafana add prod").await;
    h.command("grafana add staging --room #dev").await;

    let response = h
        .server
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let health: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["instances"], 2);
}
