//! Turns Grafana webhook calls into chat notifications.

use std::sync::Arc;

use relay_chat::{Card, ChatSink};
use relay_registry::{Instance, SharedRegistry};
use tracing::{debug, error, info, warn};

use crate::colors::ColorTable;
use crate::error::{AlertError, Result};
use crate::payload::AlertPayload;
use crate::rewrite::LinkRewrite;

/// What was delivered for an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A rich card built from a structured payload.
    Card(Card),
    /// The plain fallback for payloads of unknown shape.
    Text(String),
}

/// Resolves webhook tokens to instances and relays alerts to their rooms.
#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    registry: SharedRegistry,
    sink: Arc<dyn ChatSink>,
    colors: ColorTable,
}

impl AlertDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(registry: SharedRegistry, sink: Arc<dyn ChatSink>, colors: ColorTable) -> Self {
        Self {
            registry,
            sink,
            colors,
        }
    }

    /// The registry tokens are resolved against.
    #[must_use]
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// The state→color table.
    #[must_use]
    pub const fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// Handles one webhook call.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::UnknownToken` if no instance owns `token`. Any
    /// other error means the alert was accepted but could not be relayed; it
    /// has already been logged together with the raw body.
    pub async fn handle_alert(&self, token: &str, body: &[u8]) -> Result<Delivery> {
        let instance = {
            let registry = self.registry.read().await;
            match registry.find_by_token(token) {
                Ok(instance) => instance.clone(),
                Err(_) => {
                    warn!(
                        token = %token.get(..6).unwrap_or(token),
                        "rejected alert for unknown token"
                    );
                    return Err(AlertError::UnknownToken);
                }
            }
        };

        info!(
            instance = %instance.name,
            token = %instance.token_hint(),
            "received alert"
        );

        self.relay(&instance, body).await.map_err(|e| {
            error!(
                instance = %instance.name,
                error = %e,
                payload = %String::from_utf8_lossy(body),
                "failed to process alert"
            );
            e
        })
    }

    async fn relay(&self, instance: &Instance, body: &[u8]) -> Result<Delivery> {
        match AlertPayload::parse(body) {
            Ok(payload) => {
                debug!(image = ?payload.image_url, "alert image");
                let card = build_card(instance, &payload, &self.colors);
                self.sink.send_card(&instance.room, &card).await?;
                Ok(Delivery::Card(card))
            }
            Err(AlertError::MalformedPayload { reason }) => {
                debug!(instance = %instance.name, reason = %reason, "alert body is not structured");
                let text = unknown_alert_text(instance);
                self.sink.send_text(&instance.room, &text).await?;
                Ok(Delivery::Text(text))
            }
            Err(e) => Err(e),
        }
    }
}

/// Builds the card for a structured alert.
#[must_use]
pub fn build_card(instance: &Instance, payload: &AlertPayload, colors: &ColorTable) -> Card {
    let link = match (&payload.rule_url, LinkRewrite::for_instance(instance)) {
        (Some(url), Some(rewrite)) => Some(rewrite.apply(url)),
        (url, _) => url.clone(),
    };
    let image = if instance.show_images {
        payload.image_url.clone()
    } else {
        None
    };

    Card::new(
        format!("[{}] {}", instance.name, payload.display_title()),
        colors.color_for(payload.effective_state()),
    )
    .with_body(payload.message.clone())
    .with_image(image)
    .with_link(link)
}

/// Text sent when the alert body has an unknown shape.
#[must_use]
pub fn unknown_alert_text(instance: &Instance) -> String {
    format!("Received unknown alert from Grafana {}", instance.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_chat::{MemorySink, SentMessage};
    use relay_registry::{InstanceRegistry, NewInstance, TokenGenerator};
    use test_case::test_case;

    struct Fixture {
        dispatcher: AlertDispatcher,
        sink: MemorySink,
        token: String,
    }

    async fn fixture_with(request: NewInstance, sink: MemorySink) -> Fixture {
        let registry = InstanceRegistry::in_memory(TokenGenerator::default()).into_shared();
        let token = registry.write().await.add(request).unwrap().token;
        let dispatcher =
            AlertDispatcher::new(registry, Arc::new(sink.clone()), ColorTable::default());
        Fixture {
            dispatcher,
            sink,
            token,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(NewInstance::new("prod", "#ops"), MemorySink::new()).await
    }

    fn only_card(sink: &MemorySink) -> Card {
        match sink.sent().as_slice() {
            [SentMessage::Card { room, card }] => {
                assert_eq!(room, "#ops");
                card.clone()
            }
            other => panic!("expected one card, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ok_alert_is_green_card() {
        let f = fixture().await;
        let body = br#"{"state":"ok","title":"t","message":"m"}"#;

        let delivery = f.dispatcher.handle_alert(&f.token, body).await.unwrap();

        let card = only_card(&f.sink);
        assert_eq!(delivery, Delivery::Card(card.clone()));
        assert_eq!(card.color, "green");
        assert_eq!(card.title, "[prod] t");
        assert!(card.title.contains("prod"));
        assert_eq!(card.body.as_deref(), Some("m"));
    }

    #[test_case("exploded" ; "unrecognized state")]
    #[test_case("no_data" ; "no data")]
    #[test_case("alerting" ; "alerting")]
    #[tokio::test]
    async fn test_red_states(state: &str) {
        let f = fixture().await;
        let body = format!(r#"{{"state":"{state}","title":"t"}}"#);

        f.dispatcher
            .handle_alert(&f.token, body.as_bytes())
            .await
            .unwrap();
        assert_eq!(only_card(&f.sink).color, "red");
    }

    #[tokio::test]
    async fn test_missing_fields_use_defaults() {
        let f = fixture().await;
        f.dispatcher.handle_alert(&f.token, b"{}").await.unwrap();

        let card = only_card(&f.sink);
        assert_eq!(card.title, "[prod] unknown");
        assert_eq!(card.color, "red");
        assert!(card.body.is_none());
        assert!(card.link.is_none());
    }

    #[tokio::test]
    async fn test_title_falls_back_to_state() {
        let f = fixture().await;
        f.dispatcher
            .handle_alert(&f.token, br#"{"state":"pending"}"#)
            .await
            .unwrap();

        let card = only_card(&f.sink);
        assert_eq!(card.title, "[prod] pending");
        assert_eq!(card.color, "orange");
    }

    #[tokio::test]
    async fn test_unknown_token_sends_nothing() {
        let f = fixture().await;
        for token in ["", "nope", &f.token[1..]] {
            let result = f
                .dispatcher
                .handle_alert(token, br#"{"state":"ok"}"#)
                .await;
            assert!(matches!(result, Err(AlertError::UnknownToken)));
        }
        assert!(f.sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_non_json_body_sends_fallback_text() {
        let f = fixture().await;
        let delivery = f
            .dispatcher
            .handle_alert(&f.token, b"alert! something broke")
            .await
            .unwrap();

        let expected = "Received unknown alert from Grafana prod".to_string();
        assert_eq!(delivery, Delivery::Text(expected.clone()));
        assert_eq!(
            f.sink.sent(),
            vec![SentMessage::Text {
                room: "#ops".to_string(),
                text: expected
            }]
        );
    }

    #[tokio::test]
    async fn test_link_rewrite_applied() {
        let request = NewInstance::new("prod", "#ops")
            .link_rewrite("http://grafana.internal:3000/?orgId=1", "https://grafana.example.com/?orgId=1");
        let f = fixture_with(request, MemorySink::new()).await;

        f.dispatcher
            .handle_alert(
                &f.token,
                br#"{"state":"alerting","ruleUrl":"http://grafana.internal:3000/?orgId=1&d=abc"}"#,
            )
            .await
            .unwrap();

        assert_eq!(
            only_card(&f.sink).link.as_deref(),
            Some("https://grafana.example.com/?orgId=1&d=abc")
        );
    }

    #[tokio::test]
    async fn test_empty_find_leaves_link_alone() {
        let request = NewInstance::new("prod", "#ops").link_rewrite("", "X");
        let f = fixture_with(request, MemorySink::new()).await;

        f.dispatcher
            .handle_alert(&f.token, br#"{"ruleUrl":"http://g/d"}"#)
            .await
            .unwrap();

        assert_eq!(only_card(&f.sink).link.as_deref(), Some("http://g/d"));
    }

    #[tokio::test]
    async fn test_link_passthrough_without_rewrite() {
        let f = fixture().await;
        f.dispatcher
            .handle_alert(&f.token, br#"{"ruleUrl":"http://grafana.internal/d/abc"}"#)
            .await
            .unwrap();
        assert_eq!(
            only_card(&f.sink).link.as_deref(),
            Some("http://grafana.internal/d/abc")
        );
    }

    #[tokio::test]
    async fn test_images_follow_instance_setting() {
        let body = br#"{"state":"alerting","imageUrl":"https://img/1.png"}"#;

        let shown = fixture().await;
        shown.dispatcher.handle_alert(&shown.token, body).await.unwrap();
        assert_eq!(
            only_card(&shown.sink).image.as_deref(),
            Some("https://img/1.png")
        );

        let hidden =
            fixture_with(NewInstance::new("prod", "#ops").show_images(false), MemorySink::new())
                .await;
        hidden
            .dispatcher
            .handle_alert(&hidden.token, body)
            .await
            .unwrap();
        assert!(only_card(&hidden.sink).image.is_none());
    }

    #[tokio::test]
    async fn test_delivery_failure_is_internal() {
        let f = fixture_with(NewInstance::new("prod", "#ops"), MemorySink::failing()).await;

        let card_result = f.dispatcher.handle_alert(&f.token, br#"{"state":"ok"}"#).await;
        assert!(matches!(card_result, Err(AlertError::Delivery(_))));

        let text_result = f.dispatcher.handle_alert(&f.token, b"plain").await;
        assert!(matches!(text_result, Err(ref e) if e.is_internal()));
    }

    #[tokio::test]
    async fn test_custom_colors() {
        let registry = InstanceRegistry::in_memory(TokenGenerator::default()).into_shared();
        let token = registry
            .write()
            .await
            .add(NewInstance::new("prod", "#ops"))
            .unwrap()
            .token;
        let sink = MemorySink::new();
        let colors = ColorTable::default().with("ok", "#00ff00");
        let dispatcher = AlertDispatcher::new(registry, Arc::new(sink.clone()), colors);

        dispatcher
            .handle_alert(&token, br#"{"state":"ok"}"#)
            .await
            .unwrap();
        assert_eq!(only_card(&sink).color, "#00ff00");
    }
}
