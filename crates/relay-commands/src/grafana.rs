//! `grafana add|list|update|delete` command handlers.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use clap::builder::BoolishValueParser;
use relay_chat::ChatSink;
use relay_registry::{InstanceUpdate, NewInstance, SharedRegistry};
use tracing::warn;

use crate::error::Result;
use crate::router::{CommandContext, CommandHandler, CommandReply, CommandRouter};

/// Shared state for the Grafana commands.
#[derive(Debug, Clone)]
pub struct GrafanaCommands {
    registry: SharedRegistry,
    sink: Arc<dyn ChatSink>,
    public_url: String,
}

impl GrafanaCommands {
    /// Creates the command set. `public_url` is the externally reachable base
    /// URL of the webhook server.
    #[must_use]
    pub fn new(registry: SharedRegistry, sink: Arc<dyn ChatSink>, public_url: impl Into<String>) -> Self {
        Self {
            registry,
            sink,
            public_url: public_url.into(),
        }
    }

    /// Registers all four commands on `router`.
    pub fn register(self, router: &mut CommandRouter) {
        let shared = Arc::new(self);
        router.register("grafana add", Arc::new(AddCommand(shared.clone())));
        router.register("grafana list", Arc::new(ListCommand(shared.clone())));
        router.register("grafana update", Arc::new(UpdateCommand(shared.clone())));
        router.register("grafana delete", Arc::new(DeleteCommand(shared)));
    }

    /// Webhook URL Grafana should call for `token`.
    #[must_use]
    pub fn webhook_url(&self, token: &str) -> String {
        format!("{}/grafana/{token}/alert", self.public_url.trim_end_matches('/'))
    }

    /// Posts `text` to `room`, returning a reply line if that failed.
    async fn announce(&self, room: &str, text: &str) -> Option<String> {
        match self.sink.send_text(room, text).await {
            Ok(()) => None,
            Err(e) => {
                warn!(room = %room, error = %e, "failed to announce to room");
                Some(format!("Could not post the announcement to {room}: {e}"))
            }
        }
    }
}

fn describe_rewrite(find: Option<&str>, replace: Option<&str>) -> String {
    format!(
        "{} --> {}",
        find.unwrap_or("None"),
        replace.unwrap_or("None")
    )
}

#[derive(Debug, Parser)]
#[command(name = "grafana add", about = "Register a Grafana instance")]
struct AddArgs {
    /// Name of the Grafana instance
    name: String,
    /// Room alerts are posted to. Defaults to the current room
    #[arg(long)]
    room: Option<String>,
    /// Attach alert images to notifications
    #[arg(long, default_value_t = true, value_parser = BoolishValueParser::new(), action = clap::ArgAction::Set)]
    show_images: bool,
    /// Text replaced in alert links. Useful if the DNS name needs massaging
    #[arg(long)]
    link_regex_find: Option<String>,
    /// Replacement for the link text
    #[arg(long)]
    link_regex_replace: Option<String>,
    /// URL of the Grafana deployment, for reference
    #[arg(long)]
    url: Option<String>,
}

struct AddCommand(Arc<GrafanaCommands>);

#[async_trait]
impl CommandHandler for AddCommand {
    fn summary(&self) -> &str {
        "Register a Grafana instance and print its webhook URL"
    }

    async fn handle(&self, ctx: &CommandContext, args: Vec<String>) -> Result<CommandReply> {
        let args = AddArgs::try_parse_from(std::iter::once("grafana add".to_string()).chain(args))?;

        let mut request = NewInstance::new(args.name, args.room.unwrap_or_else(|| ctx.room.clone()))
            .show_images(args.show_images);
        request.link_regex_find = args.link_regex_find;
        request.link_regex_replace = args.link_regex_replace;
        request.url = args.url;

        let instance = self.0.registry.write().await.add(request)?;

        let mut reply = CommandReply::default();
        if let Some(warning) = self
            .0
            .announce(
                &instance.room,
                &format!(
                    "Registered Grafana instance {} for {}",
                    instance.name, instance.room
                ),
            )
            .await
        {
            reply.push(warning);
        }

        reply.push(format!(
            "Successfully registered Grafana instance {} for `{}`. Regex replacement: {}",
            instance.name,
            instance.room,
            describe_rewrite(
                instance.link_regex_find.as_deref(),
                instance.link_regex_replace.as_deref()
            ),
        ));
        reply.push(format!(
            "Please config Grafana to call following webhook: {}",
            self.0.webhook_url(&instance.token)
        ));
        Ok(reply)
    }
}

#[derive(Debug, Parser)]
#[command(name = "grafana list", about = "List registered Grafana instances")]
struct ListArgs {}

struct ListCommand(Arc<GrafanaCommands>);

#[async_trait]
impl CommandHandler for ListCommand {
    fn summary(&self) -> &str {
        "List registered Grafana instances"
    }

    async fn handle(&self, _ctx: &CommandContext, args: Vec<String>) -> Result<CommandReply> {
        ListArgs::try_parse_from(std::iter::once("grafana list".to_string()).chain(args))?;

        let instances = self.0.registry.read().await.list();
        let mut reply = CommandReply::line(format!("{} Grafana instances found", instances.len()));
        for instance in instances {
            reply.push(format!(
                "{} in {} -> {}",
                instance.name, instance.room, instance.token
            ));
        }
        Ok(reply)
    }
}

#[derive(Debug, Parser)]
#[command(name = "grafana update", about = "Change a registered Grafana instance")]
struct UpdateArgs {
    /// Name of the Grafana instance
    name: String,
    /// Room alerts are posted to
    #[arg(long)]
    room: Option<String>,
    /// Attach alert images to notifications
    #[arg(long, value_parser = BoolishValueParser::new())]
    show_images: Option<bool>,
    /// Text replaced in alert links
    #[arg(long)]
    link_regex_find: Option<String>,
    /// Replacement for the link text
    #[arg(long)]
    link_regex_replace: Option<String>,
    /// Remove the link rewrite before applying other changes
    #[arg(long)]
    clear_link_regex: bool,
    /// URL of the Grafana deployment, for reference
    #[arg(long)]
    url: Option<String>,
}

struct UpdateCommand(Arc<GrafanaCommands>);

#[async_trait]
impl CommandHandler for UpdateCommand {
    fn summary(&self) -> &str {
        "Change room, image or link settings of a Grafana instance"
    }

    async fn handle(&self, _ctx: &CommandContext, args: Vec<String>) -> Result<CommandReply> {
        let args =
            UpdateArgs::try_parse_from(std::iter::once("grafana update".to_string()).chain(args))?;

        let update = InstanceUpdate {
            room: args.room,
            show_images: args.show_images,
            link_regex_find: args.link_regex_find,
            link_regex_replace: args.link_regex_replace,
            clear_link_regex: args.clear_link_regex,
            url: args.url,
        };
        if update.is_empty() {
            return Ok(CommandReply::line(format!(
                "Nothing to update for Grafana instance {}",
                args.name
            )));
        }

        let instance = self.0.registry.write().await.update(&args.name, update)?;
        Ok(CommandReply::line(format!(
            "Updated Grafana instance {} for `{}`. Show images: {}. Regex replacement: {}",
            instance.name,
            instance.room,
            instance.show_images,
            describe_rewrite(
                instance.link_regex_find.as_deref(),
                instance.link_regex_replace.as_deref()
            ),
        )))
    }
}

#[derive(Debug, Parser)]
#[command(name = "grafana delete", about = "Remove a registered Grafana instance")]
struct DeleteArgs {
    /// Name of the Grafana instance
    name: String,
}

struct DeleteCommand(Arc<GrafanaCommands>);

#[async_trait]
impl CommandHandler for DeleteCommand {
    fn summary(&self) -> &str {
        "Remove a Grafana instance; its webhook stops working"
    }

    async fn handle(&self, _ctx: &CommandContext, args: Vec<String>) -> Result<CommandReply> {
        let args =
            DeleteArgs::try_parse_from(std::iter::once("grafana delete".to_string()).chain(args))?;

        let room = self.0.registry.write().await.delete(&args.name)?;

        let mut reply = CommandReply::default();
        if let Some(warning) = self
            .0
            .announce(
                &room,
                &format!("Successfully deleted Grafana instance {}", args.name),
            )
            .await
        {
            reply.push(warning);
        }
        reply.push(format!(
            "Deleted Grafana instance {} for {}",
            args.name, room
        ));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_chat::{MemorySink, SentMessage};
    use relay_registry::{InstanceRegistry, TokenGenerator};

    struct Fixture {
        router: CommandRouter,
        registry: SharedRegistry,
        sink: MemorySink,
    }

    fn fixture_with(sink: MemorySink) -> Fixture {
        let registry = InstanceRegistry::in_memory(TokenGenerator::default()).into_shared();
        let mut router = CommandRouter::new();
        GrafanaCommands::new(
            registry.clone(),
            Arc::new(sink.clone()),
            "http://relay.example.com:3141/",
        )
        .register(&mut router);
        Fixture {
            router,
            registry,
            sink,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MemorySink::new())
    }

    fn ctx() -> CommandContext {
        CommandContext::new("#current", "alice")
    }

    async fn run(f: &Fixture, line: &str) -> CommandReply {
        f.router.dispatch(&ctx(), line).await
    }

    #[tokio::test]
    async fn test_add_defaults_to_current_room() {
        let f = fixture();
        let reply = run(&f, "grafana add prod").await;

        let registry = f.registry.read().await;
        let prod = registry.get("prod").unwrap();
        assert_eq!(prod.room, "#current");
        assert!(prod.show_images);

        assert_eq!(
            reply.lines,
            vec![
                "Successfully registered Grafana instance prod for `#current`. Regex replacement: None --> None".to_string(),
                format!(
                    "Please config Grafana to call following webhook: http://relay.example.com:3141/grafana/{}/alert",
                    prod.token
                ),
            ]
        );
        assert_eq!(
            f.sink.sent(),
            vec![SentMessage::Text {
                room: "#current".to_string(),
                text: "Registered Grafana instance prod for #current".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_add_with_options() {
        let f = fixture();
        run(
            &f,
            r#"grafana add prod --room '#ops' --show-images false --link-regex-find http://grafana.internal --link-regex-replace https://grafana.example.com --url https://grafana.example.com"#,
        )
        .await;

        let registry = f.registry.read().await;
        let prod = registry.get("prod").unwrap();
        assert_eq!(prod.room, "#ops");
        assert!(!prod.show_images);
        assert_eq!(prod.link_regex_find.as_deref(), Some("http://grafana.internal"));
        assert_eq!(
            prod.link_regex_replace.as_deref(),
            Some("https://grafana.example.com")
        );
        assert_eq!(prod.url.as_deref(), Some("https://grafana.example.com"));
        assert_eq!(f.sink.sent()[0].room(), "#ops");
    }

    #[tokio::test]
    async fn test_add_duplicate() {
        let f = fixture();
        run(&f, "grafana add prod --room #ops").await;
        let token = f.registry.read().await.get("prod").unwrap().token.clone();

        let reply = run(&f, "grafana add prod --room #other").await;
        assert_eq!(reply.text(), "prod already exists as Grafana instance");

        let registry = f.registry.read().await;
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("prod").unwrap().room, "#ops");
        assert_eq!(registry.get("prod").unwrap().token, token);
    }

    #[tokio::test]
    async fn test_add_without_name_is_usage_error() {
        let f = fixture();
        let reply = run(&f, "grafana add").await;
        assert!(reply.text().contains("Usage"));
        assert!(f.registry.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_with_unbalanced_paren_in_find() {
        let f = fixture();
        let reply = run(&f, "grafana add prod --link-regex-find 'http://grafana(1' --link-regex-replace x").await;
        assert!(reply.lines[0].ends_with("Regex replacement: http://grafana(1 --> x"));
        assert!(f.registry.read().await.get("prod").is_some());
    }

    #[tokio::test]
    async fn test_add_with_empty_find_has_no_rewrite() {
        let f = fixture();
        let reply = run(&f, "grafana add prod --link-regex-find '' --link-regex-replace X").await;
        assert!(reply.lines[0].ends_with("Regex replacement: None --> X"));
        assert!(f.registry.read().await.get("prod").unwrap().link_regex_find.is_none());
    }

    #[tokio::test]
    async fn test_add_announcement_failure_keeps_instance() {
        let f = fixture_with(MemorySink::failing());
        let reply = run(&f, "grafana add prod").await;

        assert!(reply.lines[0].starts_with("Could not post the announcement to #current"));
        assert_eq!(reply.lines.len(), 3);
        assert!(f.registry.read().await.get("prod").is_some());
    }

    #[tokio::test]
    async fn test_list() {
        let f = fixture();
        assert_eq!(run(&f, "grafana list").await.text(), "0 Grafana instances found");

        run(&f, "grafana add staging --room #dev").await;
        run(&f, "grafana add prod --room #ops").await;

        let registry = f.registry.read().await;
        let reply = run(&f, "grafana_list").await;
        assert_eq!(
            reply.lines,
            vec![
                "2 Grafana instances found".to_string(),
                format!("prod in #ops -> {}", registry.get("prod").unwrap().token),
                format!("staging in #dev -> {}", registry.get("staging").unwrap().token),
            ]
        );
    }

    #[tokio::test]
    async fn test_update() {
        let f = fixture();
        run(&f, "grafana add prod --room #ops").await;

        let reply = run(
            &f,
            "grafana update prod --room #alerts --show-images no --link-regex-find internal --link-regex-replace external",
        )
        .await;
        assert_eq!(
            reply.text(),
            "Updated Grafana instance prod for `#alerts`. Show images: false. Regex replacement: internal --> external"
        );

        let reply = run(&f, "grafana update prod --clear-link-regex").await;
        assert!(reply.text().ends_with("Regex replacement: None --> None"));

        let registry = f.registry.read().await;
        let prod = registry.get("prod").unwrap();
        assert_eq!(prod.room, "#alerts");
        assert!(!prod.show_images);
        assert!(prod.link_regex_find.is_none());
    }

    #[tokio::test]
    async fn test_update_nothing_and_missing() {
        let f = fixture();
        run(&f, "grafana add prod").await;

        assert_eq!(
            run(&f, "grafana update prod").await.text(),
            "Nothing to update for Grafana instance prod"
        );
        assert_eq!(
            run(&f, "grafana update ghost --room #x").await.text(),
            "ghost does not exist as Grafana instance"
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let f = fixture();
        run(&f, "grafana add prod --room #ops").await;
        f.sink.take();

        let reply = run(&f, "grafana delete prod").await;
        assert_eq!(reply.text(), "Deleted Grafana instance prod for #ops");
        assert_eq!(
            f.sink.sent(),
            vec![SentMessage::Text {
                room: "#ops".to_string(),
                text: "Successfully deleted Grafana instance prod".to_string(),
            }]
        );
        assert!(f.registry.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let f = fixture();
        run(&f, "grafana add prod").await;

        let reply = run(&f, "grafana delete ghost").await;
        assert_eq!(reply.text(), "ghost does not exist as Grafana instance");
        assert_eq!(f.registry.read().await.len(), 1);
    }

    #[test]
    fn test_webhook_url_trims_trailing_slash() {
        let commands = GrafanaCommands::new(
            InstanceRegistry::in_memory(TokenGenerator::default()).into_shared(),
            Arc::new(MemorySink::new()),
            "https://relay.example.com/",
        );
        assert_eq!(
            commands.webhook_url("abc"),
            "https://relay.example.com/grafana/abc/alert"
        );
    }
}
