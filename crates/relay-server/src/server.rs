//! Relay server: webhook listener plus command router.

use std::net::SocketAddr;
use std::sync::Arc;

use relay_alerts::AlertDispatcher;
use relay_commands::{CommandRouter, GrafanaCommands};
use relay_registry::{InstanceRegistry, SharedRegistry};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::RelayConfig;
use crate::error::{ServerError, ServerResult};
use crate::routes::create_router;
use crate::state::AppState;

/// The assembled relay: one registry shared by the webhook endpoint and the
/// chat commands.
#[derive(Debug, Clone)]
pub struct RelayServer {
    state: Arc<AppState>,
    commands: Arc<CommandRouter>,
}

impl RelayServer {
    /// Creates a server from its parts.
    #[must_use]
    pub fn new(dispatcher: AlertDispatcher, commands: CommandRouter) -> Self {
        Self {
            state: Arc::new(AppState::new(dispatcher)),
            commands: Arc::new(commands),
        }
    }

    /// Wires up registry, chat sink, dispatcher and commands from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the persisted
    /// registry cannot be read or the chat backend cannot be created.
    pub fn from_config(config: &RelayConfig) -> ServerResult<Self> {
        config.validate()?;

        let registry = InstanceRegistry::open(&config.state_dir, config.token_generator()?)?;
        info!(
            state_dir = %config.state_dir.display(),
            instances = registry.len(),
            "loaded instance registry"
        );
        let registry = registry.into_shared();

        let sink = config.chat.build_sink()?;
        info!(sink = %sink.name(), "chat backend ready");

        let dispatcher = AlertDispatcher::new(registry.clone(), sink.clone(), config.color_table());

        let mut commands = CommandRouter::new().with_admins(config.admins.clone());
        GrafanaCommands::new(registry, sink, config.public_url.clone()).register(&mut commands);

        Ok(Self::new(dispatcher, commands))
    }

    /// Shared handler state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// The instance registry.
    #[must_use]
    pub fn registry(&self) -> SharedRegistry {
        self.state.registry().clone()
    }

    /// The chat command router.
    #[must_use]
    pub fn commands(&self) -> Arc<CommandRouter> {
        self.commands.clone()
    }

    /// Starts the webhook server and runs until a fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve(&self, addr: SocketAddr) -> ServerResult<()> {
        self.serve_with_shutdown(addr, std::future::pending()).await
    }

    /// Starts the webhook server and stops when `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve_with_shutdown<F>(&self, addr: SocketAddr, shutdown: F) -> ServerResult<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(addr, e))?;

        let local = listener.local_addr().unwrap_or(addr);
        info!(addr = %local, "webhook server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        info!("webhook server shut down");
        Ok(())
    }

    /// Creates the router without starting the server.
    pub fn router(&self) -> axum::Router {
        create_router(self.state.clone())
    }
}
