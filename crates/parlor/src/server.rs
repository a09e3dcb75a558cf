//! `ParlorServer` builder and server loop.
//!
//! This is the entry point for running a coordinator. It ties together
//! all the layers: transport → protocol → dispatch → registry.

use std::sync::Arc;

use parlor_protocol::JsonCodec;
use parlor_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::dispatch::Dispatcher;
use crate::handler::handle_connection;
use crate::{ParlorError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// dispatcher sits behind one `Mutex`; every command from every
/// connection serializes through it.
pub(crate) struct ServerState {
    pub(crate) dispatcher: Mutex<Dispatcher>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,ignore
/// use parlor::prelude::*;
///
/// let server = ParlorServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct ParlorServerBuilder {
    bind_addr: String,
    config: ServerConfig,
}

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the server configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`; text frames of JSON in
    /// both directions.
    pub async fn build(self) -> Result<ParlorServer, ParlorError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            dispatcher: Mutex::new(Dispatcher::new()),
            codec: JsonCodec,
        });

        Ok(ParlorServer {
            transport,
            state,
            config: self.config,
        })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Parlor server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
    config: ServerConfig,
}

impl ParlorServer {
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server: the accept loop plus the background sweep that
    /// reclaims idle rooms. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        tracing::info!("Parlor server running");

        let sweep_state = Arc::clone(&self.state);
        let room_ttl = self.config.room_ttl;
        let mut interval = tokio::time::interval(self.config.sweep_interval);
        tokio::spawn(async move {
            loop {
                interval.tick().await;
                let swept = sweep_state.dispatcher.lock().await.sweep(room_ttl);
                if swept > 0 {
                    tracing::info!(swept, "idle rooms reclaimed");
                }
            }
        });

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
