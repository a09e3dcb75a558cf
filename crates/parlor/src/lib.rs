//! # Parlor
//!
//! Session coordinator for real-time multiplayer rooms.
//!
//! A host opens a room and reads its short join code out to the players,
//! who join with the code and a display name. From then on every
//! connection in the room receives the same full-state snapshot whenever
//! anything changes, through the `waiting` → `active` → `ended`
//! lifecycle.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ParlorError> {
//!     let server = ParlorServer::builder()
//!         .bind("0.0.0.0:8080")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod config;
mod dispatch;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::ParlorError;
pub use server::{ParlorServer, ParlorServerBuilder};

pub use parlor_protocol::{
    ClientCommand, Codec, ConnectionId, JsonCodec, Player, ProtocolError, Room,
    RoomCode, RoomStatus, ServerEvent, StateMarker,
};
pub use parlor_registry::{RoomError, RoomRegistry};
pub use parlor_session::SessionTracker;
pub use parlor_transport::{
    Connection, Transport, TransportError, WebSocketConnection, WebSocketTransport,
};

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use crate::{
        ClientCommand, ConnectionId, ParlorError, ParlorServer, ParlorServerBuilder,
        Player, Room, RoomCode, RoomError, RoomStatus, ServerConfig, ServerEvent,
        StateMarker,
    };
}

/// Installs a `tracing` subscriber that reads the `RUST_LOG` environment
/// variable. Call once at startup; a second call is ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
