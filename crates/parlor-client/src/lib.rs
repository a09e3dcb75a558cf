//! WebSocket client for the Parlor coordinator.
//!
//! [`ParlorClient`] turns the wire protocol into method calls: connect,
//! create or join a room, start the quiz, submit answers. Room
//! broadcasts are delivered out-of-band on an update stream so they
//! never tangle with request replies.
//!
//! ```no_run
//! use parlor_client::ParlorClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut client, mut updates) = ParlorClient::connect("ws://127.0.0.1:8080").await?;
//!     let code = client.create_room("my-host").await?;
//!     println!("share this code: {code}");
//!
//!     while let Some(update) = updates.recv().await {
//!         println!("{} players in the room", update.state.players.len());
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;

pub use client::{ParlorClient, StateUpdate};
pub use error::ClientError;
