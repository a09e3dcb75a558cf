//! Wire protocol for Parlor.
//!
//! This crate defines the language clients and the coordinator speak:
//!
//! - **Types** ([`Room`], [`Player`], [`RoomStatus`], the id newtypes):
//!   the state that travels inside messages.
//! - **Messages** ([`ClientCommand`], [`ServerEvent`]): the closed sets
//!   of things a client may ask and a server may answer.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how messages become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong on the way.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the
//! dispatcher (room state). It knows nothing about connections or rooms
//! beyond their serialized shapes.
//!
//! ```text
//! Transport (frames) → Protocol (commands/events) → Dispatcher (rooms)
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use message::{ClientCommand, ServerEvent, StateMarker};
pub use types::{ConnectionId, Player, Room, RoomCode, RoomStatus};
