//! Connection and broadcast-group tracking for Parlor.
//!
//! This crate knows which connections are alive and which rooms each one
//! can hear. It moves events, not room state:
//!
//! 1. **Outbound queues**: one sender per connection, registered at accept
//! 2. **Broadcast groups**: per-room member sets, maintained as players
//!    join and disconnect
//!
//! # How it fits in the stack
//!
//! ```text
//! Dispatcher (above)  ← decides WHO hears an event
//!     ↕
//! Session Layer (this crate)  ← owns the queues and delivers it
//!     ↕
//! Protocol Layer (below)  ← provides ConnectionId, ServerEvent
//! ```

mod tracker;

pub use tracker::{EventSender, SessionTracker};
