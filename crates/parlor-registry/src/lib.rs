//! Room registry for Parlor.
//!
//! [`RoomRegistry`] owns the authoritative mapping from join code to room
//! state: creation, membership, the status lifecycle, and reclamation of
//! abandoned rooms. Join-code sampling lives in [`code`].

mod code;
mod error;
mod registry;

pub use code::{fresh_code, generate_code, CODE_ALPHABET, CODE_LENGTH};
pub use error::RoomError;
pub use registry::RoomRegistry;
