use parlor_protocol::{ConnectionId, RoomCode, RoomStatus};
use thiserror::Error;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    NotFound(RoomCode),

    #[error("only the host may do that")]
    Forbidden,

    #[error("{0} already joined room {1}")]
    AlreadyJoined(ConnectionId, RoomCode),

    #[error("room cannot move from {from} to {to}")]
    InvalidTransition { from: RoomStatus, to: RoomStatus },

    #[error("display name must not be empty")]
    InvalidName,

    #[error("could not find a free join code")]
    CodesExhausted,
}
