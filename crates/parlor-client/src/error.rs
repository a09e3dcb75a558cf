use parlor_protocol::ProtocolError;
use thiserror::Error;

/// Errors from the client adapter.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect failed: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("send failed: {0}")]
    Send(#[source] tokio_tungstenite::tungstenite::Error),

    /// The server answered a request with an `error` event.
    #[error("{message}")]
    Server { message: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("connection closed")]
    Closed,
}
