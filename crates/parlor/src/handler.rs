//! Per-connection handler: registration, message routing, teardown.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task that drains the connection's event queue. The flow:
//!   1. Register an outbound queue with the dispatcher
//!   2. Loop: receive payloads → decode commands → dispatch
//!   3. On any exit, strip the connection from every room it was in

use std::sync::Arc;

use parlor_protocol::{ClientCommand, Codec, ConnectionId, JsonCodec, ServerEvent};
use parlor_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::server::ServerState;
use crate::ParlorError;

/// Drop guard that cleans up a connection's room state when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct DisconnectGuard {
    conn_id: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.dispatcher.lock().await.handle_disconnect(&conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), ParlorError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // Register the outbound queue and hand its receiving end to a writer
    // task. The dispatcher enqueues under its lock; the writer pushes
    // frames without holding anything.
    let (tx, rx) = mpsc::unbounded_channel();
    {
        let mut dispatcher = state.dispatcher.lock().await;
        dispatcher.register_connection(conn_id.clone(), tx);
    }
    let writer = tokio::spawn(write_events(conn.clone(), rx, state.codec));

    let _guard = DisconnectGuard {
        conn_id: conn_id.clone(),
        state: Arc::clone(&state),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let command: ClientCommand = match state.codec.decode(&data) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode command");
                let dispatcher = state.dispatcher.lock().await;
                dispatcher.send_error(&conn_id, "unrecognized command");
                continue;
            }
        };

        // Lock only for the dispatch, drop before the next read.
        {
            let mut dispatcher = state.dispatcher.lock().await;
            if let Err(e) = dispatcher.dispatch(&conn_id, command) {
                tracing::debug!(%conn_id, error = %e, "command rejected");
            }
        }
    }

    // _guard drops here → disconnect cleanup fires, the tracker entry is
    // removed, the queue closes, and the writer task winds down.
    drop(_guard);
    let _ = writer.await;
    Ok(())
}

/// Drains a connection's event queue onto the socket.
///
/// Runs until the queue closes (connection torn down) or a send fails
/// (peer gone). Either way the remaining events are dropped.
async fn write_events(
    conn: WebSocketConnection,
    mut rx: UnboundedReceiver<ServerEvent>,
    codec: JsonCodec,
) {
    let conn_id = conn.id();
    while let Some(event) = rx.recv().await {
        let bytes = match codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
