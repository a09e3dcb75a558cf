//! The client itself: request methods plus a background read task.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use parlor_protocol::{
    ClientCommand, Codec, ConnectionId, JsonCodec, ProtocolError, Room, RoomCode,
    ServerEvent, StateMarker,
};

use crate::ClientError;

type ClientWs = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<ClientWs, Message>;
type WsSource = SplitStream<ClientWs>;

/// One `state:update` broadcast, as delivered on the update stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUpdate {
    pub state: Room,
    pub event: Option<StateMarker>,
}

/// One WebSocket connection to a coordinator.
///
/// Requests with a direct reply (`create_room`, `join_room`) await it;
/// the rest are fire-and-forget. Broadcast `state:update` events arrive
/// on the separate stream handed out by [`connect`](Self::connect), so a
/// caller reacts to room changes without polling.
pub struct ParlorClient {
    sink: WsSink,
    replies: UnboundedReceiver<ServerEvent>,
    codec: JsonCodec,
    read_task: JoinHandle<()>,
}

impl ParlorClient {
    /// Connects to a coordinator. Returns the client and the stream of
    /// broadcasts for every room this connection ends up in.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, UnboundedReceiver<StateUpdate>), ClientError> {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(ClientError::Connect)?;
        tracing::debug!(url, "connected");

        let (sink, source) = ws.split();
        let (replies_tx, replies) = mpsc::unbounded_channel();
        let (updates_tx, updates) = mpsc::unbounded_channel();
        let read_task = tokio::spawn(read_loop(source, replies_tx, updates_tx));

        let client = Self {
            sink,
            replies,
            codec: JsonCodec,
            read_task,
        };
        Ok((client, updates))
    }

    /// Creates a room and returns its join code.
    pub async fn create_room(&mut self, host_id: &str) -> Result<RoomCode, ClientError> {
        let reply = self
            .request(&ClientCommand::CreateRoom {
                host_id: host_id.to_string(),
            })
            .await?;
        match reply {
            ServerEvent::RoomCreated { code } => Ok(code),
            ServerEvent::Error { message } => Err(ClientError::Server { message }),
            other => Err(unexpected("room:created", &other)),
        }
    }

    /// Joins a room. Returns the id the server assigned this connection
    /// and the roster as of the join.
    pub async fn join_room(
        &mut self,
        code: &RoomCode,
        name: &str,
    ) -> Result<(ConnectionId, Room), ClientError> {
        let reply = self
            .request(&ClientCommand::JoinRoom {
                code: code.clone(),
                name: name.to_string(),
            })
            .await?;
        match reply {
            ServerEvent::RoomJoined { player_id, state } => Ok((player_id, state)),
            ServerEvent::Error { message } => Err(ClientError::Server { message }),
            other => Err(unexpected("room:joined", &other)),
        }
    }

    /// Asks a room to go active. Fire-and-forget: success shows up as a
    /// `quiz:started` update on the broadcast stream.
    pub async fn start_quiz(&mut self, code: &RoomCode) -> Result<(), ClientError> {
        self.send(&ClientCommand::StartQuiz { code: code.clone() }).await
    }

    /// Submits an answer. Fire-and-forget; the server records it.
    pub async fn submit_answer(
        &mut self,
        question_id: &str,
        answer: serde_json::Value,
    ) -> Result<(), ClientError> {
        self.send(&ClientCommand::SubmitAnswer {
            question_id: question_id.to_string(),
            answer,
        })
        .await
    }

    /// Closes the connection. The server strips this client from every
    /// room and tells the remaining members.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.sink.close().await.map_err(ClientError::Send)
    }

    async fn request(&mut self, command: &ClientCommand) -> Result<ServerEvent, ClientError> {
        // Replies nobody awaited (rejections of fire-and-forget commands)
        // must not be matched with this request.
        while let Ok(stale) = self.replies.try_recv() {
            tracing::debug!(?stale, "discarding stale reply");
        }
        self.send(command).await?;
        self.replies.recv().await.ok_or(ClientError::Closed)
    }

    async fn send(&mut self, command: &ClientCommand) -> Result<(), ClientError> {
        let bytes = self.codec.encode(command)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| ProtocolError::InvalidMessage(e.to_string()))?;
        self.sink
            .send(Message::text(text))
            .await
            .map_err(ClientError::Send)
    }
}

impl Drop for ParlorClient {
    fn drop(&mut self) {
        self.read_task.abort();
    }
}

fn unexpected(wanted: &str, got: &ServerEvent) -> ClientError {
    ClientError::Protocol(ProtocolError::InvalidMessage(format!(
        "expected {wanted}, got {got:?}"
    )))
}

/// Routes inbound events: broadcasts to the update stream, everything
/// else to the reply queue. Runs until the socket or both receivers are
/// gone.
async fn read_loop(
    mut source: WsSource,
    replies: UnboundedSender<ServerEvent>,
    updates: UnboundedSender<StateUpdate>,
) {
    let codec = JsonCodec;
    while let Some(frame) = source.next().await {
        let data = match frame {
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // ping/pong
            Err(e) => {
                tracing::debug!(error = %e, "read failed, stopping");
                break;
            }
        };
        let event: ServerEvent = match codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable server frame");
                continue;
            }
        };
        let routed = match event {
            ServerEvent::StateUpdate { state, event } => {
                updates.send(StateUpdate { state, event }).is_ok()
            }
            reply => replies.send(reply).is_ok(),
        };
        if !routed {
            break;
        }
    }
}
