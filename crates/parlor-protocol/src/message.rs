//! The closed sets of messages that cross the wire.
//!
//! Inbound traffic decodes to exactly one [`ClientCommand`] variant and
//! outbound traffic encodes from exactly one [`ServerEvent`] variant; there
//! is no escape hatch for ad-hoc event names. Both enums are adjacently
//! tagged, so every frame is the same two-field JSON object:
//!
//! ```text
//! { "event": "room:join", "data": { "code": "AB12CD", "name": "Alice" } }
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{ConnectionId, Room, RoomCode};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// A command issued by a client.
///
/// Room codes decode through [`RoomCode`], so they are uppercase before any
/// handler sees them. The `host_id` on `CreateRoom` is advisory: the server
/// binds the room to the sending connection, whatever the payload claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientCommand {
    /// Open a new room. Replied to with `room:created`.
    #[serde(rename = "room:create")]
    CreateRoom {
        #[serde(rename = "hostId")]
        host_id: String,
    },

    /// Join an existing room by code. Replied to with `room:joined`,
    /// followed by a `state:update` broadcast to the whole room.
    #[serde(rename = "room:join")]
    JoinRoom { code: RoomCode, name: String },

    /// Advance the room to its active phase. Host only.
    #[serde(rename = "quiz:start")]
    StartQuiz { code: RoomCode },

    /// Submit an answer to the current question. Accepted and logged;
    /// scoring is not wired up yet, so nothing comes back.
    #[serde(rename = "answer:submit")]
    SubmitAnswer {
        #[serde(rename = "questionId")]
        question_id: String,
        answer: serde_json::Value,
    },
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Marker attached to a `state:update` when the refresh was caused by a
/// lifecycle transition rather than routine membership churn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateMarker {
    #[serde(rename = "quiz:started")]
    QuizStarted,
}

/// An event emitted by the server.
///
/// `RoomCreated`, `RoomJoined`, and `Error` go to a single requester;
/// `StateUpdate` fans out to a room's whole broadcast group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Reply to `room:create` carrying the freshly minted code.
    #[serde(rename = "room:created")]
    RoomCreated { code: RoomCode },

    /// Reply to `room:join` carrying the joiner's identity and the full
    /// room state at the moment of joining.
    #[serde(rename = "room:joined")]
    RoomJoined {
        #[serde(rename = "playerId")]
        player_id: ConnectionId,
        state: Room,
    },

    /// Full-state refresh for every member of a room's group. The `event`
    /// marker is present only on lifecycle transitions and is omitted from
    /// the JSON otherwise.
    #[serde(rename = "state:update")]
    StateUpdate {
        state: Room,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event: Option<StateMarker>,
    },

    /// Terminal failure for one request, sent to the requester only.
    #[serde(rename = "error")]
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================
