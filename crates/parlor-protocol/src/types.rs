//! Core types for Parlor's wire format.
//!
//! Everything here travels on the wire as JSON. Field names follow the
//! client-facing convention (camelCase), so a [`Room`] serializes with
//! `hostId`, not `host_id`.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The identity of one live connection.
///
/// Minted by the transport when a socket is accepted (`"c1"`, `"c2"`, …).
/// A connection's id doubles as its player id inside any room it joins;
/// there is no separate account identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A room's six-character join code.
///
/// Codes are case-insensitive on input and canonically uppercase inside
/// the system. Construction normalizes, and the `Deserialize` impl routes
/// through [`RoomCode::new`], so a code that arrived off the wire is
/// already uppercase by the time anything compares it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Creates a code, normalizing to uppercase.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_ascii_uppercase())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for RoomCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(RoomCode::new(raw))
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// Transitions are strictly ordered, with no skipping and no going back:
///
/// ```text
/// Waiting → Active → Ended
/// ```
///
/// - **Waiting**: Room exists, host is gathering players.
/// - **Active**: The host started the session; questions are live.
/// - **Ended**: The session finished. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Active,
    Ended,
}

impl RoomStatus {
    /// The next phase in the lifecycle, or `None` from the terminal phase.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Active),
            Self::Active => Some(Self::Ended),
            Self::Ended => None,
        }
    }

    /// Returns `true` if advancing to `target` is the valid next step.
    pub fn can_advance_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Player / Room
// ---------------------------------------------------------------------------

/// One joined participant in a room.
///
/// `id` is the player's connection id, unique within the room. Display
/// names carry no uniqueness constraint, so two Alices can share a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
}

/// The full state of one session, broadcast as-is in `state:update`.
///
/// The host's connection is not listed in `players`; it holds the room
/// open and steers the lifecycle but never appears as a joined player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: RoomCode,
    pub host_id: ConnectionId,
    /// Joined players in join order.
    pub players: Vec<Player>,
    pub status: RoomStatus,
}

impl Room {
    /// Creates an empty room in the `Waiting` phase.
    ///
    /// `host_id` is fixed here for the room's lifetime; nothing may
    /// reassign it afterwards.
    pub fn new(code: RoomCode, host_id: ConnectionId) -> Self {
        Self {
            code,
            host_id,
            players: Vec::new(),
            status: RoomStatus::Waiting,
        }
    }

    /// Returns `true` if the connection already has a player entry here.
    pub fn has_player(&self, id: &ConnectionId) -> bool {
        self.players.iter().any(|p| &p.id == id)
    }

    /// Removes the player entry for `id`, if present.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove_player(&mut self, id: &ConnectionId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| &p.id != id);
        self.players.len() != before
    }
}

// =========================================================================
// Tests
// =========================================================================
