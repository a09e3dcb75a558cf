//! The authoritative room table.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parlor_protocol::{ConnectionId, Player, Room, RoomCode, RoomStatus};

use crate::code;
use crate::RoomError;

/// One stored room plus its reclamation bookkeeping.
struct RoomEntry {
    room: Room,
    last_activity: Instant,
}

/// Owns every live room, keyed by join code.
///
/// Plain data with no interior locking. The dispatcher holds the registry
/// behind a single async lock and every mutation happens inside it, which
/// is what keeps broadcast order equal to mutation order.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomEntry>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Creates a room in the `waiting` state with a code no other live
    /// room holds, owned by `host_id`.
    pub fn create_room(&mut self, host_id: ConnectionId) -> Result<Room, RoomError> {
        let code = code::fresh_code(&mut rand::rng(), |c| self.rooms.contains_key(c))?;
        let room = Room::new(code.clone(), host_id);
        self.rooms.insert(
            code.clone(),
            RoomEntry {
                room: room.clone(),
                last_activity: Instant::now(),
            },
        );
        tracing::info!(%code, host = %room.host_id, "room created");
        Ok(room)
    }

    /// Returns a snapshot of the room at `code`.
    pub fn lookup(&self, code: &RoomCode) -> Result<Room, RoomError> {
        self.rooms
            .get(code)
            .map(|entry| entry.room.clone())
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// Adds a player to the room at `code` and returns the updated room.
    ///
    /// A connection may join a given room once; a second join with the
    /// same id is rejected without touching the roster.
    pub fn add_player(
        &mut self,
        code: &RoomCode,
        id: ConnectionId,
        name: String,
    ) -> Result<Room, RoomError> {
        if name.trim().is_empty() {
            return Err(RoomError::InvalidName);
        }
        let entry = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if entry.room.has_player(&id) {
            return Err(RoomError::AlreadyJoined(id, code.clone()));
        }
        tracing::debug!(%code, player = %id, name, "player joined");
        entry.room.players.push(Player { id, name });
        entry.last_activity = Instant::now();
        Ok(entry.room.clone())
    }

    /// Advances the room's status on behalf of `requester`.
    ///
    /// Only the host may advance a room, and only along the one-way
    /// `waiting -> active -> ended` path. The host check runs first, so a
    /// non-host asking for a legal transition still gets `Forbidden`.
    pub fn set_status(
        &mut self,
        code: &RoomCode,
        new_status: RoomStatus,
        requester: &ConnectionId,
    ) -> Result<Room, RoomError> {
        let entry = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if &entry.room.host_id != requester {
            return Err(RoomError::Forbidden);
        }
        if !entry.room.status.can_advance_to(new_status) {
            return Err(RoomError::InvalidTransition {
                from: entry.room.status,
                to: new_status,
            });
        }
        entry.room.status = new_status;
        entry.last_activity = Instant::now();
        tracing::info!(%code, status = %new_status, "room status advanced");
        Ok(entry.room.clone())
    }

    /// Strips `id` from every room it appears in and returns the changed
    /// rooms. Rooms the connection never joined are untouched.
    pub fn remove_player(&mut self, id: &ConnectionId) -> Vec<(RoomCode, Room)> {
        let mut changed = Vec::new();
        for (code, entry) in self.rooms.iter_mut() {
            if entry.room.remove_player(id) {
                tracing::debug!(%code, player = %id, "player removed");
                changed.push((code.clone(), entry.room.clone()));
            }
        }
        changed
    }

    /// Drops the room at `code`, returning its final state if it existed.
    pub fn remove_room(&mut self, code: &RoomCode) -> Option<Room> {
        let removed = self.rooms.remove(code).map(|entry| entry.room);
        if removed.is_some() {
            tracing::info!(%code, "room removed");
        }
        removed
    }

    /// Drops every room idle for at least `max_idle` and returns their
    /// codes. Creating, joining, and status changes all count as activity.
    pub fn sweep_idle(&mut self, max_idle: Duration) -> Vec<RoomCode> {
        let now = Instant::now();
        let mut swept = Vec::new();
        self.rooms.retain(|code, entry| {
            if now.duration_since(entry.last_activity) < max_idle {
                return true;
            }
            tracing::info!(%code, "idle room swept");
            swept.push(code.clone());
            false
        });
        swept
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
