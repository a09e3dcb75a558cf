//! The session tracker: connections, their outbound queues, and the
//! broadcast group for each room.
//!
//! # Concurrency note
//!
//! `SessionTracker` is NOT thread-safe by itself; it uses plain
//! `HashMap`s, not concurrent ones. The dispatcher owns it behind a
//! single async lock, and enqueueing an event under that lock is cheap
//! (an unbounded channel send never blocks). Socket writes happen later,
//! on each connection's writer task, outside the lock.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;

use parlor_protocol::{ConnectionId, RoomCode, ServerEvent};

/// Sender half of one connection's outbound event queue.
///
/// The receiver half lives on the connection's writer task, which encodes
/// each event and pushes it down the socket.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Bookkeeping for one live connection.
struct ConnectionEntry {
    sender: EventSender,
    /// Rooms whose broadcasts this connection receives.
    codes: HashSet<RoomCode>,
}

/// Tracks live connections and per-room broadcast groups.
///
/// The two maps index the same membership from both sides and are kept
/// in sync: `connections[id].codes` contains `code` exactly when
/// `groups[code]` contains `id`.
pub struct SessionTracker {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    groups: HashMap<RoomCode, HashSet<ConnectionId>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    /// Registers a connection's outbound queue. Called once per
    /// connection, at accept time, before any command is dispatched.
    pub fn register(&mut self, id: ConnectionId, sender: EventSender) {
        tracing::debug!(%id, "connection registered");
        self.connections.insert(
            id,
            ConnectionEntry {
                sender,
                codes: HashSet::new(),
            },
        );
    }

    /// Adds a connection to a room's broadcast group. Unknown connections
    /// are ignored; membership requires a registered queue.
    pub fn join_group(&mut self, id: &ConnectionId, code: &RoomCode) {
        let Some(entry) = self.connections.get_mut(id) else {
            tracing::warn!(%id, %code, "join_group for unregistered connection");
            return;
        };
        entry.codes.insert(code.clone());
        self.groups
            .entry(code.clone())
            .or_default()
            .insert(id.clone());
    }

    /// Forgets a connection and strips it from every group it was in.
    /// Returns the codes of those groups so the caller can react to the
    /// departure room by room.
    pub fn remove_connection(&mut self, id: &ConnectionId) -> Vec<RoomCode> {
        let Some(entry) = self.connections.remove(id) else {
            return Vec::new();
        };
        tracing::debug!(%id, "connection removed");
        for code in &entry.codes {
            if let Some(members) = self.groups.get_mut(code) {
                members.remove(id);
                if members.is_empty() {
                    self.groups.remove(code);
                }
            }
        }
        entry.codes.into_iter().collect()
    }

    /// Dissolves a room's broadcast group without touching the members'
    /// queues. Returns the former members.
    pub fn remove_group(&mut self, code: &RoomCode) -> Vec<ConnectionId> {
        let Some(members) = self.groups.remove(code) else {
            return Vec::new();
        };
        for id in &members {
            if let Some(entry) = self.connections.get_mut(id) {
                entry.codes.remove(code);
            }
        }
        members.into_iter().collect()
    }

    /// Queues an event for one connection. A closed queue means the
    /// connection is mid-teardown; the event is dropped silently.
    pub fn send_to(&self, id: &ConnectionId, event: ServerEvent) {
        let Some(entry) = self.connections.get(id) else {
            tracing::debug!(%id, "send_to unknown connection, event dropped");
            return;
        };
        if entry.sender.send(event).is_err() {
            tracing::debug!(%id, "event dropped, queue closed");
        }
    }

    /// Queues an event for every member of a room's group. Returns how
    /// many queues accepted it.
    pub fn broadcast(&self, code: &RoomCode, event: ServerEvent) -> usize {
        let Some(members) = self.groups.get(code) else {
            return 0;
        };
        let mut delivered = 0;
        for id in members {
            if let Some(entry) = self.connections.get(id) {
                if entry.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Members of a room's broadcast group, in no particular order.
    pub fn members(&self, code: &RoomCode) -> Vec<ConnectionId> {
        self.groups
            .get(code)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// True when no connection is left in the room's group.
    pub fn group_is_empty(&self, code: &RoomCode) -> bool {
        self.groups.get(code).is_none_or(HashSet::is_empty)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId(id.into())
    }

    fn code(c: &str) -> RoomCode {
        RoomCode::new(c)
    }

    /// Distinguishable event payloads without building a whole room.
    fn event(msg: &str) -> ServerEvent {
        ServerEvent::Error {
            message: msg.into(),
        }
    }

    fn register(tracker: &mut SessionTracker, id: &str) -> UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        tracker.register(conn(id), tx);
        rx
    }

    #[test]
    fn test_send_to_delivers_to_registered_connection() {
        let mut tracker = SessionTracker::new();
        let mut rx = register(&mut tracker, "c1");

        tracker.send_to(&conn("c1"), event("hello"));

        assert_eq!(rx.try_recv().unwrap(), event("hello"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_to_unknown_connection_is_a_no_op() {
        let tracker = SessionTracker::new();
        tracker.send_to(&conn("ghost"), event("hello"));
    }

    #[test]
    fn test_send_to_closed_queue_is_a_no_op() {
        let mut tracker = SessionTracker::new();
        let rx = register(&mut tracker, "c1");
        drop(rx);

        tracker.send_to(&conn("c1"), event("hello"));
    }

    #[test]
    fn test_broadcast_reaches_only_group_members() {
        let mut tracker = SessionTracker::new();
        let mut rx1 = register(&mut tracker, "c1");
        let mut rx2 = register(&mut tracker, "c2");
        let mut rx3 = register(&mut tracker, "c3");
        tracker.join_group(&conn("c1"), &code("AB12CD"));
        tracker.join_group(&conn("c2"), &code("AB12CD"));

        let delivered = tracker.broadcast(&code("AB12CD"), event("update"));

        assert_eq!(delivered, 2);
        assert_eq!(rx1.try_recv().unwrap(), event("update"));
        assert_eq!(rx2.try_recv().unwrap(), event("update"));
        assert!(rx3.try_recv().is_err(), "non-member must not hear the broadcast");
    }

    #[test]
    fn test_broadcast_to_unknown_group_reaches_no_one() {
        let tracker = SessionTracker::new();
        assert_eq!(tracker.broadcast(&code("ZZZZZZ"), event("update")), 0);
    }

    #[test]
    fn test_broadcast_skips_closed_queues() {
        let mut tracker = SessionTracker::new();
        let rx1 = register(&mut tracker, "c1");
        let mut rx2 = register(&mut tracker, "c2");
        tracker.join_group(&conn("c1"), &code("AB12CD"));
        tracker.join_group(&conn("c2"), &code("AB12CD"));
        drop(rx1);

        let delivered = tracker.broadcast(&code("AB12CD"), event("update"));

        assert_eq!(delivered, 1);
        assert_eq!(rx2.try_recv().unwrap(), event("update"));
    }

    #[test]
    fn test_join_group_requires_registration() {
        let mut tracker = SessionTracker::new();
        tracker.join_group(&conn("ghost"), &code("AB12CD"));

        assert!(tracker.group_is_empty(&code("AB12CD")));
        assert!(tracker.members(&code("AB12CD")).is_empty());
    }

    #[test]
    fn test_remove_connection_returns_joined_codes_and_prunes_groups() {
        let mut tracker = SessionTracker::new();
        let _rx1 = register(&mut tracker, "c1");
        let _rx2 = register(&mut tracker, "c2");
        tracker.join_group(&conn("c1"), &code("AAAAAA"));
        tracker.join_group(&conn("c1"), &code("BBBBBB"));
        tracker.join_group(&conn("c2"), &code("AAAAAA"));

        let mut codes = tracker.remove_connection(&conn("c1"));
        codes.sort();

        assert_eq!(codes, vec![code("AAAAAA"), code("BBBBBB")]);
        assert_eq!(tracker.members(&code("AAAAAA")), vec![conn("c2")]);
        assert!(
            tracker.group_is_empty(&code("BBBBBB")),
            "sole member left, group must dissolve"
        );
        assert_eq!(tracker.connection_count(), 1);
    }

    #[test]
    fn test_remove_connection_unknown_returns_empty() {
        let mut tracker = SessionTracker::new();
        assert!(tracker.remove_connection(&conn("ghost")).is_empty());
    }

    #[test]
    fn test_removed_connection_hears_nothing_more() {
        let mut tracker = SessionTracker::new();
        let mut rx = register(&mut tracker, "c1");
        tracker.join_group(&conn("c1"), &code("AB12CD"));
        tracker.remove_connection(&conn("c1"));

        tracker.broadcast(&code("AB12CD"), event("update"));
        tracker.send_to(&conn("c1"), event("direct"));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_remove_group_strips_members_but_keeps_queues() {
        let mut tracker = SessionTracker::new();
        let mut rx = register(&mut tracker, "c1");
        let _rx2 = register(&mut tracker, "c2");
        tracker.join_group(&conn("c1"), &code("AB12CD"));
        tracker.join_group(&conn("c2"), &code("AB12CD"));

        let mut members = tracker.remove_group(&code("AB12CD"));
        members.sort();

        assert_eq!(members, vec![conn("c1"), conn("c2")]);
        assert!(tracker.group_is_empty(&code("AB12CD")));

        // Queues survive; only the group membership is gone.
        tracker.send_to(&conn("c1"), event("direct"));
        assert_eq!(rx.try_recv().unwrap(), event("direct"));

        let codes = tracker.remove_connection(&conn("c1"));
        assert!(codes.is_empty(), "dissolved group must not linger in codes");
    }

    #[test]
    fn test_group_is_empty_for_unknown_code() {
        let tracker = SessionTracker::new();
        assert!(tracker.group_is_empty(&code("ZZZZZZ")));
    }
}
