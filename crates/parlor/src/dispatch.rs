//! Command dispatch: the single entry point through which every room
//! mutation flows.
//!
//! One connection task at a time holds the dispatcher lock and runs a
//! command to completion: mutate the registry, then queue the replies
//! and broadcasts. Queueing into the per-connection channels is
//! synchronous, so the events for one mutation are all enqueued before
//! the lock is released. That is the whole ordering story: per room,
//! broadcasts arrive in mutation order.

use std::time::Duration;

use parlor_protocol::{
    ClientCommand, ConnectionId, RoomCode, RoomStatus, ServerEvent, StateMarker,
};
use parlor_registry::{RoomError, RoomRegistry};
use parlor_session::{EventSender, SessionTracker};

/// Routes commands to the registry and fans results out to the right
/// connections: failures go back to the requester alone, state changes
/// to the room's whole broadcast group.
pub struct Dispatcher {
    registry: RoomRegistry,
    tracker: SessionTracker,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            registry: RoomRegistry::new(),
            tracker: SessionTracker::new(),
        }
    }

    /// Registers a connection's outbound queue. Must happen before the
    /// connection's first command is dispatched.
    pub fn register_connection(&mut self, id: ConnectionId, sender: EventSender) {
        self.tracker.register(id, sender);
    }

    /// Runs one command on behalf of `requester`.
    ///
    /// A failed command is answered with an `error` event to the
    /// requester before this returns; the `Err` is handed back purely
    /// for the caller's log line. Nobody else hears about failures.
    pub fn dispatch(
        &mut self,
        requester: &ConnectionId,
        command: ClientCommand,
    ) -> Result<(), RoomError> {
        let result = match command {
            ClientCommand::CreateRoom { host_id } => {
                self.create_room(requester, &host_id)
            }
            ClientCommand::JoinRoom { code, name } => {
                self.join_room(requester, &code, name)
            }
            ClientCommand::StartQuiz { code } => self.start_quiz(requester, &code),
            ClientCommand::SubmitAnswer {
                question_id,
                answer,
            } => {
                // Answers are accepted but not scored yet.
                tracing::info!(%requester, %question_id, %answer, "answer received");
                Ok(())
            }
        };
        if let Err(e) = &result {
            self.send_error(requester, &e.to_string());
        }
        result
    }

    /// Queues an `error` event for one connection. Used by `dispatch`
    /// for failed commands and by the connection handler for payloads
    /// that never decoded into a command.
    pub fn send_error(&self, id: &ConnectionId, message: &str) {
        self.tracker.send_to(
            id,
            ServerEvent::Error {
                message: message.to_string(),
            },
        );
    }

    /// Tears down a connection that is gone: strips it from every
    /// roster, tells the remaining members, and deletes rooms whose
    /// broadcast group emptied out.
    pub fn handle_disconnect(&mut self, id: &ConnectionId) {
        let changed = self.registry.remove_player(id);
        // Leave the groups first so the departed connection is not a
        // recipient of its own departure.
        let codes = self.tracker.remove_connection(id);
        for (code, room) in changed {
            self.tracker.broadcast(
                &code,
                ServerEvent::StateUpdate {
                    state: room,
                    event: None,
                },
            );
        }
        for code in &codes {
            if self.tracker.group_is_empty(code) {
                self.registry.remove_room(code);
            }
        }
    }

    /// Reclaims rooms idle for at least `max_idle` and dissolves their
    /// broadcast groups. Returns how many rooms were swept.
    pub fn sweep(&mut self, max_idle: Duration) -> usize {
        let swept = self.registry.sweep_idle(max_idle);
        for code in &swept {
            let members = self.tracker.remove_group(code);
            if !members.is_empty() {
                tracing::debug!(
                    %code,
                    members = members.len(),
                    "swept room still had listeners"
                );
            }
        }
        swept.len()
    }

    // --- Command arms -------------------------------------------------------

    fn create_room(
        &mut self,
        requester: &ConnectionId,
        host_id: &str,
    ) -> Result<(), RoomError> {
        // Ownership is bound to the requesting connection. The id in the
        // payload is advisory only; clients cannot claim to be someone else.
        if host_id != requester.0 {
            tracing::debug!(%requester, claimed = %host_id, "client-sent host id ignored");
        }
        let room = self.registry.create_room(requester.clone())?;
        self.tracker.join_group(requester, &room.code);
        self.tracker
            .send_to(requester, ServerEvent::RoomCreated { code: room.code });
        Ok(())
    }

    fn join_room(
        &mut self,
        requester: &ConnectionId,
        code: &RoomCode,
        name: String,
    ) -> Result<(), RoomError> {
        let room = self.registry.add_player(code, requester.clone(), name)?;
        // Reply first; the group broadcast that follows reaches the
        // joiner too, once it has joined the group.
        self.tracker.send_to(
            requester,
            ServerEvent::RoomJoined {
                player_id: requester.clone(),
                state: room.clone(),
            },
        );
        self.tracker.join_group(requester, code);
        self.tracker.broadcast(
            code,
            ServerEvent::StateUpdate {
                state: room,
                event: None,
            },
        );
        Ok(())
    }

    fn start_quiz(
        &mut self,
        requester: &ConnectionId,
        code: &RoomCode,
    ) -> Result<(), RoomError> {
        let room = self
            .registry
            .set_status(code, RoomStatus::Active, requester)?;
        self.tracker.broadcast(
            code,
            ServerEvent::StateUpdate {
                state: room,
                event: Some(StateMarker::QuizStarted),
            },
        );
        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
