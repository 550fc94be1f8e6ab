//! The Room registry: name-keyed map from room name to an ordered list
//! of member sessions. Creates rooms on demand, destroys them the
//! instant they become empty, and performs best-effort broadcast
//! fan-out. A session holding this lock must never acquire the User
//! registry lock (§5) — every operation here only ever touches session
//! handles it already has in hand.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::instrument;

use crate::consts;
use crate::events::{EventLog, Tag};
use crate::messages;
use crate::protocol;
use crate::session::SessionHandle;

struct Room {
    members: Vec<SessionHandle>,
}

#[derive(Default)]
pub struct RoomRegistry {
    inner: Mutex<HashMap<String, Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        RoomRegistry::default()
    }

    /// `/join <name>`: leave any current room first, validate the name,
    /// then add to (or create) the named room.
    #[instrument(skip_all, fields(room = name))]
    pub fn join(&self, events: &EventLog, session: &SessionHandle, name: &str) {
        if !session.current_room().is_empty() {
            self.leave(events, session);
        }

        if !protocol::is_valid_room_name(name) {
            let _ = session.send_line(messages::ERR_INVALID_ROOM_NAME);
            return;
        }

        let mut rooms = self.inner.lock().unwrap();

        if let Some(room) = rooms.get_mut(name) {
            if room.members.len() >= consts::SESSION_CAP {
                let _ = session.send_line(messages::ERR_ROOM_FULL);
                return;
            }
            room.members.push(session.clone());
        } else {
            if rooms.len() >= consts::ROOM_CAP {
                let _ = session.send_line(messages::ERR_UNABLE_TO_JOIN);
                return;
            }
            rooms.insert(name.to_string(), Room { members: vec![session.clone()] });
        }

        *session.current_room.lock().unwrap() = name.to_string();
        drop(rooms);

        let _ = session.send_line(&messages::join_success(name));
        events.log(Tag::Join, format!("'{}' joined '{name}'", session.username()));
    }

    /// `/leave`: splice the session out of its current room, preserving
    /// the order of the remaining members; deactivate an empty room in
    /// the same critical section.
    #[instrument(skip_all)]
    pub fn leave(&self, events: &EventLog, session: &SessionHandle) {
        let name = session.current_room();
        if name.is_empty() {
            return;
        }

        let mut rooms = self.inner.lock().unwrap();
        if let Some(room) = rooms.get_mut(&name) {
            room.members.retain(|m| m.id != session.id);
            if room.members.is_empty() {
                rooms.remove(&name);
            }
        }
        drop(rooms);

        *session.current_room.lock().unwrap() = String::new();

        let _ = session.send_line(&messages::leave_success(&name));
        events.log(Tag::Leave, format!("'{}' left '{name}'", session.username()));
    }

    /// `/broadcast <msg>`: fan out to every other member of the sender's
    /// room. A per-recipient send failure never aborts the fan-out —
    /// the doomed recipient will be reaped by its own worker's I/O error.
    #[instrument(skip_all)]
    pub fn broadcast(&self, events: &EventLog, sender: &SessionHandle, msg: &str) {
        let name = sender.current_room();
        if name.is_empty() {
            let _ = sender.send_line(messages::ERR_NOT_IN_ROOM);
            return;
        }

        let sender_name = sender.username();
        let line = messages::room_message(&name, &sender_name, msg);

        let rooms = self.inner.lock().unwrap();
        if let Some(room) = rooms.get(&name) {
            for member in &room.members {
                if member.id == sender.id {
                    continue;
                }
                let _ = member.send_line(&line);
            }
        }
        drop(rooms);

        let _ = sender.send_line(messages::SUCCESS_BROADCAST);
        events.log(Tag::Broadcast, format!("'{sender_name}' in '{name}': {msg}"));
    }
}
