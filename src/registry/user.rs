//! The User registry: a name-keyed map from username to a live session
//! handle. Enforces global name uniqueness and backs whisper lookups.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::instrument;

use crate::events::{EventLog, Tag};
use crate::messages;
use crate::session::SessionHandle;

#[derive(Default)]
pub struct UserRegistry {
    inner: Mutex<HashMap<String, SessionHandle>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        UserRegistry::default()
    }

    /// Insert `name -> session` iff no entry for `name` exists yet.
    /// Returns whether the insert happened.
    #[instrument(skip_all, fields(name = name))]
    pub fn insert_if_absent(&self, name: &str, session: SessionHandle) -> bool {
        let mut map = self.inner.lock().unwrap();
        if map.contains_key(name) {
            return false;
        }
        map.insert(name.to_string(), session);
        true
    }

    pub fn remove(&self, name: &str) {
        self.inner.lock().unwrap().remove(name);
    }

    /// Look up a live session handle by username. The returned handle is
    /// a clone of the `Arc`, valid independent of the registry lock.
    pub fn lookup(&self, name: &str) -> Option<SessionHandle> {
        self.inner.lock().unwrap().get(name).cloned()
    }

    /// Send a one-to-one message, per §4.3.
    pub fn whisper(&self, events: &EventLog, sender: &SessionHandle, target: &str, msg: &str) {
        let sender_name = sender.username();
        match self.lookup(target) {
            Some(target_session) => {
                let _ = target_session.send_line(&messages::whisper_message(&sender_name, msg));
                let _ = sender.send_line(messages::SUCCESS_WHISPER_SENT);
                events.log(Tag::Whisper, format!("'{sender_name}' -> '{target}'"));
            }
            None => {
                let _ = sender.send_line(messages::ERR_USER_NOT_FOUND);
            }
        }
    }

    /// Snapshot of all currently registered sessions. Used by shutdown to
    /// notify everyone while holding the registry lock for the whole
    /// iteration, per §4.7.
    pub fn for_each_active<F: FnMut(&SessionHandle)>(&self, mut f: F) -> usize {
        let map = self.inner.lock().unwrap();
        let mut count = 0;
        for session in map.values() {
            f(session);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::{TcpListener, TcpStream};

    fn dummy_session(id: u64) -> SessionHandle {
        // loop back a real socket pair so Session can hold live TcpStreams
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        crate::session::test_support::new_session(id, server.peer_addr().unwrap(), server, client)
    }

    #[test]
    fn insert_rejects_duplicate() {
        let reg = UserRegistry::new();
        assert!(reg.insert_if_absent("alice", dummy_session(1)));
        assert!(!reg.insert_if_absent("alice", dummy_session(2)));
    }

    #[test]
    fn remove_then_lookup_misses() {
        let reg = UserRegistry::new();
        reg.insert_if_absent("bob", dummy_session(1));
        reg.remove("bob");
        assert!(reg.lookup("bob").is_none());
    }

    #[test]
    fn case_sensitive_uniqueness() {
        let reg = UserRegistry::new();
        assert!(reg.insert_if_absent("Bob", dummy_session(1)));
        assert!(reg.insert_if_absent("bob", dummy_session(2)));
    }
}
