//! The structured event log sink (design §4.6).
//!
//! Every component hands this a tag plus a human-readable message; the
//! sink is responsible only for timestamping and serializing one line at
//! a time so that concurrent writers never interleave. Where the line
//! ultimately goes (a rotated file, stdout, a test harness's pipe) is an
//! external collaborator's concern, not this engine's.

use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use chrono::Local;

/// The fixed vocabulary of event tags the contract enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Login,
    Rejected,
    Join,
    Leave,
    Broadcast,
    Whisper,
    FileQueue,
    SendFile,
    Disconnect,
    Shutdown,
    Error,
    Server,
}

impl Tag {
    fn as_str(self) -> &'static str {
        match self {
            Tag::Login => "LOGIN",
            Tag::Rejected => "REJECTED",
            Tag::Join => "JOIN",
            Tag::Leave => "LEAVE",
            Tag::Broadcast => "BROADCAST",
            Tag::Whisper => "WHISPER",
            Tag::FileQueue => "FILE-QUEUE",
            Tag::SendFile => "SEND FILE",
            Tag::Disconnect => "DISCONNECT",
            Tag::Shutdown => "SHUTDOWN",
            Tag::Error => "ERROR",
            Tag::Server => "SERVER",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf lock: no other lock may be held while writing to the sink, and
/// the sink never acquires any other lock itself.
pub struct EventLog {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl EventLog {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        EventLog { writer: Mutex::new(writer) }
    }

    /// Record one event. Serializes to `YYYY-MM-DD HH:MM:SS - <TAG> <msg>\n`.
    pub fn log(&self, tag: Tag, msg: impl fmt::Display) {
        let line = format!("{} - {} {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"), tag, msg);
        let mut w = self.writer.lock().unwrap();
        if let Err(e) = w.write_all(line.as_bytes()) {
            tracing::warn!("failed writing event log line: {:?}", e);
        }
        let _ = w.flush();
    }
}
