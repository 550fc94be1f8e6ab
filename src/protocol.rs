//! The line-oriented command grammar spoken by sessions once they have
//! left the naming state. Parsing is pure and side-effect free; dispatch
//! lives in [`crate::session`].

/// A single parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join { room: String },
    Leave,
    Broadcast { msg: String },
    Whisper { user: String, msg: String },
    SendFile { path: String, user: String },
    Exit,
}

/// Parse one already-trimmed command line.
///
/// Returns `None` for a blank line (caller should silently ignore it) and
/// `Some(Err(line))` for anything that doesn't match the grammar (caller
/// emits the generic unknown-command error, echoing nothing back from the
/// line itself).
pub fn parse(line: &str) -> Option<Result<Command, ()>> {
    if line.is_empty() {
        return None;
    }

    let mut parts = line.splitn(2, ' ');
    let verb = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    let cmd = match verb {
        "/join" => {
            if rest.is_empty() {
                return Some(Err(()));
            }
            Command::Join { room: rest.to_string() }
        }
        "/leave" => Command::Leave,
        "/broadcast" => {
            if rest.is_empty() {
                return Some(Err(()));
            }
            Command::Broadcast { msg: rest.to_string() }
        }
        "/whisper" => {
            let mut wparts = rest.splitn(2, ' ');
            let user = wparts.next().unwrap_or("");
            let msg = wparts.next().unwrap_or("").trim();
            if user.is_empty() || msg.is_empty() {
                return Some(Err(()));
            }
            Command::Whisper { user: user.to_string(), msg: msg.to_string() }
        }
        "/sendfile" => {
            let mut sparts = rest.splitn(2, ' ');
            let path = sparts.next().unwrap_or("");
            let user = sparts.next().unwrap_or("").trim();
            if path.is_empty() || user.is_empty() {
                return Some(Err(()));
            }
            Command::SendFile { path: path.to_string(), user: user.to_string() }
        }
        "/exit" => Command::Exit,
        _ => return Some(Err(())),
    };

    Some(Ok(cmd))
}

/// Validate a username per the contract: 1-16 ASCII alphanumeric chars.
pub fn is_valid_username(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= crate::consts::USERNAME_MAX_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Validate a room name per the contract: 1-32 ASCII alphanumeric chars.
pub fn is_valid_room_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= crate::consts::ROOM_NAME_MAX_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric())
}
