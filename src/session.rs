//! The Session state machine: Naming → Active → Terminated.
//!
//! A Session is exclusively owned by its worker thread for mutation; the
//! registries only ever hold a cloned `Arc<Session>` for lookup and
//! fan-out, never for lifetime ownership. `username` and `current_room`
//! are wrapped in their own mutexes because other threads (room
//! broadcast, the transfer worker, shutdown) read them while this
//! session's own worker keeps running, but per design note 9(a) the
//! username is written exactly once, by the owning worker, before the
//! session is ever inserted into a registry.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, instrument, warn};

use crate::events::Tag;
use crate::messages;
use crate::protocol::{self, Command};
use crate::server::ServerContext;

pub struct Session {
    pub id: u64,
    pub peer_addr: SocketAddr,
    write_half: Mutex<TcpStream>,
    pub username: Mutex<String>,
    pub current_room: Mutex<String>,
    active: AtomicBool,
}

pub type SessionHandle = Arc<Session>;

impl Session {
    /// `write_half` should be a handle to the same socket the caller will
    /// build a `BufReader` from (e.g. via `TcpStream::try_clone`).
    fn new(id: u64, peer_addr: SocketAddr, write_half: TcpStream) -> Self {
        Session {
            id,
            peer_addr,
            write_half: Mutex::new(write_half),
            username: Mutex::new(String::new()),
            current_room: Mutex::new(String::new()),
            active: AtomicBool::new(true),
        }
    }

    pub fn username(&self) -> String {
        self.username.lock().unwrap().clone()
    }

    pub fn current_room(&self) -> String {
        self.current_room.lock().unwrap().clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Best-effort line send. A failing recipient is never fatal to the
    /// caller; it will be reaped by its own worker's next I/O error.
    pub fn send_line(&self, line: &str) -> io::Result<()> {
        let mut w = self.write_half.lock().unwrap();
        w.write_all(line.as_bytes())
    }

    fn close(&self) {
        self.active.store(false, Ordering::Release);
        let w = self.write_half.lock().unwrap();
        let _ = w.shutdown(Shutdown::Both);
    }
}

/// Drive one connection end to end. Runs on its own thread, spawned by
/// the Acceptor. Cleanup runs exactly once, whatever the exit path.
#[instrument(skip_all, fields(cid = conn_id))]
pub fn run(ctx: Arc<ServerContext>, stream: TcpStream, conn_id: u64) {
    let peer_addr = match stream.peer_addr() {
        Ok(a) => a,
        Err(e) => {
            warn!("could not read peer addr: {:?}", e);
            ctx.release_session_slot();
            return;
        }
    };

    let write_half = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            warn!("could not clone session stream: {:?}", e);
            ctx.release_session_slot();
            return;
        }
    };
    let session = Arc::new(Session::new(conn_id, peer_addr, write_half));

    let mut reader = BufReader::new(stream);

    let registered = naming_loop(&ctx, &session, &mut reader);
    if registered {
        active_loop(&ctx, &session, &mut reader);
    }

    teardown(&ctx, &session);
}

/// Returns true if a username was successfully registered (Active state
/// reached), false if the peer hung up during Naming.
fn naming_loop(ctx: &Arc<ServerContext>, session: &SessionHandle, reader: &mut BufReader<TcpStream>) -> bool {
    loop {
        if session.send_line(messages::USERNAME_PROMPT).is_err() {
            return false;
        }

        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => return false, // peer closed before naming
            Ok(_) => {}
            Err(_) => return false,
        }
        let name = trim_line(&line);

        if !protocol::is_valid_username(name) {
            let _ = session.send_line(messages::ERR_INVALID_USERNAME);
            continue;
        }

        if !ctx.users.insert_if_absent(name, Arc::clone(session)) {
            let _ = session.send_line(messages::ERR_USERNAME_TAKEN);
            ctx.events.log(Tag::Rejected, format!("username '{name}' already taken"));
            continue;
        }

        *session.username.lock().unwrap() = name.to_string();
        info!("session {} registered as '{}'", session.id, name);
        ctx.events.log(Tag::Login, format!("'{name}' connected from {}", session.peer_addr));

        let _ = session.send_line(messages::SUCCESS_CONNECTED);
        let _ = session.send_line(messages::COMMAND_SUMMARY);
        return true;
    }
}

fn active_loop(ctx: &Arc<ServerContext>, session: &SessionHandle, reader: &mut BufReader<TcpStream>) {
    loop {
        if !session.is_active() {
            return;
        }

        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => return, // peer closed
            Ok(_) => {}
            Err(e) => {
                warn!("read error on session {}: {:?}", session.id, e);
                return;
            }
        }
        let line = trim_line(&line);

        match protocol::parse(line) {
            None => continue, // blank line, ignored
            Some(Err(())) => {
                let _ = session.send_line(messages::ERR_UNKNOWN_COMMAND);
            }
            Some(Ok(cmd)) => {
                if dispatch(ctx, session, cmd) == Dispatch::Exit {
                    return;
                }
            }
        }
    }
}

#[derive(PartialEq, Eq)]
enum Dispatch {
    Continue,
    Exit,
}

fn dispatch(ctx: &Arc<ServerContext>, session: &SessionHandle, cmd: Command) -> Dispatch {
    match cmd {
        Command::Join { room } => {
            ctx.rooms.join(&ctx.events, session, &room);
            Dispatch::Continue
        }
        Command::Leave => {
            if session.current_room().is_empty() {
                let _ = session.send_line(messages::ERR_NOT_IN_ROOM);
            } else {
                ctx.rooms.leave(&ctx.events, session);
            }
            Dispatch::Continue
        }
        Command::Broadcast { msg } => {
            if session.current_room().is_empty() {
                let _ = session.send_line(messages::ERR_NOT_IN_ROOM);
            } else {
                ctx.rooms.broadcast(&ctx.events, session, &msg);
            }
            Dispatch::Continue
        }
        Command::Whisper { user, msg } => {
            ctx.users.whisper(&ctx.events, session, &user, &msg);
            Dispatch::Continue
        }
        Command::SendFile { path, user } => {
            crate::upload::handle_sendfile(ctx, session, &path, &user);
            Dispatch::Continue
        }
        Command::Exit => {
            let _ = session.send_line(messages::INFO_GOODBYE);
            Dispatch::Exit
        }
    }
}

fn teardown(ctx: &Arc<ServerContext>, session: &SessionHandle) {
    let username = session.username();

    if !session.current_room().is_empty() {
        ctx.rooms.leave(&ctx.events, session);
    }

    if !username.is_empty() {
        ctx.users.remove(&username);
    }

    session.close();
    ctx.release_session_slot();

    if !username.is_empty() {
        ctx.events.log(Tag::Disconnect, format!("'{username}' disconnected"));
    }
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}
