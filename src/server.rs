//! The Acceptor and the shared `ServerContext` that every connection
//! worker, the Transfer worker, and the signal handler all hold a
//! reference to.

use std::net::TcpListener;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{error, info, instrument};

use crate::consts;
use crate::events::{EventLog, Tag};
use crate::messages;
use crate::registry::{RoomRegistry, UserRegistry};
use crate::session;
use crate::upload::{TransferWorker, UploadQueue};

/// Everything a connection worker needs, bundled so it can be handed to
/// `thread::spawn` as a single `Arc`.
pub struct ServerContext {
    pub users: UserRegistry,
    pub rooms: RoomRegistry,
    pub upload: UploadQueue,
    pub events: EventLog,
    next_conn_id: AtomicU64,
    session_slots: AtomicUsize,
}

impl ServerContext {
    pub fn new(events: EventLog) -> Arc<Self> {
        Arc::new(ServerContext {
            users: UserRegistry::new(),
            rooms: RoomRegistry::new(),
            upload: UploadQueue::new(),
            events,
            next_conn_id: AtomicU64::new(1),
            session_slots: AtomicUsize::new(0),
        })
    }

    /// Attempt to reserve one of `SESSION_CAP` concurrent session slots.
    /// Returns false if the server is already at capacity (§4.1).
    fn try_reserve_session_slot(&self) -> bool {
        let mut current = self.session_slots.load(Ordering::Acquire);
        loop {
            if current >= consts::SESSION_CAP {
                return false;
            }
            match self.session_slots.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn release_session_slot(&self) {
        self.session_slots.fetch_sub(1, Ordering::AcqRel);
    }

    /// Notify every active session, log the shutdown event, and wake the
    /// Transfer worker, per §4.7.
    pub fn shutdown(&self) {
        let count = self.users.for_each_active(|s| {
            let _ = s.send_line(messages::SERVER_SHUTTING_DOWN);
        });
        self.events.log(Tag::Shutdown, format!("server shutting down, {count} session(s) notified"));
        self.upload.shutdown();
    }
}

/// Bind, start the Transfer worker, and accept connections until the
/// listener errors out (which happens once the process is exiting).
pub fn serve(ctx: Arc<ServerContext>, listener: TcpListener) -> anyhow::Result<()> {
    let local_addr = listener.local_addr();
    info!("listening on {local_addr:?}");
    ctx.events.log(Tag::Server, format!("listening on {local_addr:?}, session cap {}", consts::SESSION_CAP));

    {
        let ctx = Arc::clone(&ctx);
        thread::spawn(move || {
            TransferWorker::run(&ctx.upload, &ctx.users, &ctx.events);
        });
    }

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                if !ctx.try_reserve_session_slot() {
                    use std::io::Write;
                    let mut stream = stream;
                    let _ = stream.write_all(messages::ERR_SERVER_FULL.as_bytes());
                    let _ = stream.shutdown(std::net::Shutdown::Both);
                    continue;
                }

                let conn_id = ctx.next_conn_id.fetch_add(1, Ordering::Relaxed);
                let ctx = Arc::clone(&ctx);
                thread::spawn(move || accept_one(ctx, stream, conn_id));
            }
            Err(e) => {
                error!("accept error: {:?}", e);
            }
        }
    }

    Ok(())
}

#[instrument(skip_all, fields(cid = conn_id))]
fn accept_one(ctx: Arc<ServerContext>, stream: std::net::TcpStream, conn_id: u64) {
    session::run(ctx, stream, conn_id);
}
