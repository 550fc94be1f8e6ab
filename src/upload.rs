//! The bounded upload queue and its single Transfer worker (§4.5).
//!
//! The contract describes two counting semaphores (`slots`, `items`)
//! plus a mutex guarding head/tail/count. A bounded channel with a
//! non-blocking `try_send` falling back to a blocking `send` on the
//! producer side, and a blocking `recv` on the single consumer side, is
//! an equivalent rendering (§9) — `crossbeam_channel::bounded` already
//! implements exactly that pair of semaphores internally, so this
//! engine builds on it directly rather than hand-rolling one.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{info, instrument, warn};

use crate::consts;
use crate::events::{EventLog, Tag};
use crate::messages;
use crate::registry::UserRegistry;
use crate::session::SessionHandle;

/// One pending file transfer. `payload` is always `None` in this engine:
/// on-disk byte storage for transferred files is an external
/// collaborator (§1), so the queue only ever carries metadata and a
/// delivery notification is all the Transfer worker sends.
#[derive(Debug, Clone)]
pub struct FileTransfer {
    pub filename: String,
    pub sender: String,
    pub receiver: String,
    pub size_bytes: u64,
    pub enqueued_at: SystemTime,
}

/// Sentinel wrapper so a shutdown can wake a consumer blocked on `recv`
/// without faking a transfer record (§4.7's "post a sentinel" step).
enum Msg {
    Transfer(FileTransfer),
    Shutdown,
}

pub struct UploadQueue {
    tx: Sender<Msg>,
    rx: Receiver<Msg>,
}

impl UploadQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(consts::UPLOAD_QUEUE_CAPACITY);
        UploadQueue { tx, rx }
    }

    /// Advisory queue depth, for the `FILE-QUEUE` log line.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Non-blocking enqueue attempt. `Ok(true)` means it went in
    /// immediately; `Ok(false)` means the queue was full and the caller
    /// should fall back to [`UploadQueue::enqueue_blocking`].
    fn try_enqueue(&self, transfer: FileTransfer) -> Result<(), FileTransfer> {
        match self.tx.try_send(Msg::Transfer(transfer)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(Msg::Transfer(t))) => Err(t),
            Err(TrySendError::Full(Msg::Shutdown)) => unreachable!(),
            Err(TrySendError::Disconnected(_)) => Ok(()), // shutting down; drop silently
        }
    }

    fn enqueue_blocking(&self, transfer: FileTransfer) {
        let _ = self.tx.send(Msg::Transfer(transfer));
    }

    /// Wake a blocked consumer so it can observe shutdown and exit.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Msg::Shutdown);
    }
}

impl Default for UploadQueue {
    fn default() -> Self {
        UploadQueue::new()
    }
}

/// `/sendfile <path> <user>` validation and enqueue, per §4.5.
#[instrument(skip_all)]
pub fn handle_sendfile(ctx: &Arc<crate::server::ServerContext>, session: &SessionHandle, path: &str, target: &str) {
    if !has_allowed_extension(path) {
        let _ = session.send_line(messages::ERR_INVALID_FILE_TYPE);
        return;
    }

    let filename = Path::new(path).file_name().and_then(|f| f.to_str()).unwrap_or(path);
    if filename.is_empty() || filename.len() > consts::MAX_FILENAME_LEN {
        let _ = session.send_line(messages::ERR_INVALID_FILE_TYPE);
        return;
    }

    if ctx.users.lookup(target).is_none() {
        let _ = session.send_line(messages::ERR_TARGET_NOT_FOUND);
        return;
    }

    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!("stat failed for '{}': {:?}", path, e);
            let _ = session.send_line(messages::ERR_FILE_UNREADABLE);
            return;
        }
    };

    if size > consts::MAX_FILE_SIZE_BYTES {
        let _ = session.send_line(messages::ERR_FILE_TOO_LARGE);
        ctx.events.log(
            Tag::Error,
            format!("'{}' rejected: '{filename}' is {size} bytes, exceeds 3MB limit", session.username()),
        );
        return;
    }

    let sender_name = session.username();
    let transfer = FileTransfer {
        filename: filename.to_string(),
        sender: sender_name.clone(),
        receiver: target.to_string(),
        size_bytes: size,
        enqueued_at: SystemTime::now(),
    };

    match ctx.upload.try_enqueue(transfer) {
        Ok(()) => {
            let _ = session.send_line(messages::SUCCESS_FILE_QUEUED_IMMEDIATE);
        }
        Err(transfer) => {
            let _ = session.send_line(messages::INFO_QUEUE_FULL);
            ctx.upload.enqueue_blocking(transfer);
            let _ = session.send_line(messages::SUCCESS_FILE_QUEUED_AFTER_WAIT);
        }
    }

    ctx.events.log(
        Tag::FileQueue,
        format!("'{sender_name}' queued '{filename}' for '{target}', queue depth {}", ctx.upload.len()),
    );
}

fn has_allowed_extension(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    consts::ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// The single Transfer worker: one consumer, strictly serialized
/// delivery in producer-commit order.
pub struct TransferWorker;

impl TransferWorker {
    #[instrument(skip_all)]
    pub fn run(queue: &UploadQueue, users: &UserRegistry, events: &EventLog) {
        loop {
            match queue.rx.recv() {
                Ok(Msg::Transfer(transfer)) => {
                    std::thread::sleep(consts::TRANSFER_DELAY);
                    deliver(&transfer, users, events);
                }
                Ok(Msg::Shutdown) | Err(_) => {
                    info!("transfer worker observed shutdown, exiting");
                    return;
                }
            }
        }
    }
}

fn deliver(transfer: &FileTransfer, users: &UserRegistry, events: &EventLog) {
    match users.lookup(&transfer.receiver) {
        Some(receiver) => {
            let line = messages::file_received(&transfer.filename, &transfer.sender, transfer.size_bytes);
            let _ = receiver.send_line(&line);
            events.log(
                Tag::SendFile,
                format!(
                    "delivered '{}' from '{}' to '{}' ({} bytes)",
                    transfer.filename, transfer.sender, transfer.receiver, transfer.size_bytes
                ),
            );
        }
        None => {
            events.log(
                Tag::SendFile,
                format!(
                    "failed to deliver '{}' from '{}' to '{}': target offline",
                    transfer.filename, transfer.sender, transfer.receiver
                ),
            );
        }
    }
}
