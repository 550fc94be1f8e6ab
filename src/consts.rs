//! Compile-time constants of the contract: caps, sizes and timings that
//! are first-class rejection paths rather than something that grows.

use std::time::Duration;

/// Maximum concurrent sessions. Exceeding this is a rejection, not a queue.
pub const SESSION_CAP: usize = 15;

/// Maximum concurrently active rooms.
pub const ROOM_CAP: usize = 10;

/// Username length bound, ASCII alphanumeric only.
pub const USERNAME_MAX_LEN: usize = 16;

/// Room name length bound, ASCII alphanumeric only.
pub const ROOM_NAME_MAX_LEN: usize = 32;

/// Upload queue capacity (number of pending FileTransfer records).
pub const UPLOAD_QUEUE_CAPACITY: usize = 5;

/// Maximum declared file size accepted by `/sendfile`.
pub const MAX_FILE_SIZE_BYTES: u64 = 3 * 1024 * 1024;

/// Maximum filename length accepted by `/sendfile`.
pub const MAX_FILENAME_LEN: usize = 255;

/// File extensions `/sendfile` will enqueue.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".txt", ".pdf", ".jpg", ".png"];

/// Simulated transfer duration. Contract-visible: it is what makes queue
/// backpressure externally observable under concurrent producers.
pub const TRANSFER_DELAY: Duration = Duration::from_secs(2);

/// Valid port range for the one positional CLI argument.
pub const MIN_PORT: u16 = 1;
pub const MAX_PORT: u16 = 10000;
