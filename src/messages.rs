//! Byte-exact server-to-client strings. Centralized here so the wire
//! contract lives in one place instead of being sprinkled through the
//! session state machine.

pub const USERNAME_PROMPT: &str = "Enter username (max 16 chars, alphanumeric): ";
pub const ERR_INVALID_USERNAME: &str =
    "[ERROR] Invalid username. Use alphanumeric characters only.\n";
pub const ERR_USERNAME_TAKEN: &str = "[ERROR] Username already taken. Choose another.\n";
pub const SUCCESS_CONNECTED: &str = "[SUCCESS] Connected to chat server!\n";
pub const COMMAND_SUMMARY: &str = "[INFO] Commands: /join <room>, /leave, /broadcast <msg>, /whisper <user> <msg>, /sendfile <path> <user>, /exit\n";

pub const ERR_UNKNOWN_COMMAND: &str = "[ERROR] Unknown command. Type a valid command.\n";
pub const ERR_NOT_IN_ROOM: &str = "[ERROR] You are not in a room.\n";
pub const ERR_UNABLE_TO_JOIN: &str = "[ERROR] Unable to join room.\n";
pub const ERR_ROOM_FULL: &str = "[ERROR] Room is full.\n";
pub const ERR_INVALID_ROOM_NAME: &str =
    "[ERROR] Invalid room name. Use alphanumeric characters only.\n";

pub const ERR_WHISPER_USAGE: &str = "[ERROR] Usage: /whisper <user> <message>\n";
pub const ERR_USER_NOT_FOUND: &str = "[ERROR] User not found or offline.\n";
pub const SUCCESS_WHISPER_SENT: &str = "[SUCCESS] Whisper sent.\n";

pub const ERR_SENDFILE_USAGE: &str = "[ERROR] Usage: /sendfile <path> <user>\n";
pub const ERR_INVALID_FILE_TYPE: &str =
    "[ERROR] Invalid file type. Allowed: .txt, .pdf, .jpg, .png\n";
pub const ERR_TARGET_NOT_FOUND: &str = "[ERROR] Target user not found or offline.\n";
pub const ERR_FILE_UNREADABLE: &str = "[ERROR] Unable to access file.\n";
pub const ERR_FILE_TOO_LARGE: &str = "[ERROR] File exceeds size limit (3MB).\n";
pub const SUCCESS_FILE_QUEUED_IMMEDIATE: &str = "[SUCCESS] File added to upload queue.\n";
pub const INFO_QUEUE_FULL: &str = "[INFO] Upload queue full. Waiting...\n";
pub const SUCCESS_FILE_QUEUED_AFTER_WAIT: &str = "[SUCCESS] File queued for upload.\n";

pub const INFO_GOODBYE: &str = "[INFO] Goodbye!\n";
pub const ERR_SERVER_FULL: &str = "[ERROR] Server full. Try again later.\n";
pub const SERVER_SHUTTING_DOWN: &str = "[SERVER] Server shutting down. Goodbye!\n";

pub fn join_success(room: &str) -> String {
    format!("[SUCCESS] Joined room '{room}'\n")
}

pub fn leave_success(room: &str) -> String {
    format!("[SUCCESS] Left room '{room}'\n")
}

pub const SUCCESS_BROADCAST: &str = "[SUCCESS] Message broadcasted.\n";

pub fn room_message(room: &str, sender: &str, msg: &str) -> String {
    format!("[{room}] {sender}: {msg}\n")
}

pub fn whisper_message(sender: &str, msg: &str) -> String {
    format!("[WHISPER from {sender}]: {msg}\n")
}

pub fn file_received(filename: &str, sender: &str, size: u64) -> String {
    format!("[FILE] Received '{filename}' from {sender} ({size} bytes)\n")
}
