#![allow(dead_code)]

use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::{env, time};

use anyhow::{anyhow, Context};

pub mod line_matcher;

pub fn cargo_dir() -> PathBuf {
    env::var_os("CARGO_BIN_PATH")
        .map(PathBuf::from)
        .or_else(|| {
            env::current_exe().ok().map(|mut path| {
                path.pop();
                if path.ends_with("deps") {
                    path.pop();
                }
                path
            })
        })
        .unwrap_or_else(|| panic!("CARGO_BIN_PATH wasn't set. Cannot continue running test"))
}

pub fn chatd_bin() -> PathBuf {
    cargo_dir().join("chatd")
}

/// A spawned `chatd <port>` subprocess, killed when it goes out of scope.
pub struct ServerProc {
    proc: Child,
    pub port: u16,
}

impl ServerProc {
    pub fn new() -> anyhow::Result<ServerProc> {
        let port = free_port().context("finding a free port")?;

        let proc = Command::new(chatd_bin())
            .arg(port.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("spawning chatd process")?;

        let mut sleep_dur = time::Duration::from_millis(5);
        let mut connected = false;
        for _ in 0..12 {
            if TcpStream::connect(("127.0.0.1", port)).is_ok() {
                connected = true;
                break;
            }
            std::thread::sleep(sleep_dur);
            sleep_dur *= 2;
        }
        if !connected {
            return Err(anyhow!("chatd never came up on port {port}"));
        }

        Ok(ServerProc { proc, port })
    }

    pub fn connect(&self) -> anyhow::Result<ChatClient> {
        let stream = TcpStream::connect(("127.0.0.1", self.port)).context("connecting to chatd")?;
        Ok(ChatClient::new(stream))
    }

    pub fn pid(&self) -> u32 {
        self.proc.id()
    }

    /// Poll for process exit, erroring out if it's still running after
    /// `timeout`.
    pub fn wait_with_timeout(&mut self, timeout: time::Duration) -> anyhow::Result<std::process::ExitStatus> {
        let start = time::Instant::now();
        loop {
            if let Some(status) = self.proc.try_wait().context("polling child status")? {
                return Ok(status);
            }
            if start.elapsed() > timeout {
                return Err(anyhow!("process did not exit within {timeout:?}"));
            }
            std::thread::sleep(time::Duration::from_millis(20));
        }
    }
}

impl Drop for ServerProc {
    fn drop(&mut self) {
        let _ = self.proc.kill();
        let _ = self.proc.wait();
    }
}

/// A connected test client: a raw stream plus a line matcher over its
/// read half.
pub struct ChatClient {
    stream: TcpStream,
    pub lines: line_matcher::LineMatcher<TcpStream>,
}

impl ChatClient {
    fn new(stream: TcpStream) -> Self {
        let read_half = stream.try_clone().expect("cloning test client stream");
        read_half.set_read_timeout(Some(time::Duration::from_millis(50))).unwrap();
        ChatClient { stream, lines: line_matcher::LineMatcher { out: BufReader::new(read_half) } }
    }

    pub fn send(&mut self, line: &str) -> anyhow::Result<()> {
        use std::io::Write;
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\n")?;
        Ok(())
    }

    /// Wait for `needle` in the raw byte stream (the username prompt has
    /// no trailing newline, so it can't go through `LineMatcher::match_re`).
    pub fn expect_bytes(&mut self, needle: &str) -> anyhow::Result<()> {
        self.lines.expect_bytes(needle)
    }

    /// Consume the username prompt and register as `name`.
    pub fn register(&mut self, name: &str) -> anyhow::Result<()> {
        self.expect_bytes("Enter username")?;
        self.register_after_prompt(name)
    }

    /// Register as `name`, assuming a prompt has already been consumed
    /// (e.g. after an invalid-username retry).
    pub fn register_after_prompt(&mut self, name: &str) -> anyhow::Result<()> {
        self.send(name)?;
        self.lines.match_re(r"\[SUCCESS\] Connected")?;
        self.lines.match_re(r"\[INFO\] Commands")?;
        Ok(())
    }
}

fn free_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
