use std::{io, io::BufRead, time};

use anyhow::{anyhow, Context};
use regex::Regex;

const READ_TIMEOUT: time::Duration = time::Duration::from_secs(3);
const READ_SLEEP_DUR: time::Duration = time::Duration::from_millis(20);

pub struct LineMatcher<R> {
    pub out: io::BufReader<R>,
}

impl<R> LineMatcher<R>
where
    R: std::io::Read,
{
    pub fn match_re(&mut self, re: &str) -> anyhow::Result<()> {
        self.capture_re(re).map(|_| ())
    }

    /// Wait for `needle` to show up somewhere in the raw byte stream.
    /// Reads through the same buffered reader `match_re` uses, so it is
    /// safe to interleave the two on one connection. Needed for the
    /// username prompt, which the wire contract never terminates with a
    /// newline.
    pub fn expect_bytes(&mut self, needle: &str) -> anyhow::Result<()> {
        use std::io::Read;
        let start = time::Instant::now();
        let mut seen = Vec::new();
        let mut buf = [0u8; 256];
        loop {
            match self.out.read(&mut buf) {
                Ok(0) => return Err(anyhow!("expect_bytes: EOF before seeing {needle:?}")),
                Ok(n) => {
                    seen.extend_from_slice(&buf[..n]);
                    if String::from_utf8_lossy(&seen).contains(needle) {
                        return Ok(());
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if start.elapsed() > READ_TIMEOUT {
                        return Err(anyhow!("expect_bytes: timed out waiting for {needle:?}"));
                    }
                    std::thread::sleep(READ_SLEEP_DUR);
                }
                Err(e) => return Err(e).context("reading from chatd connection")?,
            }
        }
    }

    pub fn capture_re(&mut self, re: &str) -> anyhow::Result<Vec<Option<String>>> {
        let start = time::Instant::now();
        loop {
            let mut line = String::new();
            match self.out.read_line(&mut line) {
                Ok(0) => return Err(anyhow!("LineMatcher: EOF")),
                Err(e) => {
                    if e.kind() == io::ErrorKind::WouldBlock {
                        if start.elapsed() > READ_TIMEOUT {
                            return Err(io::Error::new(io::ErrorKind::TimedOut, "timed out reading line"))?;
                        }
                        std::thread::sleep(READ_SLEEP_DUR);
                        continue;
                    }
                    return Err(e).context("reading line from chatd connection")?;
                }
                Ok(_) => {
                    if line.ends_with('\n') {
                        line.pop();
                        if line.ends_with('\r') {
                            line.pop();
                        }
                    }
                }
            }

            return match Regex::new(re)?.captures(&line) {
                Some(caps) => Ok(caps.iter().map(|m| m.map(|m| String::from(m.as_str()))).collect()),
                None => Err(anyhow!("expected /{}/ to match '{}'", re, &line)),
            };
        }
    }
}
