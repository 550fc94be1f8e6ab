//! SIGINT handling (§4.7). Only SIGINT triggers graceful shutdown; other
//! signals are left at their default disposition, unlike the broader
//! `TERM_SIGNALS` group a daemon-style process would normally catch.

use std::sync::Arc;
use std::thread;

use anyhow::Context;
use signal_hook::consts::SIGINT;
use signal_hook::iterator::Signals;
use tracing::info;

use crate::server::ServerContext;

pub struct Handler {
    ctx: Arc<ServerContext>,
}

impl Handler {
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Handler { ctx }
    }

    pub fn spawn(self) -> anyhow::Result<()> {
        let mut signals = Signals::new([SIGINT]).context("registering SIGINT handler")?;

        thread::spawn(move || {
            for signal in &mut signals {
                if signal == SIGINT {
                    info!("SIGINT received, shutting down gracefully");
                    self.ctx.shutdown();
                    std::process::exit(0);
                }
            }
        });

        Ok(())
    }
}
