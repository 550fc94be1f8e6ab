//! chatd: a multi-user TCP chat server. `run` wires together the event
//! log, the shared server context, the Acceptor and the SIGINT handler,
//! matching the library-does-the-work / binary-does-argv-parsing split
//! the daemon crate this one is descended from uses.

pub mod consts;
pub mod events;
pub mod messages;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod signals;
pub mod upload;

use std::net::{SocketAddr, TcpListener};

use anyhow::{bail, Context};
use socket2::{Domain, Socket, Type};
use tracing::info;

use events::EventLog;
use server::ServerContext;

pub fn run(port: u16) -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    if !(consts::MIN_PORT..=consts::MAX_PORT).contains(&port) {
        bail!("port {port} is out of range ({}-{})", consts::MIN_PORT, consts::MAX_PORT);
    }

    let events = EventLog::new(Box::new(std::io::stdout()));
    let ctx = ServerContext::new(events);

    let listener = bind_listener(port).with_context(|| format!("binding to port {port}"))?;

    signals::Handler::new(ctx.clone()).spawn().context("spawning signal handler")?;

    info!("chatd listening on port {port}");
    server::serve(ctx, listener)
}

/// Binds with `SO_REUSEADDR` and a listen backlog equal to the session
/// cap (§4.1) — `std::net::TcpListener::bind` alone has no way to
/// override its platform-default backlog, so the socket is built and
/// listened on through `socket2` before being handed back as a plain
/// `std::net::TcpListener`.
fn bind_listener(port: u16) -> anyhow::Result<TcpListener> {
    let addr: SocketAddr = (std::net::Ipv4Addr::UNSPECIFIED, port).into();

    let socket = Socket::new(Domain::IPV4, Type::STREAM, None).context("creating socket")?;
    socket.set_reuse_address(true).context("setting SO_REUSEADDR")?;
    socket.bind(&addr.into()).context("binding socket")?;
    socket.listen(consts::SESSION_CAP as i32).context("listening on socket")?;
    socket.set_nonblocking(false).context("setting blocking mode")?;

    Ok(socket.into())
}
