mod support;

use std::process::Command;
use std::time;

use support::ServerProc;

#[test]
fn sigint_notifies_sessions_and_exits_cleanly() -> anyhow::Result<()> {
    let mut server = ServerProc::new()?;

    let mut alice = server.connect()?;
    alice.register("alice")?;

    let pid = server.pid();
    Command::new("kill").arg("-INT").arg(pid.to_string()).status()?;

    alice.lines.match_re(r"\[SERVER\] Server shutting down")?;

    let exit = server.wait_with_timeout(time::Duration::from_secs(3))?;
    assert!(exit.success(), "expected a clean exit after SIGINT, got {exit:?}");

    Ok(())
}
