use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const RESTART_TIMEOUT: Duration = Duration::from_secs(15);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Ask the host to restart itself. Fire-and-forget: a non-zero exit or a
/// timeout is logged and otherwise ignored; the config we just wrote
/// takes effect whenever the host next comes up.
pub fn request_host_restart(command: &[String]) {
    let Some((program, args)) = command.split_first() else {
        warn!("restart command is empty, skipping");
        return;
    };

    info!(command = %command.join(" "), "requesting host restart");
    let spawned = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            warn!(%err, "failed to spawn host restart command");
            return;
        }
    };

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    warn!(%status, "host restart command exited non-zero");
                }
                return;
            }
            Ok(None) => {
                if start.elapsed() > RESTART_TIMEOUT {
                    warn!("host restart command timed out, leaving it running");
                    return;
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                warn!(%err, "failed to poll host restart command");
                return;
            }
        }
    }
}
