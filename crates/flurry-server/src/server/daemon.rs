//! Detaching `flurryd` from its terminal.

use crate::server::lockfile::Lockfile;
use anyhow::{Context, anyhow, bail};
use std::{fs::OpenOptions, os::fd::IntoRawFd, path::Path};

/// Which side of the fork this process ended up on.
pub enum Daemonized {
    /// The launching process; it should exit.
    Parent,
    /// The detached daemon, holding its PID file.
    Child(Lockfile),
}

/// Forks into the background and locks `pid_file`.
///
/// Must run before the async runtime starts its threads. The terminal stays
/// attached until the PID file is locked, so a lock failure is reported to
/// the operator before the daemon goes quiet.
///
/// # Errors
///
/// Fails if forking fails, the PID file is already locked, or stdio cannot be
/// redirected.
pub fn daemonize(pid_file: &Path) -> anyhow::Result<Daemonized> {
    match fork::daemon(false, true) {
        Ok(fork::Fork::Child) => lock_then_detach(pid_file, detach_stdio).map(Daemonized::Child),
        Ok(fork::Fork::Parent(_)) => Ok(Daemonized::Parent),
        Err(code) => bail!("failed to daemonize: error code {code}"),
    }
}

/// Locks `pid_file`, then runs `detach`. `detach` never runs if the lock is
/// refused.
fn lock_then_detach<F>(pid_file: &Path, detach: F) -> anyhow::Result<Lockfile>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    let lock = Lockfile::acquire(pid_file)?;
    detach()?;
    Ok(lock)
}

/// Points stdin, stdout and stderr at `/dev/null`.
fn detach_stdio() -> anyhow::Result<()> {
    fork::close_fd().map_err(|code| anyhow!("failed to close stdio: error code {code}"))?;

    // With 0, 1 and 2 closed, each open takes the lowest free descriptor.
    for _ in 0..3 {
        let null = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/null")
            .context("failed to open /dev/null")?;
        let _ = null.into_raw_fd();
    }

    Ok(())
}
