//! PID file lock held for the lifetime of a daemonized process.

use anyhow::{Context, anyhow};
use std::path::Path;

/// An acquired PID file. Released when dropped.
pub struct Lockfile(pidlock::Pidlock);

impl Lockfile {
    /// Locks `path` with the current process ID.
    ///
    /// # Errors
    ///
    /// Fails if the path is not valid UTF-8 or another live process already
    /// holds the lock.
    pub fn acquire(path: &Path) -> anyhow::Result<Self> {
        let path_str = path
            .to_str()
            .with_context(|| format!("PID file path is not valid UTF-8: {}", path.display()))?;

        let mut lock = pidlock::Pidlock::new(path_str);
        if let Err(err) = lock.acquire() {
            return Err(match lock.get_owner() {
                Some(pid) => anyhow!("PID file {path_str} is locked by running process {pid}"),
                None => anyhow!("failed to lock PID file {path_str}: {err:?}"),
            });
        }

        Ok(Self(lock))
    }
}

impl Drop for Lockfile {
    fn drop(&mut self) {
        if self.0.locked() {
            let _ = self.0.release();
        }
    }
}
