//! # Advisory File Locking
//!
//! Cross-process mutual exclusion for the database file. Readers take a
//! shared lock, writers an exclusive lock; only other lock-aware processes
//! respect it. Holding an exclusive lock guarantees no other process holds
//! any lock on the file; holding a shared lock only excludes exclusive
//! holders.
//!
//! ## Retry Semantics
//!
//! Each attempt is non-blocking. When the lock is held elsewhere, the call
//! sleeps [`FLOCK_RETRY_INTERVAL`] and retries. A zero timeout retries
//! forever. With a non-zero timeout, the elapsed time (measured on the
//! monotonic clock, so system time changes cannot shorten or stretch the
//! deadline) is checked before each sleep; once the remaining budget is
//! smaller than one retry interval, the call fails with [`LockTimeout`]
//! instead of sleeping past the deadline.
//!
//! `LockTimeout` is surfaced as a distinguished error so a caller can
//! print "database is locked" rather than a generic I/O failure:
//!
//! ```ignore
//! if err.downcast_ref::<LockTimeout>().is_some() {
//!     eprintln!("database is locked by another process");
//! }
//! ```
//!
//! ## State Machine
//!
//! `Unlocked -> lock() -> Locked -> unlock() -> Unlocked`. A timed-out
//! lock attempt leaves the handle unlocked. There is no shared-to-exclusive
//! upgrade; a caller needing exclusivity after holding shared must unlock
//! and re-lock, managing the race window itself (e.g. under a higher-level
//! mutex). `unlock` without a prior successful `lock` is undefined.

use std::fs::File;
use std::thread;
use std::time::{Duration, Instant};

use eyre::{Result, WrapErr};
use fs2::FileExt;

/// Sleep between non-blocking lock attempts (and the minimum budget left
/// for one more attempt before a deadline fails).
pub const FLOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// A lock attempt exceeded its deadline while another holder kept the file
/// locked. Recoverable: the caller decides whether to retry with a new
/// deadline or abort.
#[derive(Debug)]
pub struct LockTimeout {
    pub exclusive: bool,
    pub timeout: Duration,
}

impl std::fmt::Display for LockTimeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "timed out waiting for {} lock on database file after {:?}",
            if self.exclusive { "exclusive" } else { "shared" },
            self.timeout
        )
    }
}

impl std::error::Error for LockTimeout {}

/// Advisory lock handle over the database's open file.
#[derive(Debug)]
pub struct FileLock<'a> {
    file: &'a File,
}

impl<'a> FileLock<'a> {
    pub fn new(file: &'a File) -> Self {
        Self { file }
    }

    /// Acquires a shared (readers) or exclusive (writers) lock, retrying
    /// while the file is held elsewhere. A zero `timeout` retries
    /// indefinitely. OS errors other than lock contention surface
    /// immediately without retry.
    pub fn lock(&self, exclusive: bool, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        let contended = fs2::lock_contended_error().raw_os_error();

        loop {
            let attempt = if exclusive {
                FileExt::try_lock_exclusive(self.file)
            } else {
                FileExt::try_lock_shared(self.file)
            };

            match attempt {
                Ok(()) => return Ok(()),
                Err(err) if err.raw_os_error() == contended => {}
                Err(err) => {
                    return Err(err).wrap_err_with(|| {
                        format!(
                            "failed to acquire {} lock on database file",
                            if exclusive { "exclusive" } else { "shared" }
                        )
                    });
                }
            }

            if !timeout.is_zero() && start.elapsed() + FLOCK_RETRY_INTERVAL > timeout {
                return Err(eyre::Report::new(LockTimeout { exclusive, timeout }));
            }

            thread::sleep(FLOCK_RETRY_INTERVAL);
        }
    }

    /// Releases the lock held on the file descriptor.
    pub fn unlock(&self) -> Result<()> {
        FileExt::unlock(self.file).wrap_err("failed to release lock on database file")
    }
}
