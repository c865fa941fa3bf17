//! Scoped mutations of process-wide state
//!
//! The working directory and the environment table are process-global, so
//! overrides are modeled as RAII guards: the prior state is captured on
//! acquisition and restored on drop, on every exit path including unwind.
//!
//! Callers must not overlap these guards from multiple threads.

use anyhow::{Context, Result};
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Guard that changes the working directory and restores it on drop.
///
/// # Example
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// {
///     let _cwd = build_support::ScopedCwd::new("/tmp")?;
///     // current dir is /tmp for the rest of this block
/// }
/// // prior working directory restored here
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ScopedCwd {
    prev: PathBuf,
}

impl ScopedCwd {
    /// Change the working directory to `path`, remembering the current one.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let prev = env::current_dir().context("cannot read current directory")?;
        env::set_current_dir(path)
            .with_context(|| format!("cannot change directory to {}", path.display()))?;
        Ok(Self { prev })
    }
}

impl Drop for ScopedCwd {
    fn drop(&mut self) {
        // Restoration is best-effort; the previous directory may be gone.
        let _ = env::set_current_dir(&self.prev);
    }
}

/// Guard that overrides an environment variable and restores it on drop.
///
/// If the variable was unset before the override it is removed again, not
/// left behind as an empty string.
#[derive(Debug)]
pub struct ScopedEnv {
    key: OsString,
    prev: Option<OsString>,
}

impl ScopedEnv {
    /// Set `key` to `value` for the lifetime of the returned guard.
    pub fn set(key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        let key = key.as_ref().to_os_string();
        let prev = env::var_os(&key);
        // SAFETY: build scripts are single-threaded; no other thread reads
        // the environment while a guard is alive (see module docs).
        unsafe { env::set_var(&key, value.as_ref()) };
        Self { key, prev }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        // SAFETY: same single-threaded contract as in `set`.
        unsafe {
            match self.prev.take() {
                Some(value) => env::set_var(&self.key, value),
                None => env::remove_var(&self.key),
            }
        }
    }
}

/// Create a fresh temp directory whose tree is removed when the handle drops.
///
/// Cleanup failures are silent; an interrupted process may leave the
/// directory behind.
pub fn scoped_tempdir(prefix: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .context("cannot create temp directory")
}
