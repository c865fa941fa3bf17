//! Process-wide flags consulted by the other helpers
//!
//! Verbosity is an explicit flag set by the calling script; CI mode is
//! detected from the environment.

use std::ffi::OsStr;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable verbose mode for subprocess helpers.
///
/// When verbose, [`crate::exec`] echoes invocations and their output, and
/// npm installs run with `--verbose`.
pub fn set_verbose(on: bool) {
    VERBOSE.store(on, Ordering::Relaxed);
}

/// Whether verbose mode is enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Whether we are running under a continuous-integration environment.
///
/// CI mode switches download progress to a single completion line and makes
/// dependency-install failures non-fatal.
pub fn is_ci() -> bool {
    ci_from(std::env::var_os("CI").as_deref())
}

fn ci_from(value: Option<&OsStr>) -> bool {
    match value.and_then(OsStr::to_str) {
        Some(v) => !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"),
        None => false,
    }
}
