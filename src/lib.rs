//! Build-support helpers for project build and release scripts
//!
//! This crate is the shared toolbox used by the higher-level build tooling:
//! every helper is a small, self-contained wrapper over an OS or library
//! call. There is no engine here; build scripts call these functions
//! directly.
//!
//! # Categories
//!
//! - **config**: process-wide verbosity flag, CI-mode detection
//! - **platform**: canonical host architecture detection
//! - **scoped**: RAII guards for cwd / environment overrides, temp dirs
//! - **fsops**: rm_rf, safe_unlink, ensure_dir
//! - **exec**: subprocess execution (capturing and streaming)
//! - **download**: HTTP download with progress reporting
//! - **archive**: tar member extraction, zip extract/create
//! - **project**: build manifest parsing, version handling
//! - **upload**: cloud-storage batch upload wrapper
//! - **toolchain**: compiler environment setup, npm module installs
//!
//! # Example
//!
//! ```no_run
//! use build_support::{archive, download, scoped};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let staging = scoped::scoped_tempdir("release-")?;
//! let archive_path = staging.path().join("tools.zip");
//! download::download("tools.zip", "https://example.com/tools.zip", &archive_path)?;
//! archive::extract_zip(&archive_path, staging.path())?;
//! # Ok(())
//! # }
//! ```
//!
//! All helpers are synchronous and single-threaded. The scoped guards mutate
//! process-wide state (cwd, environment); callers must not overlap them from
//! multiple threads.

pub mod archive;
pub mod config;
pub mod download;
pub mod exec;
pub mod fsops;
pub mod output;
pub mod platform;
pub mod project;
pub mod scoped;
pub mod toolchain;
pub mod upload;

pub use exec::Exec;
pub use platform::{HostArch, host_arch};
pub use scoped::{ScopedCwd, ScopedEnv, scoped_tempdir};
