//! Cloud-storage batch upload wrapper
//!
//! Thin subprocess wrapper around the vendored upload tool. Credentials are
//! passed through environment variables, never argv.

use crate::exec::Exec;
use crate::{output, project};
use anyhow::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";

fn uploader_path() -> PathBuf {
    project::source_root().join("vendor/boto-upload/bin/s3put")
}

fn upload_args(bucket: &str, prefix: &Path, key_prefix: &str, files: &[PathBuf]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--bucket".into(),
        bucket.into(),
        "--prefix".into(),
        prefix.into(),
        "--key_prefix".into(),
        key_prefix.into(),
        "--grant".into(),
        "public-read".into(),
    ];
    args.extend(files.iter().map(|f| f.as_os_str().to_os_string()));
    args
}

/// Upload `files` to a storage bucket with public-read access.
///
/// `prefix` is the local path prefix stripped from each file; `key_prefix`
/// is prepended to the resulting object keys. Upload tool failures
/// propagate with the captured tool output.
pub fn s3put(
    bucket: &str,
    access_key: &str,
    secret_key: &str,
    prefix: &Path,
    key_prefix: &str,
    files: &[PathBuf],
) -> Result<()> {
    output::status(&format!(
        "uploading {} files to {bucket}/{key_prefix}",
        files.len()
    ));
    Exec::new(uploader_path())
        .args(upload_args(bucket, prefix, key_prefix, files))
        .env(ACCESS_KEY_VAR, access_key)
        .env(SECRET_KEY_VAR, secret_key)
        .run_capture()
        .map(|_| ())
}
