//! HTTP download with progress reporting
//!
//! Streams the response body to disk in fixed-size chunks. Interactive runs
//! get an indicatif progress bar; CI runs get a single completion line.

use crate::{config, fsops, output};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 8192;

/// Download `url` to `dest`, creating parent directories as needed.
///
/// `label` is the display name used for progress reporting. Network and
/// filesystem errors propagate; a partially written file is left in place
/// on failure.
pub fn download(label: &str, url: &str, dest: impl AsRef<Path>) -> Result<PathBuf> {
    let dest = dest.as_ref();
    fsops::ensure_parent_dir(dest)?;

    let response = ureq::get(url)
        .call()
        .with_context(|| format!("download of {url} failed"))?;
    let total: Option<u64> = response
        .header("content-length")
        .and_then(|s| s.parse().ok());

    let mut file =
        File::create(dest).with_context(|| format!("cannot create {}", dest.display()))?;
    let mut reader = response.into_reader();

    let ci = config::is_ci();
    let bar = (!ci).then(|| match total {
        Some(total) => output::download_progress(label, total),
        None => output::spinner(&format!("downloading {label}")),
    });

    let mut buffer = [0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = reader
            .read(&mut buffer)
            .with_context(|| format!("read error while downloading {url}"))?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])
            .with_context(|| format!("write error for {}", dest.display()))?;
        written += n as u64;
        if let Some(ref bar) = bar {
            bar.set_position(written);
        }
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    if ci {
        output::detail(&format!("{label} done"));
    }

    Ok(dest.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_invalid_url_errors() {
        let temp = tempfile::tempdir().unwrap();
        let result = download("bad", "not-a-valid-url", temp.path().join("out.bin"));
        assert!(result.is_err());
    }

    // Mocked HTTP tests. wiremock runs its server on a background thread,
    // so the blocking ureq call here is fine.
    mod mock_tests {
        use super::*;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn test_download_writes_body() {
            let server = MockServer::start().await;
            let body: Vec<u8> = (0..40_000u32).map(|i| (i % 251) as u8).collect();
            Mock::given(method("GET"))
                .and(path("/blob.bin"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
                .mount(&server)
                .await;

            let temp = tempfile::tempdir().unwrap();
            let dest = temp.path().join("nested/dir/blob.bin");
            let url = format!("{}/blob.bin", server.uri());

            let path = download("blob.bin", &url, &dest).unwrap();
            assert_eq!(path, dest);
            assert_eq!(std::fs::read(&dest).unwrap(), body);
        }

        #[tokio::test]
        async fn test_download_404_errors() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/missing.bin"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;

            let temp = tempfile::tempdir().unwrap();
            let url = format!("{}/missing.bin", server.uri());
            let err = download("missing", &url, temp.path().join("out.bin")).unwrap_err();
            assert!(err.to_string().contains("download"), "err: {err:#}");
        }

        #[tokio::test]
        async fn test_download_in_ci_mode_writes_file() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/ci.bin"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ci bytes".to_vec()))
                .mount(&server)
                .await;

            // CI mode takes the no-progress-bar branch and prints the
            // single completion line instead.
            let _ci = crate::ScopedEnv::set("CI", "1");
            assert!(crate::config::is_ci());

            let temp = tempfile::tempdir().unwrap();
            let dest = temp.path().join("ci.bin");
            download("ci.bin", &format!("{}/ci.bin", server.uri()), &dest).unwrap();
            assert_eq!(std::fs::read(&dest).unwrap(), b"ci bytes");
        }

        #[tokio::test]
        async fn test_download_creates_parent_dirs() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/f"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
                .mount(&server)
                .await;

            let temp = tempfile::tempdir().unwrap();
            let dest = temp.path().join("a/b/c/f");
            download("f", &format!("{}/f", server.uri()), &dest).unwrap();
            assert!(dest.is_file());
        }
    }
}
