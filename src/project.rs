//! Project build manifest and version handling
//!
//! The build configuration is a strict TOML manifest with a `[variables]`
//! table; values are read by parsing, never by evaluating the file.
//!
//! ```toml
//! [variables]
//! version = "1.4.0"
//! product_name = "Example"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct Manifest {
    variables: BTreeMap<String, String>,
}

/// Read the `[variables]` table from a build manifest.
pub fn manifest_variables(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read manifest {}", path.display()))?;
    let manifest: Manifest =
        toml::from_str(&text).with_context(|| format!("malformed manifest {}", path.display()))?;
    Ok(manifest.variables)
}

/// The project version declared in a build manifest, with its `v` prefix.
pub fn declared_version(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let variables = manifest_variables(path)?;
    let version = variables
        .get("version")
        .with_context(|| format!("manifest {} declares no version variable", path.display()))?;
    Ok(format!("v{version}"))
}

/// Split a version string into exactly four numeric-string components.
///
/// An optional `v` prefix is stripped. Fewer than four components are
/// right-padded with `"0"`; more than four are truncated.
///
/// ```
/// use build_support::project::parse_version;
/// assert_eq!(parse_version("v1.2"), ["1", "2", "0", "0"]);
/// assert_eq!(parse_version("1.2.3.4.5"), ["1", "2", "3", "4"]);
/// ```
pub fn parse_version(version: &str) -> [String; 4] {
    let version = version.strip_prefix('v').unwrap_or(version);
    let mut components: [String; 4] = std::array::from_fn(|_| String::from("0"));
    for (slot, part) in components.iter_mut().zip(version.split('.')) {
        *slot = part.to_string();
    }
    components
}

/// Root of the source tree this build tooling serves.
///
/// The crate lives in a subdirectory of the project checkout; vendored
/// tools (LLVM, the upload scripts) are addressed relative to this root.
pub fn source_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(content: &str) -> (tempfile::TempDir, PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("project.toml");
        fs::write(&path, content).unwrap();
        (temp, path)
    }

    #[test]
    fn test_manifest_variables() {
        let (_temp, path) = write_manifest(
            r#"
[variables]
version = "1.4.0"
product_name = "Example"
"#,
        );
        let vars = manifest_variables(&path).unwrap();
        assert_eq!(vars.get("version").unwrap(), "1.4.0");
        assert_eq!(vars.get("product_name").unwrap(), "Example");
    }

    #[test]
    fn test_declared_version_has_prefix() {
        let (_temp, path) = write_manifest("[variables]\nversion = \"2.0.1\"\n");
        assert_eq!(declared_version(&path).unwrap(), "v2.0.1");
    }

    #[test]
    fn test_declared_version_missing_file_errors() {
        let err = declared_version("/no/such/manifest.toml").unwrap_err();
        assert!(err.to_string().contains("cannot read manifest"));
    }

    #[test]
    fn test_declared_version_missing_variable_errors() {
        let (_temp, path) = write_manifest("[variables]\nproduct_name = \"Example\"\n");
        let err = declared_version(&path).unwrap_err();
        assert!(err.to_string().contains("no version variable"));
    }

    #[test]
    fn test_malformed_manifest_errors() {
        let (_temp, path) = write_manifest("variables = \"not a table\"\n");
        let err = manifest_variables(&path).unwrap_err();
        assert!(err.to_string().contains("malformed manifest"));
    }

    #[test]
    fn test_parse_version_pads_short_versions() {
        assert_eq!(parse_version("v1.2"), ["1", "2", "0", "0"]);
        assert_eq!(parse_version("2.0.0"), ["2", "0", "0", "0"]);
        assert_eq!(parse_version("3"), ["3", "0", "0", "0"]);
    }

    #[test]
    fn test_parse_version_truncates_long_versions() {
        assert_eq!(parse_version("1.2.3.4.5"), ["1", "2", "3", "4"]);
        assert_eq!(parse_version("1.2.3.4"), ["1", "2", "3", "4"]);
    }

    #[test]
    fn test_parse_version_without_prefix() {
        assert_eq!(parse_version("1.2.3"), ["1", "2", "3", "0"]);
    }

    #[test]
    fn test_source_root_is_manifest_parent() {
        let root = source_root();
        assert_eq!(
            Path::new(env!("CARGO_MANIFEST_DIR")).parent().unwrap(),
            root
        );
    }
}
