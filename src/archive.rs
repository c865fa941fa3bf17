//! Archive helpers: tar member extraction, zip extract/create
//!
//! Tar compression is detected from the file extension. Zip handling is a
//! strategy picked at call time: on macOS the native `zip`/`unzip` tools are
//! used so symbolic links inside archives survive; everywhere else the
//! in-process `zip` crate is used.

use crate::{exec::Exec, fsops};
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How zip archives are read and written on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipStrategy {
    /// Shell out to the platform `zip`/`unzip` tools (preserves symlinks).
    NativeTool,
    /// Use the in-process zip reader/writer.
    InProcess,
}

impl ZipStrategy {
    /// Pick the strategy for the running platform.
    ///
    /// The in-process writer stores symlinks as regular files, which breaks
    /// macOS framework bundles, so macOS uses the native tools.
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            ZipStrategy::NativeTool
        } else {
            ZipStrategy::InProcess
        }
    }
}

/// Open a tar archive with its compression layer, chosen by extension.
fn open_tar_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let reader = BufReader::new(file);

    let name = path.file_name().map_or_else(String::new, |n| {
        n.to_string_lossy().to_ascii_lowercase()
    });
    let boxed: Box<dyn Read> = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Box::new(flate2::read::GzDecoder::new(reader))
    } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
        Box::new(xz2::read::XzDecoder::new(reader))
    } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
        Box::new(bzip2::read::BzDecoder::new(reader))
    } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
        Box::new(zstd::stream::read::Decoder::new(reader).context("zstd init error")?)
    } else {
        Box::new(reader)
    };
    Ok(boxed)
}

/// Extract exactly one named member from a tar archive into `dest`.
///
/// The member keeps its archive-relative path under the destination. A
/// member that is not present in the archive is an error.
pub fn extract_tar_member(archive: impl AsRef<Path>, member: &str, dest: impl AsRef<Path>) -> Result<()> {
    let archive = archive.as_ref();
    let dest = dest.as_ref();
    fsops::ensure_dir(dest)?;

    let mut tarball = tar::Archive::new(open_tar_reader(archive)?);
    for entry in tarball
        .entries()
        .with_context(|| format!("cannot read {}", archive.display()))?
    {
        let mut entry = entry.with_context(|| format!("bad entry in {}", archive.display()))?;
        let path = entry
            .path()
            .with_context(|| format!("bad entry path in {}", archive.display()))?
            .into_owned();
        if path == Path::new(member) {
            // unpack_in refuses paths that would escape dest.
            entry
                .unpack_in(dest)
                .with_context(|| format!("cannot extract {member} to {}", dest.display()))?;
            return Ok(());
        }
    }
    bail!("member {member} not found in {}", archive.display());
}

/// Extract a zip archive into `dest` using the detected platform strategy.
pub fn extract_zip(archive: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    extract_zip_with(ZipStrategy::detect(), archive.as_ref(), dest.as_ref())
}

/// Extract a zip archive into `dest` with an explicit strategy.
pub fn extract_zip_with(strategy: ZipStrategy, archive: &Path, dest: &Path) -> Result<()> {
    fsops::ensure_dir(dest)?;
    match strategy {
        ZipStrategy::NativeTool => Exec::new("unzip")
            .arg(archive)
            .arg("-d")
            .arg(dest)
            .run_capture()
            .map(|_| ()),
        ZipStrategy::InProcess => extract_zip_in_process(archive, dest),
    }
}

fn extract_zip_in_process(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).with_context(|| format!("cannot open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("cannot read zip {}", archive.display()))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .with_context(|| format!("bad zip entry in {}", archive.display()))?;

        // Entries with unsafe names (absolute, "..") are skipped.
        let Some(rel) = entry.enclosed_name() else {
            continue;
        };
        let outpath = dest.join(rel);

        if entry.is_dir() {
            fsops::ensure_dir(&outpath)?;
            continue;
        }

        fsops::ensure_parent_dir(&outpath)?;
        let mut outfile =
            File::create(&outpath).with_context(|| format!("cannot create {}", outpath.display()))?;
        io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("write error for {}", outpath.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                let _ = std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode));
            }
        }
    }
    Ok(())
}

/// Create a zip archive from a list of files and directories.
///
/// Any pre-existing file at `out` is removed first. Paths are stored with
/// the names given, so callers normally pass paths relative to the current
/// working directory. A partial archive is not rolled back on error.
pub fn make_zip(out: impl AsRef<Path>, files: &[PathBuf], dirs: &[PathBuf]) -> Result<()> {
    make_zip_with(ZipStrategy::detect(), out.as_ref(), files, dirs)
}

/// Create a zip archive with an explicit strategy.
pub fn make_zip_with(
    strategy: ZipStrategy,
    out: &Path,
    files: &[PathBuf],
    dirs: &[PathBuf],
) -> Result<()> {
    fsops::safe_unlink(out)?;
    match strategy {
        ZipStrategy::NativeTool => {
            // zip -r recurses into directories itself; -y stores symlinks.
            Exec::new("zip")
                .args(["-r", "-y"])
                .arg(out)
                .args(files)
                .args(dirs)
                .run_capture()
                .map(|_| ())
        }
        ZipStrategy::InProcess => make_zip_in_process(out, files, dirs),
    }
}

fn make_zip_in_process(out: &Path, files: &[PathBuf], dirs: &[PathBuf]) -> Result<()> {
    let file = File::create(out).with_context(|| format!("cannot create {}", out.display()))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for path in files {
        add_zip_entry(&mut zip, path, options)?;
    }
    for dir in dirs {
        for entry in WalkDir::new(dir) {
            let entry =
                entry.with_context(|| format!("cannot walk directory {}", dir.display()))?;
            if entry.file_type().is_file() {
                add_zip_entry(&mut zip, entry.path(), options)?;
            }
        }
    }

    zip.finish()
        .with_context(|| format!("cannot finish zip {}", out.display()))?;
    Ok(())
}

fn add_zip_entry(
    zip: &mut zip::ZipWriter<File>,
    path: &Path,
    options: zip::write::SimpleFileOptions,
) -> Result<()> {
    let name = entry_name(path);
    zip.start_file(name, options)
        .with_context(|| format!("cannot add {} to zip", path.display()))?;
    let mut input = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    io::copy(&mut input, zip).with_context(|| format!("cannot compress {}", path.display()))?;
    Ok(())
}

// Zip entry names always use forward slashes.
fn entry_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
