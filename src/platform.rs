//! Host architecture detection
//!
//! Maps the raw kernel machine string onto the small set of canonical
//! architecture labels the build configuration understands.

use std::fmt;

/// Canonical host architecture label.
///
/// Unrecognized machine strings are passed through unchanged so callers can
/// still log or reject them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostArch {
    /// 32-bit x86 (i386..i686, i86pc)
    Ia32,
    /// 64-bit x86 (x86_64, amd64)
    X64,
    /// 32-bit ARM
    Arm,
    /// Raw machine string that matched no canonical label
    Other(String),
}

impl fmt::Display for HostArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostArch::Ia32 => f.write_str("ia32"),
            HostArch::X64 => f.write_str("x64"),
            HostArch::Arm => f.write_str("arm"),
            HostArch::Other(raw) => f.write_str(raw),
        }
    }
}

/// Map a raw machine string to its canonical label.
///
/// The machine string reports the running kernel, which may be 64-bit under
/// a 32-bit userland (e.g. to give the linker more address space). Passing
/// `pointer_width_32 = true` for a 32-bit process downgrades an x64 kernel
/// to `Ia32`.
pub fn canonical_arch(raw: &str, pointer_width_32: bool) -> HostArch {
    let arch = if is_x86_32(raw) {
        HostArch::Ia32
    } else if raw == "x86_64" || raw == "amd64" {
        HostArch::X64
    } else if raw.starts_with("arm") {
        HostArch::Arm
    } else {
        HostArch::Other(raw.to_string())
    };

    if arch == HostArch::X64 && pointer_width_32 {
        return HostArch::Ia32;
    }
    arch
}

// i386 / i486 / i586 / i686, plus Solaris-style i86pc.
fn is_x86_32(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    (bytes.len() == 4 && bytes[0] == b'i' && &bytes[2..] == b"86") || raw == "i86pc"
}

/// Detect the host architecture of the running process.
///
/// Always returns a best-effort label; probe failures fall back to the
/// compile-time target architecture.
pub fn host_arch() -> HostArch {
    canonical_arch(&raw_machine(), cfg!(target_pointer_width = "32"))
}

#[cfg(unix)]
fn raw_machine() -> String {
    let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut uts) } == 0 {
        let machine = unsafe { std::ffi::CStr::from_ptr(uts.machine.as_ptr()) };
        return machine.to_string_lossy().into_owned();
    }
    std::env::consts::ARCH.to_string()
}

#[cfg(not(unix))]
fn raw_machine() -> String {
    std::env::consts::ARCH.to_string()
}
