//! Subprocess execution wrappers
//!
//! Builder in two flavors: capturing (stdout and stderr collected into one
//! transcript) and streaming (inherited stdio when verbose). Verbose mode
//! echoes the invocation and its output.

use crate::{config, output};
use anyhow::{Context, Result, bail};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Builder for subprocess invocations.
///
/// Environment entries are layered on top of the inherited environment;
/// they do not replace it.
///
/// # Example
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// let out = build_support::Exec::new("git")
///     .args(["rev-parse", "HEAD"])
///     .current_dir("/src/project")
///     .run_capture()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Exec {
    program: OsString,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    cwd: Option<PathBuf>,
}

impl Exec {
    /// Create a new invocation of `program`.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_os_string());
        }
        self
    }

    /// Override an environment variable for the child process.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Override several environment variables at once.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        for (k, v) in vars {
            self.envs
                .push((k.as_ref().to_os_string(), v.as_ref().to_os_string()));
        }
        self
    }

    /// Set the working directory for the child process.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// The invocation as a display string, for echoing and error messages.
    pub fn display_line(&self) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Run to completion, capturing stdout and stderr as one transcript.
    ///
    /// stderr is appended after stdout. On non-zero exit the transcript is
    /// printed and returned inside the error.
    pub fn run_capture(&self) -> Result<String> {
        if config::is_verbose() {
            output::detail(&self.display_line());
        }

        let out = self
            .build_command()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to start `{}`", self.display_line()))?;

        let mut transcript = String::from_utf8_lossy(&out.stdout).into_owned();
        transcript.push_str(&String::from_utf8_lossy(&out.stderr));

        if !out.status.success() {
            print!("{transcript}");
            bail!(
                "command `{}` exited with {}:\n{}",
                self.display_line(),
                out.status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                transcript
            );
        }

        if config::is_verbose() {
            print!("{transcript}");
        }
        Ok(transcript)
    }

    /// Run to completion with live output when verbose.
    ///
    /// When verbose, stdio is inherited so the caller sees output as it is
    /// produced; otherwise this delegates to [`run_capture`](Self::run_capture).
    pub fn run_streamed(&self) -> Result<()> {
        if !config::is_verbose() {
            return self.run_capture().map(|_| ());
        }

        output::detail(&self.display_line());
        let status = self
            .build_command()
            .status()
            .with_context(|| format!("failed to start `{}`", self.display_line()))?;
        if !status.success() {
            bail!(
                "command `{}` exited with {}",
                self.display_line(),
                status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string())
            );
        }
        Ok(())
    }
}

/// Run an argv slice, capturing combined output.
pub fn execute(argv: &[&str]) -> Result<String> {
    let (program, args) = split_argv(argv)?;
    Exec::new(program).args(args).run_capture()
}

/// Run an argv slice, streaming output when verbose.
pub fn execute_streamed(argv: &[&str]) -> Result<()> {
    let (program, args) = split_argv(argv)?;
    Exec::new(program).args(args).run_streamed()
}

fn split_argv<'a>(argv: &'a [&'a str]) -> Result<(&'a str, &'a [&'a str])> {
    match argv.split_first() {
        Some((program, args)) => Ok((program, args)),
        None => bail!("empty argument vector"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_stdout() {
        let out = Exec::new("echo").arg("hello").run_capture().unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_capture_combines_stderr() {
        let out = Exec::new("sh")
            .args(["-c", "echo out; echo err >&2"])
            .run_capture()
            .unwrap();
        assert!(out.contains("out"));
        assert!(out.contains("err"));
    }

    #[test]
    fn test_failure_error_includes_transcript() {
        let err = Exec::new("sh")
            .args(["-c", "echo boom; exit 3"])
            .run_capture()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exited with 3"), "msg: {msg}");
        assert!(msg.contains("boom"), "msg: {msg}");
    }

    #[test]
    fn test_env_override() {
        let out = Exec::new("sh")
            .args(["-c", "echo $BUILD_SUPPORT_EXEC_TEST"])
            .env("BUILD_SUPPORT_EXEC_TEST", "value")
            .run_capture()
            .unwrap();
        assert_eq!(out.trim(), "value");
    }

    #[test]
    fn test_current_dir() {
        let temp = tempfile::tempdir().unwrap();
        let out = Exec::new("pwd")
            .current_dir(temp.path())
            .run_capture()
            .unwrap();
        let reported = std::path::Path::new(out.trim()).canonicalize().unwrap();
        assert_eq!(reported, temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_missing_program_errors() {
        let err = Exec::new("definitely-not-a-real-program-12345")
            .run_capture()
            .unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }

    #[test]
    fn test_streamed_failure_propagates() {
        let err = Exec::new("sh")
            .args(["-c", "exit 7"])
            .run_streamed()
            .unwrap_err();
        assert!(err.to_string().contains("7"));
    }

    #[test]
    fn test_execute_argv() {
        assert_eq!(execute(&["echo", "hi"]).unwrap().trim(), "hi");
        assert!(execute(&[]).is_err());
    }

    #[test]
    fn test_display_line() {
        let cmd = Exec::new("zip").args(["-r", "-y", "out.zip"]);
        assert_eq!(cmd.display_line(), "zip -r -y out.zip");
    }
}
