//! Subprocess helpers
// (c) 2026 The rconsole authors

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use anyhow::{Context as _, Result};
use tokio::process::Command;
use tracing::trace;

/// The captured result of a finished child process
#[derive(Debug)]
pub(crate) struct ProcessOutput {
    pub(crate) status: ExitStatus,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl ProcessOutput {
    pub(crate) fn success(&self) -> bool {
        self.status.success()
    }

    /// A short description of a failure, for error messages
    pub(crate) fn failure_summary(&self) -> String {
        let detail = self.stderr.trim();
        let detail = if detail.is_empty() {
            self.stdout.trim()
        } else {
            detail
        };
        if detail.is_empty() {
            format!("{}", self.status)
        } else {
            format!("{}: {detail}", self.status)
        }
    }
}

/// Runs a command to completion, capturing its output.
///
/// The child has no stdin. It is killed if the returned future is dropped,
/// which is how callers impose a timeout.
pub(crate) async fn run(mut cmd: Command) -> Result<ProcessOutput> {
    let _ = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    trace!("spawning {:?}", cmd.as_std());
    let program = cmd.as_std().get_program().to_string_lossy().to_string();
    let output = cmd
        .output()
        .await
        .with_context(|| format!("could not run {program}"))?;
    Ok(ProcessOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt as _;
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Looks for an executable on `PATH`, as a shell would.
/// A name containing a path separator is checked as given.
pub(crate) fn find_executable<S: AsRef<OsStr>>(name: S) -> Option<PathBuf> {
    let name = Path::new(name.as_ref());
    if name.as_os_str().is_empty() {
        return None;
    }
    if name.components().count() > 1 {
        return is_executable(name).then(|| name.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(test)]
mod test {
    use super::{find_executable, run};
    use tokio::process::Command;

    #[cfg(unix)]
    #[test]
    fn finds_sh() {
        let sh = find_executable("sh").unwrap();
        assert!(sh.is_absolute());
        assert_eq!(find_executable("/bin/sh").unwrap(), std::path::PathBuf::from("/bin/sh"));
    }

    #[test]
    fn missing_executable() {
        assert!(find_executable("surely-no-such-program-exists-here").is_none());
        assert!(find_executable("").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_output() {
        let mut cmd = Command::new("sh");
        let _ = cmd.args(["-c", "echo out; echo err >&2; exit 3"]);
        let out = run(cmd).await.unwrap();
        assert!(!out.success());
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert!(out.failure_summary().ends_with(": err"));
    }

    #[tokio::test]
    async fn spawn_failure() {
        let cmd = Command::new("surely-no-such-program-exists-here");
        let e = run(cmd).await.unwrap_err();
        assert!(e.to_string().contains("could not run"));
    }
}
