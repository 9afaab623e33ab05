//! Blocking execution of external programs.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use tracing::debug;

/// Run `program` with `args`, returning trimmed stdout on success and a
/// human-readable failure detail otherwise.
pub(crate) fn run<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Result<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    debug!("running {:?}", command);

    let output = command
        .output()
        .map_err(|e| format!("failed to execute {program}: {e}"))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        Err(if stderr.is_empty() {
            format!("{program} exited with {}", output.status)
        } else {
            stderr.to_string()
        })
    }
}
