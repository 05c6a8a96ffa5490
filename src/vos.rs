//! `vos` invocation.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::Dialect;

/// Well-known installation paths, tried before a plain PATH lookup so
/// the probe does not depend on a mount of the filesystem it monitors.
const VOS_PATHS: &[&str] = &[
    "/usr/bin/vos",
    "/usr/sbin/vos",
    "/usr/local/bin/vos",
    "/usr/afs/bin/vos",
];

const POLL: Duration = Duration::from_millis(50);

/// Failure to obtain output from `vos`.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The subprocess could not be started or its output stream was
    /// unusable.
    #[error("cannot contact server: {command}: {source}")]
    Contact {
        command: String,
        source: io::Error,
    },

    /// The subprocess did not finish within the configured deadline.
    #[error("vos did not complete within {0} seconds")]
    Timeout(u64),
}

/// Examines a single named volume.
///
/// # Errors
///
/// Returns an error if `vos` cannot be started or does not finish within
/// `timeout`.
pub fn examine(
    dialect: Dialect,
    volume: &str,
    timeout: Duration,
) -> Result<String, QueryError> {
    let mut cmd = Command::new(vos_binary());
    cmd.args(examine_args(dialect, volume));

    run(cmd, timeout)
}

/// Lists the volumes hosted on a server, optionally restricted to one
/// partition.
///
/// # Errors
///
/// Returns an error if `vos` cannot be started or does not finish within
/// `timeout`.
pub fn listvol(
    dialect: Dialect,
    server: &str,
    partition: Option<&str>,
    timeout: Duration,
) -> Result<String, QueryError> {
    let mut cmd = Command::new(vos_binary());
    cmd.args(listvol_args(dialect, server, partition));

    run(cmd, timeout)
}

fn vos_binary() -> &'static str {
    VOS_PATHS
        .iter()
        .find(|path| Path::new(path).exists())
        .copied()
        .unwrap_or("vos")
}

fn examine_args(dialect: Dialect, volume: &str) -> Vec<String> {
    let mut args = vec!["examine".into(), volume.into(), "-noauth".into()];

    if dialect == Dialect::Alternate {
        args.push("-format".into());
    }

    args
}

fn listvol_args(
    dialect: Dialect,
    server: &str,
    partition: Option<&str>,
) -> Vec<String> {
    let mut args = vec!["listvol".into(), server.into()];

    if let Some(partition) = partition {
        args.push("-partition".into());
        args.push(partition.into());
    }

    match dialect {
        Dialect::Primary => args.push("-long".into()),
        Dialect::Alternate => args.push("-format".into()),
    }

    args.push("-noauth".into());

    args
}

fn run(mut cmd: Command, timeout: Duration) -> Result<String, QueryError> {
    let command = format!("{cmd:?}");
    debug!("running: {command}");

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| QueryError::Contact {
            command: command.clone(),
            source,
        })?;

    let stdout = child.stdout.take().ok_or_else(|| QueryError::Contact {
        command: command.clone(),
        source: io::Error::new(io::ErrorKind::BrokenPipe, "stdout not captured"),
    })?;

    // Drain the pipe off-thread: a full pipe would block the child and
    // stall the deadline loop below.
    let reader = thread::spawn(move || {
        let mut stdout = stdout;
        let mut raw = Vec::new();
        let _ = stdout.read_to_end(&mut raw);
        raw
    });

    let deadline = Instant::now() + timeout;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("vos exited with {status}");
                break;
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();

                    return Err(QueryError::Timeout(timeout.as_secs()));
                }

                thread::sleep(POLL);
            }
            Err(source) => {
                let _ = child.kill();

                return Err(QueryError::Contact { command, source });
            }
        }
    }

    let raw = reader.join().unwrap_or_default();

    Ok(String::from_utf8_lossy(&raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn examine_args_per_dialect() {
        assert_eq!(
            examine_args(Dialect::Primary, "proj.users"),
            ["examine", "proj.users", "-noauth"]
        );
        assert_eq!(
            examine_args(Dialect::Alternate, "proj.users"),
            ["examine", "proj.users", "-noauth", "-format"]
        );
    }

    #[test]
    fn listvol_args_per_dialect() {
        assert_eq!(
            listvol_args(Dialect::Primary, "afs1.example.org", None),
            ["listvol", "afs1.example.org", "-long", "-noauth"]
        );
        assert_eq!(
            listvol_args(Dialect::Alternate, "afs1.example.org", Some("a")),
            [
                "listvol",
                "afs1.example.org",
                "-partition",
                "a",
                "-format",
                "-noauth"
            ]
        );
    }

    #[test]
    fn missing_binary_is_contact_error() {
        let cmd = Command::new("/nonexistent/vos");
        let err = run(cmd, Duration::from_secs(1)).unwrap_err();

        assert!(matches!(err, QueryError::Contact { .. }));
        assert!(err.to_string().contains("cannot contact server"));
    }

    #[test]
    fn deadline_kills_slow_child() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 5"]);

        let err = run(cmd, Duration::from_millis(200)).unwrap_err();

        assert!(matches!(err, QueryError::Timeout(_)));
        assert!(err.to_string().contains("seconds"));
    }

    #[test]
    fn captures_stdout() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf 'a\\nb\\n'"]);

        let output = run(cmd, Duration::from_secs(5)).unwrap();

        assert_eq!(output, "a\nb\n");
    }

    #[test]
    fn child_exit_status_is_not_interpreted() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf 'partial\\n'; exit 1"]);

        let output = run(cmd, Duration::from_secs(5)).unwrap();

        assert_eq!(output, "partial\n");
    }
}
