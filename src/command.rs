//! Run the external commands that do the real work
//!
//! Everything the check knows about the host comes from running some other
//! program and reading its stdout. This is the one place that happens, so
//! that every command gets the same locale and the same deadline.

use std::ffi::OsString;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::PlatformError;

/// How often we look at a running command to see if it has exited
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A command line, kept around so errors can say what we ran
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// `PATH` to look the program up in, the inherited one if `None`
    pub path: Option<OsString>,
}

impl Invocation {
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> Invocation {
        Invocation {
            program: program.into(),
            args,
            path: None,
        }
    }

    pub fn search_path(mut self, path: Option<OsString>) -> Invocation {
        self.path = path;
        self
    }

    /// The command the way you would type it into a shell
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Run the command and return its stdout
    ///
    /// The command is run with `LC_ALL=C` and `S_TIME_FORMAT=ISO` so that
    /// `sar` prints 24-hour timestamps and `.` as its decimal separator. If
    /// it hasn't finished after `timeout` it is killed and we give up.
    pub fn run(&self, timeout: Duration) -> Result<String, PlatformError> {
        let shown = self.display();
        debug!("running '{}'", shown);
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env("LC_ALL", "C")
            .env("S_TIME_FORMAT", "ISO")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref path) = self.path {
            command.env("PATH", path);
        }
        let mut child = command.spawn().map_err(|error| PlatformError::Spawn {
            command: shown.clone(),
            error,
        })?;

        // the pipes are drained on their own threads so a chatty command
        // can't block on a full pipe while we wait for it
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = wait_until(&mut child, &shown, Instant::now() + timeout).map_err(|e| match e {
            Waited::Expired => PlatformError::Timeout {
                command: shown.clone(),
                seconds: timeout.as_secs(),
            },
            Waited::Failed(error) => PlatformError::Spawn {
                command: shown.clone(),
                error,
            },
        })?;
        let output = Output {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        };
        into_stdout(shown, output)
    }
}

enum Waited {
    Expired,
    Failed(std::io::Error),
}

/// Wait for `child` to exit, killing it once `deadline` passes
///
/// The child is only ever signalled while we still hold it unreaped, so the
/// pid can't have been handed to some other process.
fn wait_until(child: &mut Child, shown: &str, deadline: Instant) -> Result<ExitStatus, Waited> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                if let Err(e) = child.kill() {
                    warn!("unable to kill '{}' (pid {}): {}", shown, child.id(), e);
                }
                if let Err(e) = child.wait() {
                    warn!("unable to reap '{}' (pid {}): {}", shown, child.id(), e);
                }
                return Err(Waited::Expired);
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(error) => return Err(Waited::Failed(error)),
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            debug!("stopped reading a pipe early: {}", e);
        }
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader.and_then(|handle| handle.join().ok()).unwrap_or_default()
}

fn into_stdout(command: String, output: Output) -> Result<String, PlatformError> {
    if !output.status.success() {
        return Err(PlatformError::CommandFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    debug!("'{}' printed {} bytes", command, stdout.len());
    Ok(stdout)
}

#[cfg(test)]
mod test {
    use std::thread;
    use std::time::Duration;

    use tempfile::tempdir;

    use super::Invocation;
    use crate::error::PlatformError;

    fn sh(script: &str) -> Invocation {
        Invocation::new("sh", vec!["-c".to_owned(), script.to_owned()])
    }

    #[test]
    fn display_is_shell_like() {
        let inv = Invocation::new("sar", vec!["-u".into(), "1".into(), "1".into()]);
        assert_eq!(inv.display(), "sar -u 1 1");
    }

    #[test]
    fn captures_stdout() {
        let out = sh("echo hello").run(Duration::from_secs(5)).unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn runs_in_the_c_locale() {
        let out = sh("echo $LC_ALL").run(Duration::from_secs(5)).unwrap();
        assert_eq!(out.trim(), "C");
    }

    #[test]
    fn non_zero_exit_is_an_error() {
        match sh("echo broken >&2; exit 3").run(Duration::from_secs(5)) {
            Err(PlatformError::CommandFailed { stderr, .. }) => assert_eq!(stderr, "broken"),
            other => panic!("expected a failed command, got {:?}", other),
        }
    }

    #[test]
    fn missing_command_is_an_error() {
        let inv = Invocation::new("definitely-not-a-real-sar", vec![]);
        match inv.run(Duration::from_secs(5)) {
            Err(PlatformError::Spawn { command, .. }) => {
                assert_eq!(command, "definitely-not-a-real-sar")
            }
            other => panic!("expected a spawn error, got {:?}", other),
        }
    }

    #[test]
    fn slow_commands_are_killed() {
        match sh("exec sleep 30").run(Duration::from_millis(200)) {
            Err(PlatformError::Timeout { command, .. }) => assert_eq!(command, "sh -c exec sleep 30"),
            other => panic!("expected a timeout, got {:?}", other),
        }
    }

    #[test]
    fn timed_out_commands_do_not_keep_running() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("sleep 1; touch '{}'", marker.display());
        assert!(sh(&script).run(Duration::from_millis(100)).is_err());
        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[test]
    fn search_path_is_used_to_find_the_program() {
        let dir = tempdir().unwrap();
        let inv = Invocation::new("sh", vec!["-c".to_owned(), "echo $PATH".to_owned()])
            .search_path(Some(format!("{}:/usr/bin:/bin", dir.path().display()).into()));
        let out = inv.run(Duration::from_secs(5)).unwrap();
        assert!(out.starts_with(&dir.path().display().to_string()));
    }

    #[test]
    fn large_output_does_not_block() {
        let out = sh("head -c 200000 /dev/zero | tr '\\0' x")
            .run(Duration::from_secs(5))
            .unwrap();
        assert_eq!(out.len(), 200_000);
    }
}
