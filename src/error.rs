//! Errors that turn a run into an UNKNOWN
//!
//! There are only two kinds: the caller got the arguments wrong, or the host
//! did something we can't make sense of. Both end the check with exit code 3.

use std::fmt;
use std::io;
use std::result::Result as StdResult;

use derive_more::From;

use crate::layout::Version;
use crate::platform::PackageFamily;

/// Every error in this crate can be converted into a `CheckError`
#[derive(Debug, From)]
pub enum CheckError {
    /// Bad or missing arguments, or thresholds in the wrong order
    Usage(String),
    /// Anything that went wrong talking to the host
    Platform(PlatformError),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        match *self {
            CheckError::Usage(ref msg) => write!(f, "{}", msg),
            CheckError::Platform(ref e) => write!(f, "{}", e),
        }
    }
}

/// Errors from detecting the platform, running commands or parsing output
#[derive(Debug)]
pub enum PlatformError {
    /// `uname` gave us a kernel we have no `sar` for
    UnsupportedKernel(String),
    /// A Linux host without any of the release files we know about
    NoReleaseFile,
    /// A release file we read, naming a distribution with no package family
    UnsupportedDistribution(String),
    /// Couldn't read a release file that exists
    ReleaseFile { path: String, error: io::Error },
    /// The command couldn't be started at all, usually because it isn't
    /// installed
    Spawn { command: String, error: io::Error },
    /// The command ran but exited non-zero
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    /// The command didn't finish in time and was killed
    Timeout { command: String, seconds: u64 },
    /// The package query printed something without a version in it
    InvalidVersion { package: &'static str, output: String },
    /// The installed collector is older than anything we have a layout for
    UnsupportedVersion {
        family: PackageFamily,
        version: Version,
        minimum: Version,
    },
    /// The command's output had no data row
    NoDataRow { command: String },
    /// The data row is too short for the layout
    MissingField {
        field: &'static str,
        position: usize,
        row: String,
    },
    /// The data row had something non-numeric where a number should be
    InvalidField {
        field: &'static str,
        value: String,
        row: String,
    },
    /// `lparstat` didn't give us a usable maximum capacity
    InvalidCapacity(String),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        use self::PlatformError::*;
        match *self {
            UnsupportedKernel(ref kernel) => {
                write!(f, "unsupported operating system '{}'", kernel)
            }
            NoReleaseFile => write!(f, "unable to detect the Linux distribution"),
            UnsupportedDistribution(ref dist) => {
                write!(f, "unsupported Linux distribution '{}'", dist)
            }
            ReleaseFile {
                ref path,
                ref error,
            } => write!(f, "unable to read {}: {}", path, error),
            Spawn {
                ref command,
                ref error,
            } => write!(f, "unable to run '{}': {}", command, error),
            CommandFailed {
                ref command,
                ref status,
                ref stderr,
            } => {
                write!(f, "'{}' failed ({})", command, status)?;
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            Timeout {
                ref command,
                seconds,
            } => write!(f, "'{}' did not finish within {}s", command, seconds),
            InvalidVersion {
                package,
                ref output,
            } => write!(
                f,
                "unable to determine the installed version of {} from '{}'",
                package, output
            ),
            UnsupportedVersion {
                family,
                version,
                minimum,
            } => write!(
                f,
                "{} collector version {} is not supported, need at least {}",
                family, version, minimum
            ),
            NoDataRow { ref command } => {
                write!(f, "no data row in the output of '{}'", command)
            }
            MissingField {
                field,
                position,
                ref row,
            } => write!(
                f,
                "no '{}' at column {} in row '{}'",
                field, position, row
            ),
            InvalidField {
                field,
                ref value,
                ref row,
            } => write!(
                f,
                "unable to parse '{}' value '{}' from row '{}'",
                field, value, row
            ),
            InvalidCapacity(ref output) => write!(
                f,
                "unable to determine the LPAR maximum capacity from '{}'",
                output
            ),
        }
    }
}

/// All the results are results with `CheckError`s
pub type Result<T> = StdResult<T, CheckError>;
