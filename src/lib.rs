//! sar-plugins: a strongly typed CPU check for Nagios-compatible pollers
//!
//! The check samples CPU usage with the platform's `sar`-family command,
//! compares the idle and iowait percentages against thresholds and exits
//! with the conventional Nagios status codes.
//!
//! Each stage of the check lives in its own module and hands an immutable
//! value to the next one:
//!
//! * [`thresholds`]: command-line thresholds -> `Thresholds`
//! * [`platform`]: kernel name and release files -> `PlatformProfile`
//! * [`collector`]: runs `sar` and the package query -> `Collected`
//! * [`sample`]: picks the columns out of the captured row -> `SampleRow`
//! * [`check`]: compares and formats -> `Verdict`
//!
//! See the [`scripts`] module for the `--help` of the binary.

use std::fmt;
use std::process;

pub mod check;
pub mod collector;
pub mod command;
pub mod error;
pub mod layout;
pub mod platform;
pub mod sample;
pub mod scripts;
pub mod thresholds;

pub use crate::error::{CheckError, PlatformError};

/// All the ways a check can exit
///
/// Variants are ordered by severity, so `std::cmp::max` gives the worse of
/// two statuses.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// The process exit code Nagios expects for this status
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

    #[cfg_attr(test, allow(dead_code))]
    pub fn exit(self) -> ! {
        process::exit(self.code())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}
