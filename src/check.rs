//! Decide how bad things are, and say so
//!
//! The output is one line that Nagios shows to people, followed by
//! performance data that graphing tools pick up:
//!
//! ```plain
//! OK: CPU Used = 15.90% IOWAIT = 0.25% | CpuUser=10.25; CpuNice=0.00; CpuSystem=3.00; CpuIowait=0.25;5;15 CpuSteal=0.00; CpuIdle=84.10;20;10
//! ```

use std::cmp::max;
use std::fmt;

use crate::sample::{Reading, SampleRow};
use crate::thresholds::Thresholds;
use crate::Status;

/// Compare the sample against the thresholds
///
/// Both pairs off means OK no matter what. Otherwise the worse of the idle
/// and iowait comparisons wins. All comparisons are on truncated integers.
pub fn decide(thresholds: &Thresholds, sample: &SampleRow) -> Status {
    if thresholds.informational() {
        return Status::Ok;
    }

    let idle = sample.idle.truncated();
    let idle_status = if !thresholds.idle_enabled() {
        Status::Ok
    } else if idle < thresholds.idle_crit_bound() {
        Status::Critical
    } else if idle < thresholds.idle_warn_bound() {
        Status::Warning
    } else {
        Status::Ok
    };

    let iowait_status = match sample.iowait {
        Some(ref iowait) if thresholds.iowait_enabled() => {
            let iowait = iowait.truncated();
            if iowait > i64::from(thresholds.iowait_critical) {
                Status::Critical
            } else if iowait > i64::from(thresholds.iowait_warning) {
                Status::Warning
            } else {
                Status::Ok
            }
        }
        _ => Status::Ok,
    };

    max(idle_status, iowait_status)
}

fn plain(name: &str, reading: &Option<Reading>, out: &mut Vec<String>) {
    if let Some(ref r) = *reading {
        out.push(format!("{}={};", name, r));
    }
}

/// The performance data block, without the leading `|`
pub fn perfdata(thresholds: &Thresholds, sample: &SampleRow) -> String {
    let mut out = Vec::new();
    plain("CpuUser", &sample.user, &mut out);
    plain("CpuNice", &sample.nice, &mut out);
    plain("CpuSystem", &sample.system, &mut out);
    if let Some(ref iowait) = sample.iowait {
        out.push(format!(
            "CpuIowait={};{};{}",
            iowait, thresholds.iowait_warning, thresholds.iowait_critical
        ));
    }
    plain("CpuSteal", &sample.steal, &mut out);
    plain("CpuIntrpt", &sample.intrpt, &mut out);
    out.push(format!(
        "CpuIdle={};{};{}",
        sample.idle,
        thresholds.idle_warn_bound(),
        thresholds.idle_crit_bound()
    ));
    plain("CpuPhysc", &sample.physc, &mut out);
    plain("CpuEntc", &sample.entc, &mut out);
    plain("LparMaxCapacity", &sample.lpar_max_capacity, &mut out);
    out.join(" ")
}

/// The result of a run: what to print and how to exit
#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
    pub status: Status,
    pub message: String,
}

impl Verdict {
    pub fn new(thresholds: &Thresholds, sample: &SampleRow) -> Verdict {
        let status = decide(thresholds, sample);
        let mut message = format!(
            "{}: CPU Used = {:.2}%",
            status,
            100.0 - sample.idle.value()
        );
        if let Some(ref iowait) = sample.iowait {
            message.push_str(&format!(" IOWAIT = {}%", iowait));
        }
        message.push_str(" | ");
        message.push_str(&perfdata(thresholds, sample));
        Verdict { status, message }
    }

    /// A run that never got as far as comparing anything
    pub fn unknown<E: fmt::Display>(err: E) -> Verdict {
        Verdict {
            status: Status::Unknown,
            message: format!("{}: {}", Status::Unknown, err),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}
