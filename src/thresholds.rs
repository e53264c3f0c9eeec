//! Warning and critical levels for idle and iowait
//!
//! The idle levels are given as "percent used", which is what people think
//! in, and turned into bounds on the idle percentage that `sar` reports: a
//! warning at 80% used is a warning below 20% idle.

use crate::error::CheckError;

/// The four levels the check compares against, all percentages
///
/// A `(0, 0)` pair turns alerting off for that metric. When both pairs are
/// `(0, 0)` the check only reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    pub idle_warning: u32,
    pub idle_critical: u32,
    pub iowait_warning: u32,
    pub iowait_critical: u32,
}

impl Thresholds {
    /// Validate the levels the caller asked for
    ///
    /// Every level must be a percentage and neither critical level may be
    /// lower than its warning level.
    pub fn new(
        idle_warning: u32,
        idle_critical: u32,
        iowait_warning: u32,
        iowait_critical: u32,
    ) -> Result<Thresholds, CheckError> {
        let levels = [
            ("idle warning", idle_warning),
            ("idle critical", idle_critical),
            ("iowait warning", iowait_warning),
            ("iowait critical", iowait_critical),
        ];
        for &(name, level) in &levels {
            if level > 100 {
                return Err(CheckError::Usage(format!(
                    "{} level {} is not a percentage",
                    name, level
                )));
            }
        }
        if idle_critical < idle_warning {
            return Err(CheckError::Usage(format!(
                "idle critical ({}) must not be lower than idle warning ({})",
                idle_critical, idle_warning
            )));
        }
        if iowait_critical < iowait_warning {
            return Err(CheckError::Usage(format!(
                "iowait critical ({}) must not be lower than iowait warning ({})",
                iowait_critical, iowait_warning
            )));
        }
        Ok(Thresholds {
            idle_warning,
            idle_critical,
            iowait_warning,
            iowait_critical,
        })
    }

    pub fn idle_enabled(&self) -> bool {
        (self.idle_warning, self.idle_critical) != (0, 0)
    }

    pub fn iowait_enabled(&self) -> bool {
        (self.iowait_warning, self.iowait_critical) != (0, 0)
    }

    /// Both pairs are off, so the check never alerts
    pub fn informational(&self) -> bool {
        !self.idle_enabled() && !self.iowait_enabled()
    }

    /// Warn when idle drops below this
    pub fn idle_warn_bound(&self) -> i64 {
        100 - i64::from(self.idle_warning)
    }

    /// Go critical when idle drops below this
    pub fn idle_crit_bound(&self) -> i64 {
        100 - i64::from(self.idle_critical)
    }
}
