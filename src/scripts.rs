//! Documentation about the checks contained herein
//!
//! - [check_cpu](#check_cpu)
//!
//! # check_cpu
//!
//! Linux (RedHat and Debian families), Solaris, AIX and BSD. Requires sar (sysstat on Linux, bsdsar on BSD).
//!
//! ```plain
//! $ check_cpu --help
//! check_cpu (part of sar-plugins) 0.1.0
//! Brandon W Maister <quodlibetor@gmail.com>
//! Check CPU usage with sar
//!
//! Samples the CPU once with the platform's sar and compares the idle and iowait percentages against the given levels.
//! Works on RedHat- and Debian-like Linux, Solaris, AIX (including LPARs) and BSD with bsdsar.
//!
//! USAGE:
//!     check_cpu [FLAGS] [OPTIONS] <idle_warn> <idle_crit> [ARGS]
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!     -v, --verbose    Log what the check is doing to stderr
//!
//! OPTIONS:
//!     -i, --interval <interval>    Seconds for sar to sample over [default: 1]
//!     -t, --timeout <timeout>      Seconds a command may take, plus the interval for sar [default: 10]
//!
//! ARGS:
//!     <idle_warn>      Percent of CPU used to warn at
//!     <idle_crit>      Percent of CPU used to go critical at
//!     <iowait_warn>    Percent iowait to warn at [default: 0]
//!     <iowait_crit>    Percent iowait to go critical at [default: 0]
//!
//! About thresholds:
//!
//!     Idle thresholds are given as percent of CPU *used* and compared against
//!     100 minus the idle percentage that sar reports, so `80 90` warns below
//!     20% idle and goes critical below 10% idle.
//!
//!     Iowait thresholds are compared directly against sar's iowait percentage.
//!     Platforms without an iowait column (BSD) skip them.
//!
//!     A `0 0` pair turns that comparison off. With all four thresholds at 0
//!     the check always exits OK and only reports performance data.
//!
//!     Values are truncated, not rounded, before comparing: 19.99% idle is 19.
//! ```
