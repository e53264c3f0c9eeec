//! Check CPU idle and iowait with sar

use std::ffi::OsString;
use std::time::Duration;

use env_logger::Env;
use log::{debug, LevelFilter};
use structopt::clap::{AppSettings, ErrorKind};
use structopt::StructOpt;

use sar_plugins::check::Verdict;
use sar_plugins::collector::Collector;
use sar_plugins::platform::PlatformProfile;
use sar_plugins::sample::SampleRow;
use sar_plugins::thresholds::Thresholds;
use sar_plugins::{CheckError, Status};

static USAGE: &str = "\
Usage: check_cpu <idle_warn> <idle_crit> [<iowait_warn> <iowait_crit>]

    idle levels are percent of CPU used, iowait levels are percent iowait.
    Critical levels must not be lower than warning levels. A pair of 0 0
    turns that check off.";

/// Check CPU usage with sar
///
/// Samples the CPU once with the platform's sar and compares the idle and
/// iowait percentages against the given levels. Works on RedHat- and
/// Debian-like Linux, Solaris, AIX (including LPARs) and BSD with bsdsar.
#[derive(StructOpt, Debug)]
#[structopt(
    name = "check_cpu (part of sar-plugins)",
    setting = AppSettings::ColoredHelp,
    after_help = "About thresholds:

    Idle thresholds are given as percent of CPU *used* and compared against
    100 minus the idle percentage that sar reports, so `80 90` warns below
    20% idle and goes critical below 10% idle.

    Iowait thresholds are compared directly against sar's iowait percentage.
    Platforms without an iowait column (BSD) skip them.

    A `0 0` pair turns that comparison off. With all four thresholds at 0
    the check always exits OK and only reports performance data.

    Values are truncated, not rounded, before comparing: 19.99% idle is 19."
)]
struct Args {
    #[structopt(name = "idle_warn", help = "Percent of CPU used to warn at")]
    idle_warn: u32,
    #[structopt(name = "idle_crit", help = "Percent of CPU used to go critical at")]
    idle_crit: u32,
    #[structopt(
        name = "iowait_warn",
        help = "Percent iowait to warn at",
        default_value = "0"
    )]
    iowait_warn: u32,
    #[structopt(
        name = "iowait_crit",
        help = "Percent iowait to go critical at",
        default_value = "0"
    )]
    iowait_crit: u32,

    #[structopt(
        short = "i",
        long = "interval",
        help = "Seconds for sar to sample over",
        default_value = "1"
    )]
    interval: u32,
    #[structopt(
        short = "t",
        long = "timeout",
        help = "Seconds a command may take, plus the interval for sar",
        default_value = "10"
    )]
    timeout: u64,
    #[structopt(short = "v", long = "verbose", help = "Log what the check is doing to stderr")]
    verbose: bool,
}

impl Args {
    /// Parse the command line, or explain what was wrong with it
    ///
    /// `--help` and `--version` are not errors and come back as clap errors
    /// for the caller to print.
    fn parse_from<I>(argv: I) -> Result<Args, structopt::clap::Error>
    where
        I: IntoIterator,
        I::Item: Into<OsString> + Clone,
    {
        Args::from_iter_safe(argv)
    }

    fn thresholds(&self) -> Result<Thresholds, CheckError> {
        if self.interval == 0 {
            return Err(CheckError::Usage("--interval must be at least 1".to_owned()));
        }
        if self.timeout == 0 {
            return Err(CheckError::Usage("--timeout must be at least 1".to_owned()));
        }
        Thresholds::new(
            self.idle_warn,
            self.idle_crit,
            self.iowait_warn,
            self.iowait_crit,
        )
    }

    fn collector(&self) -> Collector {
        Collector {
            interval: self.interval,
            timeout: Duration::from_secs(self.timeout),
            path: None,
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn run(args: &Args, thresholds: &Thresholds) -> Result<Verdict, CheckError> {
    let profile = PlatformProfile::detect()?;
    let collected = args.collector().collect(&profile)?;
    let sample = SampleRow::from_collected(&collected)?;
    debug!("parsed {:?}", sample);
    Ok(Verdict::new(thresholds, &sample))
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = match Args::parse_from(std::env::args_os()) {
        Ok(args) => args,
        Err(ref e) if e.kind == ErrorKind::HelpDisplayed || e.kind == ErrorKind::VersionDisplayed => {
            e.exit()
        }
        Err(e) => {
            println!("{}", e.message);
            Status::Unknown.exit();
        }
    };
    init_logging(args.verbose);

    let thresholds = match args.thresholds() {
        Ok(thresholds) => thresholds,
        Err(e) => {
            println!("UNKNOWN: {}\n\n{}", e, USAGE);
            Status::Unknown.exit();
        }
    };

    let verdict = run(&args, &thresholds).unwrap_or_else(Verdict::unknown);
    println!("{}", verdict);
    verdict.status.exit();
}

#[cfg(test)]
mod unit {
    use structopt::clap::ErrorKind;

    use super::Args;
    use sar_plugins::CheckError;

    fn build_args(argv: Vec<&str>) -> Args {
        Args::parse_from(argv.into_iter()).unwrap()
    }

    #[test]
    fn two_thresholds_default_the_rest() {
        let args = build_args(vec!["check_cpu", "80", "90"]);
        let t = args.thresholds().unwrap();
        assert_eq!(t.idle_warning, 80);
        assert_eq!(t.idle_critical, 90);
        assert_eq!(t.iowait_warning, 0);
        assert_eq!(t.iowait_critical, 0);
        assert_eq!(args.interval, 1);
        assert_eq!(args.timeout, 10);
        assert!(!args.verbose);
    }

    #[test]
    fn four_thresholds() {
        let args = build_args(vec!["check_cpu", "80", "90", "5", "15"]);
        let t = args.thresholds().unwrap();
        assert_eq!(t.iowait_warning, 5);
        assert_eq!(t.iowait_critical, 15);
    }

    #[test]
    fn options() {
        let args = build_args(vec!["check_cpu", "-v", "--interval", "5", "-t", "30", "80", "90"]);
        assert!(args.verbose);
        assert_eq!(args.interval, 5);
        assert_eq!(args.collector().timeout.as_secs(), 30);
        assert_eq!(args.collector().sample_timeout().as_secs(), 35);
    }

    #[test]
    fn fewer_than_two_thresholds_is_an_error() {
        assert!(Args::parse_from(vec!["check_cpu", "80"].into_iter()).is_err());
        assert!(Args::parse_from(vec!["check_cpu"].into_iter()).is_err());
    }

    #[test]
    fn non_numeric_and_negative_thresholds_are_errors() {
        assert!(Args::parse_from(vec!["check_cpu", "eighty", "90"].into_iter()).is_err());
        assert!(Args::parse_from(vec!["check_cpu", "80", "-90"].into_iter()).is_err());
    }

    #[test]
    fn inverted_thresholds_are_usage_errors() {
        let args = build_args(vec!["check_cpu", "90", "80"]);
        match args.thresholds() {
            Err(CheckError::Usage(_)) => {}
            other => panic!("expected a usage error, got {:?}", other),
        }
    }

    #[test]
    fn zero_interval_is_a_usage_error() {
        let args = build_args(vec!["check_cpu", "-i", "0", "80", "90"]);
        assert!(args.thresholds().is_err());
    }

    #[test]
    fn help_is_not_a_usage_error() {
        match Args::parse_from(vec!["check_cpu", "--help"].into_iter()) {
            Err(e) => assert_eq!(e.kind, ErrorKind::HelpDisplayed),
            Ok(_) => panic!("--help should not parse into args"),
        }
    }
}
