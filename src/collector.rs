//! Talk to the platform's `sar` and package manager
//!
//! For every `PackageFamily` there's one command that samples the CPU and
//! one that tells us which version of the collector is installed. The
//! version decides which `Layout` the sampled row is read with.

use std::ffi::OsString;
use std::time::Duration;

use log::debug;

use crate::command::Invocation;
use crate::error::PlatformError;
use crate::layout::{layout_for, Layout, Version};
use crate::platform::{PackageFamily, PlatformProfile};

/// The package whose version decides the column layout
pub fn collector_package(family: PackageFamily) -> &'static str {
    match family {
        PackageFamily::Rpm | PackageFamily::Dpkg => "sysstat",
        PackageFamily::Solaris => "SUNWaccu",
        PackageFamily::Aix => "bos.acct",
        PackageFamily::Bsd => "bsdsar",
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| (*s).to_owned()).collect()
}

/// The command that takes one CPU sample, `interval` seconds long
pub fn sample_invocation(family: PackageFamily, interval: u32) -> Invocation {
    let interval = interval.to_string();
    match family {
        PackageFamily::Rpm | PackageFamily::Dpkg | PackageFamily::Solaris => {
            Invocation::new("sar", strings(&["-u", interval.as_str(), "1"]))
        }
        // LPAR accounting only has the plain report
        PackageFamily::Aix => Invocation::new("sar", strings(&[interval.as_str(), "1"])),
        PackageFamily::Bsd => Invocation::new("bsdsar", strings(&["-u"])),
    }
}

/// The package-manager query for the collector's installed version
pub fn version_invocation(family: PackageFamily) -> Invocation {
    let package = collector_package(family);
    match family {
        PackageFamily::Rpm => Invocation::new("rpm", strings(&["-q", "--queryformat", "%{VERSION}", package])),
        PackageFamily::Dpkg => Invocation::new("dpkg-query", strings(&["-W", "--showformat=${Version}", package])),
        PackageFamily::Solaris => Invocation::new("pkginfo", strings(&["-l", package])),
        PackageFamily::Aix => Invocation::new("lslpp", strings(&["-Lqc", package])),
        PackageFamily::Bsd => {
            let pattern = format!("{}*", package);
            Invocation::new("pkg_info", strings(&["-E", pattern.as_str()]))
        }
    }
}

/// Pull the collector version out of the package query's output
///
/// * rpm: `11.7.3`
/// * dpkg: `12.5.2-2`, maybe with an epoch like `1:12.5.2-2`
/// * pkginfo: a `VERSION:  11.10.0,REV=2005.01.21` line
/// * lslpp: `bos.acct:bos.acct:7.2.5.0: : :C:F:Accounting Services: : : : : : :0:0:/:`
/// * pkg_info: `bsdsar-1.21`
pub fn parse_version(family: PackageFamily, output: &str) -> Result<Version, PlatformError> {
    let output = output.trim();
    let relevant = match family {
        PackageFamily::Rpm => Some(output),
        PackageFamily::Dpkg => Some(output.rsplit(':').next().unwrap_or(output)),
        PackageFamily::Solaris => output
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("VERSION:"))
            .map(|line| &line["VERSION:".len()..]),
        PackageFamily::Aix => output
            .lines()
            .filter(|line| !line.starts_with('#'))
            .filter_map(|line| line.split(':').nth(2))
            .next(),
        PackageFamily::Bsd => output.lines().next().and_then(|line| line.rsplit('-').next()),
    };
    relevant
        .and_then(Version::find)
        .ok_or_else(|| PlatformError::InvalidVersion {
            package: collector_package(family),
            output: output.to_owned(),
        })
}

fn is_number(s: &str) -> bool {
    s.parse::<f64>().is_ok()
}

/// The last data row in `sar`-style output
///
/// A data row starts with a timestamp and ends with a number. That skips the
/// banner, the column headers, blank lines, the `Average` summary and any
/// trailing non-data rows.
pub fn last_data_row(output: &str) -> Option<&str> {
    output
        .lines()
        .filter(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.last()) {
                (Some(first), Some(last)) => {
                    first.contains(':') && !first.starts_with("Average") && is_number(last)
                }
                _ => false,
            }
        })
        .last()
}

/// The `Maximum Capacity` line from `lparstat -i`
pub fn parse_max_capacity(output: &str) -> Result<String, PlatformError> {
    output
        .lines()
        .filter(|line| line.trim_start().starts_with("Maximum Capacity"))
        .filter_map(|line| line.splitn(2, ':').nth(1))
        .map(str::trim)
        .find(|value| is_number(value))
        .map(str::to_owned)
        .ok_or_else(|| PlatformError::InvalidCapacity(output.trim().to_owned()))
}

/// Everything the parser needs from the host
#[derive(Clone, Debug, PartialEq)]
pub struct Collected {
    pub version: Version,
    pub layout: &'static Layout,
    /// The raw data row, exactly as `sar` printed it
    pub row: String,
    /// AIX LPARs only: the partition's maximum processing capacity
    pub lpar_max_capacity: Option<String>,
}

/// Runs the commands for one `PlatformProfile`
#[derive(Clone, Debug)]
pub struct Collector {
    /// Seconds `sar` samples for
    pub interval: u32,
    /// How long a command may take, on top of the sampling interval for `sar`
    pub timeout: Duration,
    /// `PATH` to find the commands in, the inherited one if `None`
    pub path: Option<OsString>,
}

impl Collector {
    /// The deadline for the sampling command, which can't finish before
    /// `interval` seconds have passed
    pub fn sample_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval)) + self.timeout
    }

    fn run(&self, invocation: Invocation, timeout: Duration) -> Result<String, PlatformError> {
        invocation.search_path(self.path.clone()).run(timeout)
    }

    /// Check the collector version and take one sample
    ///
    /// The version check happens first so that an unsupported install fails
    /// before we spend `interval` seconds sampling.
    pub fn collect(&self, profile: &PlatformProfile) -> Result<Collected, PlatformError> {
        let family = profile.family;
        let version_output = self.run(version_invocation(family), self.timeout)?;
        let version = parse_version(family, &version_output)?;
        let layout = layout_for(family, version)?;
        debug!(
            "{} {} is version {}, using the layout for {} and newer",
            family,
            collector_package(family),
            version,
            layout.since
        );

        let sample = sample_invocation(family, self.interval);
        let shown = sample.display();
        let output = self.run(sample, self.sample_timeout())?;
        let row = last_data_row(&output)
            .ok_or(PlatformError::NoDataRow { command: shown })?
            .to_owned();
        debug!("captured row '{}'", row);

        let lpar_max_capacity = if layout.columns.physc.is_some() {
            let lparstat = Invocation::new("lparstat", vec!["-i".to_owned()]);
            Some(parse_max_capacity(&self.run(lparstat, self.timeout)?)?)
        } else {
            None
        };

        Ok(Collected {
            version,
            layout,
            row,
            lpar_max_capacity,
        })
    }
}
