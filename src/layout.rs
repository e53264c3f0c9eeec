//! Which column holds which number, per platform and collector version
//!
//! `sar` has changed its output over the years (sysstat 6 added `%steal`,
//! AIX 5.3 added `physc` and `%entc`), so the position of each value depends
//! on both the platform and the installed version of the collector. Adding
//! support for a new version is a new entry in `LAYOUTS`.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PlatformError;
use crate::platform::PackageFamily;

/// The `major.minor` version of an installed package
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)(?:\.(\d+))?").unwrap());

impl Version {
    pub const fn new(major: u32, minor: u32) -> Version {
        Version { major, minor }
    }

    /// Find the first `major[.minor]` in some text
    ///
    /// Anything after the minor version (patch level, distro revision) is
    /// ignored.
    pub fn find(text: &str) -> Option<Version> {
        let caps = VERSION_RE.captures(text)?;
        let major = caps.get(1)?.as_str().parse().ok()?;
        let minor = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        Some(Version { major, minor })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Zero-based, whitespace-separated column positions in a data row
///
/// Column 0 is always the timestamp. `None` means the platform doesn't
/// report that value at this version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Columns {
    pub user: Option<usize>,
    pub nice: Option<usize>,
    pub system: Option<usize>,
    pub iowait: Option<usize>,
    pub steal: Option<usize>,
    pub intrpt: Option<usize>,
    pub idle: usize,
    pub physc: Option<usize>,
    pub entc: Option<usize>,
}

/// The columns used by `family` from version `since` onwards
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub family: PackageFamily,
    pub since: Version,
    pub columns: Columns,
}

/// `%user %nice %system %iowait %idle`
const SYSSTAT_5: Columns = Columns {
    user: Some(2),
    nice: Some(3),
    system: Some(4),
    iowait: Some(5),
    steal: None,
    intrpt: None,
    idle: 6,
    physc: None,
    entc: None,
};

/// `%user %nice %system %iowait %steal %idle`
const SYSSTAT_6: Columns = Columns {
    steal: Some(6),
    idle: 7,
    ..SYSSTAT_5
};

/// `%usr %sys %wio %idle`
const SOLARIS: Columns = Columns {
    user: Some(1),
    nice: None,
    system: Some(2),
    iowait: Some(3),
    steal: None,
    intrpt: None,
    idle: 4,
    physc: None,
    entc: None,
};

/// `%usr %sys %wio %idle physc %entc`
const AIX_LPAR: Columns = Columns {
    physc: Some(5),
    entc: Some(6),
    ..SOLARIS
};

/// `%usr %nice %sys %intr %idle`
const BSDSAR: Columns = Columns {
    user: Some(1),
    nice: Some(2),
    system: Some(3),
    iowait: None,
    steal: None,
    intrpt: Some(4),
    idle: 5,
    physc: None,
    entc: None,
};

pub static LAYOUTS: &[Layout] = &[
    Layout {
        family: PackageFamily::Rpm,
        since: Version::new(5, 0),
        columns: SYSSTAT_5,
    },
    Layout {
        family: PackageFamily::Rpm,
        since: Version::new(6, 0),
        columns: SYSSTAT_6,
    },
    Layout {
        family: PackageFamily::Dpkg,
        since: Version::new(5, 0),
        columns: SYSSTAT_5,
    },
    Layout {
        family: PackageFamily::Dpkg,
        since: Version::new(6, 0),
        columns: SYSSTAT_6,
    },
    Layout {
        family: PackageFamily::Solaris,
        since: Version::new(8, 0),
        columns: SOLARIS,
    },
    Layout {
        family: PackageFamily::Aix,
        since: Version::new(5, 0),
        columns: SOLARIS,
    },
    Layout {
        family: PackageFamily::Aix,
        since: Version::new(5, 3),
        columns: AIX_LPAR,
    },
    Layout {
        family: PackageFamily::Bsd,
        since: Version::new(1, 0),
        columns: BSDSAR,
    },
];

/// The oldest collector version we can parse for `family`
pub fn minimum_version(family: PackageFamily) -> Option<Version> {
    LAYOUTS
        .iter()
        .filter(|l| l.family == family)
        .map(|l| l.since)
        .min()
}

/// Pick the newest layout for `family` that `version` is at least as new as
///
/// Errors if the version is older than every layout we know about.
pub fn layout_for(family: PackageFamily, version: Version) -> Result<&'static Layout, PlatformError> {
    let found = LAYOUTS
        .iter()
        .filter(|l| l.family == family && l.since <= version)
        .max_by_key(|l| l.since);
    match found {
        Some(layout) => Ok(layout),
        None => Err(PlatformError::UnsupportedVersion {
            family,
            version,
            minimum: minimum_version(family).unwrap_or(version),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn versions_are_found_in_package_output() {
        assert_eq!(Version::find("11.7.3"), Some(Version::new(11, 7)));
        assert_eq!(Version::find("12.5.2-2"), Some(Version::new(12, 5)));
        assert_eq!(Version::find("7"), Some(Version::new(7, 0)));
        assert_eq!(Version::find("package sysstat is not installed"), None);
    }

    #[test]
    fn versions_compare_numerically() {
        assert!(Version::new(10, 0) > Version::new(9, 9));
        assert!(Version::new(5, 3) > Version::new(5, 2));
        assert_eq!(Version::new(5, 3).to_string(), "5.3");
    }

    #[test]
    fn newer_sysstat_has_steal() {
        let layout = layout_for(PackageFamily::Rpm, Version::new(11, 7)).unwrap();
        assert_eq!(layout.since, Version::new(6, 0));
        assert_eq!(layout.columns.steal, Some(6));
        assert_eq!(layout.columns.idle, 7);

        let layout = layout_for(PackageFamily::Dpkg, Version::new(5, 0)).unwrap();
        assert_eq!(layout.columns.steal, None);
        assert_eq!(layout.columns.idle, 6);
    }

    #[test]
    fn aix_lpar_columns_start_at_5_3() {
        let old = layout_for(PackageFamily::Aix, Version::new(5, 2)).unwrap();
        assert_eq!(old.columns.physc, None);
        let new = layout_for(PackageFamily::Aix, Version::new(7, 2)).unwrap();
        assert_eq!(new.columns.physc, Some(5));
        assert_eq!(new.columns.entc, Some(6));
    }

    #[test]
    fn too_old_is_unsupported() {
        match layout_for(PackageFamily::Rpm, Version::new(4, 0)) {
            Err(PlatformError::UnsupportedVersion { minimum, .. }) => {
                assert_eq!(minimum, Version::new(5, 0))
            }
            other => panic!("expected an unsupported version, got {:?}", other),
        }
    }

    #[test]
    fn every_family_has_a_minimum() {
        for family in &[
            PackageFamily::Rpm,
            PackageFamily::Dpkg,
            PackageFamily::Solaris,
            PackageFamily::Aix,
            PackageFamily::Bsd,
        ] {
            assert!(minimum_version(*family).is_some(), "{:?}", family);
        }
    }
}
