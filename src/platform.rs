//! Work out what kind of host we are running on
//!
//! The only thing the rest of the check needs to know is the
//! `PackageFamily`: it decides which `sar` to run, how to ask for its version
//! and which columns to read. Everything here is a pure function of the
//! kernel name and the contents of a handful of release files, so that it
//! can be tested without the files being present.

use std::fmt;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PlatformError;

/// The packaging world a host lives in
///
/// This picks the statistics command, the package query and the column
/// layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PackageFamily {
    /// RedHat, Amazon, SUSE, Mandrake and UnitedLinux
    Rpm,
    /// Debian and its children
    Dpkg,
    Solaris,
    Aix,
    Bsd,
}

impl fmt::Display for PackageFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            PackageFamily::Rpm => "RPM",
            PackageFamily::Dpkg => "DPKG",
            PackageFamily::Solaris => "Solaris",
            PackageFamily::Aix => "AIX",
            PackageFamily::Bsd => "BSD",
        };
        f.write_str(s)
    }
}

/// Everything we know about the host, decided once at startup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformProfile {
    /// What `uname -s` says
    pub kernel: String,
    /// The distribution label on Linux, the kernel name everywhere else
    pub distribution: String,
    pub family: PackageFamily,
}

/// The contents of the files that identify a Linux distribution
///
/// `None` means the file does not exist.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReleaseFiles {
    pub redhat: Option<String>,
    pub system: Option<String>,
    pub suse: Option<String>,
    pub mandrake: Option<String>,
    pub debian: Option<String>,
    pub united_linux: Option<String>,
}

fn read_optional(root: &Path, name: &str) -> Result<Option<String>, PlatformError> {
    let path = root.join("etc").join(name);
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(Some(contents)),
        Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(PlatformError::ReleaseFile {
            path: path.display().to_string(),
            error,
        }),
    }
}

impl ReleaseFiles {
    /// Read the release files under `<root>/etc`
    pub fn load(root: &Path) -> Result<ReleaseFiles, PlatformError> {
        Ok(ReleaseFiles {
            redhat: read_optional(root, "redhat-release")?,
            system: read_optional(root, "system-release")?,
            suse: read_optional(root, "SuSE-release")?,
            mandrake: read_optional(root, "mandrake-release")?,
            debian: read_optional(root, "debian_version")?,
            united_linux: read_optional(root, "UnitedLinux-release")?,
        })
    }

    /// The distribution label, from the first release file that exists
    ///
    /// Checked in order: redhat, system, SuSE, mandrake, debian. A
    /// UnitedLinux release file is tacked on to whatever we found, or is the
    /// label on its own if nothing else was.
    pub fn distribution(&self) -> Option<String> {
        let label = if let Some(ref contents) = self.redhat {
            trim_label(contents)
        } else if let Some(ref contents) = self.system {
            trim_label(contents)
        } else if let Some(ref contents) = self.suse {
            trim_label(contents)
        } else if let Some(ref contents) = self.mandrake {
            trim_label(contents)
        } else if let Some(ref contents) = self.debian {
            format!("Debian {}", contents.trim())
        } else {
            return self.united_linux.as_ref().map(|united| trim_label(united));
        };

        match self.united_linux {
            Some(ref united) => Some(format!("{}[ {} ]", label, trim_label(united))),
            None => Some(label),
        }
    }
}

static LABEL_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:VERSION|release).*$").unwrap());

/// Turn release-file contents into a short distribution name
///
/// "CentOS Linux release 7.9.2009 (Core)" becomes "CentOS Linux".
fn trim_label(contents: &str) -> String {
    let folded = contents.lines().collect::<Vec<_>>().join(" ");
    LABEL_TAIL.replace(&folded, "").trim().to_owned()
}

/// Map a distribution label to its package family by its first word
pub fn family_for_distribution(label: &str) -> Option<PackageFamily> {
    let first = label.split_whitespace().next()?.to_lowercase();
    match first.as_ref() {
        "red" | "redhat" | "centos" | "fedora" | "amazon" | "rocky" | "almalinux" | "oracle"
        | "suse" | "opensuse" | "mandrake" | "mandriva" | "unitedlinux" => Some(PackageFamily::Rpm),
        "debian" | "ubuntu" => Some(PackageFamily::Dpkg),
        _ => None,
    }
}

fn family_for_kernel(kernel: &str) -> Option<PackageFamily> {
    match kernel {
        "SunOS" => Some(PackageFamily::Solaris),
        "AIX" => Some(PackageFamily::Aix),
        "DragonFly" => Some(PackageFamily::Bsd),
        k if k.ends_with("BSD") => Some(PackageFamily::Bsd),
        _ => None,
    }
}

impl PlatformProfile {
    /// Classify a host from its kernel name and release files
    ///
    /// The release files are only looked at when the kernel is Linux.
    pub fn classify(kernel: &str, release: &ReleaseFiles) -> Result<PlatformProfile, PlatformError> {
        if kernel == "Linux" {
            let distribution = release.distribution().ok_or(PlatformError::NoReleaseFile)?;
            let family = family_for_distribution(&distribution)
                .ok_or_else(|| PlatformError::UnsupportedDistribution(distribution.clone()))?;
            return Ok(PlatformProfile {
                kernel: kernel.to_owned(),
                distribution,
                family,
            });
        }

        match family_for_kernel(kernel) {
            Some(family) => Ok(PlatformProfile {
                kernel: kernel.to_owned(),
                distribution: kernel.to_owned(),
                family,
            }),
            None => Err(PlatformError::UnsupportedKernel(kernel.to_owned())),
        }
    }

    /// Inspect the running host
    pub fn detect() -> Result<PlatformProfile, PlatformError> {
        let uts = nix::sys::utsname::uname().map_err(|errno| PlatformError::Spawn {
            command: "uname".to_owned(),
            error: io::Error::from(errno),
        })?;
        let kernel = uts.sysname().to_string_lossy().into_owned();
        let release = if kernel == "Linux" {
            ReleaseFiles::load(Path::new("/"))?
        } else {
            ReleaseFiles::default()
        };
        let profile = PlatformProfile::classify(&kernel, &release)?;
        debug!(
            "detected kernel={} distribution={:?} family={}",
            profile.kernel, profile.distribution, profile.family
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn linux(release: ReleaseFiles) -> Result<PlatformProfile, PlatformError> {
        PlatformProfile::classify("Linux", &release)
    }

    #[test]
    fn redhat_family() {
        let profile = linux(ReleaseFiles {
            redhat: Some("CentOS Linux release 7.9.2009 (Core)\n".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(profile.distribution, "CentOS Linux");
        assert_eq!(profile.family, PackageFamily::Rpm);

        let profile = linux(ReleaseFiles {
            redhat: Some("Red Hat Enterprise Linux Server release 6.10 (Santiago)".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(profile.family, PackageFamily::Rpm);
    }

    #[test]
    fn amazon_uses_system_release() {
        let profile = linux(ReleaseFiles {
            system: Some("Amazon Linux release 2 (Karoo)".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(profile.distribution, "Amazon Linux");
        assert_eq!(profile.family, PackageFamily::Rpm);
    }

    #[test]
    fn redhat_release_wins_over_system_release() {
        let release = ReleaseFiles {
            redhat: Some("Fedora release 38 (Thirty Eight)".into()),
            system: Some("Something Else release 1".into()),
            ..Default::default()
        };
        assert_eq!(release.distribution().unwrap(), "Fedora");
    }

    #[test]
    fn suse_drops_version_lines() {
        let profile = linux(ReleaseFiles {
            suse: Some("SUSE Linux Enterprise Server 11 (x86_64)\nVERSION = 11\nPATCHLEVEL = 4\n".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(profile.distribution, "SUSE Linux Enterprise Server 11 (x86_64)");
        assert_eq!(profile.family, PackageFamily::Rpm);
    }

    #[test]
    fn united_linux_is_appended() {
        let release = ReleaseFiles {
            suse: Some("SuSE SLES-8 (i386)\nVERSION = 8.1\n".into()),
            united_linux: Some("UnitedLinux 1.0 (i586)\nVERSION = 1.0\n".into()),
            ..Default::default()
        };
        assert_eq!(
            release.distribution().unwrap(),
            "SuSE SLES-8 (i386)[ UnitedLinux 1.0 (i586) ]"
        );
        assert_eq!(linux(release).unwrap().family, PackageFamily::Rpm);
    }

    #[test]
    fn united_linux_on_its_own() {
        let profile = linux(ReleaseFiles {
            united_linux: Some("UnitedLinux 1.0 (i586)\nVERSION = 1.0\n".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(profile.distribution, "UnitedLinux 1.0 (i586)");
        assert_eq!(profile.family, PackageFamily::Rpm);
    }

    #[test]
    fn debian_version_is_prefixed() {
        let profile = linux(ReleaseFiles {
            debian: Some("12.4\n".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(profile.distribution, "Debian 12.4");
        assert_eq!(profile.family, PackageFamily::Dpkg);
    }

    #[test]
    fn unknown_distribution_is_an_error() {
        match linux(ReleaseFiles {
            redhat: Some("Frobnitz OS release 3".into()),
            ..Default::default()
        }) {
            Err(PlatformError::UnsupportedDistribution(d)) => assert_eq!(d, "Frobnitz OS"),
            other => panic!("expected an unsupported distribution, got {:?}", other),
        }

        match linux(ReleaseFiles::default()) {
            Err(PlatformError::NoReleaseFile) => {}
            other => panic!("expected no release file, got {:?}", other),
        }
    }

    #[test]
    fn other_kernels() {
        let none = ReleaseFiles::default();
        let family = |k: &str| PlatformProfile::classify(k, &none).map(|p| p.family).ok();
        assert_eq!(family("SunOS"), Some(PackageFamily::Solaris));
        assert_eq!(family("AIX"), Some(PackageFamily::Aix));
        assert_eq!(family("FreeBSD"), Some(PackageFamily::Bsd));
        assert_eq!(family("OpenBSD"), Some(PackageFamily::Bsd));
        assert_eq!(family("DragonFly"), Some(PackageFamily::Bsd));
        assert_eq!(family("Darwin"), None);
    }

    #[test]
    fn release_files_load_from_disk() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("etc")).unwrap();
        fs::write(root.path().join("etc/debian_version"), "bookworm/sid\n").unwrap();

        let release = ReleaseFiles::load(root.path()).unwrap();
        assert_eq!(release.redhat, None);
        assert_eq!(release.debian.as_ref().map(|s| s.as_str()), Some("bookworm/sid\n"));

        let profile = PlatformProfile::classify("Linux", &release).unwrap();
        assert_eq!(profile.distribution, "Debian bookworm/sid");
        assert_eq!(profile.family, PackageFamily::Dpkg);
    }
}
