use std::fs;
use std::path::Path;

use crate::error::{InstallError, Result};

/// Host operating systems the installer knows how to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// Platform this binary was built for.
    ///
    /// # Errors
    ///
    /// Returns an error on operating systems without an install path.
    pub fn current() -> Result<Self> {
        if cfg!(target_os = "linux") {
            Ok(Self::Linux)
        } else if cfg!(target_os = "macos") {
            Ok(Self::MacOs)
        } else if cfg!(target_os = "windows") {
            Ok(Self::Windows)
        } else {
            Err(InstallError::UnsupportedPlatform(
                std::env::consts::OS.to_owned(),
            ))
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::MacOs => "macOS",
            Self::Windows => "Windows",
        }
    }
}

/// Linux distribution families the package step can target.
///
/// `Other` falls back to the distribution-agnostic convenience script, so
/// detection never blocks an installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinuxDistro {
    /// Debian and derivatives (Ubuntu included).
    Debian,
    /// Fedora family, including CentOS and RHEL.
    Fedora,
    Other,
}

impl LinuxDistro {
    /// Detect the running distribution from `/etc/os-release`, with the
    /// older per-family release files as fallback probes.
    #[must_use]
    pub fn detect() -> Self {
        Self::detect_in(Path::new("/etc"))
    }

    fn detect_in(etc: &Path) -> Self {
        if let Ok(contents) = fs::read_to_string(etc.join("os-release")) {
            if let Some(id) = parse_os_release_id(&contents) {
                return Self::from_id(&id);
            }
        }

        for (probe, distro) in [
            ("debian_version", Self::Debian),
            ("fedora-release", Self::Fedora),
            ("centos-release", Self::Fedora),
            ("redhat-release", Self::Fedora),
        ] {
            if etc.join(probe).exists() {
                return distro;
            }
        }

        Self::Other
    }

    fn from_id(id: &str) -> Self {
        match id {
            "ubuntu" | "debian" => Self::Debian,
            "fedora" | "centos" | "rhel" => Self::Fedora,
            _ => Self::Other,
        }
    }
}

fn parse_os_release_id(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        line.strip_prefix("ID=")
            .map(|value| value.trim().trim_matches('"').to_ascii_lowercase())
    })
}
