//! Host platform and architecture resolution
//!
//! Maps the identifiers reported by the host into the canonical strings used
//! by release artifact names (`spin-v2.0.0-linux-amd64.tar.gz`).

use crate::provision::ProvisionError;
use std::fmt;

/// Operating systems a tool release can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOs,
    FreeBsd,
    Linux,
    OpenBsd,
    Windows,
}

impl Platform {
    /// Maps a host OS identifier to a platform.
    ///
    /// Accepts both the Rust `std::env::consts::OS` spelling and the
    /// `darwin`/`win32` spelling used by most CI runners.
    pub fn from_host_id(id: &str) -> Result<Self, ProvisionError> {
        match id {
            "darwin" | "macos" => Ok(Platform::MacOs),
            "freebsd" => Ok(Platform::FreeBsd),
            "linux" => Ok(Platform::Linux),
            "openbsd" => Ok(Platform::OpenBsd),
            "win32" | "windows" => Ok(Platform::Windows),
            other => Err(ProvisionError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::MacOs => "macos",
            Platform::FreeBsd => "freebsd",
            Platform::Linux => "linux",
            Platform::OpenBsd => "openbsd",
            Platform::Windows => "windows",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architectures a tool release can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Arm,
    Aarch64,
    I386,
    Amd64,
}

impl Arch {
    /// Maps a host CPU identifier to an architecture.
    ///
    /// `arm64`, `x32` and `x64` are the runner spellings; `aarch64`, `x86`
    /// and `x86_64` are what `std::env::consts::ARCH` reports.
    pub fn from_host_id(id: &str) -> Result<Self, ProvisionError> {
        match id {
            "arm" => Ok(Arch::Arm),
            "arm64" | "aarch64" => Ok(Arch::Aarch64),
            "x32" | "x86" => Ok(Arch::I386),
            "x64" | "x86_64" => Ok(Arch::Amd64),
            other => Err(ProvisionError::UnsupportedArch(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Aarch64 => "aarch64",
            Arch::I386 => "386",
            Arch::Amd64 => "amd64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the platform of the running host
pub fn resolve_platform() -> Result<Platform, ProvisionError> {
    Platform::from_host_id(std::env::consts::OS)
}

/// Resolves the CPU architecture of the running host
pub fn resolve_arch() -> Result<Arch, ProvisionError> {
    Arch::from_host_id(std::env::consts::ARCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_canonical_names() {
        assert_eq!(Platform::from_host_id("darwin").unwrap().as_str(), "macos");
        assert_eq!(Platform::from_host_id("freebsd").unwrap().as_str(), "freebsd");
        assert_eq!(Platform::from_host_id("linux").unwrap().as_str(), "linux");
        assert_eq!(Platform::from_host_id("openbsd").unwrap().as_str(), "openbsd");
        assert_eq!(Platform::from_host_id("win32").unwrap().as_str(), "windows");
    }

    #[test]
    fn test_platform_rust_spellings() {
        assert_eq!(Platform::from_host_id("macos").unwrap(), Platform::MacOs);
        assert_eq!(Platform::from_host_id("windows").unwrap(), Platform::Windows);
    }

    #[test]
    fn test_platform_unsupported() {
        let err = Platform::from_host_id("aix").unwrap_err();
        assert!(matches!(err, ProvisionError::UnsupportedPlatform(ref p) if p == "aix"));
        assert!(Platform::from_host_id("").is_err());
    }

    #[test]
    fn test_arch_canonical_names() {
        assert_eq!(Arch::from_host_id("arm").unwrap().as_str(), "arm");
        assert_eq!(Arch::from_host_id("arm64").unwrap().as_str(), "aarch64");
        assert_eq!(Arch::from_host_id("x32").unwrap().as_str(), "386");
        assert_eq!(Arch::from_host_id("x64").unwrap().as_str(), "amd64");
    }

    #[test]
    fn test_arch_unsupported() {
        let err = Arch::from_host_id("mips").unwrap_err();
        assert!(matches!(err, ProvisionError::UnsupportedArch(ref a) if a == "mips"));
        assert!(Arch::from_host_id("ppc64").is_err());
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(format!("{}-{}", Platform::Linux, Arch::Amd64), "linux-amd64");
    }
}
