//! Platform resolution for the glyphd release matrix.
//!
//! Every other component keys off a [`PlatformKey`]: the fetcher derives
//! download URLs from it, the locator derives package paths, and the
//! publish pipeline iterates the fixed [`PLATFORMS`] table so that staging,
//! publishing and reporting always happen in the same order.

use std::fmt;

use thiserror::Error;

/// npm name of the aggregator package.
pub const MAIN_PACKAGE: &str = "glyphd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Windows,
    Linux,
    Macos,
}

impl Os {
    /// Map a raw OS identifier to a canonical value.
    ///
    /// Accepts both our canonical names and the identifiers used by node
    /// (`win32`, `darwin`) so manifests written by either side resolve.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "windows" | "win32" => Some(Os::Windows),
            "linux" => Some(Os::Linux),
            "macos" | "darwin" | "osx" => Some(Os::Macos),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Os::Windows => "windows",
            Os::Linux => "linux",
            Os::Macos => "macos",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    Arm64,
}

impl Arch {
    /// Map a raw architecture identifier to a canonical value.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "x64" | "x86_64" | "amd64" => Some(Arch::X64),
            "arm64" | "aarch64" => Some(Arch::Arm64),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical (OS, architecture) pair selecting one binary variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    pub os: Os,
    pub arch: Arch,
}

impl PlatformKey {
    /// Resolve the platform this process is running on.
    pub fn current() -> Result<Self, UnsupportedPlatform> {
        resolve(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Canonical name of the installed executable for this platform.
    pub fn executable_name(self) -> &'static str {
        match self.os {
            Os::Windows => "glyphd.exe",
            _ => "glyphd",
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Raw identifiers that did not map to any supported platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported platform: {os}-{arch}")]
pub struct UnsupportedPlatform {
    pub os: String,
    pub arch: String,
}

/// Resolve raw OS and architecture identifiers into a [`PlatformKey`].
///
/// Pure and total: any unrecognized identifier yields [`UnsupportedPlatform`]
/// carrying the original strings for diagnostics.
pub fn resolve(os_id: &str, arch_id: &str) -> Result<PlatformKey, UnsupportedPlatform> {
    match (Os::from_id(os_id), Arch::from_id(arch_id)) {
        (Some(os), Some(arch)) => Ok(PlatformKey { os, arch }),
        _ => Err(UnsupportedPlatform {
            os: os_id.to_string(),
            arch: arch_id.to_string(),
        }),
    }
}

/// One row of the release matrix.
#[derive(Debug, Clone, Copy)]
pub struct PlatformSpec {
    pub key: PlatformKey,
    /// Cargo target triple used by `glyphd-dist build`.
    pub target: &'static str,
    /// npm name of the platform package.
    pub package: &'static str,
    /// Base name of the release artifact (archive name without extension).
    pub artifact: &'static str,
    /// Executable file name inside the artifact and the package's bin/.
    pub executable: &'static str,
}

/// The shipped platforms, in the order every pipeline step iterates them.
pub const PLATFORMS: &[PlatformSpec] = &[
    PlatformSpec {
        key: PlatformKey { os: Os::Windows, arch: Arch::X64 },
        target: "x86_64-pc-windows-msvc",
        package: "glyphd-windows-x64",
        artifact: "glyphd-windows-x64",
        executable: "glyphd.exe",
    },
    PlatformSpec {
        key: PlatformKey { os: Os::Linux, arch: Arch::X64 },
        target: "x86_64-unknown-linux-gnu",
        package: "glyphd-linux-x64",
        artifact: "glyphd-linux-x64",
        executable: "glyphd",
    },
    PlatformSpec {
        key: PlatformKey { os: Os::Macos, arch: Arch::X64 },
        target: "x86_64-apple-darwin",
        package: "glyphd-macos-x64",
        artifact: "glyphd-macos-x64",
        executable: "glyphd",
    },
    PlatformSpec {
        key: PlatformKey { os: Os::Macos, arch: Arch::Arm64 },
        target: "aarch64-apple-darwin",
        package: "glyphd-macos-arm64",
        artifact: "glyphd-macos-arm64",
        executable: "glyphd",
    },
];

/// Look up the release matrix entry for a platform, if it ships.
pub fn spec_for(key: PlatformKey) -> Option<&'static PlatformSpec> {
    PLATFORMS.iter().find(|spec| spec.key == key)
}

/// Human-readable list of shipped platforms for diagnostics.
pub fn supported_list() -> String {
    PLATFORMS
        .iter()
        .map(|spec| spec.key.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
