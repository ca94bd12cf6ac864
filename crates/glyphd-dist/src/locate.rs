//! Resolution of the installed glyphd binary.
//!
//! Three sources are tried in order: the binary bundled with the aggregator
//! package, the platform package installed as an optional dependency, and
//! finally an on-demand fetch of the release artifact.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fetch::Fetcher;
use crate::platform::{self, Os, PlatformKey, UnsupportedPlatform};

/// Windows ships two ABI builds. The MSVC binary always wins over the GNU
/// one when both are present; callers never see the tie-break.
const WINDOWS_CANDIDATES: &[&str] = &["glyphd.exe", "glyphd-gnu.exe"];
const UNIX_CANDIDATES: &[&str] = &["glyphd"];

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("unsupported platform {os}-{arch} (supported: {supported})")]
    Unsupported {
        os: String,
        arch: String,
        supported: String,
    },

    #[error(
        "no glyphd binary available for {platform}; reinstall the package or place a binary \
         under bin/ manually (supported: {supported})"
    )]
    NotFound { platform: String, supported: String },
}

impl From<UnsupportedPlatform> for LocateError {
    fn from(err: UnsupportedPlatform) -> Self {
        LocateError::Unsupported {
            os: err.os,
            arch: err.arch,
            supported: platform::supported_list(),
        }
    }
}

pub struct Locator {
    root: PathBuf,
    version: String,
    key: PlatformKey,
    fetcher: Fetcher,
}

impl Locator {
    /// Locator for the platform this process is running on.
    pub fn new(root: PathBuf, version: String, fetcher: Fetcher) -> Result<Self, LocateError> {
        let key = PlatformKey::current()?;
        Ok(Self::for_platform(root, version, fetcher, key))
    }

    /// Locator for an explicit platform key.
    pub fn for_platform(
        root: PathBuf,
        version: String,
        fetcher: Fetcher,
        key: PlatformKey,
    ) -> Self {
        Self {
            root,
            version,
            key,
            fetcher,
        }
    }

    /// Resolve the binary path, fetching the release artifact if neither the
    /// bundled nor the delegated copy exists.
    pub async fn locate<F>(&self, progress: Option<F>) -> Result<PathBuf, LocateError>
    where
        F: Fn(u64, u64),
    {
        if let Some(path) = self.bundled() {
            log::debug!("using bundled binary at {}", path.display());
            return Ok(path);
        }
        if let Some(path) = self.delegated() {
            log::debug!("using platform package binary at {}", path.display());
            return Ok(path);
        }
        self.fetched(progress).await
    }

    fn bundled(&self) -> Option<PathBuf> {
        probe(&self.root.join("bin"), self.key.os)
    }

    fn delegated(&self) -> Option<PathBuf> {
        let spec = platform::spec_for(self.key)?;
        let bin_dir = self
            .root
            .join("node_modules")
            .join(spec.package)
            .join("bin");
        probe(&bin_dir, self.key.os)
    }

    async fn fetched<F>(&self, progress: Option<F>) -> Result<PathBuf, LocateError>
    where
        F: Fn(u64, u64),
    {
        let dest = self.root.join("bin");
        match self
            .fetcher
            .fetch_and_install(self.key, &self.version, &dest, progress)
            .await
        {
            Ok(binary) => Ok(binary.path),
            Err(err) => {
                log::warn!("on-demand fetch failed for {}: {}", self.key, err);
                Err(LocateError::NotFound {
                    platform: self.key.to_string(),
                    supported: platform::supported_list(),
                })
            }
        }
    }
}

/// Probe a bin directory for the platform's executable variants, in
/// preference order.
fn probe(bin_dir: &Path, os: Os) -> Option<PathBuf> {
    let candidates = match os {
        Os::Windows => WINDOWS_CANDIDATES,
        _ => UNIX_CANDIDATES,
    };
    candidates
        .iter()
        .map(|name| bin_dir.join(name))
        .find(|path| path.is_file())
}
