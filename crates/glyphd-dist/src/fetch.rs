//! On-demand artifact install: download, extract, and normalize the binary.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::archive::{self, ArchiveFormat, ExtractError};
use crate::http::{HttpClient, HttpError};
use crate::platform::{Os, PlatformKey};
use crate::util;

/// Release download base; overridable so tests can point at a local server.
pub const DEFAULT_RELEASE_BASE: &str = "https://github.com/glyphd/glyphd/releases/download";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RELEASE_BASE.to_string(),
        }
    }
}

/// One release artifact for one platform and version. Built per install
/// attempt, never persisted.
#[derive(Debug, Clone)]
pub struct ArtifactDescriptor {
    pub key: PlatformKey,
    pub url: String,
    pub format: ArchiveFormat,
    /// File name the archive is expected to contain.
    pub executable: &'static str,
}

/// The installed binary: where it landed and whether it is executable.
#[derive(Debug, Clone)]
pub struct InstalledBinary {
    pub path: PathBuf,
    pub executable: bool,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download failed with HTTP {0}")]
    HttpStatus(u16),

    #[error("i/o error during download: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to extract archive: {0}")]
    Extract(#[from] ExtractError),

    #[error("archive did not contain the expected executable {0}")]
    MissingExecutable(String),
}

impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status { status, .. } => FetchError::HttpStatus(status),
            HttpError::Io(err) => FetchError::Io(err),
            other => FetchError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                other.to_string(),
            )),
        }
    }
}

pub struct Fetcher {
    http: HttpClient,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(FetchConfig::default())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self, FetchError> {
        Ok(Self {
            http: HttpClient::new()?,
            config,
        })
    }

    /// Describe the release artifact for one platform and version.
    pub fn descriptor(&self, key: PlatformKey, version: &str) -> ArtifactDescriptor {
        let format = ArchiveFormat::for_os(key.os);
        let url = format!(
            "{}/v{}/glyphd-{}.{}",
            self.config.base_url.trim_end_matches('/'),
            version,
            key,
            format.extension(),
        );
        ArtifactDescriptor {
            key,
            url,
            format,
            executable: key.executable_name(),
        }
    }

    /// Download the artifact for `key`/`version` and install its executable
    /// into `dest_dir`.
    ///
    /// The temporary archive is removed on every exit path, success or not.
    pub async fn fetch_and_install<F>(
        &self,
        key: PlatformKey,
        version: &str,
        dest_dir: &Path,
        progress: Option<F>,
    ) -> Result<InstalledBinary, FetchError>
    where
        F: Fn(u64, u64),
    {
        let descriptor = self.descriptor(key, version);
        tokio::fs::create_dir_all(dest_dir).await?;

        let archive_path =
            dest_dir.join(format!("glyphd-download.{}", descriptor.format.extension()));
        log::info!("downloading {}", descriptor.url);

        let result = self
            .install_inner(&descriptor, dest_dir, &archive_path, progress)
            .await;
        let _ = tokio::fs::remove_file(&archive_path).await;
        result
    }

    async fn install_inner<F>(
        &self,
        descriptor: &ArtifactDescriptor,
        dest_dir: &Path,
        archive_path: &Path,
        progress: Option<F>,
    ) -> Result<InstalledBinary, FetchError>
    where
        F: Fn(u64, u64),
    {
        self.http
            .download(&descriptor.url, archive_path, progress)
            .await?;

        archive::extract(archive_path, dest_dir, descriptor.format)?;

        let extracted = dest_dir.join(descriptor.executable);
        if !extracted.is_file() {
            return Err(FetchError::MissingExecutable(
                descriptor.executable.to_string(),
            ));
        }

        let target = dest_dir.join(descriptor.key.executable_name());
        if extracted != target {
            std::fs::rename(&extracted, &target)?;
        }

        let executable = mark_executable(&target, descriptor.key.os);
        Ok(InstalledBinary {
            path: target,
            executable,
        })
    }
}

/// Apply the executable bit where the OS needs one. Best effort: a chmod
/// failure downgrades to a warning, the install itself stands.
fn mark_executable(path: &Path, os: Os) -> bool {
    if os == Os::Windows {
        return true;
    }
    match util::set_executable(path) {
        Ok(()) => cfg!(unix),
        Err(err) => {
            log::warn!(
                "could not set execute permission on {}: {}",
                path.display(),
                err
            );
            false
        }
    }
}
