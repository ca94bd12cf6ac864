//! Registry operations and the clock behind availability polling.
//!
//! The registry itself is external; this module only shells out to the
//! `npm` CLI for the two operations the pipeline needs: pushing a package
//! and checking whether a published version is visible yet.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("publish of {package} failed: {reason}")]
    Rejected { package: String, reason: String },

    #[error("{package}@{version} is not visible on the registry")]
    NotVisible { package: String, version: String },
}

pub trait Registry {
    /// Push one package directory to the registry.
    fn publish(&self, package_dir: &Path, package: &str, dry_run: bool)
        -> Result<(), PublishError>;

    /// Check whether `package@version` is visible on the registry.
    fn view_version(&self, package: &str, version: &str) -> Result<(), PublishError>;
}

/// Registry backed by the `npm` CLI.
pub struct NpmRegistry;

impl Registry for NpmRegistry {
    fn publish(
        &self,
        package_dir: &Path,
        package: &str,
        dry_run: bool,
    ) -> Result<(), PublishError> {
        let mut command = Command::new("npm");
        command.arg("publish").current_dir(package_dir);
        if dry_run {
            command.arg("--dry-run");
        }

        let output = command.output().map_err(|source| PublishError::Spawn {
            command: "npm publish".to_string(),
            source,
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(PublishError::Rejected {
                package: package.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn view_version(&self, package: &str, version: &str) -> Result<(), PublishError> {
        let status = Command::new("npm")
            .args(["view", &format!("{package}@{version}"), "version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| PublishError::Spawn {
                command: "npm view".to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(PublishError::NotVisible {
                package: package.to_string(),
                version: version.to_string(),
            })
        }
    }
}

/// Sleep abstraction so the pipeline's waits can run without real time in
/// tests.
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
