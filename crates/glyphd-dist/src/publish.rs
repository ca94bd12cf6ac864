//! Release publishing pipeline.
//!
//! Per release: sync manifests, stage built artifacts into the platform
//! packages, publish every staged platform package (one failure never stops
//! the siblings), poll the registry until each published package is visible,
//! then publish the aggregator. A platform whose artifact is missing or
//! fails to stage counts as failed and its package is never pushed. If any
//! platform failed the aggregator is withheld and the release fails.

use std::path::Path;
use std::time::Duration;

use crate::layout::Layout;
use crate::manifest::{self, ManifestError, SyncReport};
use crate::platform::{Os, PlatformSpec, MAIN_PACKAGE, PLATFORMS};
use crate::registry::{Clock, Registry};
use crate::util;

pub const AVAILABILITY_ATTEMPTS: u32 = 30;
pub const AVAILABILITY_INTERVAL: Duration = Duration::from_secs(10);
/// Pacing delay before the aggregator publish, applied in addition to the
/// availability poll.
pub const MAIN_PUBLISH_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    Failed,
}

/// Per-package publish outcome.
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub package: String,
    pub outcome: PublishOutcome,
    pub error: Option<String>,
}

/// Batch report for one release.
#[derive(Debug, Default)]
pub struct PublishSummary {
    pub published: Vec<String>,
    pub failed: Vec<PublishResult>,
    /// Published but never became visible within the poll bound. Soft
    /// warning only; does not fail the release.
    pub unavailable: Vec<String>,
    /// Platforms whose artifact was staged into its package.
    pub staged: Vec<String>,
    pub sync: Option<SyncReport>,
}

impl PublishSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn main_published(&self) -> bool {
        self.published.iter().any(|name| name == MAIN_PACKAGE)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub dry_run: bool,
    pub skip_platforms: bool,
    pub skip_main: bool,
}

pub struct PublishPipeline<'a> {
    layout: Layout,
    registry: &'a dyn Registry,
    clock: &'a dyn Clock,
}

impl<'a> PublishPipeline<'a> {
    pub fn new(layout: Layout, registry: &'a dyn Registry, clock: &'a dyn Clock) -> Self {
        Self {
            layout,
            registry,
            clock,
        }
    }

    /// Run the whole pipeline for one release version.
    ///
    /// Only a manifest failure is an `Err`: it aborts before anything has
    /// been pushed. Everything after that is reported per package in the
    /// returned summary.
    pub fn publish_release(
        &self,
        version: &str,
        options: &PublishOptions,
    ) -> Result<PublishSummary, ManifestError> {
        let mut summary = PublishSummary::default();

        // manifest writes must land before any publish step reads them
        summary.sync = Some(manifest::sync_versions(&self.layout, version)?);

        if !options.skip_platforms {
            let ready = self.stage_artifacts(&mut summary);
            self.publish_platforms(&ready, options.dry_run, &mut summary);
            if !options.dry_run {
                self.await_availability(version, &mut summary);
            }
        }

        if options.skip_main {
            return Ok(summary);
        }
        if !summary.failed.is_empty() {
            log::error!(
                "withholding {}: {} platform package(s) failed to publish",
                MAIN_PACKAGE,
                summary.failed.len()
            );
            return Ok(summary);
        }

        if !options.dry_run {
            self.clock.sleep(MAIN_PUBLISH_DELAY);
        }
        match self
            .registry
            .publish(self.layout.root(), MAIN_PACKAGE, options.dry_run)
        {
            Ok(()) => {
                log::info!("published {MAIN_PACKAGE}@{version}");
                summary.published.push(MAIN_PACKAGE.to_string());
            }
            Err(err) => {
                log::error!("failed to publish {MAIN_PACKAGE}: {err}");
                summary.failed.push(PublishResult {
                    package: MAIN_PACKAGE.to_string(),
                    outcome: PublishOutcome::Failed,
                    error: Some(err.to_string()),
                });
            }
        }

        Ok(summary)
    }

    /// Copy built artifacts from dist/ into each platform package's bin
    /// directory, applying the executable bit where the OS needs one.
    ///
    /// Returns the platforms whose package may be published. A missing
    /// artifact or a copy error fails that platform; its package must not
    /// go out without a binary inside.
    fn stage_artifacts(&self, summary: &mut PublishSummary) -> Vec<&'static PlatformSpec> {
        let mut ready = Vec::new();
        for spec in PLATFORMS {
            let source = self.layout.artifact_dir(spec.artifact);
            let outcome = if source.is_dir() {
                stage_one(spec, &source, &self.layout.package_bin_dir(spec.key))
                    .map_err(|err| err.to_string())
            } else {
                Err(format!("no built artifact at {}", source.display()))
            };
            match outcome {
                Ok(()) => {
                    summary.staged.push(spec.key.to_string());
                    ready.push(spec);
                }
                Err(reason) => {
                    log::error!("staging {} failed: {reason}", spec.key);
                    summary.failed.push(PublishResult {
                        package: spec.package.to_string(),
                        outcome: PublishOutcome::Failed,
                        error: Some(format!("staging failed: {reason}")),
                    });
                }
            }
        }
        ready
    }

    fn publish_platforms(
        &self,
        specs: &[&'static PlatformSpec],
        dry_run: bool,
        summary: &mut PublishSummary,
    ) {
        for spec in specs {
            let dir = self.layout.package_dir(spec.key);
            match self.registry.publish(&dir, spec.package, dry_run) {
                Ok(()) => {
                    log::info!("published {}", spec.package);
                    summary.published.push(spec.package.to_string());
                }
                Err(err) => {
                    // one rejected package must not stop its siblings
                    log::error!("failed to publish {}: {}", spec.package, err);
                    summary.failed.push(PublishResult {
                        package: spec.package.to_string(),
                        outcome: PublishOutcome::Failed,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
    }

    fn await_availability(&self, version: &str, summary: &mut PublishSummary) {
        let published = summary.published.clone();
        for package in &published {
            if !self.poll_visible(package, version) {
                log::warn!(
                    "{package}@{version} still not visible after {AVAILABILITY_ATTEMPTS} attempts"
                );
                summary.unavailable.push(package.clone());
            }
        }
    }

    fn poll_visible(&self, package: &str, version: &str) -> bool {
        for attempt in 1..=AVAILABILITY_ATTEMPTS {
            if self.registry.view_version(package, version).is_ok() {
                return true;
            }
            if attempt < AVAILABILITY_ATTEMPTS {
                log::debug!(
                    "waiting for {package}@{version} (attempt {attempt}/{AVAILABILITY_ATTEMPTS})"
                );
                self.clock.sleep(AVAILABILITY_INTERVAL);
            }
        }
        false
    }
}

fn stage_one(spec: &PlatformSpec, source: &Path, bin_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(bin_dir)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let dest = bin_dir.join(entry.file_name());
        std::fs::copy(entry.path(), &dest)?;

        if spec.key.os != Os::Windows {
            if let Err(err) = util::set_executable(&dest) {
                log::warn!(
                    "could not set execute permission on {}: {}",
                    dest.display(),
                    err
                );
            }
        }
    }
    Ok(())
}
