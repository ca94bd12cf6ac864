//! Filesystem layout of the glyphd distribution repository.
//!
//! ```text
//! <root>/package.json              aggregator manifest
//! <root>/bin/                      bundled binary (aggregator package)
//! <root>/packages/<os>-<arch>/     one npm package per shipped platform
//! <root>/dist/<artifact>/          built artifacts waiting to be staged
//! ```

use std::path::{Path, PathBuf};

use crate::platform::PlatformKey;

#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn main_manifest(&self) -> PathBuf {
        self.root.join("package.json")
    }

    pub fn bundled_bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    pub fn package_dir(&self, key: PlatformKey) -> PathBuf {
        self.packages_dir().join(key.to_string())
    }

    pub fn package_bin_dir(&self, key: PlatformKey) -> PathBuf {
        self.package_dir(key).join("bin")
    }

    pub fn platform_manifest(&self, key: PlatformKey) -> PathBuf {
        self.package_dir(key).join("package.json")
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root.join("dist")
    }

    pub fn artifact_dir(&self, artifact: &str) -> PathBuf {
        self.dist_dir().join(artifact)
    }
}
