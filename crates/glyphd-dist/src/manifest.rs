//! Package manifest (package.json) reading, rewriting, and version sync.
//!
//! Manifests are parsed into `serde_json` maps with key order preserved, so
//! a rewrite touches only the fields we own and leaves unknown fields
//! exactly where they were.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::layout::Layout;
use crate::platform::PLATFORMS;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{} is not a JSON object", path.display())]
    NotAnObject { path: PathBuf },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One on-disk package.json, loaded whole so saving preserves every field.
#[derive(Debug, Clone)]
pub struct PackageManifest {
    path: PathBuf,
    doc: Map<String, Value>,
}

impl PackageManifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let Value::Object(doc) = value else {
            return Err(ManifestError::NotAnObject {
                path: path.to_path_buf(),
            });
        };
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.doc.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.doc.get("version").and_then(Value::as_str)
    }

    pub fn set_version(&mut self, version: &str) {
        self.doc
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Pin an existing optionalDependencies entry to an exact version.
    /// Returns false when the manifest does not list the package.
    pub fn pin_optional_dependency(&mut self, package: &str, version: &str) -> bool {
        let Some(deps) = self
            .doc
            .get_mut("optionalDependencies")
            .and_then(Value::as_object_mut)
        else {
            return false;
        };
        match deps.get_mut(package) {
            Some(entry) => {
                *entry = Value::String(version.to_string());
                true
            }
            None => false,
        }
    }

    /// Write the manifest back to its path, pretty-printed with a trailing
    /// newline. Same input, same bytes: the sync pass is idempotent.
    pub fn save(&self) -> Result<(), ManifestError> {
        let value = Value::Object(self.doc.clone());
        let mut content =
            serde_json::to_string_pretty(&value).map_err(|source| ManifestError::Parse {
                path: self.path.clone(),
                source,
            })?;
        content.push('\n');
        fs::write(&self.path, content).map_err(|source| ManifestError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Result of one version synchronization pass.
#[derive(Debug, Default, Clone)]
pub struct SyncReport {
    /// Packages whose manifest was rewritten, aggregator first.
    pub updated: Vec<String>,
    /// Platform packages pinned in the aggregator's optionalDependencies.
    pub pinned: Vec<String>,
    /// Shipped platforms whose manifest was absent.
    pub missing: Vec<String>,
}

/// Set every manifest in the repository to `version`.
///
/// The aggregator manifest gets its version and exact optionalDependency
/// pins rewritten; each platform manifest gets its version. A missing
/// platform manifest is reported, not fatal; parse and write errors are.
pub fn sync_versions(layout: &Layout, version: &str) -> Result<SyncReport, ManifestError> {
    let mut report = SyncReport::default();

    let mut main = PackageManifest::load(&layout.main_manifest())?;
    main.set_version(version);
    for spec in PLATFORMS {
        if main.pin_optional_dependency(spec.package, version) {
            report.pinned.push(spec.package.to_string());
        }
    }
    main.save()?;
    report
        .updated
        .push(main.name().unwrap_or(crate::platform::MAIN_PACKAGE).to_string());

    for spec in PLATFORMS {
        let path = layout.platform_manifest(spec.key);
        if !path.exists() {
            log::warn!("manifest missing for {}: {}", spec.key, path.display());
            report.missing.push(spec.key.to_string());
            continue;
        }
        let mut manifest = PackageManifest::load(&path)?;
        manifest.set_version(version);
        manifest.save()?;
        report.updated.push(spec.package.to_string());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(root: &Path) {
        fs::write(
            root.join("package.json"),
            r#"{
  "name": "glyphd",
  "version": "0.9.0",
  "description": "native glyph renderer",
  "bin": {
    "glyphd": "index.js"
  },
  "optionalDependencies": {
    "glyphd-windows-x64": "0.9.0",
    "glyphd-linux-x64": "0.9.0",
    "glyphd-macos-x64": "0.9.0",
    "glyphd-macos-arm64": "0.9.0",
    "left-pad": "^1.3.0"
  },
  "keywords": ["glyph", "renderer"]
}
"#,
        )
        .unwrap();

        for key in ["windows-x64", "linux-x64", "macos-x64"] {
            let dir = root.join("packages").join(key);
            fs::create_dir_all(&dir).unwrap();
            fs::write(
                dir.join("package.json"),
                format!(
                    r#"{{
  "name": "glyphd-{key}",
  "version": "0.9.0",
  "os": ["anything"]
}}
"#
                ),
            )
            .unwrap();
        }
        // macos-arm64 manifest deliberately absent
    }

    #[test]
    fn test_sync_sets_all_versions_and_pins() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let layout = Layout::new(dir.path());

        let report = sync_versions(&layout, "1.2.3").unwrap();

        assert_eq!(report.updated.len(), 4); // aggregator + three platforms
        assert_eq!(report.missing, vec!["macos-arm64"]);
        assert_eq!(report.pinned.len(), 4);

        let main = PackageManifest::load(&layout.main_manifest()).unwrap();
        assert_eq!(main.version(), Some("1.2.3"));

        for key in ["windows-x64", "linux-x64", "macos-x64"] {
            let path = dir.path().join("packages").join(key).join("package.json");
            let manifest = PackageManifest::load(&path).unwrap();
            assert_eq!(manifest.version(), Some("1.2.3"));
        }
    }

    #[test]
    fn test_sync_pins_are_exact_and_leave_other_deps_alone() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let layout = Layout::new(dir.path());

        sync_versions(&layout, "1.2.3").unwrap();

        let content = fs::read_to_string(layout.main_manifest()).unwrap();
        let doc: Value = serde_json::from_str(&content).unwrap();
        let deps = doc["optionalDependencies"].as_object().unwrap();

        assert_eq!(deps["glyphd-windows-x64"], "1.2.3");
        assert_eq!(deps["glyphd-macos-arm64"], "1.2.3");
        // non-platform entry untouched
        assert_eq!(deps["left-pad"], "^1.3.0");
    }

    #[test]
    fn test_sync_preserves_unknown_fields_and_order() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let layout = Layout::new(dir.path());

        sync_versions(&layout, "1.2.3").unwrap();

        let content = fs::read_to_string(layout.main_manifest()).unwrap();
        let doc: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(doc["description"], "native glyph renderer");
        assert_eq!(doc["bin"]["glyphd"], "index.js");
        assert_eq!(doc["keywords"][0], "glyph");

        // name still serializes before version
        let name_pos = content.find("\"name\"").unwrap();
        let version_pos = content.find("\"version\"").unwrap();
        assert!(name_pos < version_pos);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let layout = Layout::new(dir.path());

        sync_versions(&layout, "1.2.3").unwrap();
        let first = fs::read_to_string(layout.main_manifest()).unwrap();

        sync_versions(&layout, "1.2.3").unwrap();
        let second = fs::read_to_string(layout.main_manifest()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{ not json").unwrap();
        let layout = Layout::new(dir.path());

        let err = sync_versions(&layout, "1.2.3").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn test_non_object_manifest_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "[1, 2, 3]").unwrap();

        let err = PackageManifest::load(&dir.path().join("package.json")).unwrap_err();
        assert!(matches!(err, ManifestError::NotAnObject { .. }));
    }
}
