//! Release archive extraction (zip for windows artifacts, tar.gz elsewhere).

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use thiserror::Error;

use crate::platform::Os;

/// Archive format of a release artifact, implied by the target OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn for_os(os: Os) -> Self {
        match os {
            Os::Windows => ArchiveFormat::Zip,
            _ => ArchiveFormat::TarGz,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid archive: {0}")]
    Invalid(String),

    #[error("archive entry escapes destination: {0}")]
    Traversal(String),
}

/// Extract an archive into `dest`, creating it if needed.
pub fn extract(archive: &Path, dest: &Path, format: ArchiveFormat) -> Result<(), ExtractError> {
    std::fs::create_dir_all(dest)?;
    match format {
        ArchiveFormat::Zip => extract_zip(archive, dest),
        ArchiveFormat::TarGz => extract_tar_gz(archive, dest),
    }
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), ExtractError> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| ExtractError::Invalid(format!("failed to open zip: {e}")))?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| ExtractError::Invalid(format!("failed to read zip entry: {e}")))?;

        let name = entry.name().to_string();
        let Some(relative) = sanitized(&name)? else {
            continue;
        };
        let outpath = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)?;
        std::io::copy(&mut entry, &mut outfile)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<(), ExtractError> {
    let file = File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    let entries = tar
        .entries()
        .map_err(|e| ExtractError::Invalid(format!("failed to read tar: {e}")))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| ExtractError::Invalid(format!("failed to read tar entry: {e}")))?;

        let name = entry
            .path()
            .map_err(|e| ExtractError::Invalid(format!("invalid path in tar: {e}")))?
            .to_string_lossy()
            .into_owned();
        let Some(relative) = sanitized(&name)? else {
            continue;
        };
        let outpath = dest.join(relative);

        if entry.header().entry_type().is_dir() {
            std::fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry
            .unpack(&outpath)
            .map_err(|e| ExtractError::Invalid(format!("failed to extract {name}: {e}")))?;
    }

    Ok(())
}

/// Normalize an entry name, rejecting absolute paths and parent components.
/// Returns `None` for entries that resolve to nothing (e.g. `./`).
fn sanitized(name: &str) -> Result<Option<PathBuf>, ExtractError> {
    let mut out = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return Err(ExtractError::Traversal(name.to_string())),
        }
    }

    if out.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_for_os() {
        assert_eq!(ArchiveFormat::for_os(Os::Windows), ArchiveFormat::Zip);
        assert_eq!(ArchiveFormat::for_os(Os::Linux), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::for_os(Os::Macos), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::Zip.extension(), "zip");
        assert_eq!(ArchiveFormat::TarGz.extension(), "tar.gz");
    }

    #[test]
    fn test_sanitized_rejects_traversal() {
        assert!(sanitized("../evil").is_err());
        assert!(sanitized("ok/../../evil").is_err());
        assert!(sanitized("/etc/passwd").is_err());
        assert_eq!(sanitized("./").unwrap(), None);
        assert_eq!(sanitized("./bin/glyphd").unwrap(), Some(PathBuf::from("bin/glyphd")));
    }

    #[test]
    fn test_extract_tar_gz() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("artifact.tar.gz");

        let file = File::create(&archive_path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let payload = b"#!/bin/sh\necho glyphd\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(payload.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, "glyphd", payload.as_ref()).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = dir.path().join("out");
        extract(&archive_path, &dest, ArchiveFormat::TarGz).unwrap();

        let extracted = dest.join("glyphd");
        assert!(extracted.is_file());
        assert_eq!(std::fs::read(&extracted).unwrap(), payload);
    }

    #[test]
    fn test_extract_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("artifact.zip");

        let file = File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("glyphd.exe", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"MZ fake binary").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("out");
        extract(&archive_path, &dest, ArchiveFormat::Zip).unwrap();

        let extracted = dest.join("glyphd.exe");
        assert!(extracted.is_file());
        assert_eq!(std::fs::read(&extracted).unwrap(), b"MZ fake binary");
    }

    #[test]
    fn test_extract_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("broken.tar.gz");
        std::fs::write(&archive_path, b"not a gzip stream").unwrap();

        let dest = dir.path().join("out");
        let err = extract(&archive_path, &dest, ArchiveFormat::TarGz).unwrap_err();
        assert!(matches!(err, ExtractError::Invalid(_) | ExtractError::Io(_)));
    }
}
