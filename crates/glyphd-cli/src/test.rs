//! Test command - check that every platform package has its staged binary.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;
use glyphd_dist::{Layout, PLATFORMS};

#[derive(Args, Debug)]
pub struct TestArgs {
    /// Working directory (repository root)
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,
}

pub async fn execute(args: TestArgs) -> Result<i32> {
    let layout = Layout::new(&args.working_dir);
    let missing = missing_binaries(&layout);

    for spec in PLATFORMS {
        let key = spec.key.to_string();
        if missing.contains(&key) {
            println!(
                "{} {}: binary missing from {}",
                style("missing").red().bold(),
                key,
                layout.package_bin_dir(spec.key).display()
            );
        } else {
            println!("{} {}: binary staged", style("ok").green().bold(), key);
        }
    }

    if missing.is_empty() {
        println!("All platform packages look good");
        Ok(0)
    } else {
        Ok(1)
    }
}

/// Platforms whose package is missing its staged executable.
fn missing_binaries(layout: &Layout) -> Vec<String> {
    PLATFORMS
        .iter()
        .filter(|spec| !layout.package_bin_dir(spec.key).join(spec.executable).is_file())
        .map(|spec| spec.key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binaries_reports_unstaged_platforms() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());

        // stage only linux-x64
        let spec = PLATFORMS
            .iter()
            .find(|spec| spec.key.to_string() == "linux-x64")
            .unwrap();
        let bin_dir = layout.package_bin_dir(spec.key);
        std::fs::create_dir_all(&bin_dir).unwrap();
        std::fs::write(bin_dir.join(spec.executable), b"binary").unwrap();

        let missing = missing_binaries(&layout);
        assert_eq!(missing.len(), PLATFORMS.len() - 1);
        assert!(!missing.contains(&"linux-x64".to_string()));
        assert!(missing.contains(&"windows-x64".to_string()));
    }

    #[test]
    fn test_missing_binaries_empty_when_all_staged() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());

        for spec in PLATFORMS {
            let bin_dir = layout.package_bin_dir(spec.key);
            std::fs::create_dir_all(&bin_dir).unwrap();
            std::fs::write(bin_dir.join(spec.executable), b"binary").unwrap();
        }

        assert!(missing_binaries(&layout).is_empty());
    }
}
