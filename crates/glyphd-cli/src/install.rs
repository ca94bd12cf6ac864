//! Install command - resolve or fetch the glyphd binary for this platform.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use glyphd_dist::{Fetcher, Layout, Locator, PackageManifest};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Working directory (the installed aggregator package root)
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,
}

pub async fn execute(args: InstallArgs) -> Result<i32> {
    let layout = Layout::new(&args.working_dir);
    let manifest = PackageManifest::load(&layout.main_manifest())?;
    let version = manifest
        .version()
        .context("package.json has no version field")?
        .to_string();

    let fetcher = Fetcher::new()?;
    let locator = Locator::new(args.working_dir.clone(), version.clone(), fetcher)?;

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bytes}/{total_bytes} [{bar:30}] {bytes_per_sec}")
            .context("invalid progress template")?
            .progress_chars("=> "),
    );

    let path = locator
        .locate(Some(|downloaded, total| {
            if total > 0 {
                bar.set_length(total);
            }
            bar.set_position(downloaded);
        }))
        .await?;
    bar.finish_and_clear();

    println!(
        "{} glyphd {} at {}",
        style("ok").green().bold(),
        version,
        path.display()
    );
    Ok(0)
}
