//! Version command - synchronize every package manifest to a release version.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;
use glyphd_dist::{sync_versions, Layout};

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Working directory (repository root)
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,

    /// Release version to apply (e.g. 1.2.3)
    #[arg(value_name = "VERSION")]
    pub version: String,
}

pub async fn execute(args: VersionArgs) -> Result<i32> {
    let layout = Layout::new(&args.working_dir);
    let report = sync_versions(&layout, &args.version)?;

    println!(
        "{} set {} manifest(s) to {}",
        style("ok").green().bold(),
        report.updated.len(),
        args.version
    );
    if !report.pinned.is_empty() {
        println!("  pinned optional dependencies: {}", report.pinned.join(", "));
    }
    for missing in &report.missing {
        println!(
            "{} no manifest for {}",
            style("warning:").yellow().bold(),
            missing
        );
    }

    Ok(0)
}
