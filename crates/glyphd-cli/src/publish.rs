//! Publish command - run the release pipeline against the npm registry.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use glyphd_dist::{Layout, NpmRegistry, PublishOptions, PublishPipeline, SystemClock};

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Working directory (repository root)
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,

    /// Rehearse the pipeline without writing to the registry
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the platform packages and publish only the aggregator
    #[arg(long)]
    pub skip_platforms: bool,

    /// Stop after the platform package batch
    #[arg(long)]
    pub skip_main: bool,
}

pub async fn execute(args: PublishArgs) -> Result<i32> {
    // the release version comes from the environment; check it before
    // touching anything
    let version =
        std::env::var("VERSION").context("VERSION environment variable is required")?;

    let layout = Layout::new(&args.working_dir);
    let registry = NpmRegistry;
    let clock = SystemClock;
    let pipeline = PublishPipeline::new(layout, &registry, &clock);
    let options = PublishOptions {
        dry_run: args.dry_run,
        skip_platforms: args.skip_platforms,
        skip_main: args.skip_main,
    };

    println!(
        "Publishing release {}{}",
        version,
        if args.dry_run { " (dry run)" } else { "" }
    );

    let summary = pipeline.publish_release(&version, &options)?;

    println!();
    println!("Publish summary");
    if !summary.staged.is_empty() {
        println!("  staged:      {}", summary.staged.join(", "));
    }
    if !summary.published.is_empty() {
        println!(
            "  {}   {}",
            style("published:").green().bold(),
            summary.published.join(", ")
        );
    }
    for unavailable in &summary.unavailable {
        println!(
            "  {} {} published but not yet visible",
            style("warning:").yellow().bold(),
            unavailable
        );
    }
    for failure in &summary.failed {
        println!(
            "  {}      {} ({})",
            style("failed:").red().bold(),
            failure.package,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(if summary.is_success() { 0 } else { 1 })
}
