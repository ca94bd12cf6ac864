//! Build command - cross-compile glyphd and stage the binaries.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;
use glyphd_dist::{util, Layout, Os, PlatformSpec, PLATFORMS};

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Working directory (repository root)
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,

    /// Build with optimizations
    #[arg(long)]
    pub release: bool,

    /// Build a single platform (e.g. "windows-x64")
    #[arg(long, value_name = "KEY")]
    pub platform: Option<String>,
}

pub async fn execute(args: BuildArgs) -> Result<i32> {
    let layout = Layout::new(&args.working_dir);

    let specs: Vec<&PlatformSpec> = match &args.platform {
        Some(filter) => {
            let spec = PLATFORMS
                .iter()
                .find(|spec| spec.key.to_string() == *filter)
                .with_context(|| {
                    format!(
                        "unknown platform '{}' (supported: {})",
                        filter,
                        glyphd_dist::supported_list()
                    )
                })?;
            vec![spec]
        }
        None => PLATFORMS.iter().collect(),
    };

    println!(
        "Building platform packages ({} mode)",
        if args.release { "release" } else { "debug" }
    );

    let mut built = Vec::new();
    let mut failed = Vec::new();
    for spec in specs {
        match build_platform(&layout, spec, args.release) {
            Ok(size_mb) => {
                println!(
                    "{} {} ({size_mb:.2} MB)",
                    style("built").green().bold(),
                    spec.key
                );
                built.push(spec.key.to_string());
            }
            Err(err) => {
                eprintln!("{} {}: {err:#}", style("failed").red().bold(), spec.key);
                failed.push(spec.key.to_string());
            }
        }
    }

    println!();
    println!("Build summary");
    if !built.is_empty() {
        println!("  built:  {}", built.join(", "));
    }
    if !failed.is_empty() {
        println!("  failed: {}", failed.join(", "));
    }

    Ok(if failed.is_empty() { 0 } else { 1 })
}

fn build_platform(layout: &Layout, spec: &PlatformSpec, release: bool) -> Result<f64> {
    let mut command = Command::new("cargo");
    command
        .arg("build")
        .arg("--target")
        .arg(spec.target)
        .current_dir(layout.root());
    if release {
        command.arg("--release");
    }

    let status = command.status().context("failed to run cargo")?;
    if !status.success() {
        bail!("cargo build --target {} exited with {status}", spec.target);
    }

    let profile = if release { "release" } else { "debug" };
    let source = layout
        .root()
        .join("target")
        .join(spec.target)
        .join(profile)
        .join(spec.executable);
    if !source.is_file() {
        bail!("built executable not found: {}", source.display());
    }

    let bin_dir = layout.package_bin_dir(spec.key);
    std::fs::create_dir_all(&bin_dir)?;
    let dest = bin_dir.join(spec.executable);
    std::fs::copy(&source, &dest)?;

    if spec.key.os != Os::Windows {
        if let Err(err) = util::set_executable(&dest) {
            log::warn!(
                "could not set execute permission on {}: {}",
                dest.display(),
                err
            );
        }
    }

    let size = std::fs::metadata(&dest)?.len();
    Ok(size as f64 / 1024.0 / 1024.0)
}
