//! glyphd-dist — build, version, and publish the glyphd platform packages.

mod build;
mod install;
mod publish;
mod test;
mod version;

use clap::{Parser, Subcommand};
use console::style;

#[derive(Parser, Debug)]
#[command(
    name = "glyphd-dist",
    version,
    about = "Build, version, and publish the glyphd platform packages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Cross-build the glyphd binary and stage it into the platform packages
    Build(build::BuildArgs),

    /// Set every package manifest to the given release version
    Version(version::VersionArgs),

    /// Publish platform packages, then the aggregator, to the registry
    Publish(publish::PublishArgs),

    /// Verify that every platform package has a staged binary
    Test(test::TestArgs),

    /// Resolve (or fetch) the glyphd binary for the current platform
    Install(install::InstallArgs),
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build(args) => build::execute(args).await,
        Commands::Version(args) => version::execute(args).await,
        Commands::Publish(args) => publish::execute(args).await,
        Commands::Test(args) => test::execute(args).await,
        Commands::Install(args) => install::execute(args).await,
    };

    let code = match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", style("error:").red().bold());
            1
        }
    };
    std::process::exit(code);
}
