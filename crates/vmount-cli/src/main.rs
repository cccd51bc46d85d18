//! vmount command-line driver.
//!
//! Builds one computer from a RON config and answers path questions about
//! its guest filesystem.
//!
//! Usage:
//!   vmount resolve rom/programs/ls.lua
//!   vmount resolve rom/programs --mode gather_all
//!   vmount --config ./computer.ron mkdir docs/notes
//!   RUST_LOG=vmount_kernel=debug vmount ls /

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use vmount_kernel::config::default_config_path;
use vmount_kernel::{Computer, ComputerConfig, ResolveMode};

/// Inspect and manipulate a vmount computer's guest filesystem.
#[derive(Parser, Debug)]
#[command(name = "vmount")]
#[command(about = "Guest path resolution for emulated computers")]
struct Args {
    /// Computer config (RON). Defaults to the per-user config if present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force debug mode regardless of the config.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a guest path to its real location(s).
    Resolve {
        path: String,
        /// exists, create, raw or gather_all
        #[arg(short, long, default_value = "exists")]
        mode: ResolveMode,
    },
    /// Create a directory and any missing parents.
    Mkdir { path: String },
    /// Create the parent directories for a file about to be written.
    Prepare { path: String },
    /// List a guest directory, mount points included.
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    /// Report whether writes to a path are refused.
    Ro { path: String },
    /// Name of the volume an existing path lives on.
    Drive { path: String },
    /// Show the mount table.
    Mounts,
}

async fn load_config(args: &Args) -> Result<ComputerConfig> {
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None => default_config_path().filter(|p| p.is_file()),
    };
    let mut config = match path {
        Some(path) => ComputerConfig::load(&path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            tracing::debug!("no config file, using defaults");
            ComputerConfig::default()
        }
    };
    if args.debug {
        config.debug = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args).await?;
    let computer = Computer::from_config(&config)
        .await
        .context("building computer")?;

    match args.command {
        Command::Resolve { path, mode } => {
            let resolved = computer.resolve(&path, mode).await?;
            println!("{}", resolved.joined());
        }
        Command::Mkdir { path } => {
            let made = computer.make_directory(&path).await?;
            println!("{made}");
        }
        Command::Prepare { path } => {
            let target = computer.ensure_directory_for(&path, true).await?;
            println!("{target}");
        }
        Command::Ls { path } => {
            for entry in computer.list(&path).await? {
                if entry.kind.is_dir() {
                    println!("{}/", entry.name);
                } else {
                    println!("{}", entry.name);
                }
            }
        }
        Command::Ro { path } => {
            println!("{}", computer.is_read_only(&path).await?);
        }
        Command::Drive { path } => {
            println!("{}", computer.drive(&path).await?);
        }
        Command::Mounts => {
            for mount in computer.list_mounts().await {
                let path = if mount.path.is_empty() {
                    "/"
                } else {
                    mount.path.as_str()
                };
                let flag = if mount.read_only { "ro" } else { "rw" };
                println!("{path}\t{flag}\t{}", mount.targets.join(", "));
            }
        }
    }

    Ok(())
}
