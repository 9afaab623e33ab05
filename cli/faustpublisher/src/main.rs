//! faustpublisher — publish Faust libraries and packages to the registry.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use faust_registry::RegistryConfig;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "faustpublisher",
    version,
    about = "Publish Faust libraries and packages to the Faust registry"
)]
struct Cli {
    /// Configuration file (default: ~/.faust/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Registry repository URL, overriding the configuration
    #[arg(long, global = true, env = "FAUST_REGISTRY_URL")]
    registry_url: Option<String>,

    /// Access token for the hosting service
    #[arg(long, global = true, env = "FAUST_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish updates from the faustlibraries repository to the Faust Registry
    PublishLibraries,
    /// Publish a single package repository under your account
    Publish {
        /// Package repository URL (e.g., https://github.com/you/mylib.lib.git)
        repo_url: String,
    },
    /// Synchronize a local library tree into a local registry directory
    Sync {
        /// Registry directory to add versions to
        #[arg(long)]
        registry: PathBuf,
        /// Flat library tree to read versions from
        #[arg(long)]
        source: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Sync {
            registry,
            source,
            json,
        } => commands::sync::run(&registry, &source, json),

        Commands::PublishLibraries => {
            let config = load_config(cli.config, cli.registry_url)?;
            let token = require_token(cli.token)?;
            commands::libraries::run(&config, &token)
        }

        Commands::Publish { repo_url } => {
            let config = load_config(cli.config, cli.registry_url)?;
            let token = require_token(cli.token)?;
            commands::package::run(&config, &token, &repo_url)
        }
    }
}

/// Load configuration and apply command-line overrides.
fn load_config(
    path: Option<PathBuf>,
    registry_url: Option<String>,
) -> anyhow::Result<RegistryConfig> {
    let mut config = RegistryConfig::load(path.as_deref())?;
    if let Some(url) = registry_url {
        config.registry_url = url;
    }
    Ok(config)
}

fn require_token(token: Option<String>) -> anyhow::Result<String> {
    match token {
        Some(token) if !token.trim().is_empty() => Ok(token),
        _ => anyhow::bail!("no access token: pass --token or set FAUST_TOKEN"),
    }
}
