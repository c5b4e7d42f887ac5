mod cmd;
mod config_path;
mod output;
mod tools;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, deploy::DeployArgs, namespaces::NamespacesSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fndeploy",
    about = "Deploy a single Python function to DigitalOcean Functions through doctl",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ~/.config/fndeploy/config.yaml)
    #[arg(long, global = true, env = "FNDEPLOY_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a Python file as a function, creating the namespace if needed
    Deploy(DeployArgs),

    /// Inspect functions namespaces
    Namespaces {
        #[command(subcommand)]
        subcommand: NamespacesSubcommand,
    },

    /// Print the public URL of a deployed action
    Url {
        /// Action as package/action (default: config defaults)
        action: Option<String>,
    },

    /// Show, validate or create the configuration file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Run as an MCP stdio server
    Mcp,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Deploy(_) | Commands::Mcp => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    // stdout carries reports and MCP frames; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = config_path::resolve_config_path(cli.config.as_deref()).and_then(|path| {
        match cli.command {
            Commands::Deploy(args) => cmd::deploy::run(&path, args, cli.json),
            Commands::Namespaces { subcommand } => cmd::namespaces::run(&path, subcommand, cli.json),
            Commands::Url { action } => cmd::url::run(&path, action.as_deref(), cli.json),
            Commands::Config { subcommand } => cmd::config::run(&path, subcommand, cli.json),
            Commands::Mcp => cmd::mcp::run(&path),
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
