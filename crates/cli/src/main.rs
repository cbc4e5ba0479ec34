//! Armory CLI: the main entry point.
//!
//! Commands:
//! - `init`: Write a starter config
//! - `assemble`: Build components for a stage and list the registry
//! - `run`: Execute an agent on a task, streaming its progress
//! - `agents`: List configured agents
//! - `preheat`: Assemble every enabled agent on a channel

use armory_core::registry::ComponentKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "armory",
    about = "Strategy-tree client assembly and auto-agent runner",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.armory/config.toml)
    #[arg(short, long, global = true, env = "ARMORY_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Init,

    /// Assemble components of one kind
    Assemble {
        /// Stage to assemble: api, model, tool_mcp or client
        #[arg(short, long, default_value = "client")]
        kind: ComponentKind,

        /// Ids to assemble
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Run an agent on a task
    Run {
        #[arg(short, long)]
        agent: String,

        #[arg(short, long)]
        message: String,

        /// Session id (generated when omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Maximum reasoning rounds (defaults to execution.default_max_step)
        #[arg(long)]
        max_step: Option<u32>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// List configured agents
    Agents {
        /// Only enabled agents on this channel
        #[arg(long)]
        channel: Option<String>,
    },

    /// Assemble every enabled agent on a channel
    Preheat {
        /// Channel to preheat (defaults to execution.preheat_channel, then "agent")
        #[arg(long)]
        channel: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = commands::config_path(cli.config.as_deref());
    if let Commands::Init = cli.command {
        return commands::init::run(&config_path).await;
    }

    let config = commands::load_config(Some(config_path.as_path()))?;
    let service = commands::build_service(&config);

    match cli.command {
        Commands::Init => {}
        Commands::Assemble { kind, ids } => commands::assemble::run(&service, kind, ids).await?,
        Commands::Run {
            agent,
            message,
            session,
            max_step,
            json,
        } => {
            let args = commands::run::RunArgs {
                agent,
                message,
                session,
                max_step: max_step.unwrap_or(config.execution.default_max_step),
                json,
            };
            commands::run::run(&service, args).await?
        }
        Commands::Agents { channel } => commands::agents::run(&config, channel).await?,
        Commands::Preheat { channel } => {
            let channel = channel
                .or_else(|| config.execution.preheat_channel.clone())
                .unwrap_or_else(|| "agent".into());
            commands::preheat::run(&service, &channel).await?
        }
    }

    Ok(())
}
