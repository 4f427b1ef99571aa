//! Operator CLI for inspecting bots and workflow files.
//!
//! Running a bot needs its site plugin, so that lives in the binaries that link one.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use autoapply::{bots::BotRegistry, config::Config, workflow::WorkflowConfig, Result};

#[derive(Parser)]
#[command(author, version, about = "Job application workflow tools", long_about = None)]
struct Cli {
    /// Log level (debug, info, warn, error), overridden by RUST_LOG
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bots found in the bots directory
    Bots {
        /// Bots directory (defaults to AUTOAPPLY_BOTS_DIR)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Print a workflow's step graph and any problems with it
    Inspect {
        /// Path to a workflow YAML or JSON file
        workflow: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load()?;
    info!("Bots directory: {}", config.bots.dir.display());

    match cli.command {
        Commands::Bots { dir } => {
            let mut registry = BotRegistry::new(dir.unwrap_or(config.bots.dir));
            let names = registry.discover();
            if names.is_empty() {
                println!("No bots found in {}", registry.bots_dir().display());
            }
            for bot in registry.bots() {
                println!("{:<12} {}", bot.name, bot.description);
            }
        }
        Commands::Inspect { workflow } => {
            let workflow = WorkflowConfig::from_path(&workflow)?;
            println!("{}", workflow.meta.title);
            if !workflow.meta.description.is_empty() {
                println!("{}", workflow.meta.description);
            }
            println!("start: {}", workflow.meta.start_state);
            println!();

            for (name, state) in workflow.ordered_states() {
                println!(
                    "{:>3}. {} [{}] timeout {}s -> {}",
                    state.sequence_index,
                    name,
                    state.function_name,
                    state.timeout_seconds,
                    state.timeout_event
                );
                let mut transitions: Vec<_> = state.transitions.iter().collect();
                transitions.sort();
                for (event, target) in transitions {
                    println!("       {} -> {}", event, target);
                }
            }

            let issues = workflow.lint();
            if !issues.is_empty() {
                println!();
                println!("{} issue(s):", issues.len());
                for issue in issues {
                    println!("  - {}", issue);
                }
            }
        }
    }

    Ok(())
}
