mod configuration;
mod error;

use anyhow::{anyhow, Context, Result};
use bat::PrettyPrinter;
use clap::{Parser, Subcommand};
use cliclack::spinner;
use console::style;
use serde_json::Value;
use starknet_agent::tools::ChainToolKind;
use starknet_agent::Agent;
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tracing_subscriber::EnvFilter;

use crate::configuration::Settings;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to ./starknet-agent.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a question about StarkNet activity
    Ask {
        query: String,

        /// Extra JSON context handed to the planner
        #[arg(long)]
        context: Option<String>,
    },
    /// List the built-in tools the planner can use
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Ask { query, context } => ask(cli.config, &query, context.as_deref()).await,
        Command::Tools => {
            list_tools();
            Ok(())
        }
    }
}

async fn ask(config: Option<PathBuf>, query: &str, context: Option<&str>) -> Result<()> {
    let context: Option<Value> = context
        .map(serde_json::from_str)
        .transpose()
        .context("--context must be valid JSON")?;

    let settings = Settings::load(config.as_deref())?;
    let agent = Agent::new(settings.into_agent_config())?;
    tracing::info!(provider = agent.provider().name(), "Agent ready");

    let spin = spinner();
    spin.start("analyzing");
    let result = agent.process(query, context.as_ref()).await;
    spin.stop("");

    let response = result?;
    render(&response)?;
    println!();
    Ok(())
}

fn list_tools() {
    for kind in ChainToolKind::iter() {
        println!(
            "{} {} {}",
            style(kind.name()).bold(),
            style(format!("[{}]", kind.category())).dim(),
            kind.description()
        );
    }
}

fn render(content: &str) -> Result<()> {
    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()
        .map_err(|e| anyhow!("Failed to render response: {}", e))?;
    Ok(())
}
