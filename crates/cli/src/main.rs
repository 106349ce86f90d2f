//! Ragline CLI: chat with one document from the terminal.
//!
//! `ragline` loads the configured document, indexes it, connects to any
//! configured MCP servers, then reads questions from stdin until
//! end-of-input.

use clap::Parser;
use std::path::PathBuf;

mod startup;

#[derive(Parser)]
#[command(
    name = "ragline",
    about = "Ragline: chat with a document, backed by retrieval and MCP tools",
    version,
    author
)]
struct Cli {
    /// Config file (default: $RAGLINE_CONFIG, ./ragline.toml, ~/.ragline/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the conversation.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = startup::load_config(cli.config.as_deref())?;

    let mut session = startup::build_session(&config).await?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    ragline_agent::run_repl(&mut session, &config.agent.banner, stdin, stdout).await?;

    Ok(())
}
