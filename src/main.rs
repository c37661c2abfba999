mod cli;
mod config;
mod response_gateway;
#[cfg(test)]
mod testing;

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::{Result, WrapErr};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::ChatContext;
use crate::config::ChatConfig;
use crate::response_gateway::HttpGateway;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    options: ChatOptions,
}

#[derive(clap::Args)]
struct ChatOptions {
    /// Send a single message, print the reply and exit
    #[arg(short, long)]
    input: Option<String>,

    /// Chat endpoint URL (falls back to CHAT_ENDPOINT, then http://localhost:8000/chat)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Give up on an exchange after this many seconds (falls back to CHAT_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat {
        #[command(flatten)]
        options: ChatOptions,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let options = match cli.command {
        Some(Commands::Chat { options }) => options,
        None => cli.options,
    };

    let log_level = if options.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .wrap_err("Failed to set tracing subscriber")?;

    let config = ChatConfig::resolve(options.endpoint.as_deref(), options.timeout_secs)?;
    let gateway = HttpGateway::new(&config)?;
    info!("Starting chat against {}", gateway.endpoint());

    let interactive = options.input.is_none();

    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        options.input,
        interactive,
        &config,
        gateway,
    );
    chat_context.run().await
}
