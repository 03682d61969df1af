//! CLI entry point for parley

mod chat;
mod client;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use parley_core::config::{Config, ConfigLoader};
use parley_core::logging::init_logging;
use parley_providers::{GenerationParams, OpenAiCompatClient};
use parley_server::{run_server, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::client::HttpRelayClient;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Chat relay for OpenAI-compatible completion APIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Chat interactively through a running relay
    Chat {
        /// Relay endpoint URL
        #[arg(short, long)]
        relay_url: Option<String>,
    },
    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;

    // Keep the chat prompt readable unless RUST_LOG asks for more.
    if matches!(cli.command, Commands::Chat { .. }) {
        config.logging.level = "warn".to_string();
    }
    let _guard = init_logging(&config.logging);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Commands::Chat { relay_url } => {
            let relay_url = relay_url.unwrap_or_else(|| config.client.relay_url.clone());
            let relay = HttpRelayClient::new(relay_url);
            println!(
                "{} {}\n",
                style("Chatting through").dim(),
                style(relay.relay_url()).dim()
            );
            chat::run_chat(&relay).await
        }
        Commands::Status => {
            print_status(&loader, &config);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    let provider = OpenAiCompatClient::from_config(&config.upstream)?;
    if !config.upstream.has_api_key() {
        warn!("GROQ_API_KEY is not set; the upstream service will reject requests");
    }
    info!(
        "Relaying to {} with model {}",
        provider.api_base(),
        config.upstream.model
    );

    let state = AppState::new(
        Arc::new(provider),
        GenerationParams::from_config(&config.upstream),
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    run_server(state, &config.server, shutdown_rx).await
}

fn print_status(loader: &ConfigLoader, config: &Config) {
    println!("{}", style("parley status").bold());
    println!("Config dir:   {}", loader.config_dir().display());
    println!("Upstream:     {}", config.upstream.api_base);
    println!("Model:        {}", config.upstream.model);
    println!("Temperature:  {}", config.upstream.temperature);
    println!("Max tokens:   {}", config.upstream.max_tokens);
    let key_state = if config.upstream.has_api_key() {
        style("set").green()
    } else {
        style("missing").red()
    };
    println!("API key:      {}", key_state);
    println!("Listen:       {}:{}", config.server.host, config.server.port);
    println!("Relay URL:    {}", config.client.relay_url);
}
