mod bootstrap;
mod cli;

use crate::bootstrap::{config, logging, storage};
use crate::cli::{Cli, Commands};
use stowage_events::{AppEvent, EventBus};
use stowage_storage::BackendRegistry;
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    logging::initialize();

    let cli = Cli::parse();

    let events = EventBus::new(cli.command.is_machine_readable());
    events.emit(AppEvent::Starting);

    let config = config::load(&cli.config, &events).await?;
    let registry = storage::initialize(&config, &events).await?;

    if let Err(e) = run(cli.command, &registry).await {
        events.emit(AppEvent::Error {
            context: "Command failed".to_string(),
            error: format!("{:#}", e),
        });
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, registry: &Arc<BackendRegistry>) -> Result<()> {
    match command {
        Commands::Backends => {
            for name in registry.names() {
                println!("{}", name);
            }
        }
        Commands::List { backend, prefix, json } => {
            let listing = registry.require(&backend)?.list(&prefix).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for entry in &listing {
                    let kind = if entry.is_dir { "dir " } else { "file" };
                    let modified = entry
                        .last_modified
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("{}  {:>10.3} MB  {:<19}  {}", kind, entry.size, modified, entry.key);
                }
            }
        }
        Commands::Put { backend, file, folder } => {
            registry.require(&backend)?.put(&file, &folder).await?;
            tracing::info!("Stored {} in {}", file.display(), backend);
        }
        Commands::Get { backend, destination, keys } => {
            registry.require(&backend)?.get(&destination, &keys).await?;
            tracing::info!("Fetched {} key(s) into {}", keys.len(), destination.display());
        }
        Commands::Delete { backend, keys } => {
            if !registry.require(&backend)?.delete(&keys).await {
                anyhow::bail!("Not every key could be deleted from {}", backend);
            }
            tracing::info!("Deleted {} key(s) from {}", keys.len(), backend);
        }
    }

    Ok(())
}
