use super::models::{AppEvent, EventBus};
use colored::Colorize;
use std::sync::Arc;

impl EventBus {
    /// Silent mode suppresses terminal output so that machine-readable
    /// command output (e.g. `--json`) stays clean. Errors are still logged.
    pub fn new(silent_mode: bool) -> Arc<Self> {
        Arc::new(Self { silent_mode })
    }

    pub fn emit(&self, event: AppEvent) {
        match event {
            // Errors
            AppEvent::Error { context, error } => {
                tracing::error!("{}: {}", context, error);
            }
            event if self.silent_mode => {
                tracing::debug!("{:?}", event);
            }

            // Application lifecycle
            AppEvent::Starting => {
                println!("\n{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_black());
                println!("  {}", "Stowage - Storage Gateway".white().bold());
                println!("  {} {}", "Version".dimmed(), env!("CARGO_PKG_VERSION").cyan());
                println!("{}\n", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_black());
            }

            // Configuration
            AppEvent::ConfigLoading { path } => {
                println!("  {} {}", "Loading config".dimmed(), path.cyan());
            }
            AppEvent::ConfigLoaded { backends_enabled } => {
                if backends_enabled == 0 {
                    println!("  {} No storage backends enabled", "⚠".yellow());
                } else {
                    println!("  {} {} backend(s) enabled", "✓".green(), backends_enabled.to_string().cyan());
                }
            }
            AppEvent::ConfigCreated { path } => {
                tracing::warn!("Configuration file not found");
                tracing::info!("Created default configuration at: {}", path);
            }
            AppEvent::ConfigMigrated { added_fields } => {
                if !added_fields.is_empty() {
                    println!("  {} Config updated: added {}",
                        "↻".blue(),
                        added_fields.join(", ").dimmed()
                    );
                }
            }

            // Storage backends
            AppEvent::BackendRegistered { name } => {
                println!("  {} Registered {}", "+".green(), name.cyan());
            }
            AppEvent::RegistryReady { names } => {
                if names.is_empty() {
                    println!("  {} Registry is empty", "⚠".yellow());
                }
            }
        }
    }
}
