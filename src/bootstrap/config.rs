use stowage_events::{AppEvent, EventBus};
use stowage_config::Config;
use stowage_filesystem::FileSystem;
use anyhow::{Context, Result};
use std::sync::Arc;

pub async fn load(config_path: &str, events: &Arc<EventBus>) -> Result<Config> {
    let abs_config_path = FileSystem::get_absolute_path_string(config_path)?;

    events.emit(AppEvent::ConfigLoading {
        path: abs_config_path.clone(),
    });

    let config_exists = tokio::fs::try_exists(config_path).await.unwrap_or(false);
    let config = Config::from_file_with_events(config_path, Some(events))
        .await
        .with_context(|| format!("Failed to load configuration from {}", abs_config_path))?;

    if !config_exists {
        events.emit(AppEvent::ConfigCreated {
            path: abs_config_path,
        });
    }

    events.emit(AppEvent::ConfigLoaded {
        backends_enabled: config.storage.enabled_count(),
    });

    Ok(config)
}
