use stowage_events::{AppEvent, EventBus};
use stowage_config::Config;
use stowage_storage::BackendRegistry;
use anyhow::Result;
use std::sync::Arc;

/// Builds one backend per enabled storage section
pub async fn initialize(config: &Config, events: &Arc<EventBus>) -> Result<Arc<BackendRegistry>> {
    let registry = BackendRegistry::from_config(&config.storage).await?;

    for name in registry.names() {
        events.emit(AppEvent::BackendRegistered { name });
    }

    events.emit(AppEvent::RegistryReady {
        names: registry.names(),
    });

    Ok(Arc::new(registry))
}
