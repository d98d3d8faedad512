use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    // Application lifecycle
    Starting,

    // Configuration
    ConfigLoading { path: String },
    ConfigLoaded { backends_enabled: usize },
    ConfigCreated { path: String },
    ConfigMigrated { added_fields: Vec<String> },

    // Storage backends
    BackendRegistered { name: String },
    RegistryReady { names: Vec<String> },

    // Errors
    Error { context: String, error: String },
}

pub struct EventBus {
    pub(super) silent_mode: bool,
}
