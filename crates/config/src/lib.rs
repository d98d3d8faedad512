mod models;
mod defaults;
mod loader;
mod migration;
mod validation;
mod errors;

pub use models::*;
pub use defaults::DEFAULT_CONFIG_TEMPLATE;
pub use migration::migrate_document;
pub use errors::ConfigError;
