use tracing_subscriber::EnvFilter;

use crate::error::{ProsoponError, Result};
use crate::settings::LoggingSettings;

/// Installs a global `fmt` subscriber. `RUST_LOG` takes precedence over
/// `filter`. Only the first call in a process succeeds.
pub fn init(filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(filter)
            .map_err(|e| ProsoponError::Settings(format!("invalid log filter `{}`: {}", filter, e)))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| ProsoponError::Settings(e.to_string()))
}

pub fn init_from(settings: &LoggingSettings) -> Result<()> {
    init(&settings.filter)
}
