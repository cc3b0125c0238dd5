use crate::config::{ConfigError, JsonFormatterConfig};
use crate::formatter::JsonFormatter;
use crate::layer::JsonLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Error returned when the global JSON subscriber cannot be installed.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("invalid formatter configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install a global `tracing` subscriber that writes every event to
/// stdout as one JSON line rendered by a [`JsonFormatter`].
///
/// **Parameters**
/// - `config`: [`JsonFormatterConfig`] controlling field mapping, key
///   names and timestamp rendering.
///
/// **Returns**
/// - `Err(InitError::Config)` if the configuration is rejected.
/// - `Err(InitError::AlreadyInstalled)` if another subscriber was set
///   first.
pub fn init_json_logging_with_config(config: JsonFormatterConfig) -> Result<(), InitError> {
    let formatter = JsonFormatter::new(config)?;
    let subscriber = Registry::default().with(JsonLayer::stdout(formatter));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Initialize JSON logging from `LOG_JSON_*` environment variables.
///
/// Equivalent to calling [`init_json_logging_with_config`] with
/// [`JsonFormatterConfig::from_env`]. This is the recommended entrypoint
/// for typical services.
pub fn init_json_logging() -> Result<(), InitError> {
    init_json_logging_with_config(JsonFormatterConfig::from_env()?)
}
