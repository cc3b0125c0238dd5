//! Environment variable names used by this crate for convenient
//! configuration of the formatter from services.
//!
//! These are purely helpers; [`JsonFormatterConfig`] itself stays
//! decoupled from environment access.

use crate::config::{parse_field_spec, ConfigError, JsonFormatterConfig};

/// Output key for plain-text messages.
pub const LOG_JSON_MESSAGE_FIELD_ENV: &str = "LOG_JSON_MESSAGE_FIELD";

/// Output key for error details. An empty value disables error output.
pub const LOG_JSON_EXCEPTION_FIELD_ENV: &str = "LOG_JSON_EXCEPTION_FIELD";

/// Field map as `key=selector,key2=selector2`.
pub const LOG_JSON_FIELDS_ENV: &str = "LOG_JSON_FIELDS";

/// strftime pattern for the formatted timestamp.
pub const LOG_JSON_DATEFMT_ENV: &str = "LOG_JSON_DATEFMT";

/// `1`/`true` renders timestamps in local time instead of UTC.
pub const LOG_JSON_LOCAL_TIME_ENV: &str = "LOG_JSON_LOCAL_TIME";

impl JsonFormatterConfig {
    /// Build a configuration from `LOG_JSON_*` variables, starting from
    /// the defaults. Unset variables keep their default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`JsonFormatterConfig::from_env`] with a custom variable
    /// source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup(LOG_JSON_MESSAGE_FIELD_ENV) {
            config.message_field_name = name;
        }
        if let Some(name) = lookup(LOG_JSON_EXCEPTION_FIELD_ENV) {
            config.exception_field_name = Some(name);
        }
        if let Some(spec) = lookup(LOG_JSON_FIELDS_ENV) {
            config.fields = parse_field_spec(&spec)?;
        }
        if let Some(datefmt) = lookup(LOG_JSON_DATEFMT_ENV) {
            config.text.datefmt = Some(datefmt);
        }
        if let Some(flag) = lookup(LOG_JSON_LOCAL_TIME_ENV) {
            config.text.local_time = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        config.text.validate()?;
        tracing::debug!(
            fields = config.fields.len(),
            message_field = %config.message_field_name,
            "json formatter configured from environment"
        );
        Ok(config)
    }
}
