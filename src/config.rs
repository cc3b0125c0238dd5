use chrono::format::{Item, StrftimeItems};
use indexmap::IndexMap;
use serde::Deserialize;

/// Default key for plain-text messages.
pub const DEFAULT_MESSAGE_FIELD: &str = "message";

/// Default key for error details.
pub const DEFAULT_EXCEPTION_FIELD: &str = "exception";

/// Options forwarded to [`crate::text::TextFormatter`], which renders the
/// formatted timestamp (`asctime`) and plain messages.
///
/// **Fields**
/// - `datefmt`: strftime pattern; when set it is used alone, without
///   milliseconds.
/// - `default_time_format`: strftime pattern used when `datefmt` is unset.
/// - `default_msec_format`: pattern combining the time text (`%s`) with
///   milliseconds (`%03d`). `None` leaves milliseconds out.
/// - `local_time`: render in the host's local timezone instead of UTC.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TextFormatConfig {
    pub datefmt: Option<String>,
    pub default_time_format: String,
    pub default_msec_format: Option<String>,
    pub local_time: bool,
}

impl Default for TextFormatConfig {
    fn default() -> Self {
        Self {
            datefmt: None,
            default_time_format: "%Y-%m-%d %H:%M:%S".to_string(),
            default_msec_format: Some("%s,%03d".to_string()),
            local_time: false,
        }
    }
}

impl TextFormatConfig {
    /// Reject strftime patterns chrono cannot render, so formatting never
    /// fails later on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(datefmt) = &self.datefmt {
            check_strftime(datefmt)?;
        }
        check_strftime(&self.default_time_format)
    }
}

fn check_strftime(pattern: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidTimeFormat(pattern.to_string()));
    }
    Ok(())
}

/// Configuration of a [`crate::formatter::JsonFormatter`].
///
/// Fixed once the formatter is built. `fields` maps output keys to
/// selectors: a standard attribute name such as `levelname` or `asctime`,
/// an extra attribute name, or otherwise a literal value.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JsonFormatterConfig {
    pub fields: IndexMap<String, String>,
    pub message_field_name: String,
    /// `None` or an empty string disables error reporting.
    pub exception_field_name: Option<String>,
    pub text: TextFormatConfig,
}

impl Default for JsonFormatterConfig {
    fn default() -> Self {
        Self {
            fields: IndexMap::new(),
            message_field_name: DEFAULT_MESSAGE_FIELD.to_string(),
            exception_field_name: Some(DEFAULT_EXCEPTION_FIELD.to_string()),
            text: TextFormatConfig::default(),
        }
    }
}

impl JsonFormatterConfig {
    pub fn with_field(mut self, key: impl Into<String>, selector: impl Into<String>) -> Self {
        self.fields.insert(key.into(), selector.into());
        self
    }

    pub fn with_message_field_name(mut self, name: impl Into<String>) -> Self {
        self.message_field_name = name.into();
        self
    }

    pub fn with_exception_field_name(mut self, name: Option<&str>) -> Self {
        self.exception_field_name = name.map(|s| s.to_string());
        self
    }

    pub fn with_datefmt(mut self, datefmt: impl Into<String>) -> Self {
        self.text.datefmt = Some(datefmt.into());
        self
    }

    pub fn with_default_time_format(
        mut self,
        time_format: impl Into<String>,
        msec_format: Option<&str>,
    ) -> Self {
        self.text.default_time_format = time_format.into();
        self.text.default_msec_format = msec_format.map(|s| s.to_string());
        self
    }

    pub fn with_local_time(mut self, local_time: bool) -> Self {
        self.text.local_time = local_time;
        self
    }

    /// Effective exception key, with empty strings treated as disabled.
    pub fn exception_field(&self) -> Option<&str> {
        self.exception_field_name.as_deref().filter(|s| !s.is_empty())
    }
}

/// Parse a `key=selector,key2=selector2` list into a field map.
pub fn parse_field_spec(spec: &str) -> Result<IndexMap<String, String>, ConfigError> {
    let mut fields = IndexMap::new();
    for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.split_once('=') {
            Some((key, selector)) if !key.trim().is_empty() => {
                fields.insert(key.trim().to_string(), selector.trim().to_string());
            }
            _ => return Err(ConfigError::MalformedField(entry.to_string())),
        }
    }
    Ok(fields)
}

/// Error returned when a formatter configuration cannot be used.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid strftime pattern: {0:?}")]
    InvalidTimeFormat(String),

    #[error("malformed field entry {0:?}, expected key=selector")]
    MalformedField(String),
}
