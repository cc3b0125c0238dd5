pub mod value;
pub mod record;
pub mod attributes;
pub mod text;
pub mod config;
pub mod env;
pub mod formatter;

#[cfg(feature = "layer")]
pub mod layer;

#[cfg(feature = "layer")]
pub mod init;

pub use config::{ConfigError, JsonFormatterConfig, TextFormatConfig};
pub use formatter::{JsonFormatter, RecordFormatter};
pub use record::{ErrorInfo, Level, LogRecord, Message};
pub use value::{DefaultConverter, FieldValue, OpaqueValue, ValueConverter};
