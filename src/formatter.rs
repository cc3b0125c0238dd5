use crate::attributes;
use crate::config::{ConfigError, JsonFormatterConfig};
use crate::record::{LogRecord, Message};
use crate::text::TextFormatter;
use crate::value::{DefaultConverter, ValueConverter};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Renders a [`LogRecord`] to a single line of text.
///
/// This is the extension point a host logging framework calls; the
/// returned text carries no trailing newline.
pub trait RecordFormatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

/// Formats records as one JSON object per line.
///
/// Output keys are merged in a fixed order, later sources overwriting
/// earlier ones: configured fields, then the message, then the record's
/// extra attributes, then the error. A record that ends up with nothing
/// but its message is returned as the bare message text instead of JSON.
#[derive(Clone)]
pub struct JsonFormatter {
    config: JsonFormatterConfig,
    text: TextFormatter,
    converter: Arc<dyn ValueConverter>,
}

impl JsonFormatter {
    pub fn new(config: JsonFormatterConfig) -> Result<Self, ConfigError> {
        let text = TextFormatter::new(config.text.clone())?;
        Ok(Self { config, text, converter: Arc::new(DefaultConverter) })
    }

    /// Replace the hook used for values without a JSON representation.
    pub fn with_converter(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    pub fn config(&self) -> &JsonFormatterConfig {
        &self.config
    }

    /// Merge every source into the output object. Also returns the text
    /// rendered for a plain message, if the record has one.
    fn build_object(&self, record: &LogRecord) -> (Map<String, Value>, Option<String>) {
        let converter = self.converter.as_ref();
        let mut out = Map::new();

        for (key, selector) in &self.config.fields {
            let value = match attributes::resolve(selector, record, &self.text) {
                Some(v) => v.to_json(converter),
                None => match record.extra.get(selector) {
                    Some(v) => v.to_json(converter),
                    None => Value::String(selector.clone()),
                },
            };
            out.insert(key.clone(), value);
        }

        let rendered = match &record.message {
            Message::Structured(map) => {
                for (key, value) in map {
                    out.insert(key.clone(), value.to_json(converter));
                }
                None
            }
            message => {
                let text = self.text.format_message(message);
                out.insert(self.config.message_field_name.clone(), Value::String(text.clone()));
                Some(text)
            }
        };

        for (key, value) in &record.extra {
            out.insert(key.clone(), value.to_json(converter));
        }

        if let (Some(field), Some(error)) = (self.config.exception_field(), &record.error) {
            out.insert(
                field.to_string(),
                json!({
                    "type": error.type_name,
                    "message": error.message,
                    "stack": error.stack,
                }),
            );
        }

        (out, rendered)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self {
            config: JsonFormatterConfig::default(),
            text: TextFormatter::default(),
            converter: Arc::new(DefaultConverter),
        }
    }
}

impl RecordFormatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let (mut out, rendered) = self.build_object(record);

        if out.len() == 1 {
            if let Some(value) = out.remove(&self.config.message_field_name) {
                // A plain message always wins over whatever overwrote its key.
                return match (rendered, value) {
                    (Some(text), _) => text,
                    (None, Value::String(text)) => text,
                    (None, other) => other.to_string(),
                };
            }
        }

        Value::Object(out).to_string()
    }
}

impl std::fmt::Debug for JsonFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFormatter").field("config", &self.config).finish_non_exhaustive()
    }
}
