use crate::config::{ConfigError, TextFormatConfig};
use crate::record::{LogRecord, Message};
use crate::value::FieldValue;
use chrono::{Local, Timelike};
use std::fmt::Write;

/// Generic text rendering shared by every formatter: the human-readable
/// timestamp and plain messages with positional arguments.
#[derive(Clone, Debug)]
pub struct TextFormatter {
    config: TextFormatConfig,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { config: TextFormatConfig::default() }
    }
}

impl TextFormatter {
    pub fn new(config: TextFormatConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TextFormatConfig {
        &self.config
    }

    /// Render `record.timestamp`.
    ///
    /// With `datefmt` set the pattern is used as-is. Otherwise the default
    /// time pattern is rendered and, if a millisecond pattern is configured,
    /// combined with the record's milliseconds (`2020-09-10 13:12:33,007`).
    pub fn format_time(&self, record: &LogRecord) -> String {
        let (text, millis) = match &self.config.datefmt {
            Some(datefmt) => return self.strftime(record, datefmt),
            None => (
                self.strftime(record, &self.config.default_time_format),
                record.timestamp.nanosecond() / 1_000_000,
            ),
        };

        match &self.config.default_msec_format {
            Some(msec_format) => apply_msec_format(msec_format, &text, millis),
            None => text,
        }
    }

    fn strftime(&self, record: &LogRecord, pattern: &str) -> String {
        let mut out = String::new();
        // Patterns are validated in `new`, so the write cannot fail.
        let _ = if self.config.local_time {
            write!(out, "{}", record.timestamp.with_timezone(&Local).format(pattern))
        } else {
            write!(out, "{}", record.timestamp.format(pattern))
        };
        out
    }

    /// Render a message to plain text. Structured messages render as their
    /// JSON text.
    pub fn format_message(&self, message: &Message) -> String {
        match message {
            Message::Plain { template, args } => substitute_args(template, args),
            Message::Structured(map) => FieldValue::Object(map.clone()).to_string(),
        }
    }
}

/// Replace `{}` placeholders with `args` in order. `{{` and `}}` escape
/// braces; placeholders beyond the last argument stay as written.
pub fn substitute_args(template: &str, args: &[FieldValue]) -> String {
    if args.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) => {
                chars.next();
                out.push('{');
            }
            ('}', Some('}')) => {
                chars.next();
                out.push('}');
            }
            ('{', Some('}')) => {
                chars.next();
                match args.next() {
                    Some(arg) => {
                        let _ = write!(out, "{}", arg);
                    }
                    None => out.push_str("{}"),
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// printf-like combination of the time text and milliseconds. Understands
/// `%s`, `%d`, `%0Nd` and `%%`; anything else is copied through.
fn apply_msec_format(pattern: &str, time_text: &str, millis: u32) -> String {
    let mut out = String::with_capacity(pattern.len() + time_text.len());
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut width = String::new();
        while let Some(d) = chars.peek().copied().filter(|d| d.is_ascii_digit()) {
            width.push(d);
            chars.next();
        }

        match chars.next() {
            Some('s') => out.push_str(time_text),
            Some('d') => {
                let width: usize = width.parse().unwrap_or(0);
                let _ = write!(out, "{:0width$}", millis, width = width);
            }
            Some('%') => out.push('%'),
            Some(other) => {
                out.push('%');
                out.push_str(&width);
                out.push(other);
            }
            None => {
                out.push('%');
                out.push_str(&width);
            }
        }
    }
    out
}
