use crate::value::FieldValue;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::error::Error;
use std::fmt;

/// Severity of a [`LogRecord`], with the conventional names and numbers
/// used by log aggregation pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    pub fn name(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            Level::Trace => 5,
            Level::Debug => 10,
            Level::Info => 20,
            Level::Warning => 30,
            Level::Error => 40,
            Level::Critical => 50,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warning,
            _ => Level::Error,
        }
    }
}

/// Message of a record: either a text template with positional arguments
/// or a structured mapping merged straight into the output object.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Plain {
        template: String,
        args: Vec<FieldValue>,
    },
    Structured(IndexMap<String, FieldValue>),
}

impl Message {
    pub fn plain(text: impl Into<String>) -> Self {
        Message::Plain { template: text.into(), args: Vec::new() }
    }

    /// Template with `{}` placeholders filled from `args` at format time.
    pub fn with_args(template: impl Into<String>, args: Vec<FieldValue>) -> Self {
        Message::Plain { template: template.into(), args }
    }

    pub fn structured<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Message::Structured(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::plain(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::plain(text)
    }
}

/// Objects become structured messages; any other value is rendered to text
/// and carried as a plain message.
impl From<FieldValue> for Message {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Object(map) => Message::Structured(map),
            FieldValue::Json(serde_json::Value::Object(map)) => Message::Structured(
                map.into_iter().map(|(k, v)| (k, FieldValue::Json(v))).collect(),
            ),
            other => Message::plain(other.to_string()),
        }
    }
}

/// Error attached to a record: type name, message and formatted stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub type_name: String,
    pub message: String,
    pub stack: String,
}

impl ErrorInfo {
    pub fn new(
        type_name: impl Into<String>,
        message: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        ErrorInfo { type_name: type_name.into(), message: message.into(), stack: stack.into() }
    }

    /// Capture a typed error. The type name is the last path segment of
    /// `E`, the stack lists the error, its `source()` chain and a backtrace
    /// when one can be captured.
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        Self::with_type_name(short_type_name(std::any::type_name::<E>()), err)
    }

    /// Capture an erased error, for which only the `Debug` output hints at
    /// the concrete type.
    ///
    /// The type name is the leading identifier of that output: the struct
    /// name for derived `Debug` on a struct, but the variant name for enums
    /// (`std::io::Error` reports `Custom` or `Os`). Prefer
    /// [`ErrorInfo::from_error`] when the concrete type is known.
    pub fn from_dyn_error(err: &(dyn Error + 'static)) -> Self {
        let debug = format!("{:?}", err);
        let ident: String = debug
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        let type_name = if ident.is_empty() { "Error".to_string() } else { ident };
        Self::with_type_name(type_name, err)
    }

    fn with_type_name(type_name: String, err: &(dyn Error + 'static)) -> Self {
        let message = err.to_string();
        let mut stack = format!("{}: {}", type_name, message);

        let mut source = err.source();
        if source.is_some() {
            stack.push_str("\n\nCaused by:");
        }
        while let Some(cause) = source {
            stack.push_str(&format!("\n    {}", cause));
            source = cause.source();
        }

        let backtrace = std::backtrace::Backtrace::capture();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            stack.push_str(&format!("\n\nStack backtrace:\n{}", backtrace));
        }

        ErrorInfo { type_name, message, stack }
    }
}

fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

static PROCESS_START: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

static PROCESS_NAME: Lazy<String> = Lazy::new(|| {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown".to_string())
});

/// A single log event as handed to a [`crate::formatter::RecordFormatter`].
///
/// Records are plain data: a host adapter (see [`crate::layer`]) or the
/// caller fills them in, formatters only read them.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub logger_name: String,
    pub message: Message,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub module_path: Option<String>,
    pub function: Option<String>,
    pub thread_id: u64,
    pub thread_name: Option<String>,
    pub process_id: u32,
    pub process_name: String,
    /// Milliseconds between process start and this record.
    pub relative_created: f64,
    pub error: Option<ErrorInfo>,
    pub extra: IndexMap<String, FieldValue>,
}

impl LogRecord {
    /// New record stamped with the current time, thread and process.
    pub fn new(level: Level, message: impl Into<Message>) -> Self {
        // Process start must be fixed before the clock is read.
        Lazy::force(&PROCESS_START);
        let timestamp = Utc::now();
        Self::at(timestamp, level, message)
    }

    /// New record with an explicit timestamp. `relative_created` is
    /// clamped at zero for timestamps before process start.
    pub fn at(timestamp: DateTime<Utc>, level: Level, message: impl Into<Message>) -> Self {
        let relative_created = ((timestamp - *PROCESS_START).num_microseconds().unwrap_or(0) as f64
            / 1000.0)
            .max(0.0);
        let thread = std::thread::current();

        LogRecord {
            timestamp,
            level,
            logger_name: "root".to_string(),
            message: message.into(),
            file: None,
            line: None,
            module_path: None,
            function: None,
            thread_id: current_thread_id(),
            thread_name: thread.name().map(|s| s.to_string()),
            process_id: std::process::id(),
            process_name: PROCESS_NAME.clone(),
            relative_created,
            error: None,
            extra: IndexMap::new(),
        }
    }

    pub fn with_logger(mut self, name: impl Into<String>) -> Self {
        self.logger_name = name.into();
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_module(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = Some(module_path.into());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    /// Base name of `file`, e.g. `lib.rs` for `src/lib.rs`.
    pub fn file_name(&self) -> Option<&str> {
        self.file
            .as_deref()
            .map(|f| f.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(f))
    }
}

/// Numeric id of the current thread, taken from its `ThreadId` debug form.
fn current_thread_id() -> u64 {
    let debug = format!("{:?}", std::thread::current().id());
    debug
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct MyException;

    impl fmt::Display for MyException {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl Error for MyException {}

    #[test]
    fn typed_error_uses_short_type_name() {
        let info = ErrorInfo::from_error(&MyException);
        assert_eq!(info.type_name, "MyException");
        assert_eq!(info.message, "boom");
        assert!(info.stack.starts_with("MyException: boom"));
    }

    #[test]
    fn erased_error_type_comes_from_debug() {
        let err: Box<dyn Error> = Box::new(MyException);
        let info = ErrorInfo::from_dyn_error(err.as_ref());
        assert_eq!(info.type_name, "MyException");
    }

    #[test]
    fn erased_io_error_reports_its_debug_variant() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        assert_eq!(ErrorInfo::from_dyn_error(&err).type_name, "Custom");
        assert_eq!(ErrorInfo::from_error(&err).type_name, "Error");
    }

    #[test]
    fn first_record_has_non_negative_relative_time() {
        let record = LogRecord::new(Level::Info, "x");
        assert!(record.relative_created >= 0.0);
    }

    #[test]
    fn timestamps_before_process_start_clamp_relative_time() {
        let early = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(LogRecord::at(early, Level::Info, "x").relative_created, 0.0);
    }

    #[test]
    fn short_type_name_strips_paths_and_generics() {
        assert_eq!(short_type_name("a::b::Thing<c::D>"), "Thing");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn non_object_values_become_plain_messages() {
        assert_eq!(Message::from(FieldValue::from(42)), Message::plain("42"));
    }

    #[test]
    fn file_name_is_base_name() {
        let r = LogRecord::new(Level::Info, "x").with_location("src/deep/mod.rs", 3);
        assert_eq!(r.file_name(), Some("mod.rs"));
    }

    #[test]
    fn tracing_levels_map_to_names() {
        assert_eq!(Level::from(tracing::Level::WARN).name(), "WARNING");
        assert_eq!(Level::from(tracing::Level::INFO).number(), 20);
    }
}
