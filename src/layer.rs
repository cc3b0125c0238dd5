use crate::formatter::{JsonFormatter, RecordFormatter};
use crate::record::{ErrorInfo, Level, LogRecord, Message};
use crate::value::FieldValue;
use indexmap::IndexMap;
use std::io::Write;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns every event into a [`LogRecord`],
/// renders it with a [`RecordFormatter`] and writes one line per event.
///
/// Events carrying a `message` become plain messages and their other
/// fields become extra attributes. Events without a message become
/// structured messages made of their fields. A field recorded as an error
/// (`error = &err as &dyn Error`) is attached as the record's error.
pub struct JsonLayer<W> {
    formatter: Arc<dyn RecordFormatter>,
    make_writer: W,
}

impl JsonLayer<fn() -> std::io::Stdout> {
    /// Layer writing [`JsonFormatter`] output to stdout.
    pub fn stdout(formatter: JsonFormatter) -> Self {
        JsonLayer::new(formatter, std::io::stdout)
    }
}

impl<W> JsonLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    pub fn new(formatter: impl RecordFormatter + 'static, make_writer: W) -> Self {
        Self { formatter: Arc::new(formatter), make_writer }
    }

    /// Swap the writer, keeping the formatter.
    pub fn with_writer<W2>(self, make_writer: W2) -> JsonLayer<W2>
    where
        W2: for<'a> MakeWriter<'a> + 'static,
    {
        JsonLayer { formatter: self.formatter, make_writer }
    }
}

/// Build a [`LogRecord`] from a `tracing` event.
pub fn record_from_event(event: &Event<'_>) -> LogRecord {
    let mut fields = IndexMap::new();
    let mut message: Option<String> = None;
    let mut error: Option<ErrorInfo> = None;

    let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message, error: &mut error };
    event.record(&mut visitor);

    let meta = event.metadata();
    let (message, extra) = match message {
        Some(text) => (Message::plain(text), fields),
        None => (Message::Structured(fields), IndexMap::new()),
    };

    let mut record = LogRecord::new(Level::from(*meta.level()), message);
    record.logger_name = meta.target().to_string();
    record.file = meta.file().map(|s| s.to_string());
    record.line = meta.line();
    record.module_path = meta.module_path().map(|s| s.to_string());
    record.error = error;
    record.extra = extra;
    record
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let record = record_from_event(event);
        let mut line = self.formatter.format(&record);
        line.push('\n');

        let mut writer = self.make_writer.make_writer_for(event.metadata());
        if let Err(e) = writer.write_all(line.as_bytes()) {
            eprintln!("error writing log line: {}", e);
        }
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut IndexMap<String, FieldValue>,
    pub message: &'a mut Option<String>,
    pub error: &'a mut Option<ErrorInfo>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), FieldValue::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), FieldValue::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), FieldValue::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), FieldValue::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), FieldValue::from(value));
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn std::error::Error + 'static)) {
        *self.error = Some(ErrorInfo::from_dyn_error(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `message` arrives here when built from format arguments.
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), FieldValue::from(format!("{:?}", value)));
        }
    }
}
