//! Name-based lookup of the standard record attributes a field selector
//! can refer to.

use crate::record::{LogRecord, Message};
use crate::text::TextFormatter;
use crate::value::FieldValue;
use chrono::Timelike;
use once_cell::sync::Lazy;
use std::collections::HashMap;

type Accessor = fn(&LogRecord, &TextFormatter) -> FieldValue;

fn opt_str(value: Option<&str>) -> FieldValue {
    value.map(FieldValue::from).unwrap_or_else(FieldValue::null)
}

fn logger_name(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    r.logger_name.as_str().into()
}

fn level_name(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    r.level.name().into()
}

fn level_number(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    r.level.number().into()
}

fn path_name(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    opt_str(r.file.as_deref())
}

fn file_name(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    opt_str(r.file_name())
}

fn module(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    opt_str(r.module_path.as_deref())
}

fn line_number(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    r.line.map(FieldValue::from).unwrap_or_else(FieldValue::null)
}

fn function(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    opt_str(r.function.as_deref())
}

/// Seconds since the Unix epoch, with sub-second precision.
fn created(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    let micros = r.timestamp.timestamp_micros();
    (micros as f64 / 1_000_000.0).into()
}

fn millis(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    (r.timestamp.nanosecond() as f64 / 1_000_000.0).floor().into()
}

fn relative_created(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    r.relative_created.into()
}

fn thread_id(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    r.thread_id.into()
}

fn thread_name(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    opt_str(r.thread_name.as_deref())
}

fn process_id(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    r.process_id.into()
}

fn process_name(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    r.process_name.as_str().into()
}

fn rendered_message(r: &LogRecord, text: &TextFormatter) -> FieldValue {
    text.format_message(&r.message).into()
}

fn raw_message(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    match &r.message {
        Message::Plain { template, .. } => template.as_str().into(),
        Message::Structured(map) => FieldValue::Object(map.clone()),
    }
}

fn message_args(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    match &r.message {
        Message::Plain { args, .. } => FieldValue::Array(args.clone()),
        Message::Structured(_) => FieldValue::Array(Vec::new()),
    }
}

fn formatted_timestamp(r: &LogRecord, text: &TextFormatter) -> FieldValue {
    text.format_time(r).into()
}

fn exception_text(r: &LogRecord, _: &TextFormatter) -> FieldValue {
    opt_str(r.error.as_ref().map(|e| e.stack.as_str()))
}

static ATTRIBUTES: Lazy<HashMap<&'static str, Accessor>> = Lazy::new(|| {
    let table: [(&'static str, Accessor); 30] = [
        ("name", logger_name),
        ("loggerName", logger_name),
        ("levelname", level_name),
        ("level", level_name),
        ("levelno", level_number),
        ("levelNumber", level_number),
        ("pathname", path_name),
        ("sourceFile", path_name),
        ("filename", file_name),
        ("module", module),
        ("lineno", line_number),
        ("sourceLine", line_number),
        ("funcName", function),
        ("function", function),
        ("created", created),
        ("timestamp", created),
        ("msecs", millis),
        ("relativeCreated", relative_created),
        ("thread", thread_id),
        ("threadId", thread_id),
        ("threadName", thread_name),
        ("process", process_id),
        ("processId", process_id),
        ("processName", process_name),
        ("message", rendered_message),
        ("msg", raw_message),
        ("args", message_args),
        ("asctime", formatted_timestamp),
        ("formattedTimestamp", formatted_timestamp),
        ("exc_text", exception_text),
    ];
    table.into_iter().collect()
});

/// Look up a standard attribute by name. `None` means `name` is not a
/// standard attribute; attributes without a value resolve to `null`.
pub fn resolve(name: &str, record: &LogRecord, text: &TextFormatter) -> Option<FieldValue> {
    ATTRIBUTES.get(name).map(|accessor| accessor(record, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TextFormatConfig;
    use crate::record::Level;
    use chrono::{TimeZone, Utc};
    use indexmap::IndexMap;

    fn text() -> TextFormatter {
        TextFormatter::new(TextFormatConfig::default()).unwrap()
    }

    #[test]
    fn unknown_names_are_not_standard() {
        let record = LogRecord::new(Level::Info, "m");
        assert!(resolve("this is a value", &record, &text()).is_none());
        assert!(resolve("key1", &record, &text()).is_none());
    }

    #[test]
    fn aliases_resolve_to_the_same_value() {
        let record = LogRecord::new(Level::Warning, "m").with_logger("app.db");
        assert_eq!(resolve("levelname", &record, &text()), resolve("level", &record, &text()));
        assert_eq!(resolve("name", &record, &text()), Some(FieldValue::from("app.db")));
        assert_eq!(resolve("levelNumber", &record, &text()), Some(FieldValue::from(30u32)));
    }

    #[test]
    fn time_attributes() {
        let ts = Utc.with_ymd_and_hms(2020, 9, 10, 13, 12, 33).unwrap()
            + chrono::Duration::microseconds(7_667);
        let record = LogRecord::at(ts, Level::Info, "m");
        assert_eq!(resolve("msecs", &record, &text()), Some(FieldValue::from(7.0)));
        assert_eq!(resolve("created", &record, &text()), Some(FieldValue::from(1599743553.007667)));
        assert_eq!(
            resolve("asctime", &record, &text()),
            Some(FieldValue::from("2020-09-10 13:12:33,007"))
        );
    }

    #[test]
    fn raw_message_keeps_structured_mapping() {
        let record = LogRecord::new(Level::Info, Message::structured([("k", 1)]));
        let expected: IndexMap<String, FieldValue> =
            [("k".to_string(), FieldValue::from(1))].into_iter().collect();
        assert_eq!(resolve("msg", &record, &text()), Some(FieldValue::Object(expected)));
    }

    #[test]
    fn relative_created_is_milliseconds_since_start() {
        let record = LogRecord::new(Level::Info, "m");
        match resolve("relativeCreated", &record, &text()) {
            Some(FieldValue::Json(serde_json::Value::Number(n))) => {
                assert!(n.as_f64().is_some_and(|ms| ms >= 0.0));
            }
            other => panic!("unexpected relativeCreated value: {:?}", other),
        }
    }

    #[test]
    fn missing_location_is_null() {
        let record = LogRecord::new(Level::Info, "m");
        assert_eq!(resolve("lineno", &record, &text()), Some(FieldValue::null()));
    }
}
