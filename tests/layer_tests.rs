#![cfg(feature = "layer")]

use serde_json::{json, Value};
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_json_formatter::layer::JsonLayer;
use tracing_json_formatter::{JsonFormatter, JsonFormatterConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap().lines().map(str::to_string).collect()
    }
}

fn capture(config: JsonFormatterConfig, emit: impl FnOnce()) -> Vec<String> {
    let captured = Captured::default();
    let writer = captured.clone();
    let layer = JsonLayer::new(JsonFormatter::new(config).unwrap(), move || writer.clone());
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, emit);
    captured.lines()
}

#[derive(Debug)]
struct MyException;

impl fmt::Display for MyException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("boom")
    }
}

impl std::error::Error for MyException {}

#[test]
fn message_only_event_is_written_bare() {
    let lines = capture(JsonFormatterConfig::default(), || tracing::info!("message 1"));
    assert_eq!(lines, vec!["message 1"]);
}

#[test]
fn event_fields_become_extras() {
    let lines = capture(JsonFormatterConfig::default(), || {
        tracing::info!(key1 = "value 1", count = 3, ok = true, "message {}", 1)
    });
    let out: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(out, json!({"message": "message 1", "key1": "value 1", "count": 3, "ok": true}));
}

#[test]
fn event_without_message_is_structured() {
    let lines = capture(JsonFormatterConfig::default(), || tracing::warn!(key = "value", n = 2));
    assert_eq!(lines, vec![r#"{"key":"value","n":2}"#]);
}

#[test]
fn metadata_feeds_field_map() {
    let config = JsonFormatterConfig::default()
        .with_field("level", "levelname")
        .with_field("logger", "name")
        .with_field("file", "filename");
    let lines = capture(config, || tracing::warn!(target: "app::db", "slow query"));
    let out: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(
        out,
        json!({"level": "WARNING", "logger": "app::db", "file": "layer_tests.rs", "message": "slow query"})
    );
}

#[test]
fn error_fields_are_reported_as_exception() {
    let lines = capture(JsonFormatterConfig::default(), || {
        let err = MyException;
        tracing::error!(error = &err as &dyn std::error::Error, "request failed")
    });
    let out: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(out["message"], json!("request failed"));
    assert_eq!(out["exception"]["type"], json!("MyException"));
    assert_eq!(out["exception"]["message"], json!("boom"));
    assert!(out["exception"]["stack"].as_str().is_some_and(|s| !s.is_empty()));
}

#[test]
fn one_line_per_event() {
    let lines = capture(JsonFormatterConfig::default(), || {
        tracing::info!("first");
        tracing::debug!(k = 1, "second");
    });
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "first");
    assert_eq!(serde_json::from_str::<Value>(&lines[1]).unwrap(), json!({"message": "second", "k": 1}));
}
