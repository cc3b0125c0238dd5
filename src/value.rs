use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeZone};
use indexmap::IndexMap;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Arbitrary caller value with no JSON representation of its own.
///
/// Anything that is `Display + Debug + Send + Sync` qualifies; converters
/// can downcast through [`OpaqueValue::as_any`] to special-case types.
pub trait OpaqueValue: fmt::Display + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T> OpaqueValue for T
where
    T: fmt::Display + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Value carried by a record: message payloads, extras and positional
/// message arguments all use this type.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Already JSON-native.
    Json(Value),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Array(Vec<FieldValue>),
    Object(IndexMap<String, FieldValue>),
    Opaque(Arc<dyn OpaqueValue>),
}

impl FieldValue {
    pub fn opaque<T: OpaqueValue + 'static>(value: T) -> Self {
        FieldValue::Opaque(Arc::new(value))
    }

    pub fn null() -> Self {
        FieldValue::Json(Value::Null)
    }

    /// Convert to JSON, handing every non-native leaf to `converter`.
    pub fn to_json(&self, converter: &dyn ValueConverter) -> Value {
        match self {
            FieldValue::Json(v) => v.clone(),
            FieldValue::Array(items) => {
                Value::Array(items.iter().map(|v| v.to_json(converter)).collect())
            }
            FieldValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json(converter)))
                    .collect(),
            ),
            leaf => converter.convert(leaf),
        }
    }
}

/// Plain-text rendering used for positional message arguments and for
/// the `Display` fallback: strings appear without quotes.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Json(Value::String(s)) => f.write_str(s),
            FieldValue::Json(v) => write!(f, "{}", v),
            FieldValue::DateTime(dt) => f.write_str(&iso_datetime(dt)),
            FieldValue::Date(d) => write!(f, "{}", d),
            FieldValue::Time(t) => write!(f, "{}", t),
            FieldValue::Opaque(o) => write!(f, "{}", o),
            nested => write!(f, "{}", nested.to_json(&DefaultConverter)),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.to_json(&DefaultConverter) == other.to_json(&DefaultConverter)
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Json(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Json(Value::String(v.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Json(Value::String(v))
    }
}

macro_rules! from_json_native {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    FieldValue::Json(Value::from(v))
                }
            }
        )*
    };
}

from_json_native!(bool, i32, i64, u32, u64, f64);

impl<Tz: TimeZone> From<DateTime<Tz>> for FieldValue {
    fn from(v: DateTime<Tz>) -> Self {
        FieldValue::DateTime(v.fixed_offset())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(v: NaiveTime) -> Self {
        FieldValue::Time(v)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(v: Vec<FieldValue>) -> Self {
        FieldValue::Array(v)
    }
}

impl From<IndexMap<String, FieldValue>> for FieldValue {
    fn from(v: IndexMap<String, FieldValue>) -> Self {
        FieldValue::Object(v)
    }
}

/// Hook rendering values that have no JSON representation.
///
/// Only leaves reach `convert`: `Json`, `Array` and `Object` are walked by
/// [`FieldValue::to_json`] itself.
pub trait ValueConverter: Send + Sync {
    fn convert(&self, value: &FieldValue) -> Value;
}

/// Date/time values as ISO-8601, everything else through `Display`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl ValueConverter for DefaultConverter {
    fn convert(&self, value: &FieldValue) -> Value {
        match value {
            FieldValue::DateTime(dt) => Value::String(iso_datetime(dt)),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::Time(t) => Value::String(t.to_string()),
            FieldValue::Opaque(o) => Value::String(o.to_string()),
            other => other.to_json(self),
        }
    }
}

fn iso_datetime(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    struct Custom;

    impl fmt::Display for Custom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Custom instance")
        }
    }

    impl fmt::Debug for Custom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Custom")
        }
    }

    #[test]
    fn dates_render_as_iso8601() {
        let dt = Utc.with_ymd_and_hms(2020, 1, 10, 3, 14, 11).unwrap();
        let date = NaiveDate::from_ymd_opt(2020, 1, 10).unwrap();
        let time = NaiveTime::from_hms_opt(3, 14, 11).unwrap();

        assert_eq!(FieldValue::from(dt).to_json(&DefaultConverter), json!("2020-01-10T03:14:11+00:00"));
        assert_eq!(FieldValue::from(date).to_json(&DefaultConverter), json!("2020-01-10"));
        assert_eq!(FieldValue::from(time).to_json(&DefaultConverter), json!("03:14:11"));
    }

    #[test]
    fn opaque_values_use_display() {
        let v = FieldValue::opaque(Custom);
        assert_eq!(v.to_json(&DefaultConverter), json!("Custom instance"));
    }

    #[test]
    fn nested_values_are_converted() {
        let mut inner = IndexMap::new();
        inner.insert("when".to_string(), FieldValue::from(NaiveDate::from_ymd_opt(2021, 2, 3).unwrap()));
        let v = FieldValue::Array(vec![FieldValue::from(1), FieldValue::Object(inner)]);
        assert_eq!(v.to_json(&DefaultConverter), json!([1, {"when": "2021-02-03"}]));
    }

    #[test]
    fn display_leaves_strings_unquoted() {
        assert_eq!(FieldValue::from("abc").to_string(), "abc");
        assert_eq!(FieldValue::from(2).to_string(), "2");
        assert_eq!(FieldValue::null().to_string(), "null");
    }
}
