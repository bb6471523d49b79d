//! JSON encoding of resource payloads.
//!
//! Nodes nested anywhere in a payload are replaced by their own payload,
//! recursively, before ordinary JSON encoding. Opaque domain values are
//! offered to the registered [`FallbackEncoder`]s in order; if none accepts,
//! encoding fails with [`SerializationError::Unsupported`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use uuid::Uuid;

use crate::error::SerializationError;
use crate::value::{OpaqueValue, Value};

/// Pluggable encoder for values with no native JSON form.
pub trait FallbackEncoder: Send + Sync {
    /// Return `None` to decline the value and let the next encoder try.
    fn encode(&self, value: &dyn OpaqueValue) -> Option<serde_json::Value>;
}

impl<F> FallbackEncoder for F
where
    F: Fn(&dyn OpaqueValue) -> Option<serde_json::Value> + Send + Sync,
{
    fn encode(&self, value: &dyn OpaqueValue) -> Option<serde_json::Value> {
        self(value)
    }
}

/// Encodes [`Uuid`] values as hyphenated strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidEncoder;

impl FallbackEncoder for UuidEncoder {
    fn encode(&self, value: &dyn OpaqueValue) -> Option<serde_json::Value> {
        let id = value.as_any().downcast_ref::<Uuid>()?;
        Some(serde_json::Value::String(id.hyphenated().to_string()))
    }
}

/// Encodes UTC timestamps as RFC 3339 strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimestampEncoder;

impl FallbackEncoder for TimestampEncoder {
    fn encode(&self, value: &dyn OpaqueValue) -> Option<serde_json::Value> {
        let ts = value.as_any().downcast_ref::<DateTime<Utc>>()?;
        Some(serde_json::Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
    }
}

/// Renders [`Value`] trees as JSON.
#[derive(Clone, Default)]
pub struct Encoder {
    fallbacks: Vec<Arc<dyn FallbackEncoder>>,
    pretty: bool,
}

impl Encoder {
    /// Compact output, no fallbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent output by four spaces per level.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_fallback<E: FallbackEncoder + 'static>(mut self, encoder: E) -> Self {
        self.fallbacks.push(Arc::new(encoder));
        self
    }

    /// Register the UUID and timestamp encoders.
    pub fn with_standard_fallbacks(self) -> Self {
        self.with_fallback(UuidEncoder).with_fallback(TimestampEncoder)
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    /// Convert a payload to a plain JSON value.
    ///
    /// Object members keep the map's key order, so integer keys stay in
    /// numeric order ahead of string keys. Integer keys become their decimal
    /// text. If a map holds both `Int(n)` and `Str("n")`, the string key's
    /// value wins.
    pub fn to_json(&self, value: &Value) -> Result<serde_json::Value, SerializationError> {
        Ok(match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(|item| self.to_json(item)).collect::<Result<_, _>>()?,
            ),
            Value::Map(entries) => {
                let mut object = serde_json::Map::new();
                for (key, item) in entries {
                    object.insert(key.to_string(), self.to_json(item)?);
                }
                serde_json::Value::Object(object)
            }
            Value::Node(node) => self.to_json(node.payload())?,
            Value::Opaque(opaque) => self.encode_opaque(&**opaque)?,
        })
    }

    /// Render a payload to bytes.
    pub fn to_vec(&self, value: &Value) -> Result<Vec<u8>, SerializationError> {
        let json = self.to_json(value)?;
        let mut out = Vec::new();
        if self.pretty {
            let mut ser =
                serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
            json.serialize(&mut ser)
                .map_err(|e| SerializationError::Write(e.to_string()))?;
        } else {
            serde_json::to_writer(&mut out, &json)
                .map_err(|e| SerializationError::Write(e.to_string()))?;
        }
        Ok(out)
    }

    fn encode_opaque(&self, value: &dyn OpaqueValue) -> Result<serde_json::Value, SerializationError> {
        self.fallbacks
            .iter()
            .find_map(|fallback| fallback.encode(value))
            .ok_or_else(|| SerializationError::Unsupported {
                type_name: value.type_name().to_string(),
            })
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("fallbacks", &self.fallbacks.len())
            .field("pretty", &self.pretty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::key::Key;
    use crate::resource::BasicResource;

    #[derive(Debug)]
    struct Money {
        cents: i64,
    }

    #[test]
    fn nested_nodes_are_unwrapped() {
        let leaf = Value::node(BasicResource::new(Value::map([("name", "User 1")])));
        let middle = Value::node(BasicResource::new(Value::map([
            (Key::from(1), leaf),
            (Key::from("tags"), Value::list([Value::node(BasicResource::new("deep"))])),
        ])));
        let root = Value::map([("users", middle)]);

        let json = Encoder::new().to_json(&root).unwrap();
        assert_eq!(
            json,
            json!({"users": {"1": {"name": "User 1"}, "tags": ["deep"]}})
        );
    }

    #[test]
    fn compact_and_pretty_output() {
        let value = Value::map([("a", Value::list([1, 2]))]);
        let compact = Encoder::new().to_vec(&value).unwrap();
        assert_eq!(compact, br#"{"a":[1,2]}"#);

        let pretty = Encoder::new().pretty(true).to_vec(&value).unwrap();
        let text = String::from_utf8(pretty).unwrap();
        assert_eq!(text, "{\n    \"a\": [\n        1,\n        2\n    ]\n}");
    }

    #[test]
    fn unknown_opaque_fails() {
        let value = Value::map([("price", Value::opaque(Money { cents: 150 }))]);
        let err = Encoder::new().to_json(&value).unwrap_err();
        match err {
            SerializationError::Unsupported { type_name } => assert!(type_name.ends_with("Money")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn closure_fallback() {
        let encoder = Encoder::new().with_fallback(|value: &dyn OpaqueValue| {
            let money = value.as_any().downcast_ref::<Money>()?;
            Some(json!(format!("${}.{:02}", money.cents / 100, money.cents % 100)))
        });
        let value = Value::opaque(Money { cents: 1505 });
        assert_eq!(encoder.to_json(&value).unwrap(), json!("$15.05"));
    }

    #[test]
    fn fallbacks_tried_in_order() {
        let encoder = Encoder::new()
            .with_fallback(|_: &dyn OpaqueValue| None::<serde_json::Value>)
            .with_fallback(|_: &dyn OpaqueValue| Some(json!("second")))
            .with_fallback(|_: &dyn OpaqueValue| Some(json!("third")));
        assert_eq!(encoder.to_json(&Value::opaque(1u8)).unwrap(), json!("second"));
    }

    #[test]
    fn standard_fallbacks() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let value = Value::map([("id", Value::opaque(id)), ("at", Value::opaque(ts))]);

        let json = Encoder::new().with_standard_fallbacks().to_json(&value).unwrap();
        assert_eq!(
            json,
            json!({"id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "at": "2024-03-01T12:30:00Z"})
        );
    }

    #[test]
    fn integer_keys_keep_numeric_order() {
        let value = Value::map([(2, 0), (10, 1), (1, 2)]);
        let bytes = Encoder::new().to_vec(&value).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"1":2,"2":0,"10":1}"#);

        let mixed = Value::map([(Key::from("b"), 1), (Key::from(3), 2), (Key::from("a"), 3)]);
        let bytes = Encoder::new().to_vec(&mixed).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"3":2,"a":3,"b":1}"#);
    }

    #[test]
    fn string_key_wins_collision() {
        let value = Value::map([(Key::from(1), Value::from("int")), (Key::from("1"), Value::from("str"))]);
        assert_eq!(Encoder::new().to_json(&value).unwrap(), json!({"1": "str"}));
    }
}
