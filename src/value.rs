use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::payload::{Payload, SchemaRegistry};

/// Generic boxed value: the closed scalar/array/binary/void set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Void,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Binary(Vec<u8>),
}

impl Value {
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Double(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Void, Into::into)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;
        match json {
            Json::Null => Ok(Value::Void),
            Json::Bool(b) => Ok(Value::Bool(b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => n
                    .as_f64()
                    .map(Value::Double)
                    .ok_or_else(|| Error::UnsupportedValueType(format!("number {n}"))),
            },
            Json::String(s) => Ok(Value::String(s)),
            Json::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Json::Object(_) => Err(Error::UnsupportedValueType("object".into())),
        }
    }
}

/// A named generic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: Value,
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Box an arbitrary JSON value under `key`.
    pub fn from_json(key: impl Into<String>, json: serde_json::Value) -> Result<Self> {
        Ok(Self {
            key: key.into(),
            value: Value::try_from(json)?,
        })
    }
}

// ── Sniffing typed values out of text ────────────────────────────

/// What a piece of descriptor text turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Int(i64),
    Double(f64),
    Bool(bool),
    /// A `.<name>:{...}` literal decoded through the registry.
    Typed(Payload),
    /// Anything else, verbatim.
    Text(String),
}

/// Interpret `text` as a number, a boolean, a registered typed literal, or
/// plain text, in that order. Never fails: unrecognised input stays text.
pub fn parse_value(text: &str, registry: &SchemaRegistry) -> Parsed {
    let trimmed = text.trim();

    if let Ok(i) = trimmed.parse::<i64>() {
        return Parsed::Int(i);
    }
    if let Ok(d) = trimmed.parse::<f64>()
        && d.is_finite()
    {
        return Parsed::Double(d);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Parsed::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Parsed::Bool(false);
    }

    let Some((name, body)) = split_typed_literal(trimmed) else {
        debug!("no typed literal in {trimmed:?}, keeping text");
        return Parsed::Text(text.to_string());
    };
    match registry.decode(name, body) {
        Some(Ok(payload)) => Parsed::Typed(payload),
        Some(Err(e)) => {
            debug!("could not decode {name} literal ({e}), keeping text");
            Parsed::Text(text.to_string())
        }
        None => {
            debug!("type {name} is not registered, keeping text");
            Parsed::Text(text.to_string())
        }
    }
}

/// Split `.<name>:{...}` into `name` and the braced body (braces included).
fn split_typed_literal(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('.')?;
    let (name, body) = rest.split_once(':')?;
    if name.is_empty() || !body.starts_with('{') || !body.ends_with('}') {
        return None;
    }
    Some((name, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{self, Schema};
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Target {
        id: String,
        duration: i64,
    }

    impl Schema for Target {
        const SCHEMA: &'static str = ".hri.HighlightTarget";
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new().register::<Target>("hri.HighlightTarget")
    }

    #[test]
    fn box_json_scalars() {
        assert_eq!(Value::try_from(json!(null)).unwrap(), Value::Void);
        assert_eq!(Value::try_from(json!(true)).unwrap(), Value::Bool(true));
        assert_eq!(Value::try_from(json!(42)).unwrap(), Value::Int(42));
        assert_eq!(Value::try_from(json!(2.5)).unwrap(), Value::Double(2.5));
        assert_eq!(Value::try_from(json!("hi")).unwrap(), Value::from("hi"));
    }

    #[test]
    fn box_json_array_recursively() {
        let v = Value::try_from(json!([1, "two", [false]])).unwrap();
        assert_eq!(
            v,
            Value::Array(vec![
                Value::Int(1),
                Value::String("two".into()),
                Value::Array(vec![Value::Bool(false)]),
            ])
        );
    }

    #[test]
    fn object_is_unsupported() {
        let err = Value::try_from(json!({"a": 1})).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValueType(_)));
        let nested = Value::try_from(json!([1, {"a": 1}]));
        assert!(matches!(nested, Err(Error::UnsupportedValueType(_))));
    }

    #[test]
    fn key_value_pairs() {
        let kv = KeyValuePair::new("speed", 0.5f32);
        assert_eq!(kv.value.as_double(), Some(0.5));
        let none: Option<i64> = None;
        assert!(KeyValuePair::new("missing", none).value.is_void());
        assert_eq!(KeyValuePair::new("blob", vec![1u8, 2]).value, Value::Binary(vec![1, 2]));
        assert!(KeyValuePair::from_json("cfg", json!({"x": 1})).is_err());
    }

    #[test]
    fn value_serde_shape() {
        let json = serde_json::to_string(&Value::Int(3)).unwrap();
        assert_eq!(json, r#"{"type":"int","value":3}"#);
        let void = serde_json::to_string(&Value::Void).unwrap();
        assert_eq!(void, r#"{"type":"void"}"#);
    }

    #[test]
    fn parse_numbers_and_bools() {
        let reg = SchemaRegistry::new();
        assert_eq!(parse_value("17", &reg), Parsed::Int(17));
        assert_eq!(parse_value(" -3 ", &reg), Parsed::Int(-3));
        assert_eq!(parse_value("0.25", &reg), Parsed::Double(0.25));
        assert_eq!(parse_value("TRUE", &reg), Parsed::Bool(true));
        assert_eq!(parse_value("false", &reg), Parsed::Bool(false));
        assert_eq!(parse_value("NaN", &reg), Parsed::Text("NaN".into()));
    }

    #[test]
    fn parse_registered_literal() {
        let parsed = parse_value(
            r#".hri.HighlightTarget:{"id": "lamp", "duration": 2000}"#,
            &registry(),
        );
        let Parsed::Typed(p) = parsed else {
            panic!("expected typed payload, got {parsed:?}");
        };
        let target: Target = payload::deserialize(&p.bytes, &p.schema).unwrap();
        assert_eq!(target, Target { id: "lamp".into(), duration: 2000 });
    }

    #[test]
    fn parse_unknown_or_broken_literal_stays_text() {
        let reg = registry();
        let unknown = r#".hri.Gaze:{"x": 1}"#;
        assert_eq!(parse_value(unknown, &reg), Parsed::Text(unknown.into()));
        let broken = r#".hri.HighlightTarget:{"id": 5}"#;
        assert_eq!(parse_value(broken, &reg), Parsed::Text(broken.into()));
        assert_eq!(parse_value("kitchen", &reg), Parsed::Text("kitchen".into()));
    }
}
