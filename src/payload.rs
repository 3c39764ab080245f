use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Schema tag of plain UTF-8 text payloads. Also the tag of an empty payload.
pub const UTF8_SCHEMA: &str = "utf-8-string";

/// A type that can travel as an opaque task payload.
///
/// The default encoding is bincode; implementors only name their schema tag.
pub trait Schema: Serialize + DeserializeOwned {
    const SCHEMA: &'static str;

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl Schema for String {
    const SCHEMA: &'static str = UTF8_SCHEMA;

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Encoded bytes plus the schema tag needed to read them back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub schema: String,
}

impl Payload {
    pub fn empty() -> Self {
        Self {
            bytes: Vec::new(),
            schema: UTF8_SCHEMA.to_string(),
        }
    }
}

pub fn serialize<T: Schema>(value: &T) -> Result<Payload> {
    Ok(Payload {
        bytes: value.encode()?,
        schema: T::SCHEMA.to_string(),
    })
}

pub fn deserialize<T: Schema>(bytes: &[u8], schema: &str) -> Result<T> {
    if schema != T::SCHEMA {
        return Err(Error::Serialization(format!(
            "schema mismatch: expected {}, got {schema}",
            T::SCHEMA
        )));
    }
    T::decode(bytes)
}

// ── Text decoders ────────────────────────────────────────────────

/// Turns the JSON body of a `.<name>:{...}` literal into an encoded payload.
pub type TextDecoder = fn(&str) -> Result<Payload>;

fn decode_text<T: Schema>(body: &str) -> Result<Payload> {
    let value: T = serde_json::from_str(body).map_err(|e| Error::Serialization(e.to_string()))?;
    serialize(&value)
}

/// Closed mapping from type names to text decoders, built by the caller.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    decoders: HashMap<String, TextDecoder>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` decodable as `T`. A later registration under the same name wins.
    pub fn register<T: Schema>(mut self, name: impl Into<String>) -> Self {
        self.decoders.insert(name.into(), decode_text::<T>);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decoders.contains_key(name)
    }

    /// Decode `body` with the decoder registered for `name`, if any.
    pub fn decode(&self, name: &str, body: &str) -> Option<Result<Payload>> {
        self.decoders.get(name).map(|decode| decode(body))
    }
}
