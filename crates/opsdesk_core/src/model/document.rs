//! Raw document shape and typed field access.
//!
//! # Responsibility
//! - Identify documents by `collection/id` paths.
//! - Encode and decode references and timestamps the way the document store
//!   exports them.
//!
//! # Invariants
//! - A `DocPath` always has exactly two non-empty segments.
//! - Missing and `null` fields read as `None`; a present field of the wrong
//!   type is a `DecodeError`.
//! - `Document::lenient` turns such an error into `None` and a warning, for
//!   display and amount fields that must not hide the whole document.

use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key marking a JSON object as a document reference.
pub const REF_KEY: &str = "$ref";

/// Stable `collection/id` address of one document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocPath {
    collection: String,
    id: String,
}

/// Rejected document path input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
    pub raw: String,
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid document path `{}`", self.raw)
    }
}

impl Error for PathError {}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Result<Self, PathError> {
        let collection = collection.into();
        let id = id.into();
        if !is_valid_segment(&collection) || !is_valid_segment(&id) {
            return Err(PathError {
                raw: format!("{collection}/{id}"),
            });
        }
        Ok(Self { collection, id })
    }

    /// Parses `collection/id`. Leading and trailing slashes are ignored.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim().trim_matches('/');
        let Some((collection, id)) = trimmed.split_once('/') else {
            return Err(PathError {
                raw: raw.to_string(),
            });
        };
        Self::new(collection, id).map_err(|_| PathError {
            raw: raw.to_string(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Encodes this path as a stored reference value.
    pub fn to_reference(&self) -> Value {
        let mut object = Map::new();
        object.insert(REF_KEY.to_string(), Value::String(self.to_string()));
        Value::Object(object)
    }
}

impl Display for DocPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

impl TryFrom<String> for DocPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocPath> for String {
    fn from(value: DocPath) -> Self {
        value.to_string()
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.trim() == segment && !segment.contains('/')
}

/// Field-level decode failure for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub path: String,
    pub field: String,
    pub expected: &'static str,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "document `{}` field `{}`: expected {}",
            self.path, self.field, self.expected
        )
    }
}

impl Error for DecodeError {}

/// One document as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(path: DocPath, fields: Map<String, Value>) -> Self {
        Self { path, fields }
    }

    /// Builds a document from a JSON value that must be an object.
    pub fn from_value(path: DocPath, value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Object(fields) => Ok(Self { path, fields }),
            _ => Err(DecodeError {
                path: path.to_string(),
                field: String::new(),
                expected: "a JSON object",
            }),
        }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Looks up a field; dotted names walk nested maps. `null` reads as `None`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        let mut segments = name.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }

    pub fn str_field(&self, name: &str) -> Result<Option<&str>, DecodeError> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(self.error(name, "a string")),
        }
    }

    /// Reads a string and drops it when blank.
    pub fn text_field(&self, name: &str) -> Result<Option<String>, DecodeError> {
        Ok(self
            .str_field(name)?
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string))
    }

    /// Reads a number. Numeric strings are accepted since older clients wrote
    /// amounts as text.
    pub fn f64_field(&self, name: &str) -> Result<Option<f64>, DecodeError> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Number(value)) => Ok(value.as_f64()),
            Some(Value::String(value)) if value.trim().is_empty() => Ok(None),
            Some(Value::String(value)) => value
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.error(name, "a number")),
            Some(_) => Err(self.error(name, "a number")),
        }
    }

    pub fn i64_field(&self, name: &str) -> Result<Option<i64>, DecodeError> {
        match self.f64_field(name)? {
            None => Ok(None),
            Some(value) if value.fract() == 0.0 => Ok(Some(value as i64)),
            Some(_) => Err(self.error(name, "an integer")),
        }
    }

    pub fn bool_field(&self, name: &str) -> Result<Option<bool>, DecodeError> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(_) => Err(self.error(name, "a boolean")),
        }
    }

    pub fn ref_field(&self, name: &str) -> Result<Option<DocPath>, DecodeError> {
        match self.field(name) {
            None => Ok(None),
            Some(value) => decode_reference(value)
                .map(Some)
                .ok_or_else(|| self.error(name, "a document reference")),
        }
    }

    pub fn timestamp_field(&self, name: &str) -> Result<Option<DateTime<Utc>>, DecodeError> {
        match self.field(name) {
            None => Ok(None),
            Some(value) => decode_timestamp(value)
                .map(Some)
                .ok_or_else(|| self.error(name, "a timestamp")),
        }
    }

    /// Keeps a typed read best-effort: a wrong type reads as `None`.
    pub fn lenient<T>(&self, read: Result<Option<T>, DecodeError>) -> Option<T> {
        match read {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "event=decode_field module=model status=defaulted path={} field={} expected={}",
                    err.path, err.field, err.expected
                );
                None
            }
        }
    }

    /// Turns an absent required value into a `DecodeError`.
    pub fn require<T>(&self, name: &str, value: Option<T>) -> Result<T, DecodeError> {
        value.ok_or_else(|| self.error(name, "a present value"))
    }

    pub fn error(&self, field: &str, expected: &'static str) -> DecodeError {
        DecodeError {
            path: self.path.to_string(),
            field: field.to_string(),
            expected,
        }
    }
}

/// Returns whether `value` is an encoded `{"$ref": ...}` object.
pub fn is_reference_object(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.contains_key(REF_KEY))
}

/// Returns whether `value` is a `{"seconds": ...}` timestamp object.
pub fn is_timestamp_object(value: &Value) -> bool {
    value.as_object().is_some_and(|object| {
        object.contains_key("seconds") || object.contains_key("_seconds")
    })
}

/// Decodes a reference from `{"$ref": "c/id"}` or a bare `"c/id"` string.
pub fn decode_reference(value: &Value) -> Option<DocPath> {
    match value {
        Value::Object(object) => object
            .get(REF_KEY)
            .and_then(Value::as_str)
            .and_then(|raw| DocPath::parse(raw).ok()),
        Value::String(raw) => DocPath::parse(raw).ok(),
        _ => None,
    }
}

/// Decodes a timestamp from the export object shape, an RFC 3339 string or
/// integer epoch milliseconds.
pub fn decode_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(object) => {
            let seconds = object
                .get("seconds")
                .or_else(|| object.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = object
                .get("nanoseconds")
                .or_else(|| object.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).ok()?;
            Utc.timestamp_opt(seconds, nanos).single()
        }
        Value::String(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|value| value.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Encodes a timestamp in the export object shape.
pub fn encode_timestamp(value: DateTime<Utc>) -> Value {
    let mut object = Map::new();
    object.insert("seconds".to_string(), Value::from(value.timestamp()));
    object.insert(
        "nanoseconds".to_string(),
        Value::from(value.timestamp_subsec_nanos()),
    );
    Value::Object(object)
}
