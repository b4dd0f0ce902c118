//! Application-side message representation.
//!
//! A [`Message`] is an immutable pair of payload bytes and [`MessageHeaders`].
//! Header values are typed ([`HeaderValue`]) so producers can attach numbers,
//! flags or arbitrary JSON; they are stringified when the message crosses the
//! wire (see [`crate::codec`]).

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single header value.
///
/// Only [`HeaderValue::String`] survives an encode/decode round trip
/// unchanged. Every other variant reaches the peer as its [`Display`] form.
///
/// [`Display`]: std::fmt::Display
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Json(serde_json::Value),
}

impl HeaderValue {
    /// Returns the value if it is already a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::String(s) => f.write_str(s),
            HeaderValue::Integer(n) => write!(f, "{n}"),
            HeaderValue::Float(n) => write!(f, "{n}"),
            HeaderValue::Boolean(b) => write!(f, "{b}"),
            // Bare JSON strings are written without quotes, like `String`.
            HeaderValue::Json(serde_json::Value::String(s)) => f.write_str(s),
            HeaderValue::Json(value) => write!(f, "{value}"),
        }
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::String(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::String(value.to_string())
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Integer(value)
    }
}

impl From<i32> for HeaderValue {
    fn from(value: i32) -> Self {
        HeaderValue::Integer(value.into())
    }
}

impl From<u32> for HeaderValue {
    fn from(value: u32) -> Self {
        HeaderValue::Integer(value.into())
    }
}

impl From<f64> for HeaderValue {
    fn from(value: f64) -> Self {
        HeaderValue::Float(value)
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Boolean(value)
    }
}

impl From<serde_json::Value> for HeaderValue {
    fn from(value: serde_json::Value) -> Self {
        HeaderValue::Json(value)
    }
}

/// String-keyed message headers. Iteration order is unspecified.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHeaders(HashMap<String, HeaderValue>);

impl MessageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.0.get(key)
    }

    /// Get a header as a string, stringifying non-string values.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.0.get(key).map(ToString::to_string)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn insert(&mut self, key: String, value: HeaderValue) {
        self.0.insert(key, value);
    }
}

impl<K, V> FromIterator<(K, V)> for MessageHeaders
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MessageHeaders(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<HashMap<String, String>> for MessageHeaders {
    fn from(headers: HashMap<String, String>) -> Self {
        headers.into_iter().collect()
    }
}

/// An application message: payload bytes plus headers.
///
/// Messages are immutable once built; the `with_*` methods consume and return
/// a new value.
///
/// # Example
///
/// ```
/// use function_grpc_core::Message;
///
/// let message = Message::new("\"hello\"")
///     .with_header("foo", "bar")
///     .with_header("attempt", 1);
///
/// assert_eq!(message.payload().as_ref(), b"\"hello\"");
/// assert_eq!(message.headers().get_string("attempt").as_deref(), Some("1"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    payload: Bytes,
    headers: MessageHeaders,
}

impl Message {
    /// Create a message with the given payload and no headers.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            headers: MessageHeaders::new(),
        }
    }

    /// Create a message from a payload and a complete header map.
    pub fn from_parts(payload: impl Into<Bytes>, headers: MessageHeaders) -> Self {
        Self {
            payload: payload.into(),
            headers,
        }
    }

    /// Return a copy of this message with `key` set to `value`.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn headers(&self) -> &MessageHeaders {
        &self.headers
    }

    pub fn into_parts(self) -> (Bytes, MessageHeaders) {
        (self.payload, self.headers)
    }
}
