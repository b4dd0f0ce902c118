//! Translation between [`Message`] and [`WireMessage`].
//!
//! Both directions are total. Encoding stringifies every header value, so a
//! round trip is lossless for string headers and lossy (values become their
//! string form) for everything else.

use bytes::Bytes;

use crate::message::{HeaderValue, Message, MessageHeaders};
use crate::wire::WireMessage;

/// Encode a payload and headers into a [`WireMessage`].
pub fn encode(payload: impl Into<Bytes>, headers: &MessageHeaders) -> WireMessage {
    WireMessage {
        payload: payload.into(),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

/// Encode a [`Message`] into a [`WireMessage`].
pub fn encode_message(message: &Message) -> WireMessage {
    encode(message.payload().clone(), message.headers())
}

/// Decode a [`WireMessage`]; header values come back as strings.
pub fn decode(message: WireMessage) -> Message {
    let headers = message
        .headers
        .into_iter()
        .map(|(k, v)| (k, HeaderValue::String(v)))
        .collect();
    Message::from_parts(message.payload, headers)
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        encode_message(message)
    }
}

impl From<Message> for WireMessage {
    fn from(message: Message) -> Self {
        let (payload, headers) = message.into_parts();
        encode(payload, &headers)
    }
}

impl From<WireMessage> for Message {
    fn from(message: WireMessage) -> Self {
        decode(message)
    }
}
