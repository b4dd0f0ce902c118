//! The message structure exchanged over the transport.

use std::collections::HashMap;

use bytes::Bytes;

/// Wire representation of a message.
///
/// Field numbers and types match `GrpcMessage` in `proto/messaging.proto`:
/// peers built from that schema decode this struct bit-for-bit.
#[derive(Clone, PartialEq, prost::Message)]
pub struct WireMessage {
    #[prost(bytes = "bytes", tag = "1")]
    pub payload: Bytes,
    #[prost(map = "string, string", tag = "2")]
    pub headers: HashMap<String, String>,
}
