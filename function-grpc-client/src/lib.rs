//! Streaming bridge client for remote functions.
//!
//! This crate adapts in-process message streams onto the four gRPC
//! interaction shapes exposed by a function server's `MessagingService`:
//!
//! - Unary request/reply ([`UnaryBridge`])
//! - Client streaming ([`ClientStreamBridge`])
//! - Server streaming ([`ServerStreamBridge`])
//! - Bidirectional streaming ([`BiStreamBridge`])
//!
//! Streams are never buffered whole. Streaming replies are pulled from the
//! transport under explicit receive credit, and bidirectional sends are gated
//! on send credit the transport replenishes as it accepts data.
//!
//! ## Example
//!
//! ```ignore
//! use function_grpc_client::FunctionClient;
//! use function_grpc_core::Message;
//! use futures::{stream, TryStreamExt};
//!
//! let client = FunctionClient::new("localhost", 6048);
//!
//! let inbound = stream::iter(vec![
//!     Message::new("\"Ricky\""),
//!     Message::new("\"Julien\""),
//! ]);
//!
//! let replies: Vec<Message> = client.bi_stream(inbound).await?.try_collect().await?;
//! ```
//!
//! ## Cancellation
//!
//! Dropping a [`MessageStream`] cancels the call it came from. Unary and
//! client-streaming calls are canceled by dropping their future. In both cases
//! the connection is released.
//!
//! ## Errors
//!
//! Every failure is a [`BridgeError`]. Nothing is retried; callers that want
//! retries wrap calls themselves.

mod bridge;
mod builder;
mod client;
mod config;
mod connection;
mod error;
mod flow;
mod streaming;

pub use bridge::{BiStreamBridge, ClientStreamBridge, ServerStreamBridge, UnaryBridge};
pub use builder::ClientBuilder;
pub use client::FunctionClient;
pub use config::{
    BridgeConfig, CompletionPolicy, DEFAULT_COMPLETION_GRACE, DEFAULT_RECEIVE_CREDIT,
    DEFAULT_SEND_CREDIT,
};
pub use error::BridgeError;
pub use streaming::MessageStream;

pub use function_grpc_core::{HeaderValue, Message, MessageHeaders};
