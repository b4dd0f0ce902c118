//! The bridge client facade.
//!
//! This module provides [`FunctionClient`], which holds one shared
//! [`BridgeConfig`] and exposes each interaction shape as a method.

use std::sync::Arc;

use futures::Stream;

use function_grpc_core::Message;

use crate::bridge::{BiStreamBridge, ClientStreamBridge, ServerStreamBridge, UnaryBridge};
use crate::builder::ClientBuilder;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::streaming::MessageStream;

/// Client for a remote function server.
///
/// Cloning is cheap. The client holds configuration only; every call opens
/// and closes its own connection.
///
/// # Example
///
/// ```ignore
/// use function_grpc_client::FunctionClient;
/// use function_grpc_core::Message;
///
/// let client = FunctionClient::builder("localhost", 6048).build();
///
/// let reply = client
///     .request_reply(Message::new("\"hello\"").with_header("foo", "bar"))
///     .await?;
/// ```
#[derive(Clone, Debug)]
pub struct FunctionClient {
    config: Arc<BridgeConfig>,
}

impl FunctionClient {
    /// Create a builder targeting `host:port`.
    pub fn builder<S: Into<String>>(host: S, port: u16) -> ClientBuilder {
        ClientBuilder::new(host, port)
    }

    /// Create a client with default settings targeting `host:port`.
    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        ClientBuilder::new(host, port).build()
    }

    pub(crate) fn from_config(config: Arc<BridgeConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn unary(&self) -> UnaryBridge {
        UnaryBridge::new(self.config.clone())
    }

    pub fn client_streaming(&self) -> ClientStreamBridge {
        ClientStreamBridge::new(self.config.clone())
    }

    pub fn server_streaming(&self) -> ServerStreamBridge {
        ServerStreamBridge::new(self.config.clone())
    }

    pub fn bidi_streaming(&self) -> BiStreamBridge {
        BiStreamBridge::new(self.config.clone())
    }

    /// Send one message, receive one reply. See [`UnaryBridge`].
    pub async fn request_reply(&self, request: Message) -> Result<Message, BridgeError> {
        self.unary().call(request).await
    }

    /// Send a stream, receive one reply. See [`ClientStreamBridge`].
    pub async fn client_stream<S>(&self, inbound: S) -> Result<Message, BridgeError>
    where
        S: Stream<Item = Message> + Send + 'static,
    {
        self.client_streaming().call(inbound).await
    }

    /// Send one message, receive a stream. See [`ServerStreamBridge`].
    pub async fn server_stream(&self, request: Message) -> Result<MessageStream, BridgeError> {
        self.server_streaming().call(request).await
    }

    /// Send a stream, receive a stream. See [`BiStreamBridge`].
    pub async fn bi_stream<S>(&self, inbound: S) -> Result<MessageStream, BridgeError>
    where
        S: Stream<Item = Message> + Send + 'static,
    {
        self.bidi_streaming().call(inbound).await
    }
}
