//! Client builder for the function bridge client.
//!
//! Provides a fluent API for configuring and building a [`FunctionClient`].

use std::sync::Arc;
use std::time::Duration;

use crate::client::FunctionClient;
use crate::config::{BridgeConfig, CompletionPolicy};

/// Builder for creating a [`FunctionClient`].
///
/// # Example
///
/// ```ignore
/// use function_grpc_client::{ClientBuilder, CompletionPolicy};
/// use std::time::Duration;
///
/// let client = ClientBuilder::new("localhost", 6048)
///     .timeout(Duration::from_secs(5))
///     .receive_credit(8)
///     .completion_policy(CompletionPolicy::Independent)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: BridgeConfig,
}

impl ClientBuilder {
    /// Create a new builder targeting `host:port`.
    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        Self {
            config: BridgeConfig {
                host: host.into(),
                port,
                ..Default::default()
            },
        }
    }

    /// Start from an existing configuration, e.g. one loaded from a file.
    pub fn from_config(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Bound the time spent establishing each connection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Set a deadline for unary and client-streaming calls.
    ///
    /// Without one, a client-streaming call whose peer never replies waits
    /// forever. Streaming replies are not subject to this deadline; drop the
    /// returned [`MessageStream`](crate::MessageStream) to stop them.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set the initial send credit for bidirectional calls (minimum 1).
    pub fn send_credit(mut self, credit: usize) -> Self {
        self.config.send_credit = credit;
        self
    }

    /// Set the initial receive credit for streaming replies (minimum 1).
    pub fn receive_credit(mut self, credit: usize) -> Self {
        self.config.receive_credit = credit;
        self
    }

    /// Choose how a bidirectional call completes.
    pub fn completion_policy(mut self, policy: CompletionPolicy) -> Self {
        self.config.completion_policy = policy;
        self
    }

    /// Set how long replies are still delivered after inbound completes under
    /// [`CompletionPolicy::InboundTerminates`].
    pub fn completion_grace(mut self, grace: Duration) -> Self {
        self.config.completion_grace = grace;
        self
    }

    /// Build the client. No connection is opened until the first call.
    pub fn build(self) -> FunctionClient {
        FunctionClient::from_config(Arc::new(self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let client = ClientBuilder::new("example.org", 9000)
            .connect_timeout(Duration::from_secs(1))
            .timeout(Duration::from_secs(2))
            .send_credit(4)
            .receive_credit(3)
            .completion_policy(CompletionPolicy::InboundTerminates)
            .completion_grace(Duration::from_millis(50))
            .build();

        let config = client.config();
        assert_eq!(config.uri(), "http://example.org:9000");
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.send_credit, 4);
        assert_eq!(config.receive_credit, 3);
        assert_eq!(config.completion_policy, CompletionPolicy::InboundTerminates);
        assert_eq!(config.completion_grace, Duration::from_millis(50));
    }
}
