//! Bridge configuration.
//!
//! A [`BridgeConfig`] is shared by every call made through a
//! [`FunctionClient`](crate::FunctionClient). Build one with
//! [`ClientBuilder`](crate::ClientBuilder), or deserialize it with serde.

use std::time::Duration;

use serde::Deserialize;

use function_grpc_core::DEFAULT_PORT;

/// Initial send-direction credit for bidirectional calls.
pub const DEFAULT_SEND_CREDIT: usize = 16;

/// Initial receive-direction credit for streaming replies.
pub const DEFAULT_RECEIVE_CREDIT: usize = 1;

/// How long [`CompletionPolicy::InboundTerminates`] keeps delivering replies
/// after the inbound stream completes.
pub const DEFAULT_COMPLETION_GRACE: Duration = Duration::from_millis(500);

/// What ends the returned sequence of a bidirectional call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// The two directions finish independently. The returned sequence ends
    /// only when the peer completes (or fails) its own stream.
    #[default]
    Independent,
    /// Finishing the inbound stream also ends the returned sequence, even if
    /// the peer could still send more. Replies that arrive within the
    /// completion grace period after inbound completes are still delivered;
    /// the sequence then ends without an error.
    InboundTerminates,
}

/// Settings applied to every bridge call.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Peer host name or IP.
    pub host: String,
    /// Peer port.
    pub port: u16,
    /// Upper bound on establishing a connection.
    #[serde(with = "opt_millis")]
    pub connect_timeout: Option<Duration>,
    /// Deadline for unary and client-streaming calls. `None` waits forever.
    #[serde(with = "opt_millis")]
    pub timeout: Option<Duration>,
    /// Messages a bidirectional call may have handed to the transport but
    /// not yet seen it take.
    pub send_credit: usize,
    /// Replies pulled from the transport but not yet consumed by the caller.
    pub receive_credit: usize,
    pub completion_policy: CompletionPolicy,
    /// Reply window kept open after inbound completes under
    /// [`CompletionPolicy::InboundTerminates`].
    #[serde(with = "millis")]
    pub completion_grace: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            connect_timeout: None,
            timeout: None,
            send_credit: DEFAULT_SEND_CREDIT,
            receive_credit: DEFAULT_RECEIVE_CREDIT,
            completion_policy: CompletionPolicy::default(),
            completion_grace: DEFAULT_COMPLETION_GRACE,
        }
    }
}

impl BridgeConfig {
    /// The plaintext endpoint URI for this configuration.
    pub fn uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub(crate) fn send_credit(&self) -> usize {
        self.send_credit.max(1)
    }

    pub(crate) fn receive_credit(&self) -> usize {
        self.receive_credit.max(1)
    }
}

/// Durations are written as integer milliseconds in configuration files.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
