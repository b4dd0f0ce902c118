//! Server-side function errors.

use tonic::{Code, Status};

use crate::function::FunctionShape;

/// Why a function call failed on the server.
///
/// Converted into a [`Status`] before it reaches the wire, so the client sees
/// it as a protocol error with the message preserved.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// No function is registered under the requested name, or no name was
    /// given and there is no default.
    #[error("no function found for definition {0:?}")]
    NotFound(String),

    /// The function exists but cannot serve this interaction.
    #[error("function '{function}' is {shape} and cannot serve a {interaction} call")]
    ShapeMismatch {
        function: String,
        shape: FunctionShape,
        interaction: &'static str,
    },

    /// The function itself failed.
    #[error("{0}")]
    Failed(String),

    /// The inbound stream broke while the function was reading it.
    #[error("transport error: {}", .0.message())]
    Transport(Status),
}

impl FunctionError {
    /// Create a [`Failed`](FunctionError::Failed) error.
    pub fn failed<S: Into<String>>(message: S) -> Self {
        FunctionError::Failed(message.into())
    }

    pub fn code(&self) -> Code {
        match self {
            FunctionError::NotFound(_) => Code::NotFound,
            FunctionError::ShapeMismatch { .. } => Code::FailedPrecondition,
            FunctionError::Failed(_) => Code::Internal,
            FunctionError::Transport(status) => status.code(),
        }
    }
}

impl From<FunctionError> for Status {
    fn from(err: FunctionError) -> Self {
        match err {
            FunctionError::Transport(status) => status,
            other => Status::new(other.code(), other.to_string()),
        }
    }
}

impl From<Status> for FunctionError {
    fn from(status: Status) -> Self {
        FunctionError::Transport(status)
    }
}

/// Why a [`FunctionServer`](crate::FunctionServer) could not start or keep
/// serving.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}
