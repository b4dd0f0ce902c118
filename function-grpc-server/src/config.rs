//! Server configuration.

use serde::Deserialize;

use function_grpc_core::{DEFAULT_PORT, DEFAULT_ROUTING_HEADER};

/// Where the server listens and how it routes calls.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    pub port: u16,
    /// Function used when a call names none.
    pub definition: Option<String>,
    /// Header key that names the function for a call.
    pub routing_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            definition: None,
            routing_header: DEFAULT_ROUTING_HEADER.to_string(),
        }
    }
}

impl ServerConfig {
    /// `host:port`, ready for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:6048");
        assert_eq!(config.definition, None);
        assert_eq!(config.routing_header, "spring.cloud.function.definition");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"port": 7000, "definition": "uppercase"}"#).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 7000);
        assert_eq!(config.definition.as_deref(), Some("uppercase"));
    }
}
