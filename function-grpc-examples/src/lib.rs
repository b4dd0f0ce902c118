//! Shared pieces of the example binaries.

use function_grpc_server::{FunctionCatalog, ServerConfig, text};

/// Functions hosted by the example server.
///
/// | name            | shape                 |
/// |-----------------|-----------------------|
/// | `uppercase`     | single-in/single-out  |
/// | `reverse`       | single-in/single-out  |
/// | `uppercaseFlux` | stream-in/stream-out  |
/// | `stringify`     | stream-in/single-out  |
/// | `split`         | single-in/stream-out  |
pub fn demo_catalog() -> FunctionCatalog {
    FunctionCatalog::new()
        .register("uppercase", text::unary(|s| s.to_uppercase()))
        .register("reverse", text::unary(|s| s.chars().rev().collect()))
        .register("uppercaseFlux", text::bi_stream(|s| s.to_uppercase()))
        .register(
            "stringify",
            text::client_stream(|items: Vec<String>| format!("[{}]", items.join(", "))),
        )
        .register(
            "split",
            text::server_stream(|s: String| vec![s.clone(), s.to_uppercase()]),
        )
        .with_default("uppercase")
}

/// Server settings overridden by `FUNCTION_GRPC_HOST`, `FUNCTION_GRPC_PORT`
/// and `FUNCTION_DEFINITION`.
pub fn server_config_from_env() -> anyhow::Result<ServerConfig> {
    let mut config = ServerConfig::default();
    if let Ok(host) = std::env::var("FUNCTION_GRPC_HOST") {
        config.host = host;
    }
    if let Some(port) = port_from_env()? {
        config.port = port;
    }
    if let Ok(definition) = std::env::var("FUNCTION_DEFINITION") {
        config.definition = Some(definition);
    }
    Ok(config)
}

/// `FUNCTION_GRPC_PORT`, if set.
pub fn port_from_env() -> anyhow::Result<Option<u16>> {
    match std::env::var("FUNCTION_GRPC_PORT") {
        Ok(port) => Ok(Some(port.parse().map_err(|e| {
            anyhow::anyhow!("invalid FUNCTION_GRPC_PORT {port:?}: {e}")
        })?)),
        Err(_) => Ok(None),
    }
}
