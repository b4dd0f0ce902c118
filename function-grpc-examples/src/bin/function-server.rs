//! Function server hosting the demo catalog.
//!
//! Run with: cargo run --bin function-server
//! Configure with `FUNCTION_GRPC_HOST`, `FUNCTION_GRPC_PORT` and
//! `FUNCTION_DEFINITION`.

use function_grpc_examples::{demo_catalog, server_config_from_env};
use function_grpc_server::FunctionServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = server_config_from_env()?;
    let server = FunctionServer::builder(demo_catalog()).config(config).build();

    println!("=== Function server ===");
    println!("Listening on {}", server.config().bind_address());
    println!();
    println!("Functions:");
    let mut names: Vec<&str> = server.catalog().names().collect();
    names.sort_unstable();
    for name in names {
        let function = server.catalog().get(name).map(|f| f.shape().to_string());
        println!("  - {name} ({})", function.unwrap_or_default());
    }
    println!();
    println!("Default: {}", server.catalog().default_definition().unwrap_or("<none>"));
    println!("Routing header: {}", server.catalog().routing_header());
    println!();
    println!("Try: cargo run --bin bridge-client");

    server
        .serve_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;
    Ok(())
}
