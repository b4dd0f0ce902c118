//! Calls a function server through each of the four bridges.
//!
//! Run with: cargo run --bin bridge-client
//! (start `function-server` first). Connects to `FUNCTION_GRPC_HOST`
//! (default `localhost`) on `FUNCTION_GRPC_PORT` (default 6048).

use std::time::Duration;

use futures::{StreamExt, TryStreamExt, stream};

use function_grpc_client::{BridgeConfig, ClientBuilder, Message};
use function_grpc_examples::port_from_env;

fn routed(payload: &str, definition: &str) -> Message {
    Message::new(payload.to_string()).with_header("spring.cloud.function.definition", definition)
}

fn show(message: &Message) -> String {
    String::from_utf8_lossy(message.payload()).into_owned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut config = BridgeConfig::default();
    if let Ok(host) = std::env::var("FUNCTION_GRPC_HOST") {
        config.host = host;
    }
    if let Some(port) = port_from_env()? {
        config.port = port;
    }
    let client = ClientBuilder::from_config(config)
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30))
        .build();

    println!("=== Bridge client -> {} ===", client.config().uri());

    // Unary
    let reply = client
        .request_reply(Message::new("\"hello gRPC\"").with_header("foo", "bar"))
        .await?;
    println!("requestReply (default): {}", show(&reply));

    let reply = client.request_reply(routed("\"hello gRPC\"", "reverse")).await?;
    println!("requestReply (reverse): {}", show(&reply));

    // Client streaming
    let inbound = stream::iter(vec![
        routed("\"Ricky\"", "stringify"),
        Message::new("\"Julien\""),
        Message::new("\"Bubbles\""),
    ]);
    let reply = client.client_stream(inbound).await?;
    println!("clientStream: {}", show(&reply));

    // Server streaming
    let mut replies = client.server_stream(routed("\"Ricky\"", "split")).await?;
    while let Some(reply) = replies.next().await {
        println!("serverStream: {}", show(&reply?));
    }

    // Bidirectional streaming
    let inbound = stream::iter(vec![
        routed("\"Ricky\"", "uppercaseFlux"),
        Message::new("\"Julien\""),
        Message::new("\"Bubbles\""),
    ]);
    let replies: Vec<Message> = client.bi_stream(inbound).await?.try_collect().await?;
    for reply in &replies {
        println!("biStream: {}", show(reply));
    }

    Ok(())
}
