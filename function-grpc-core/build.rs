//! Generates the tonic client and server stubs for `MessagingService`.
//!
//! The service is declared manually so the build does not need `protoc`. The
//! message type is the hand-written, prost-derived `WireMessage`; the schema
//! it mirrors lives in `proto/messaging.proto` at the workspace root.

use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic_prost::ProstCodec";
const MESSAGE: &str = "crate::WireMessage";

fn method(name: &str, route: &str) -> tonic_build::manual::MethodBuilder {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(MESSAGE)
        .output_type(MESSAGE)
        .codec_path(CODEC)
}

fn main() {
    let service = Service::builder()
        .name("MessagingService")
        .package("org.springframework.cloud.function.grpc")
        .method(method("request_reply", "requestReply").build())
        .method(method("client_stream", "clientStream").client_streaming().build())
        .method(method("server_stream", "serverStream").server_streaming().build())
        .method(
            method("bi_stream", "biStream")
                .client_streaming()
                .server_streaming()
                .build(),
        )
        .build();

    Builder::new().compile(&[service]);
}
