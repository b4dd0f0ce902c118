//! Core message types for function-grpc.
//!
//! This crate provides the types shared by the bridge client
//! (`function-grpc-client`) and the function server (`function-grpc-server`).
//!
//! ## Modules
//!
//! - [`message`]: the application-side [`Message`] with typed headers
//! - [`wire`]: the [`WireMessage`] exchanged over the transport
//! - [`codec`]: lossless-by-default translation between the two
//! - [`pb`]: generated tonic stubs for `MessagingService`

pub mod codec;
pub mod message;
pub mod wire;

pub use codec::{decode, encode, encode_message};
pub use message::{HeaderValue, Message, MessageHeaders};
pub use wire::WireMessage;

/// Port used by both sides when none is configured.
pub const DEFAULT_PORT: u16 = 6048;

/// Header key a message uses to name the function it should be routed to.
pub const DEFAULT_ROUTING_HEADER: &str = "spring.cloud.function.definition";

/// Generated client and server stubs for the `MessagingService`.
///
/// Associated stream types are named after the camelCase routes
/// (`serverStreamStream`, `biStreamStream`).
#[allow(non_camel_case_types)]
pub mod pb {
    include!(concat!(
        env!("OUT_DIR"),
        "/org.springframework.cloud.function.grpc.MessagingService.rs"
    ));

    pub use messaging_service_client::MessagingServiceClient;
    pub use messaging_service_server::{MessagingService, MessagingServiceServer};
}
