//! Function server for function-grpc.
//!
//! Hosts a catalog of named functions behind the `MessagingService` routes
//! (`requestReply`, `clientStream`, `serverStream`, `biStream`) and routes
//! each call by the `spring.cloud.function.definition` header of its first message.
//!
//! ```ignore
//! use function_grpc_server::{FunctionCatalog, FunctionServer, text};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = FunctionCatalog::new()
//!         .register("uppercase", text::unary(|s| s.to_uppercase()))
//!         .register("reverse", text::unary(|s| s.chars().rev().collect()))
//!         .with_default("uppercase");
//!
//!     FunctionServer::builder(catalog).build().serve().await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod function;
pub mod server;
pub mod service;
pub mod text;

pub use catalog::FunctionCatalog;
pub use config::ServerConfig;
pub use error::{FunctionError, ServeError};
pub use function::{Function, FunctionShape, FunctionStream};
pub use server::{FunctionServer, FunctionServerBuilder};
pub use service::FunctionService;

pub use function_grpc_core::{HeaderValue, Message, MessageHeaders};
