//! Function server over tonic's transport.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

use function_grpc_core::pb::MessagingServiceServer;

use crate::catalog::FunctionCatalog;
use crate::config::ServerConfig;
use crate::error::ServeError;
use crate::service::FunctionService;

/// Builder for a [`FunctionServer`].
///
/// Settings from a [`ServerConfig`] are applied on top of the catalog: the
/// configured routing header always, the configured definition only when
/// set.
#[derive(Debug)]
pub struct FunctionServerBuilder {
    catalog: FunctionCatalog,
    config: ServerConfig,
}

impl FunctionServerBuilder {
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Function used when a call carries no routing header.
    pub fn definition<S: Into<String>>(mut self, name: S) -> Self {
        self.config.definition = Some(name.into());
        self
    }

    pub fn routing_header<S: Into<String>>(mut self, key: S) -> Self {
        self.config.routing_header = key.into();
        self
    }

    pub fn build(self) -> FunctionServer {
        let mut catalog = self
            .catalog
            .with_routing_header(self.config.routing_header.clone());
        if let Some(definition) = &self.config.definition {
            catalog = catalog.with_default(definition.clone());
        }
        FunctionServer {
            service: FunctionService::new(catalog),
            config: self.config,
        }
    }
}

/// Serves a [`FunctionCatalog`] as `MessagingService` over plaintext HTTP/2.
///
/// # Example
///
/// ```ignore
/// use function_grpc_server::{FunctionCatalog, FunctionServer, text};
///
/// let catalog = FunctionCatalog::new()
///     .register("uppercase", text::unary(|s| s.to_uppercase()));
///
/// FunctionServer::builder(catalog)
///     .port(6048)
///     .definition("uppercase")
///     .build()
///     .serve_with_shutdown(async { tokio::signal::ctrl_c().await.ok(); })
///     .await?;
/// ```
#[derive(Debug)]
pub struct FunctionServer {
    service: FunctionService,
    config: ServerConfig,
}

impl FunctionServer {
    pub fn builder(catalog: FunctionCatalog) -> FunctionServerBuilder {
        FunctionServerBuilder {
            catalog,
            config: ServerConfig::default(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &FunctionCatalog {
        self.service.catalog()
    }

    /// The tonic service, for mounting alongside other services.
    pub fn into_service(self) -> MessagingServiceServer<FunctionService> {
        MessagingServiceServer::new(self.service)
    }

    /// Bind the configured address and serve until the process ends.
    pub async fn serve(self) -> Result<(), ServeError> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Bind the configured address and serve until `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send,
    {
        let address = self.config.bind_address();
        let bound = TcpListener::bind(address.as_str()).await;
        let listener = bound.map_err(|source| ServeError::Bind { address, source })?;
        self.serve_with_listener(listener, signal).await
    }

    /// Serve on an already-bound listener until `signal` resolves.
    ///
    /// In-flight calls are allowed to finish once the signal fires.
    pub async fn serve_with_listener<F>(self, listener: TcpListener, signal: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send,
    {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        let catalog = self.service.catalog();
        tracing::info!(
            address = ?local,
            functions = catalog.len(),
            definition = catalog.default_definition().unwrap_or("<none>"),
            "function server listening"
        );

        Server::builder()
            .add_service(MessagingServiceServer::new(self.service))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), signal)
            .await?;

        tracing::info!(address = ?local, "function server stopped");
        Ok(())
    }
}
