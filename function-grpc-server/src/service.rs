//! `MessagingService` implementation dispatching to a [`FunctionCatalog`].
//!
//! Every call resolves its function exactly once. Unary and server-streaming
//! calls resolve on the request; client-streaming and bidirectional calls
//! read the first inbound message before resolving, then hand it to the
//! function ahead of the rest of the stream.
//!
//! A bidirectional call is accepted before anything is read, so a caller
//! may wait for the call to open before producing its first message. Lookup
//! failures on that route therefore arrive as the reply stream's error.
//!
//! | route          | accepts                                      |
//! |----------------|----------------------------------------------|
//! | `requestReply` | `Unary`                                      |
//! | `clientStream` | `ClientStream`                               |
//! | `serverStream` | `ServerStream`                               |
//! | `biStream`     | `BiStream`, and `Unary` applied per message  |

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt, stream};
use tonic::codec::Streaming;
use tonic::{Request, Response, Status};
use tracing::Instrument;

use function_grpc_core::pb::MessagingService;
use function_grpc_core::{Message, WireMessage, decode};

use crate::catalog::FunctionCatalog;
use crate::error::FunctionError;
use crate::function::{Function, FunctionStream, UnaryCall};

/// Reply stream handed to the transport for streaming routes.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<WireMessage, Status>> + Send + 'static>>;

/// Serves the four `MessagingService` routes from a catalog.
#[derive(Clone, Debug)]
pub struct FunctionService {
    catalog: Arc<FunctionCatalog>,
}

impl FunctionService {
    pub fn new(catalog: FunctionCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &FunctionCatalog {
        &self.catalog
    }
}

fn resolve(catalog: &FunctionCatalog, first: Option<&Message>) -> Result<(String, Function), Status> {
    catalog.resolve(first).map_err(|e| {
        tracing::warn!(error = %e, "function lookup failed");
        Status::from(e)
    })
}

fn mismatch(name: String, function: &Function, interaction: &'static str) -> Status {
    let err = FunctionError::ShapeMismatch {
        function: name,
        shape: function.shape(),
        interaction,
    };
    tracing::warn!(error = %err, "rejecting call");
    err.into()
}

/// Read the first inbound message, then rebuild the full inbound sequence.
async fn peek(
    mut inbound: Streaming<WireMessage>,
) -> Result<(Option<Message>, FunctionStream), Status> {
    let first = inbound.message().await?.map(decode);
    let rest = inbound.map(|item| item.map(decode).map_err(FunctionError::from));
    let all: FunctionStream = Box::pin(stream::iter(first.clone().map(Ok)).chain(rest));
    Ok((first, all))
}

/// Apply a unary function to each inbound message in order.
///
/// The first failure, inbound or from the function, ends the stream.
fn per_message(call: UnaryCall, mut inbound: FunctionStream) -> FunctionStream {
    Box::pin(async_stream::stream! {
        while let Some(item) = inbound.next().await {
            let reply = match item {
                Ok(message) => call(message).await,
                Err(e) => Err(e),
            };
            let failed = reply.is_err();
            yield reply;
            if failed {
                break;
            }
        }
    })
}

fn into_replies(replies: FunctionStream, name: String) -> ReplyStream {
    let mut sent = 0usize;
    Box::pin(replies.map(move |item| match item {
        Ok(message) => {
            sent += 1;
            Ok(WireMessage::from(message))
        }
        Err(e) => {
            tracing::error!(function = %name, sent, error = %e, "function stream failed");
            Err(Status::from(e))
        }
    }))
}

#[tonic::async_trait]
impl MessagingService for FunctionService {
    async fn request_reply(
        &self,
        request: Request<WireMessage>,
    ) -> Result<Response<WireMessage>, Status> {
        let span = tracing::info_span!("rpc.call", rpc.type = "unary", otel.kind = "server");
        async move {
            let message = decode(request.into_inner());
            let (name, function) = resolve(&self.catalog, Some(&message))?;
            let Function::Unary(call) = &function else {
                return Err(mismatch(name, &function, "request-reply"));
            };

            tracing::debug!(function = %name, "invoking function");
            let reply = call(message).await.map_err(|e| {
                tracing::error!(function = %name, error = %e, "function failed");
                Status::from(e)
            })?;
            Ok(Response::new(reply.into()))
        }
        .instrument(span)
        .await
    }

    async fn client_stream(
        &self,
        request: Request<Streaming<WireMessage>>,
    ) -> Result<Response<WireMessage>, Status> {
        let span = tracing::info_span!("rpc.call", rpc.type = "client_stream", otel.kind = "server");
        async move {
            let (first, inbound) = peek(request.into_inner()).await?;
            let (name, function) = resolve(&self.catalog, first.as_ref())?;
            let Function::ClientStream(call) = &function else {
                return Err(mismatch(name, &function, "client-streaming"));
            };

            tracing::debug!(function = %name, "invoking function");
            let reply = call(inbound).await.map_err(|e| {
                tracing::error!(function = %name, error = %e, "function failed");
                Status::from(e)
            })?;
            Ok(Response::new(reply.into()))
        }
        .instrument(span)
        .await
    }

    type serverStreamStream = ReplyStream;

    async fn server_stream(
        &self,
        request: Request<WireMessage>,
    ) -> Result<Response<Self::serverStreamStream>, Status> {
        let span = tracing::info_span!("rpc.call", rpc.type = "server_stream", otel.kind = "server");
        async move {
            let message = decode(request.into_inner());
            let (name, function) = resolve(&self.catalog, Some(&message))?;
            let Function::ServerStream(call) = &function else {
                return Err(mismatch(name, &function, "server-streaming"));
            };

            tracing::debug!(function = %name, "invoking function");
            Ok(Response::new(into_replies(call(message), name)))
        }
        .instrument(span)
        .await
    }

    type biStreamStream = ReplyStream;

    async fn bi_stream(
        &self,
        request: Request<Streaming<WireMessage>>,
    ) -> Result<Response<Self::biStreamStream>, Status> {
        let span = tracing::info_span!("rpc.call", rpc.type = "bidi_stream", otel.kind = "server");
        span.in_scope(|| tracing::debug!("bidirectional call accepted"));
        Ok(Response::new(bidi_replies(
            self.catalog.clone(),
            request.into_inner(),
        )))
    }
}

/// Resolve and run a bidirectional call from inside its reply stream.
fn bidi_replies(catalog: Arc<FunctionCatalog>, inbound: Streaming<WireMessage>) -> ReplyStream {
    Box::pin(async_stream::stream! {
        let (first, inbound) = match peek(inbound).await {
            Ok(peeked) => peeked,
            Err(status) => {
                yield Err(status);
                return;
            }
        };
        let (name, function) = match resolve(&catalog, first.as_ref()) {
            Ok(resolved) => resolved,
            Err(status) => {
                yield Err(status);
                return;
            }
        };

        let replies = match &function {
            Function::BiStream(call) => call(inbound),
            Function::Unary(call) => per_message(call.clone(), inbound),
            Function::ClientStream(_) | Function::ServerStream(_) => {
                yield Err(mismatch(name, &function, "bidirectional"));
                return;
            }
        };

        tracing::debug!(function = %name, shape = %function.shape(), "invoking function");
        let mut replies = into_replies(replies, name);
        while let Some(item) = replies.next().await {
            yield item;
        }
    })
}
