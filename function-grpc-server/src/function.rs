//! Functions the server can route calls to.
//!
//! A [`Function`] is a boxed async callable over [`Message`]s in one of four
//! shapes. Construct one with the shape-specific constructors, or with the
//! string helpers in [`crate::text`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;

use function_grpc_core::Message;

use crate::error::FunctionError;

/// Boxed future resolving to a single reply.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, FunctionError>> + Send + 'static>>;

/// Boxed stream of messages, used both for inbound streams handed to a
/// function and for the replies it produces.
pub type FunctionStream = Pin<Box<dyn Stream<Item = Result<Message, FunctionError>> + Send + 'static>>;

/// Boxed callable for single-in/single-out functions.
pub type UnaryCall = Arc<dyn Fn(Message) -> BoxFuture<Message> + Send + Sync>;

/// Boxed callable for stream-in/single-out functions.
pub type ClientStreamCall = Arc<dyn Fn(FunctionStream) -> BoxFuture<Message> + Send + Sync>;

/// Boxed callable for single-in/stream-out functions.
pub type ServerStreamCall = Arc<dyn Fn(Message) -> FunctionStream + Send + Sync>;

/// Boxed callable for stream-in/stream-out functions.
pub type BiStreamCall = Arc<dyn Fn(FunctionStream) -> FunctionStream + Send + Sync>;

/// The interaction shape a function was written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionShape {
    Unary,
    ClientStream,
    ServerStream,
    BiStream,
}

impl fmt::Display for FunctionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FunctionShape::Unary => "single-in/single-out",
            FunctionShape::ClientStream => "stream-in/single-out",
            FunctionShape::ServerStream => "single-in/stream-out",
            FunctionShape::BiStream => "stream-in/stream-out",
        })
    }
}

/// A routable function.
///
/// Cloning is cheap; the callable is reference counted.
#[derive(Clone)]
pub enum Function {
    Unary(UnaryCall),
    ClientStream(ClientStreamCall),
    ServerStream(ServerStreamCall),
    BiStream(BiStreamCall),
}

impl Function {
    /// Wrap an async `Message -> Message` function.
    pub fn unary<F, Fut>(f: F) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Message, FunctionError>> + Send + 'static,
    {
        Function::Unary(Arc::new(move |message| Box::pin(f(message))))
    }

    /// Wrap an async function that folds an inbound stream into one reply.
    pub fn client_stream<F, Fut>(f: F) -> Self
    where
        F: Fn(FunctionStream) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Message, FunctionError>> + Send + 'static,
    {
        Function::ClientStream(Arc::new(move |inbound| Box::pin(f(inbound))))
    }

    /// Wrap a function that expands one request into a reply stream.
    pub fn server_stream<F, S>(f: F) -> Self
    where
        F: Fn(Message) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<Message, FunctionError>> + Send + 'static,
    {
        Function::ServerStream(Arc::new(move |message| Box::pin(f(message))))
    }

    /// Wrap a function that maps an inbound stream to a reply stream.
    pub fn bi_stream<F, S>(f: F) -> Self
    where
        F: Fn(FunctionStream) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<Message, FunctionError>> + Send + 'static,
    {
        Function::BiStream(Arc::new(move |inbound| Box::pin(f(inbound))))
    }

    pub fn shape(&self) -> FunctionShape {
        match self {
            Function::Unary(_) => FunctionShape::Unary,
            Function::ClientStream(_) => FunctionShape::ClientStream,
            Function::ServerStream(_) => FunctionShape::ServerStream,
            Function::BiStream(_) => FunctionShape::BiStream,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.shape()).finish()
    }
}
