//! Helpers for functions over text payloads.
//!
//! Payloads are read as strings: a payload that is a JSON string literal
//! (`"hello"`, quotes included) is unwrapped, anything else is read as lossy
//! UTF-8. Per-message results are written back in the form they arrived in,
//! so a JSON-quoted request gets a JSON-quoted reply. Collected results are
//! written as plain UTF-8.
//!
//! ```ignore
//! use function_grpc_server::{FunctionCatalog, text};
//!
//! let catalog = FunctionCatalog::new()
//!     .register("uppercase", text::unary(|s| s.to_uppercase()))
//!     .register("reverse", text::unary(|s| s.chars().rev().collect()));
//! ```

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};

use function_grpc_core::Message;

use crate::function::{Function, FunctionStream};

/// How a text payload was encoded on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Json,
    Plain,
}

fn read(message: &Message) -> (String, Form) {
    match serde_json::from_slice::<serde_json::Value>(message.payload()) {
        Ok(serde_json::Value::String(text)) => (text, Form::Json),
        _ => (
            String::from_utf8_lossy(message.payload()).into_owned(),
            Form::Plain,
        ),
    }
}

fn write(text: String, form: Form) -> Message {
    let payload = match form {
        Form::Json => Bytes::from(serde_json::Value::String(text).to_string()),
        Form::Plain => Bytes::from(text),
    };
    Message::new(payload)
}

fn apply<F>(f: &F, message: &Message) -> Message
where
    F: Fn(String) -> String,
{
    let (text, form) = read(message);
    write(f(text), form)
}

/// A single-in/single-out function over text.
pub fn unary<F>(f: F) -> Function
where
    F: Fn(String) -> String + Send + Sync + 'static,
{
    Function::unary(move |message: Message| {
        let reply = apply(&f, &message);
        async move { Ok(reply) }
    })
}

/// A stream-in/stream-out function applying `f` to every inbound message.
pub fn bi_stream<F>(f: F) -> Function
where
    F: Fn(String) -> String + Clone + Send + Sync + 'static,
{
    Function::bi_stream(move |inbound: FunctionStream| {
        let f = f.clone();
        inbound.map_ok(move |message| apply(&f, &message))
    })
}

/// A single-in/stream-out function emitting every string `f` yields.
pub fn server_stream<F, I>(f: F) -> Function
where
    F: Fn(String) -> I + Send + Sync + 'static,
    I: IntoIterator<Item = String>,
    I::IntoIter: Send + 'static,
{
    Function::server_stream(move |message: Message| {
        let (text, form) = read(&message);
        stream::iter(f(text)).map(move |item| Ok(write(item, form)))
    })
}

/// A stream-in/single-out function folding every inbound string into one.
pub fn client_stream<F>(f: F) -> Function
where
    F: Fn(Vec<String>) -> String + Clone + Send + Sync + 'static,
{
    Function::client_stream(move |inbound: FunctionStream| {
        let f = f.clone();
        async move {
            let texts: Vec<String> = inbound.map_ok(|message| read(&message).0).try_collect().await?;
            Ok(write(f(texts), Form::Plain))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FunctionError;

    fn inbound(payloads: &[&'static str]) -> FunctionStream {
        Box::pin(stream::iter(
            payloads
                .iter()
                .map(|p| Ok::<_, FunctionError>(Message::new(*p)))
                .collect::<Vec<_>>(),
        ))
    }

    #[test]
    fn test_read_unwraps_json_string() {
        assert_eq!(read(&Message::new("\"hello gRPC\"")), ("hello gRPC".to_string(), Form::Json));
        assert_eq!(read(&Message::new("hello")), ("hello".to_string(), Form::Plain));
        // JSON that is not a string is treated as text.
        assert_eq!(read(&Message::new("42")), ("42".to_string(), Form::Plain));
        assert_eq!(
            read(&Message::new(vec![0x66, 0xff, 0x6f])),
            ("f\u{fffd}o".to_string(), Form::Plain)
        );
    }

    #[test]
    fn test_write_preserves_form() {
        let json = write("say \"hi\"".into(), Form::Json);
        assert_eq!(json.payload().as_ref(), br#""say \"hi\"""#);
        let plain = write("hi".into(), Form::Plain);
        assert_eq!(plain.payload().as_ref(), b"hi");
    }

    #[tokio::test]
    async fn test_unary_uppercase() {
        let Function::Unary(call) = unary(|s| s.to_uppercase()) else {
            panic!("expected unary");
        };
        let reply = call(Message::new("\"hello gRPC\"")).await.unwrap();
        assert_eq!(reply.payload().as_ref(), b"\"HELLO GRPC\"");

        let reply = call(Message::new("plain")).await.unwrap();
        assert_eq!(reply.payload().as_ref(), b"PLAIN");
    }

    #[tokio::test]
    async fn test_bi_stream_maps_each_message() {
        let Function::BiStream(call) = bi_stream(|s| s.to_uppercase()) else {
            panic!("expected bidi");
        };
        let replies: Vec<Message> = call(inbound(&["\"Ricky\"", "\"Julien\""]))
            .try_collect()
            .await
            .unwrap();
        let payloads: Vec<&[u8]> = replies.iter().map(|m| m.payload().as_ref()).collect();
        assert_eq!(payloads, vec![&b"\"RICKY\""[..], &b"\"JULIEN\""[..]]);
    }

    #[tokio::test]
    async fn test_server_stream_keeps_form() {
        let Function::ServerStream(call) =
            server_stream(|s: String| vec![s.clone(), s.to_uppercase()])
        else {
            panic!("expected server stream");
        };
        let replies: Vec<Message> = call(Message::new("\"Ricky\"")).try_collect().await.unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].payload().as_ref(), b"\"Ricky\"");
        assert_eq!(replies[1].payload().as_ref(), b"\"RICKY\"");
    }

    #[tokio::test]
    async fn test_client_stream_collects_plain() {
        let Function::ClientStream(call) =
            client_stream(|names: Vec<String>| format!("[{}]", names.join(", ")))
        else {
            panic!("expected client stream");
        };
        let reply = call(inbound(&["\"Ricky\"", "\"Julien\"", "\"Bubbles\""]))
            .await
            .unwrap();
        assert_eq!(reply.payload().as_ref(), b"[Ricky, Julien, Bubbles]");
    }

    #[tokio::test]
    async fn test_client_stream_propagates_inbound_error() {
        let Function::ClientStream(call) = client_stream(|names: Vec<String>| names.join(""))
        else {
            panic!("expected client stream");
        };
        let broken: FunctionStream = Box::pin(stream::iter(vec![
            Ok(Message::new("a")),
            Err(FunctionError::failed("inbound broke")),
        ]));
        let err = call(broken).await.unwrap_err();
        assert_eq!(err.to_string(), "inbound broke");
    }
}
