//! Named functions and per-call routing.

use std::collections::HashMap;

use function_grpc_core::{DEFAULT_ROUTING_HEADER, Message};

use crate::error::FunctionError;
use crate::function::Function;

/// Registry of functions a server can route calls to.
///
/// A call is routed by the routing header of its first message. When that
/// header is absent, the default definition is used.
///
/// # Example
///
/// ```ignore
/// use function_grpc_server::{FunctionCatalog, text};
///
/// let catalog = FunctionCatalog::new()
///     .register("uppercase", text::unary(|s| s.to_uppercase()))
///     .register("reverse", text::unary(|s| s.chars().rev().collect()))
///     .with_default("uppercase");
/// ```
#[derive(Clone, Debug)]
pub struct FunctionCatalog {
    functions: HashMap<String, Function>,
    default: Option<String>,
    routing_header: String,
}

impl Default for FunctionCatalog {
    fn default() -> Self {
        Self {
            functions: HashMap::new(),
            default: None,
            routing_header: DEFAULT_ROUTING_HEADER.to_string(),
        }
    }
}

impl FunctionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `name`, replacing any previous entry.
    pub fn register<S: Into<String>>(mut self, name: S, function: Function) -> Self {
        self.functions.insert(name.into(), function);
        self
    }

    /// Set the definition used when a call carries no routing header.
    pub fn with_default<S: Into<String>>(mut self, name: S) -> Self {
        self.default = Some(name.into());
        self
    }

    /// Change the header key that selects a function.
    pub fn with_routing_header<S: Into<String>>(mut self, key: S) -> Self {
        self.routing_header = key.into();
        self
    }

    pub fn default_definition(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn routing_header(&self) -> &str {
        &self.routing_header
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Pick the function for a call whose first message is `first`.
    ///
    /// `None` means the call has no messages at all, which routes to the
    /// default. Returns the resolved name alongside the function.
    pub fn resolve(&self, first: Option<&Message>) -> Result<(String, Function), FunctionError> {
        let name = first
            .and_then(|message| message.headers().get_string(&self.routing_header))
            .or_else(|| self.default.clone())
            .ok_or_else(|| FunctionError::NotFound("<none>".to_string()))?;

        match self.functions.get(&name) {
            Some(function) => Ok((name, function.clone())),
            None => Err(FunctionError::NotFound(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionShape;
    use crate::text;

    fn catalog() -> FunctionCatalog {
        FunctionCatalog::new()
            .register("uppercase", text::unary(|s| s.to_uppercase()))
            .register("reverse", text::unary(|s| s.chars().rev().collect()))
            .register("collect", text::client_stream(|v: Vec<String>| v.join(",")))
            .with_default("uppercase")
    }

    #[test]
    fn test_default_definition() {
        let catalog = catalog();
        let (name, function) = catalog.resolve(Some(&Message::new("x"))).unwrap();
        assert_eq!(name, "uppercase");
        assert_eq!(function.shape(), FunctionShape::Unary);
    }

    #[test]
    fn test_routing_header_overrides_default() {
        let message = Message::new("x").with_header("spring.cloud.function.definition", "reverse");
        let (name, _) = catalog().resolve(Some(&message)).unwrap();
        assert_eq!(name, "reverse");
    }

    #[test]
    fn test_empty_call_uses_default() {
        let (name, _) = catalog().resolve(None).unwrap();
        assert_eq!(name, "uppercase");
    }

    #[test]
    fn test_custom_routing_header() {
        let catalog = catalog().with_routing_header("route");
        let ignored = Message::new("x").with_header("spring.cloud.function.definition", "reverse");
        assert_eq!(catalog.resolve(Some(&ignored)).unwrap().0, "uppercase");

        let routed = Message::new("x").with_header("route", "collect");
        let (_, function) = catalog.resolve(Some(&routed)).unwrap();
        assert_eq!(function.shape(), FunctionShape::ClientStream);
    }

    #[test]
    fn test_unknown_and_missing_definitions() {
        let message = Message::new("x").with_header("spring.cloud.function.definition", "nope");
        let err = catalog().resolve(Some(&message)).unwrap_err();
        assert!(matches!(err, FunctionError::NotFound(ref name) if name == "nope"));

        let no_default = FunctionCatalog::new().register("reverse", text::unary(|s| s));
        assert!(matches!(
            no_default.resolve(None),
            Err(FunctionError::NotFound(_))
        ));
        assert_eq!(no_default.len(), 1);
        assert_eq!(no_default.names().collect::<Vec<_>>(), vec!["reverse"]);
    }
}
