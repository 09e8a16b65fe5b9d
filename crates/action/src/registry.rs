use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::{Handler, HandlerKind, ParamsSchema};

/// Capability descriptor returned by [`ActionRegistry::resolve`].
///
/// Carries everything the Graph Compiler and Node Executor need without
/// forcing them to hold a trait object directly: the declared ports and
/// suspendability, plus the handler itself for dispatch.
pub struct HandlerDescriptor {
    /// Fully-qualified type, e.g. `"http.request"`.
    pub node_type: String,
    /// Trigger or action.
    pub kind: HandlerKind,
    /// Declared input ports.
    pub input_ports: Vec<String>,
    /// Declared output ports (`["*"]` permits wildcard emission).
    pub output_ports: Vec<String>,
    /// Whether the handler may suspend.
    pub suspendable: bool,
    /// Declarative parameter schema, if the handler declares one.
    pub params_schema: Option<ParamsSchema>,
    /// Declared error port, if the handler routes unrecovered errors
    /// onto an output port rather than terminating the execution.
    pub error_port: Option<String>,
    /// The handler implementing `prepare`/`execute`/`resume`.
    pub handler: Arc<dyn Handler>,
}

impl HandlerDescriptor {
    /// Build a descriptor by reading a handler's static declarations.
    #[must_use]
    pub fn from_handler(node_type: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        Self {
            node_type: node_type.into(),
            kind: handler.kind(),
            input_ports: handler.input_ports().to_vec(),
            output_ports: handler.output_ports().to_vec(),
            suspendable: handler.suspendable(),
            params_schema: handler.params_schema().cloned(),
            error_port: handler.error_port().map(ToOwned::to_owned),
            handler,
        }
    }

    /// Whether `port` is a legal output port for this handler: either
    /// declared explicitly or covered by a `"*"` wildcard declaration.
    #[must_use]
    pub fn accepts_output_port(&self, port: &str) -> bool {
        self.output_ports.iter().any(|p| p == "*" || p == port)
    }
}

impl std::fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("node_type", &self.node_type)
            .field("kind", &self.kind)
            .field("input_ports", &self.input_ports)
            .field("output_ports", &self.output_ports)
            .field("suspendable", &self.suspendable)
            .finish_non_exhaustive()
    }
}

/// Lookup of handler descriptors by fully-qualified node type.
///
/// Populated once at boot via [`register`](Self::register), then treated
/// as read-only: the Graph Compiler and Node Executor both hold a shared
/// `Arc<ActionRegistry>` and never see it mutated after initialization.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, HandlerDescriptor>,
}

impl ActionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its fully-qualified type. Overwrites any
    /// existing registration for the same type.
    pub fn register(&mut self, node_type: impl Into<String>, handler: Arc<dyn Handler>) {
        let node_type = node_type.into();
        let descriptor = HandlerDescriptor::from_handler(node_type.clone(), handler);
        self.handlers.insert(node_type, descriptor);
    }

    /// Resolve a node type to its capability descriptor.
    #[must_use]
    pub fn resolve(&self, node_type: &str) -> Option<&HandlerDescriptor> {
        self.handlers.get(node_type)
    }

    /// Whether a handler is registered for `node_type`.
    #[must_use]
    pub fn contains(&self, node_type: &str) -> bool {
        self.handlers.contains_key(node_type)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Iterate over all registered `(node_type, descriptor)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HandlerDescriptor)> {
        self.handlers.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("count", &self.handlers.len())
            .field("types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
