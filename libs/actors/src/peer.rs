//! Handler Peer
//!
//! The object an actor dispatches inbound requests to. Instead of looking up
//! methods by name at runtime, handlers are registered explicitly:
//!
//! - direct handlers keyed by the exact envelope type, called with
//!   `(source, payload, done)`;
//! - an optional [`ScopeResolver`] for dotted types `scope.method`, which maps
//!   `(source, scope, payload.source)` to a [`Scope`] whose methods are called
//!   with `(payload, done)`.
//!
//! Either kind of handler may return a [`CancelHook`] that the actor fires if a
//! cancel notice for the request arrives before the handler completes.

use crate::completion::Completion;
use crate::context::ContextId;
use crate::error::RemoteError;
use codec::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Hook requesting early termination of in-flight handler work
pub struct CancelHook(Box<dyn FnOnce() + Send>);

impl CancelHook {
    pub fn new(hook: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(hook))
    }

    pub fn fire(self) {
        (self.0)()
    }
}

impl fmt::Debug for CancelHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CancelHook")
    }
}

/// Direct handler: `(source, payload, done) -> cancel hook`
pub type Handler = Arc<dyn Fn(&ContextId, Value, Completion) -> Option<CancelHook> + Send + Sync>;

/// Scope method: `(payload, done) -> cancel hook`
pub type ScopeMethod = Arc<dyn Fn(Value, Completion) -> Option<CancelHook> + Send + Sync>;

/// Addressable sub-scope exposing named methods
pub trait Scope: Send + Sync {
    fn method(&self, name: &str) -> Option<ScopeMethod>;
}

/// Maps `(source, scope name, source descriptor)` to a scope
pub trait ScopeResolver: Send + Sync {
    fn resolve(&self, source: &ContextId, scope: &str, descriptor: Option<&Value>) -> Option<Arc<dyn Scope>>;
}

impl<F> ScopeResolver for F
where
    F: Fn(&ContextId, &str, Option<&Value>) -> Option<Arc<dyn Scope>> + Send + Sync,
{
    fn resolve(&self, source: &ContextId, scope: &str, descriptor: Option<&Value>) -> Option<Arc<dyn Scope>> {
        self(source, scope, descriptor)
    }
}

/// Scope backed by a method table
#[derive(Default, Clone)]
pub struct MethodTable {
    methods: HashMap<String, ScopeMethod>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(Value, Completion) -> Option<CancelHook> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    pub fn into_scope(self) -> Arc<dyn Scope> {
        Arc::new(self)
    }
}

impl Scope for MethodTable {
    fn method(&self, name: &str) -> Option<ScopeMethod> {
        self.methods.get(name).cloned()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Outcome of resolving an envelope type against a peer
pub(crate) enum Resolution {
    Direct(Handler),
    Scoped(ScopeMethod),
    Missing(RemoteError),
}

/// Handler set an actor dispatches to
#[derive(Default, Clone)]
pub struct Peer {
    handlers: HashMap<String, Handler>,
    resolver: Option<Arc<dyn ScopeResolver>>,
}

impl Peer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a direct handler for envelopes of type `kind`
    pub fn with_handler<F>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&ContextId, Value, Completion) -> Option<CancelHook> + Send + Sync + 'static,
    {
        self.handlers.insert(kind.into(), Arc::new(handler));
        self
    }

    /// Install the resolver used for `scope.method` types
    pub fn with_scope_resolver(mut self, resolver: impl ScopeResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn has_handler(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn has_scope_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    pub(crate) fn resolve(&self, kind: &str, source: &ContextId, payload: &Value) -> Resolution {
        if let Some(handler) = self.handlers.get(kind) {
            return Resolution::Direct(Arc::clone(handler));
        }

        let Some(resolver) = &self.resolver else {
            return Resolution::Missing(RemoteError::handler_not_found(kind));
        };

        let Some((scope_name, method_name)) = kind.split_once('.') else {
            return Resolution::Missing(RemoteError::handler_not_found(kind));
        };

        let Some(scope) = resolver.resolve(source, scope_name, payload.get("source")) else {
            return Resolution::Missing(RemoteError::scope_not_found(kind, scope_name));
        };

        match scope.method(method_name) {
            Some(method) => Resolution::Scoped(method),
            None => Resolution::Missing(RemoteError::handler_not_found(kind)),
        }
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("has_scope_resolver", &self.resolver.is_some())
            .finish()
    }
}
