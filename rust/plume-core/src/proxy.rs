//! Invocation handlers and the proxy that typed clients wrap.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::decl::{Args, MethodDecl};
use crate::error::PlumeError;
use crate::handler::DispatchTable;
use crate::target::Target;
use crate::types::{Payload, Returns};

/// Routes calls on a proxy to method handlers.
///
/// Handlers also answer the identity operations of the proxy: two proxies
/// are equal, hash alike and print alike exactly when their handlers say so.
pub trait InvocationHandler: Send + Sync + 'static {
    /// Perform `method` with `args`. The payload's concrete type is decided by
    /// the handler; the typed edge converts it through [`Returns`].
    fn invoke(&self, method: &MethodDecl, args: Args) -> Result<Payload, PlumeError>;

    fn target(&self) -> &Arc<dyn Target>;

    /// `other` is another handler; implementations should only consider
    /// handlers of their own kind.
    fn equals(&self, other: &dyn InvocationHandler) -> bool;

    fn hash_code(&self) -> u64 {
        self.target().hash_code()
    }

    fn describe(&self) -> String {
        self.target().to_string()
    }

    fn as_any(&self) -> &dyn Any;
}

/// Creates the invocation handler of each new client instance.
pub trait InvocationHandlerFactory: Send + Sync {
    fn create(
        &self,
        target: Arc<dyn Target>,
        dispatch: Arc<DispatchTable>,
    ) -> Arc<dyn InvocationHandler>;
}

impl<F> InvocationHandlerFactory for F
where
    F: Fn(Arc<dyn Target>, Arc<DispatchTable>) -> Arc<dyn InvocationHandler> + Send + Sync,
{
    fn create(
        &self,
        target: Arc<dyn Target>,
        dispatch: Arc<DispatchTable>,
    ) -> Arc<dyn InvocationHandler> {
        self(target, dispatch)
    }
}

/// Calls the method handler directly and hands its result back.
pub struct DefaultInvocationHandler {
    target: Arc<dyn Target>,
    dispatch: Arc<DispatchTable>,
}

impl DefaultInvocationHandler {
    pub fn new(target: Arc<dyn Target>, dispatch: Arc<DispatchTable>) -> Self {
        Self { target, dispatch }
    }

    pub fn factory() -> impl InvocationHandlerFactory {
        |target: Arc<dyn Target>, dispatch: Arc<DispatchTable>| -> Arc<dyn InvocationHandler> {
            Arc::new(DefaultInvocationHandler::new(target, dispatch))
        }
    }
}

impl InvocationHandler for DefaultInvocationHandler {
    fn invoke(&self, method: &MethodDecl, args: Args) -> Result<Payload, PlumeError> {
        let handler = self
            .dispatch
            .get(method.name)
            .ok_or_else(|| PlumeError::UnknownMethod {
                api: self.target.api().to_string(),
                method: method.name.to_string(),
            })?;
        handler.invoke(args)
    }

    fn target(&self) -> &Arc<dyn Target> {
        &self.target
    }

    fn equals(&self, other: &dyn InvocationHandler) -> bool {
        other
            .as_any()
            .downcast_ref::<DefaultInvocationHandler>()
            .is_some_and(|other| self.target.eq_target(other.target.as_ref()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The untyped client instance behind a generated API struct.
#[derive(Clone)]
pub struct Proxy {
    api: &'static str,
    methods: Arc<HashMap<&'static str, MethodDecl>>,
    handler: Arc<dyn InvocationHandler>,
}

impl Proxy {
    pub fn new(
        api: &'static str,
        methods: Arc<HashMap<&'static str, MethodDecl>>,
        handler: Arc<dyn InvocationHandler>,
    ) -> Self {
        Self {
            api,
            methods,
            handler,
        }
    }

    pub fn api(&self) -> &'static str {
        self.api
    }

    pub fn handler(&self) -> &Arc<dyn InvocationHandler> {
        &self.handler
    }

    pub fn target(&self) -> &Arc<dyn Target> {
        self.handler.target()
    }

    /// Invoke `method` and return the raw payload.
    pub fn invoke(&self, method: &str, args: Args) -> Result<Payload, PlumeError> {
        let decl = self
            .methods
            .get(method)
            .ok_or_else(|| PlumeError::UnknownMethod {
                api: self.api.to_string(),
                method: method.to_string(),
            })?;
        self.handler.invoke(decl, args)
    }

    /// Invoke `method` and convert the result into its declared return type.
    pub fn call<R: Returns>(&self, method: &str, args: Args) -> R {
        R::from_invocation(self.invoke(method, args))
    }

    pub fn hash_code(&self) -> u64 {
        self.handler.hash_code()
    }

    /// Equality against an arbitrary value; anything but a proxy is unequal.
    pub fn equals_any(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Proxy>()
            .is_some_and(|other| self.handler.equals(other.handler.as_ref()))
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.handler.equals(other.handler.as_ref())
    }
}

impl Eq for Proxy {}

impl Hash for Proxy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.handler.hash_code());
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.handler.describe())
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("api", &self.api)
            .field("target", &self.handler.describe())
            .finish()
    }
}
