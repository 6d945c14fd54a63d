//! Explicit interface declarations.
//!
//! An interface is registered as an [`ApiDecl`]: its name, the headers shared by
//! every method, and one [`MethodDecl`] per method with the method's request
//! line, headers, parameter names and declared return type. The `http_api!`
//! macro generates these declarations from method signatures.

use serde::Serialize;
use serde_json::Value;

use crate::error::PlumeError;
use crate::proxy::Proxy;
use crate::types::TypeRef;

/// Declaration of an HTTP interface.
#[derive(Debug, Clone)]
pub struct ApiDecl {
    pub name: &'static str,
    /// Header lines applied to every method, e.g. `"Accept: application/json"`.
    pub headers: Vec<&'static str>,
    pub methods: Vec<MethodDecl>,
}

impl ApiDecl {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            headers: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn header(mut self, line: &'static str) -> Self {
        self.headers.push(line);
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn find(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Declaration of a single interface method.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: &'static str,
    /// `"<METHOD> <path>[?query]"`, e.g. `"GET /users/{id}"`.
    pub request_line: &'static str,
    pub headers: Vec<&'static str>,
    /// Parameter names, in call order.
    pub params: Vec<&'static str>,
    /// The return type exactly as declared on the interface.
    pub return_type: TypeRef,
}

impl MethodDecl {
    pub fn new(name: &'static str, return_type: TypeRef) -> Self {
        Self {
            name,
            request_line: "",
            headers: Vec::new(),
            params: Vec::new(),
            return_type,
        }
    }

    pub fn request_line(mut self, line: &'static str) -> Self {
        self.request_line = line;
        self
    }

    pub fn header(mut self, line: &'static str) -> Self {
        self.headers.push(line);
        self
    }

    pub fn param(mut self, name: &'static str) -> Self {
        self.params.push(name);
        self
    }
}

/// Arguments of one call, serialized in parameter order.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<Value>,
    invalid: Option<String>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next argument.
    ///
    /// Serialization failures are kept and reported when the call is performed.
    pub fn push<T: Serialize + ?Sized>(&mut self, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => self.values.push(v),
            Err(e) => {
                let position = self.values.len();
                self.values.push(Value::Null);
                if self.invalid.is_none() {
                    self.invalid = Some(format!("argument {position}: {e}"));
                }
            }
        }
    }

    /// Builder-style [`push`](Self::push).
    pub fn with<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.push(value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The serialized values, or the first serialization failure.
    pub fn values(&self) -> Result<&[Value], PlumeError> {
        match &self.invalid {
            Some(msg) => Err(PlumeError::Encode(msg.clone())),
            None => Ok(&self.values),
        }
    }
}

/// A typed client for a declared interface.
///
/// Implemented by the structs `http_api!` generates; `from_proxy` is how the
/// builder hands the assembled proxy to the typed client.
pub trait Api: Sized + Send + Sync + 'static {
    fn declare() -> ApiDecl;

    fn from_proxy(proxy: Proxy) -> Self;

    fn proxy(&self) -> &Proxy;
}
