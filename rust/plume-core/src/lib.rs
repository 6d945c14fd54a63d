//! plume-core - synchronous declarative HTTP clients
//!
//! An interface is declared once (usually with [`http_api!`]) and turned into a
//! client by a [`Builder`]. The builder's [`Contract`] parses the declaration
//! into per-method metadata, each method gets a [`SynchronousMethodHandler`],
//! and an [`InvocationHandler`] routes calls on the generated struct to those
//! handlers.
//!
//! ```ignore
//! plume_core::http_api! {
//!     #[headers("Accept: application/json")]
//!     pub struct Repos {
//!         #[request_line("GET /repos/{owner}/{repo}/contributors")]
//!         fn contributors(&self, owner: &str, repo: &str) -> Result<Vec<String>, PlumeError>;
//!     }
//! }
//! ```

#![deny(unsafe_code)]

mod builder;
mod client;
mod codec;
mod contract;
mod decl;
mod error;
mod handler;
mod interceptor;
mod logger;
mod proxy;
mod response;
mod retry;
mod target;
mod template;
mod types;

pub use builder::{Builder, Plume};
pub use client::{Client, Options, UreqClient};
pub use codec::{
    Decoder, DefaultDecoder, DefaultEncoder, DefaultErrorDecoder, Encoder, ErrorDecoder,
    JsonDecoder, JsonEncoder,
};
pub use contract::{Contract, DefaultContract, MethodMetadata};
pub use decl::{Api, ApiDecl, Args, MethodDecl};
pub use error::PlumeError;
pub use handler::{DispatchTable, HandlerSettings, MethodHandler, SynchronousMethodHandler};
pub use interceptor::{BasicAuthInterceptor, RequestInterceptor};
pub use logger::{LogLevel, Logger, NoOpLogger, TracingLogger};
pub use proxy::{DefaultInvocationHandler, InvocationHandler, InvocationHandlerFactory, Proxy};
pub use response::{Request, Response};
pub use retry::{DefaultRetryer, NeverRetry, Retryer};
pub use target::{HardCodedTarget, Target};
pub use template::RequestTemplate;
pub use types::{Payload, Returns, TypeRef, downcast_payload};

// Re-exported for code that implements the traits above.
pub use http;
pub use serde_json;

/// Declare an HTTP interface and generate its typed client.
///
/// Every method carries a `#[request_line("METHOD /path?query")]` and may
/// carry `#[headers("Name: value", ...)]`; `#[headers(...)]` on the struct
/// applies to all methods. Parameters referenced as `{name}` in the request
/// line or headers are bound to that expression; at most one other parameter
/// becomes the request body.
///
/// The return type decides how the call is performed: see [`Returns`].
#[macro_export]
macro_rules! http_api {
    (
        $(#[doc = $doc:expr])*
        $(#[headers($($api_header:literal),* $(,)?)])?
        $vis:vis struct $api:ident {
            $(
                $(#[doc = $mdoc:expr])*
                #[request_line($line:literal)]
                $(#[headers($($header:literal),* $(,)?)])?
                fn $method:ident(&self $(, $arg:ident : $ty:ty)* $(,)?) -> $ret:ty;
            )*
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Clone, PartialEq, Eq, Hash)]
        $vis struct $api {
            proxy: $crate::Proxy,
        }

        impl $crate::Api for $api {
            fn declare() -> $crate::ApiDecl {
                $crate::ApiDecl::new(stringify!($api))
                    $($(.header($api_header))*)?
                    $(
                        .method(
                            $crate::MethodDecl::new(
                                stringify!($method),
                                <$ret as $crate::Returns>::declared_type(),
                            )
                            .request_line($line)
                            $($(.header($header))*)?
                            $(.param(stringify!($arg)))*
                        )
                    )*
            }

            fn from_proxy(proxy: $crate::Proxy) -> Self {
                Self { proxy }
            }

            fn proxy(&self) -> &$crate::Proxy {
                &self.proxy
            }
        }

        impl $api {
            $(
                $(#[doc = $mdoc])*
                pub fn $method(&self $(, $arg: $ty)*) -> $ret {
                    #[allow(unused_mut)]
                    let mut args = $crate::Args::new();
                    $(args.push(&$arg);)*
                    self.proxy.call::<$ret>(stringify!($method), args)
                }
            )*
        }

        impl ::core::fmt::Display for $api {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.proxy, f)
            }
        }

        impl ::core::fmt::Debug for $api {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_tuple(stringify!($api)).field(&self.proxy).finish()
            }
        }
    };
}
