//! plume - declarative HTTP clients
//!
//! Declare an interface with [`http_api!`], build it with [`builder()`], and
//! call it. A method's return type picks how the call is performed:
//!
//! | return type              | behavior                                        |
//! |--------------------------|-------------------------------------------------|
//! | `Result<T, PlumeError>`  | blocking call                                   |
//! | `Mono<T>`, `Publisher<T>`| request sent when awaited                       |
//! | `Flux<T>`                | request sent when polled, one element           |
//! | `Promise<T>`             | request started in the background immediately   |
//!
//! ```ignore
//! use plume::prelude::*;
//!
//! http_api! {
//!     #[headers("Accept: application/json")]
//!     pub struct Repos {
//!         #[request_line("GET /repos/{owner}/{repo}/contributors")]
//!         fn contributors(&self, owner: &str, repo: &str) -> Mono<Vec<String>>;
//!     }
//! }
//!
//! let repos: Repos = plume::builder().decoder(JsonDecoder).target("https://api.github.com")?;
//! let names = repos.contributors("rust-lang", "rust").subscribe_on_blocking().await?;
//! ```

#![deny(unsafe_code)]

pub use plume_core::http_api;

pub use plume_core::{
    Api, ApiDecl, Args, BasicAuthInterceptor, Builder, Client, Contract, Decoder, DefaultContract,
    DefaultDecoder, DefaultEncoder, DefaultErrorDecoder, DefaultInvocationHandler, DefaultRetryer,
    DispatchTable, Encoder, ErrorDecoder, HardCodedTarget, InvocationHandler,
    InvocationHandlerFactory, JsonDecoder, JsonEncoder, LogLevel, Logger, MethodDecl, MethodHandler,
    MethodMetadata, NeverRetry, NoOpLogger, Options, Payload, Plume, PlumeError, Proxy, Request,
    RequestInterceptor, RequestTemplate, Response, Retryer, Returns, Target, TracingLogger, TypeRef,
    UreqClient,
};

pub use plume_reactive::{
    Flux, Mono, Promise, Publisher, ReactiveBuilder, ReactiveContract, ReactiveInvocationHandler,
    ReturnClass, WrapperKind, classify,
};

/// A builder for clients that may use every return type.
pub fn builder() -> ReactiveBuilder {
    ReactiveBuilder::new()
}

pub mod prelude {
    pub use crate::http_api;
    pub use crate::{
        Flux, JsonDecoder, JsonEncoder, LogLevel, Mono, PlumeError, Promise, Publisher,
        ReactiveBuilder, TracingLogger,
    };
}
