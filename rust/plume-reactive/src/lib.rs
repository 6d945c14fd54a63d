//! plume-reactive - reactive return types for plume clients
//!
//! Interface methods declared with this crate's containers are performed
//! asynchronously:
//!
//! - [`Mono<T>`] and [`Publisher<T>`]: the request is sent when the result is
//!   awaited or polled, once per call.
//! - [`Flux<T>`]: as `Mono`, delivered as a one-element stream; a decoded
//!   collection is not split into elements.
//! - [`Promise<T>`]: the request starts immediately in the background.
//!
//! Any other return type is performed synchronously, exactly as a client built
//! with [`plume_core::Builder`] would. Failures are delivered through the
//! container unchanged.
//!
//! The transport underneath is blocking. Deferred containers run it on the
//! task that polls them, so inside a tokio runtime await a `Mono` through
//! [`Mono::subscribe_on_blocking`].
//!
//! Build clients with [`ReactiveBuilder`]; its [`ReactiveContract`] makes
//! decoders produce the payload type `T` and its [`ReactiveInvocationHandler`]
//! picks the container at call time.

#![deny(unsafe_code)]

mod builder;
mod classify;
mod contract;
mod flux;
mod handler;
mod mono;
mod promise;
mod publisher;

pub use builder::ReactiveBuilder;
pub use classify::{ReturnClass, WrapperKind, classify};
pub use contract::ReactiveContract;
pub use flux::Flux;
pub use handler::ReactiveInvocationHandler;
pub use mono::Mono;
pub use promise::Promise;
pub use publisher::Publisher;
