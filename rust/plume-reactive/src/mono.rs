//! Single-element deferred computations.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture, FutureExt, TryFutureExt};
use plume_core::{Payload, PlumeError, Returns, TypeRef, downcast_payload};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::classify::WrapperKind;
use crate::flux::Flux;
use crate::promise::Promise;
use crate::publisher::Publisher;

/// A computation producing one value or one error.
///
/// Nothing runs until the mono is first polled: a mono returned from an
/// interface method has not touched the network yet, and dropping it without
/// awaiting never sends the request.
///
/// The work runs on whichever task polls the mono. For an interface method
/// that is a blocking HTTP exchange, so a plain `.await` on a tokio worker
/// stalls that worker until the response arrives. Inside a runtime, await it
/// through [`subscribe_on_blocking`](Mono::subscribe_on_blocking), which moves
/// the work to the blocking pool; [`block`](Mono::block) suits synchronous
/// callers.
///
/// ```ignore
/// let name: String = api.name().subscribe_on_blocking().await?;
/// ```
#[must_use = "a Mono does nothing unless awaited"]
pub struct Mono<T> {
    inner: BoxFuture<'static, Result<T, PlumeError>>,
}

impl<T: Send + 'static> Mono<T> {
    /// Run `work` when the mono is first polled.
    pub fn defer<F>(work: F) -> Self
    where
        F: FnOnce() -> Result<T, PlumeError> + Send + 'static,
    {
        Self {
            inner: Box::pin(async move { work() }),
        }
    }

    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, PlumeError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(future),
        }
    }

    pub fn from_result(result: Result<T, PlumeError>) -> Self {
        Self::from_future(future::ready(result))
    }

    pub fn just(value: T) -> Self {
        Self::from_result(Ok(value))
    }

    pub fn error(error: PlumeError) -> Self {
        Self::from_result(Err(error))
    }

    pub fn map<U, F>(self, f: F) -> Mono<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Mono::from_future(self.inner.map_ok(f))
    }

    pub fn try_map<U, F>(self, f: F) -> Mono<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U, PlumeError> + Send + 'static,
    {
        Mono::from_future(self.inner.map(|result| result.and_then(f)))
    }

    /// Evaluate on the tokio blocking pool once awaited.
    ///
    /// Outside a tokio runtime the mono is evaluated in place.
    pub fn subscribe_on_blocking(self) -> Self {
        let inner = self.inner;
        Self::from_future(async move {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => match handle
                    .spawn_blocking(move || futures::executor::block_on(inner))
                    .await
                {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(error = %e, "blocking subscription did not complete");
                        Err(PlumeError::Abandoned)
                    }
                },
                Err(_) => inner.await,
            }
        })
    }

    /// A flux emitting this mono's value as its only element.
    pub fn into_flux(self) -> Flux<T> {
        Flux::from_mono(self)
    }

    pub fn into_publisher(self) -> Publisher<T> {
        Publisher::from_mono(self)
    }

    /// Start evaluating now and return the pending result.
    pub fn to_future(self) -> Promise<T> {
        Promise::spawn(self)
    }

    /// Evaluate on the current thread.
    ///
    /// Must not be called from an async context.
    pub fn block(self) -> Result<T, PlumeError> {
        futures::executor::block_on(self.inner)
    }
}

impl<T> Future for Mono<T> {
    type Output = Result<T, PlumeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Mono<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mono<{}>", std::any::type_name::<T>())
    }
}

/// Recover a typed mono from what an invocation handler produced.
///
/// Reactive handlers produce a `Mono<Payload>`; a plain payload (from a
/// synchronous handler) becomes an already completed mono.
pub(crate) fn mono_from_invocation<T: Send + 'static>(
    result: Result<Payload, PlumeError>,
) -> Mono<T> {
    match result {
        Err(e) => Mono::error(e),
        Ok(payload) => match payload.downcast::<Mono<Payload>>() {
            Ok(mono) => mono.try_map(downcast_payload::<T>),
            Err(payload) => Mono::from_result(downcast_payload::<T>(payload)),
        },
    }
}

impl<T> Returns for Mono<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn declared_type() -> TypeRef {
        WrapperKind::Mono.of(TypeRef::of::<T>())
    }

    fn from_invocation(result: Result<Payload, PlumeError>) -> Self {
        mono_from_invocation(result)
    }
}
