//! Eagerly started single values.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;

use futures::future::{self, BoxFuture, FutureExt, TryFutureExt};
use plume_core::{Payload, PlumeError, Returns, TypeRef, downcast_payload};
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tracing::{trace, warn};

use crate::classify::WrapperKind;
use crate::mono::{Mono, mono_from_invocation};

/// A value that is already being computed.
///
/// Unlike [`Mono`], the work behind a promise starts when the promise is
/// created, on the tokio blocking pool when a runtime is available and on a
/// dedicated thread otherwise. Creating one never blocks; [`get`](Promise::get)
/// and `.await` wait for the result.
pub struct Promise<T> {
    inner: BoxFuture<'static, Result<T, PlumeError>>,
}

impl<T: Send + 'static> Promise<T> {
    /// Start evaluating `mono` in the background.
    pub fn spawn(mono: Mono<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let work = move || {
            let _ = tx.send(futures::executor::block_on(mono));
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                trace!("starting promise on the blocking pool");
                drop(handle.spawn_blocking(work));
            }
            Err(_) => {
                trace!("starting promise on a dedicated thread");
                if let Err(e) = thread::Builder::new()
                    .name("plume-promise".into())
                    .spawn(work)
                {
                    warn!(error = %e, "could not start promise worker");
                }
            }
        }
        Self {
            inner: Box::pin(rx.map(|received| {
                received.unwrap_or_else(|_| Err(PlumeError::Abandoned))
            })),
        }
    }

    /// An already settled promise.
    pub fn completed(result: Result<T, PlumeError>) -> Self {
        Self {
            inner: Box::pin(future::ready(result)),
        }
    }

    /// Block the current thread until the result is available.
    ///
    /// Must not be called from an async context.
    pub fn get(self) -> Result<T, PlumeError> {
        futures::executor::block_on(self.inner)
    }

    pub fn map<U, F>(self, f: F) -> Promise<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Promise {
            inner: Box::pin(self.inner.map_ok(f)),
        }
    }

    pub fn try_map<U, F>(self, f: F) -> Promise<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U, PlumeError> + Send + 'static,
    {
        Promise {
            inner: Box::pin(self.inner.map(|result| result.and_then(f))),
        }
    }
}

impl<T> Future for Promise<T> {
    type Output = Result<T, PlumeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Promise<{}>", std::any::type_name::<T>())
    }
}

impl<T> Returns for Promise<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn declared_type() -> TypeRef {
        WrapperKind::Future.of(TypeRef::of::<T>())
    }

    fn from_invocation(result: Result<Payload, PlumeError>) -> Self {
        match result {
            Ok(payload) => match payload.downcast::<Promise<Payload>>() {
                Ok(promise) => promise.try_map(downcast_payload::<T>),
                Err(payload) => mono_from_invocation(Ok(payload)).to_future(),
            },
            Err(e) => Promise::completed(Err(e)),
        }
    }
}
