//! Lazy element streams.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, FutureExt};
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use plume_core::{Payload, PlumeError, Returns, TypeRef, downcast_payload};
use serde::de::DeserializeOwned;

use crate::classify::WrapperKind;
use crate::mono::{Mono, mono_from_invocation};

/// A stream of values, ending at the first error.
///
/// Like [`Mono`], a flux is lazy: the request behind a flux returned from an
/// interface method is sent when the stream is first polled. A decoded
/// collection is a single element; it is not flattened.
#[must_use = "a Flux does nothing unless polled"]
pub struct Flux<T> {
    inner: BoxStream<'static, Result<T, PlumeError>>,
}

impl<T: Send + 'static> Flux<T> {
    /// The mono's value as the only element.
    pub fn from_mono(mono: Mono<T>) -> Self {
        Self {
            inner: Box::pin(mono.into_stream()),
        }
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, PlumeError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    pub fn from_iter<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_stream(stream::iter(values.into_iter().map(Ok)))
    }

    pub fn just(value: T) -> Self {
        Self::from_mono(Mono::just(value))
    }

    pub fn empty() -> Self {
        Self::from_stream(stream::empty())
    }

    pub fn error(error: PlumeError) -> Self {
        Self::from_stream(stream::once(future::ready(Err(error))))
    }

    pub fn map<U, F>(self, f: F) -> Flux<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        Flux::from_stream(self.inner.map_ok(f))
    }

    pub fn try_map<U, F>(self, mut f: F) -> Flux<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> Result<U, PlumeError> + Send + 'static,
    {
        Flux::from_stream(self.inner.map(move |item| item.and_then(&mut f)))
    }

    /// All elements, or the first error.
    pub fn collect_list(self) -> Mono<Vec<T>> {
        Mono::from_future(self.inner.try_collect())
    }
}

impl<T> Stream for Flux<T> {
    type Item = Result<T, PlumeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> fmt::Debug for Flux<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flux<{}>", std::any::type_name::<T>())
    }
}

impl<T> Returns for Flux<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn declared_type() -> TypeRef {
        WrapperKind::Flux.of(TypeRef::of::<T>())
    }

    fn from_invocation(result: Result<Payload, PlumeError>) -> Self {
        match result {
            Ok(payload) => match payload.downcast::<Flux<Payload>>() {
                Ok(flux) => flux.try_map(downcast_payload::<T>),
                Err(payload) => Flux::from_mono(mono_from_invocation(Ok(payload))),
            },
            Err(e) => Flux::error(e),
        }
    }
}
