//! The generic publisher: a stream whose producer is not exposed.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, Stream};
use plume_core::{Payload, PlumeError, Returns, TypeRef};
use serde::de::DeserializeOwned;

use crate::classify::WrapperKind;
use crate::flux::Flux;
use crate::mono::{Mono, mono_from_invocation};

/// A single-subscription stream of values.
///
/// Methods returning a publisher behave like methods returning a [`Mono`]:
/// the request is sent on first poll and yields at most one element.
#[must_use = "a Publisher does nothing unless polled"]
pub struct Publisher<T> {
    inner: BoxStream<'static, Result<T, PlumeError>>,
}

impl<T: Send + 'static> Publisher<T> {
    pub fn from_mono(mono: Mono<T>) -> Self {
        Self::from(Flux::from_mono(mono))
    }

    /// View the publisher as a flux to use its operators.
    pub fn into_flux(self) -> Flux<T> {
        Flux::from_stream(self.inner)
    }
}

impl<T: Send + 'static> From<Flux<T>> for Publisher<T> {
    fn from(flux: Flux<T>) -> Self {
        Self {
            inner: Box::pin(flux),
        }
    }
}

impl<T: Send + 'static> From<Mono<T>> for Publisher<T> {
    fn from(mono: Mono<T>) -> Self {
        Self::from_mono(mono)
    }
}

impl<T> Stream for Publisher<T> {
    type Item = Result<T, PlumeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Publisher<{}>", std::any::type_name::<T>())
    }
}

impl<T> Returns for Publisher<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn declared_type() -> TypeRef {
        WrapperKind::Publisher.of(TypeRef::of::<T>())
    }

    fn from_invocation(result: Result<Payload, PlumeError>) -> Self {
        Publisher::from_mono(mono_from_invocation(result))
    }
}
