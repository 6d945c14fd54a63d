//! Return-type rewriting in front of another contract.

use std::sync::Arc;

use plume_core::{ApiDecl, Contract, MethodMetadata, PlumeError};
use tracing::trace;

use crate::classify::{ReturnClass, classify};

/// Wraps a contract so that decoders are asked for the payload of a wrapper
/// return type instead of the wrapper itself.
///
/// `Mono<T>`, `Flux<T>`, `Publisher<T>` and `Promise<T>` become `T`. Each
/// method is rewritten at most once: `Mono<Mono<T>>` becomes `Mono<T>`.
/// Everything else, including unparameterized wrappers, is left as the
/// delegate parsed it.
#[derive(Clone)]
pub struct ReactiveContract {
    delegate: Arc<dyn Contract>,
}

impl ReactiveContract {
    pub fn new(delegate: impl Contract + 'static) -> Self {
        Self::wrapping(Arc::new(delegate))
    }

    pub fn wrapping(delegate: Arc<dyn Contract>) -> Self {
        Self { delegate }
    }
}

impl Contract for ReactiveContract {
    fn parse_and_validate(&self, api: &ApiDecl) -> Result<Vec<MethodMetadata>, PlumeError> {
        let mut parsed = self.delegate.parse_and_validate(api)?;
        for metadata in &mut parsed {
            let payload = match classify(metadata.return_type()) {
                ReturnClass::Wrapped { payload, .. } => payload.clone(),
                ReturnClass::Plain => continue,
            };
            trace!(
                config_key = metadata.config_key(),
                declared = %metadata.return_type(),
                decoded = %payload,
                "unwrapping reactive return type"
            );
            metadata.set_return_type(payload);
        }
        Ok(parsed)
    }
}
