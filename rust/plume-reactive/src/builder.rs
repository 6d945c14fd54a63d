//! Builder for clients with reactive return types.

use std::sync::Arc;

use plume_core::{
    Api, Builder, Client, Contract, Decoder, DefaultContract, Encoder, ErrorDecoder,
    HardCodedTarget, InvocationHandlerFactory, LogLevel, Logger, Options, Plume, PlumeError,
    RequestInterceptor, Retryer, Target,
};

use crate::contract::ReactiveContract;
use crate::handler::ReactiveInvocationHandler;

/// Configures clients whose methods may return [`Mono`](crate::Mono),
/// [`Flux`](crate::Flux), [`Publisher`](crate::Publisher) or
/// [`Promise`](crate::Promise).
///
/// Every option behaves as on [`Builder`]. The configured contract is wrapped
/// so decoders see payload types, and the invocation handler is fixed.
///
/// ```ignore
/// let api: Repos = ReactiveBuilder::new()
///     .decoder(JsonDecoder)
///     .target(server_url)?;
/// let contributors = api.contributors("rust-lang", "rust").await?;
/// ```
pub struct ReactiveBuilder {
    base: Builder,
    contract: Arc<dyn Contract>,
}

impl Default for ReactiveBuilder {
    fn default() -> Self {
        Self {
            base: Builder::new(),
            contract: Arc::new(DefaultContract),
        }
    }
}

impl ReactiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_base(mut self, f: impl FnOnce(Builder) -> Builder) -> Self {
        self.base = f(self.base);
        self
    }

    pub fn log_level(self, level: LogLevel) -> Self {
        self.with_base(|b| b.log_level(level))
    }

    /// The contract to parse declarations with; wrapped when the client is built.
    pub fn contract(mut self, contract: impl Contract + 'static) -> Self {
        self.contract = Arc::new(contract);
        self
    }

    pub fn client(self, client: impl Client + 'static) -> Self {
        self.with_base(|b| b.client(client))
    }

    pub fn retryer(self, retryer: impl Retryer + 'static) -> Self {
        self.with_base(|b| b.retryer(retryer))
    }

    pub fn logger(self, logger: impl Logger + 'static) -> Self {
        self.with_base(|b| b.logger(logger))
    }

    pub fn encoder(self, encoder: impl Encoder + 'static) -> Self {
        self.with_base(|b| b.encoder(encoder))
    }

    pub fn decoder(self, decoder: impl Decoder + 'static) -> Self {
        self.with_base(|b| b.decoder(decoder))
    }

    pub fn decode404(self) -> Self {
        self.with_base(Builder::decode404)
    }

    pub fn error_decoder(self, error_decoder: impl ErrorDecoder + 'static) -> Self {
        self.with_base(|b| b.error_decoder(error_decoder))
    }

    pub fn options(self, options: Options) -> Self {
        self.with_base(|b| b.options(options))
    }

    pub fn request_interceptor(self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.with_base(|b| b.request_interceptor(interceptor))
    }

    pub fn request_interceptors(
        self,
        interceptors: impl IntoIterator<Item = Arc<dyn RequestInterceptor>>,
    ) -> Self {
        self.with_base(|b| b.request_interceptors(interceptors))
    }

    /// Always fails: reactive clients dispatch through their own handler.
    pub fn invocation_handler_factory(
        self,
        _factory: impl InvocationHandlerFactory + 'static,
    ) -> Result<Self, PlumeError> {
        Err(PlumeError::UnsupportedOperation("invocation_handler_factory"))
    }

    pub fn build(self) -> Plume {
        self.base
            .contract(ReactiveContract::wrapping(self.contract))
            .invocation_handler_factory(ReactiveInvocationHandler::factory())
            .build()
    }

    /// Build and create a client of `A` against `url`.
    pub fn target<A: Api>(self, url: impl Into<String>) -> Result<A, PlumeError> {
        let target = Arc::new(HardCodedTarget::new(A::declare().name, url));
        self.build().new_instance(target)
    }

    pub fn target_with<A: Api>(self, target: Arc<dyn Target>) -> Result<A, PlumeError> {
        self.build().new_instance(target)
    }
}
