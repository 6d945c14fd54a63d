//! Client configuration.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::client::{Client, Options, UreqClient};
use crate::codec::{
    Decoder, DefaultDecoder, DefaultEncoder, DefaultErrorDecoder, Encoder, ErrorDecoder,
};
use crate::contract::{Contract, DefaultContract};
use crate::decl::Api;
use crate::error::PlumeError;
use crate::handler::{DispatchTable, HandlerSettings, MethodHandler, SynchronousMethodHandler};
use crate::interceptor::RequestInterceptor;
use crate::logger::{LogLevel, Logger, NoOpLogger};
use crate::proxy::{DefaultInvocationHandler, InvocationHandlerFactory, Proxy};
use crate::retry::{DefaultRetryer, Retryer};
use crate::target::{HardCodedTarget, Target};

/// Configures and builds clients.
///
/// ```ignore
/// let api: GitHub = Builder::new()
///     .decoder(JsonDecoder)
///     .retryer(NeverRetry)
///     .target("https://api.github.com")?;
/// ```
pub struct Builder {
    log_level: LogLevel,
    contract: Arc<dyn Contract>,
    client: Option<Arc<dyn Client>>,
    retryer: Arc<dyn Retryer>,
    logger: Arc<dyn Logger>,
    encoder: Arc<dyn Encoder>,
    decoder: Arc<dyn Decoder>,
    error_decoder: Arc<dyn ErrorDecoder>,
    options: Options,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
    decode404: bool,
    factory: Arc<dyn InvocationHandlerFactory>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            log_level: LogLevel::None,
            contract: Arc::new(DefaultContract),
            client: None,
            retryer: Arc::new(DefaultRetryer::default()),
            logger: Arc::new(NoOpLogger),
            encoder: Arc::new(DefaultEncoder),
            decoder: Arc::new(DefaultDecoder),
            error_decoder: Arc::new(DefaultErrorDecoder),
            options: Options::default(),
            interceptors: Vec::new(),
            decode404: false,
            factory: Arc::new(DefaultInvocationHandler::factory()),
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn contract(mut self, contract: impl Contract + 'static) -> Self {
        self.contract = Arc::new(contract);
        self
    }

    /// Defaults to a [`UreqClient`] built from the configured [`Options`].
    pub fn client(mut self, client: impl Client + 'static) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// The prototype retryer; each invocation gets a fresh copy.
    pub fn retryer(mut self, retryer: impl Retryer + 'static) -> Self {
        self.retryer = Arc::new(retryer);
        self
    }

    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    pub fn encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    pub fn decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Decode 404 responses with the decoder instead of failing.
    pub fn decode404(mut self) -> Self {
        self.decode404 = true;
        self
    }

    pub fn error_decoder(mut self, error_decoder: impl ErrorDecoder + 'static) -> Self {
        self.error_decoder = Arc::new(error_decoder);
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Replace all interceptors.
    pub fn request_interceptors(
        mut self,
        interceptors: impl IntoIterator<Item = Arc<dyn RequestInterceptor>>,
    ) -> Self {
        self.interceptors = interceptors.into_iter().collect();
        self
    }

    pub fn invocation_handler_factory(
        mut self,
        factory: impl InvocationHandlerFactory + 'static,
    ) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    pub fn build(self) -> Plume {
        let client = self
            .client
            .unwrap_or_else(|| Arc::new(UreqClient::new(&self.options)) as Arc<dyn Client>);
        Plume {
            contract: self.contract,
            factory: self.factory,
            settings: HandlerSettings {
                client,
                retryer: self.retryer,
                logger: self.logger,
                log_level: self.log_level,
                encoder: self.encoder,
                decoder: self.decoder,
                error_decoder: self.error_decoder,
                interceptors: self.interceptors.into(),
                options: self.options,
                decode404: self.decode404,
            },
        }
    }

    /// Build and create a client of `A` against `url`.
    pub fn target<A: Api>(self, url: impl Into<String>) -> Result<A, PlumeError> {
        let target = HardCodedTarget::new(A::declare().name, url);
        self.build().new_instance(Arc::new(target))
    }

    pub fn target_with<A: Api>(self, target: Arc<dyn Target>) -> Result<A, PlumeError> {
        self.build().new_instance(target)
    }
}

/// A built configuration that creates client instances.
#[derive(Clone)]
pub struct Plume {
    contract: Arc<dyn Contract>,
    factory: Arc<dyn InvocationHandlerFactory>,
    settings: HandlerSettings,
}

impl Plume {
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Create a client of `A` that sends its requests to `target`.
    pub fn new_instance<A: Api>(&self, target: Arc<dyn Target>) -> Result<A, PlumeError> {
        let decl = A::declare();
        if target.api() != decl.name {
            return Err(PlumeError::Config(format!(
                "target {target} serves {}, not {}",
                target.api(),
                decl.name
            )));
        }

        let mut dispatch = DispatchTable::new();
        for metadata in self.contract.parse_and_validate(&decl)? {
            let handler =
                SynchronousMethodHandler::new(metadata, target.clone(), self.settings.clone());
            let name = handler.metadata().method_name();
            dispatch.insert(name, Arc::new(handler) as Arc<dyn MethodHandler>);
        }

        let methods: HashMap<_, _> = decl
            .methods
            .into_iter()
            .map(|method| (method.name, method))
            .collect();
        debug!(api = decl.name, target = %target, methods = methods.len(), "new client instance");

        let handler = self.factory.create(target, Arc::new(dispatch));
        Ok(A::from_proxy(Proxy::new(decl.name, Arc::new(methods), handler)))
    }
}
