//! Per-method handlers and the synchronous call pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use http::StatusCode;
use serde_json::Value;
use tracing::trace;

use crate::client::{Client, Options};
use crate::codec::{Decoder, Encoder, ErrorDecoder};
use crate::contract::MethodMetadata;
use crate::decl::Args;
use crate::error::PlumeError;
use crate::interceptor::RequestInterceptor;
use crate::logger::{LogLevel, Logger};
use crate::response::Response;
use crate::retry::Retryer;
use crate::target::Target;
use crate::template::RequestTemplate;
use crate::types::Payload;

/// Performs one interface method.
pub trait MethodHandler: Send + Sync {
    fn invoke(&self, args: Args) -> Result<Payload, PlumeError>;
}

/// Method name to handler, built once per client instance.
pub type DispatchTable = HashMap<&'static str, Arc<dyn MethodHandler>>;

/// Everything a synchronous handler needs besides its own metadata.
///
/// Shared by all handlers of one client instance.
#[derive(Clone)]
pub struct HandlerSettings {
    pub client: Arc<dyn Client>,
    pub retryer: Arc<dyn Retryer>,
    pub logger: Arc<dyn Logger>,
    pub log_level: LogLevel,
    pub encoder: Arc<dyn Encoder>,
    pub decoder: Arc<dyn Decoder>,
    pub error_decoder: Arc<dyn ErrorDecoder>,
    pub interceptors: Arc<[Arc<dyn RequestInterceptor>]>,
    pub options: Options,
    pub decode404: bool,
}

/// Builds, sends and decodes the request of one method on the calling thread.
pub struct SynchronousMethodHandler {
    metadata: MethodMetadata,
    target: Arc<dyn Target>,
    settings: HandlerSettings,
}

impl SynchronousMethodHandler {
    pub fn new(
        metadata: MethodMetadata,
        target: Arc<dyn Target>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            metadata,
            target,
            settings,
        }
    }

    pub fn metadata(&self) -> &MethodMetadata {
        &self.metadata
    }

    fn build_template(&self, args: &Args) -> Result<RequestTemplate, PlumeError> {
        let values = args.values()?;
        if values.len() != self.metadata.param_count() {
            return Err(PlumeError::Encode(format!(
                "{} takes {} arguments but {} were given",
                self.metadata.config_key(),
                self.metadata.param_count(),
                values.len()
            )));
        }

        let mut vars: HashMap<&str, String> = HashMap::new();
        for (&index, &name) in self.metadata.index_to_name() {
            match &values[index] {
                Value::Null => {}
                Value::String(s) => {
                    vars.insert(name, s.clone());
                }
                other => {
                    vars.insert(name, other.to_string());
                }
            }
        }

        let mut template = self.metadata.template().resolve(&vars);
        if let Some(index) = self.metadata.body_index() {
            let body = &values[index];
            self.settings.encoder.encode(body, &mut template)?;
        }
        Ok(template)
    }

    fn execute_and_decode(&self, template: &RequestTemplate) -> Result<Payload, PlumeError> {
        let key = self.metadata.config_key();
        let settings = &self.settings;

        let mut template = template.clone();
        for interceptor in settings.interceptors.iter() {
            interceptor.apply(&mut template);
        }
        let request = self.target.apply(&template)?;
        settings
            .logger
            .log_request(key, settings.log_level, &request);

        let start = Instant::now();
        let response = match settings.client.execute(&request, &settings.options) {
            Ok(response) => response,
            Err(e) => {
                settings
                    .logger
                    .log_io_error(key, settings.log_level, &e, start.elapsed());
                return Err(PlumeError::Retryable {
                    method: key.to_string(),
                    message: format!("{e} ({} {})", request.method, request.url),
                    status: None,
                    retry_after: None,
                });
            }
        };
        settings
            .logger
            .log_response(key, settings.log_level, &response, start.elapsed());
        trace!(config_key = key, status = %response.status(), "response received");

        self.decode(response)
    }

    fn decode(&self, response: Response) -> Result<Payload, PlumeError> {
        let key = self.metadata.config_key();
        let status = response.status();
        if status.is_success() || (status == StatusCode::NOT_FOUND && self.settings.decode404) {
            self.settings
                .decoder
                .decode(response, self.metadata.return_type())
                .map_err(|e| e.in_method(key))
        } else {
            Err(self.settings.error_decoder.decode(key, response))
        }
    }
}

impl MethodHandler for SynchronousMethodHandler {
    fn invoke(&self, args: Args) -> Result<Payload, PlumeError> {
        let template = self.build_template(&args)?;
        let mut retryer = self.settings.retryer.clone_box();
        loop {
            match self.execute_and_decode(&template) {
                Err(e) if e.is_retryable() => {
                    retryer.continue_or_propagate(e)?;
                    self.settings
                        .logger
                        .log_retry(self.metadata.config_key(), self.settings.log_level);
                }
                other => return other,
            }
        }
    }
}
