//! Transports.

use std::io::{self, Read};
use std::time::Duration;

use http::StatusCode;
use tracing::trace;

use crate::error::PlumeError;
use crate::response::{Request, Response};

/// Per-call transport options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub follow_redirects: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            follow_redirects: true,
        }
    }
}

/// Executes requests. Implementations block the calling thread.
///
/// Non-success statuses are responses, not errors; only failing to obtain a
/// response at all is an error.
pub trait Client: Send + Sync {
    fn execute(&self, request: &Request, options: &Options) -> Result<Response, PlumeError>;
}

/// Blocking transport backed by a `ureq` agent.
///
/// Connect and read timeouts are fixed when the agent is built and there is no
/// total deadline. The per-call `Options` are ignored; [`Builder`](crate::Builder)
/// builds the default client from the same options it hands to handlers.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new(options: &Options) -> Self {
        let redirects = if options.follow_redirects { 5 } else { 0 };
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(options.connect_timeout)
            .timeout_read(options.read_timeout)
            .redirects(redirects)
            .build();
        Self { agent }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

impl Client for UreqClient {
    fn execute(&self, request: &Request, _options: &Options) -> Result<Response, PlumeError> {
        let mut call = self
            .agent
            .request_url(request.method.as_str(), &request.url);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let result = match &request.body {
            Some(body) => call.send_bytes(body),
            None => call.call(),
        };
        let response = match result {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(err)) => return Err(PlumeError::Io(io::Error::other(err))),
        };

        let status = StatusCode::from_u16(response.status()).map_err(|e| {
            PlumeError::Io(io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        let reason = response.status_text().to_string();
        let mut headers = Vec::new();
        for name in response.headers_names() {
            for value in response.all(&name) {
                headers.push((name.clone(), value.to_string()));
            }
        }
        let mut body = Vec::new();
        response.into_reader().read_to_end(&mut body)?;
        trace!(url = %request.url, %status, len = body.len(), "response received");

        Ok(Response::new(status, headers, body).with_reason(reason))
    }
}
