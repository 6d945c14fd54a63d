//! Request/response logging.
//!
//! Separate from the crate's own `tracing` diagnostics: this is the
//! user-configured log of HTTP traffic, with verbosity picked per client.

use std::time::Duration;

use crate::error::PlumeError;
use crate::response::{Request, Response};

/// How much of each exchange to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// No logging.
    #[default]
    None,
    /// Request method and URL, response status and elapsed time.
    Basic,
    /// `Basic` plus request and response headers.
    Headers,
    /// `Headers` plus bodies.
    Full,
}

/// Sink for exchange logs. Implementors only provide [`log`](Logger::log).
pub trait Logger: Send + Sync {
    fn log(&self, config_key: &str, line: &str);

    fn log_request(&self, config_key: &str, level: LogLevel, request: &Request) {
        if level == LogLevel::None {
            return;
        }
        self.log(
            config_key,
            &format!("---> {} {} HTTP/1.1", request.method, request.url),
        );
        if level >= LogLevel::Headers {
            for (name, value) in &request.headers {
                self.log(config_key, &format!("{name}: {value}"));
            }
            let len = request.body.as_ref().map_or(0, Vec::len);
            if let (LogLevel::Full, Some(body)) = (level, &request.body) {
                self.log(config_key, "");
                self.log(config_key, &String::from_utf8_lossy(body));
            }
            self.log(config_key, &format!("---> END HTTP ({len}-byte body)"));
        }
    }

    fn log_response(
        &self,
        config_key: &str,
        level: LogLevel,
        response: &Response,
        elapsed: Duration,
    ) {
        if level == LogLevel::None {
            return;
        }
        self.log(
            config_key,
            &format!(
                "<--- HTTP/1.1 {} {} ({}ms)",
                response.status().as_u16(),
                response.reason(),
                elapsed.as_millis()
            ),
        );
        if level >= LogLevel::Headers {
            for (name, value) in response.headers() {
                self.log(config_key, &format!("{name}: {value}"));
            }
            if level == LogLevel::Full && !response.body().is_empty() {
                self.log(config_key, "");
                self.log(config_key, &String::from_utf8_lossy(response.body()));
            }
            self.log(
                config_key,
                &format!("<--- END HTTP ({}-byte body)", response.body().len()),
            );
        }
    }

    fn log_retry(&self, config_key: &str, level: LogLevel) {
        if level != LogLevel::None {
            self.log(config_key, "---> RETRYING");
        }
    }

    fn log_io_error(
        &self,
        config_key: &str,
        level: LogLevel,
        error: &PlumeError,
        elapsed: Duration,
    ) {
        if level != LogLevel::None {
            self.log(
                config_key,
                &format!("<--- ERROR {error} ({}ms)", elapsed.as_millis()),
            );
        }
    }
}

/// Emits exchange logs as `tracing` debug events under the `plume::http` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, config_key: &str, line: &str) {
        tracing::debug!(target: "plume::http", "[{config_key}] {line}");
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _config_key: &str, _line: &str) {}
}
