//! Error type shared by every layer of a plume client.

use std::fmt;
use std::io;
use std::time::Duration;

use http::StatusCode;

/// Errors produced while declaring, building or calling a plume client.
///
/// The reactive layer never wraps or translates these: a failed `Mono` carries
/// exactly the `PlumeError` the synchronous call produced.
#[derive(Debug)]
pub enum PlumeError {
    /// The interface declaration is invalid (bad request line, header, body parameters...).
    Contract(String),
    /// The client was configured inconsistently (e.g. a target for another interface).
    Config(String),
    /// A builder operation that this client kind does not allow.
    UnsupportedOperation(&'static str),
    /// The proxy was asked to invoke a method that the interface does not declare.
    UnknownMethod { api: String, method: String },
    /// A request argument or body could not be encoded.
    Encode(String),
    /// A response body could not be decoded into the declared payload type.
    Decode { method: String, message: String },
    /// Transport failure while executing a request.
    Io(io::Error),
    /// The server answered with a non-success status.
    Status {
        method: String,
        status: StatusCode,
        body: Vec<u8>,
    },
    /// A failure that the configured retry policy may retry.
    Retryable {
        method: String,
        message: String,
        status: Option<StatusCode>,
        retry_after: Option<Duration>,
    },
    /// The decoded payload does not have the type the caller asked for.
    ReturnType { expected: &'static str },
    /// The worker evaluating an eager future went away before completing it.
    Abandoned,
}

impl PlumeError {
    /// Status code carried by this error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            PlumeError::Status { status, .. } => Some(*status),
            PlumeError::Retryable { status, .. } => *status,
            _ => None,
        }
    }

    /// Attribute a decode error raised by a decoder to the method being called.
    pub fn in_method(self, config_key: &str) -> Self {
        match self {
            PlumeError::Decode { method, message } if method.is_empty() => PlumeError::Decode {
                method: config_key.to_string(),
                message,
            },
            other => other,
        }
    }

    /// Whether a retry policy is allowed to retry this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlumeError::Retryable { .. })
    }
}

impl fmt::Display for PlumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlumeError::Contract(msg) => write!(f, "invalid interface declaration: {msg}"),
            PlumeError::Config(msg) => write!(f, "invalid client configuration: {msg}"),
            PlumeError::UnsupportedOperation(op) => write!(f, "unsupported operation: {op}"),
            PlumeError::UnknownMethod { api, method } => {
                write!(f, "{api} does not declare a method named `{method}`")
            }
            PlumeError::Encode(msg) => write!(f, "encode error: {msg}"),
            PlumeError::Decode { method, message } => {
                write!(f, "decode error in {method}: {message}")
            }
            PlumeError::Io(e) => write!(f, "io error: {e}"),
            PlumeError::Status {
                method,
                status,
                body,
            } => {
                if body.is_empty() {
                    write!(f, "status {status} reading {method}")
                } else {
                    write!(
                        f,
                        "status {status} reading {method}; content:\n{}",
                        String::from_utf8_lossy(body)
                    )
                }
            }
            PlumeError::Retryable {
                method, message, ..
            } => write!(f, "{message} executing {method}"),
            PlumeError::ReturnType { expected } => {
                write!(f, "decoded payload is not a `{expected}`")
            }
            PlumeError::Abandoned => write!(f, "the call was abandoned before completing"),
        }
    }
}

impl std::error::Error for PlumeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlumeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PlumeError {
    fn from(e: io::Error) -> Self {
        PlumeError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_body_only_when_present() {
        let bare = PlumeError::Status {
            method: "Api#get()".into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: Vec::new(),
        };
        assert_eq!(
            bare.to_string(),
            "status 500 Internal Server Error reading Api#get()"
        );

        let with_body = PlumeError::Status {
            method: "Api#get()".into(),
            status: StatusCode::BAD_REQUEST,
            body: b"nope".to_vec(),
        };
        assert!(with_body.to_string().ends_with("content:\nnope"));
    }

    #[test]
    fn only_retryable_errors_are_retryable() {
        let retryable = PlumeError::Retryable {
            method: "Api#get()".into(),
            message: "connection refused".into(),
            status: None,
            retry_after: None,
        };
        assert!(retryable.is_retryable());
        assert!(!PlumeError::Abandoned.is_retryable());
        assert_eq!(retryable.status(), None);
    }
}
