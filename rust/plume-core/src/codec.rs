//! Request body encoders, response decoders and error decoders.

use std::time::Duration;

use http::StatusCode;
use serde_json::Value;

use crate::error::PlumeError;
use crate::response::Response;
use crate::template::RequestTemplate;
use crate::types::{Payload, TypeRef};

/// Writes the body argument of a call into the request template.
pub trait Encoder: Send + Sync {
    fn encode(&self, body: &Value, template: &mut RequestTemplate) -> Result<(), PlumeError>;
}

/// Converts a successful response into the payload type of a method.
pub trait Decoder: Send + Sync {
    fn decode(&self, response: Response, ty: &TypeRef) -> Result<Payload, PlumeError>;
}

/// Converts a non-success response into an error.
pub trait ErrorDecoder: Send + Sync {
    fn decode(&self, config_key: &str, response: Response) -> PlumeError;
}

/// Accepts string bodies only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEncoder;

impl Encoder for DefaultEncoder {
    fn encode(&self, body: &Value, template: &mut RequestTemplate) -> Result<(), PlumeError> {
        match body {
            Value::String(s) => {
                template.set_body(s.as_bytes());
                Ok(())
            }
            Value::Null => Ok(()),
            other => Err(PlumeError::Encode(format!(
                "the default encoder only writes string bodies, got `{other}`"
            ))),
        }
    }
}

/// Writes the body argument as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(&self, body: &Value, template: &mut RequestTemplate) -> Result<(), PlumeError> {
        let bytes = serde_json::to_vec(body).map_err(|e| PlumeError::Encode(e.to_string()))?;
        if !template.has_header("Content-Type") {
            template.header("Content-Type", "application/json");
        }
        template.set_body(bytes);
        Ok(())
    }
}

/// Produces `String`, `Vec<u8>` and `()` payloads.
///
/// A `404 Not Found` that reaches the decoder decodes as the empty value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDecoder;

impl Decoder for DefaultDecoder {
    fn decode(&self, response: Response, ty: &TypeRef) -> Result<Payload, PlumeError> {
        let not_found = response.status() == StatusCode::NOT_FOUND;
        if ty.is::<()>() {
            return Ok(Box::new(()));
        }
        if ty.is::<Vec<u8>>() {
            let body = if not_found {
                Vec::new()
            } else {
                response.into_body()
            };
            return Ok(Box::new(body));
        }
        if ty.is::<String>() {
            let text = if not_found {
                String::new()
            } else {
                response.text()?
            };
            return Ok(Box::new(text));
        }
        Err(PlumeError::Decode {
            method: String::new(),
            message: format!("{ty} is not a type supported by the default decoder"),
        })
    }
}

/// Deserializes JSON bodies through the type witness.
///
/// Empty bodies, `204 No Content` and `404 Not Found` decode as JSON `null`,
/// so `Option<T>` payloads become `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, response: Response, ty: &TypeRef) -> Result<Payload, PlumeError> {
        let empty = response.body().iter().all(u8::is_ascii_whitespace)
            || matches!(
                response.status(),
                StatusCode::NO_CONTENT | StatusCode::NOT_FOUND
            );
        let body: &[u8] = if empty { b"null" } else { response.body() };
        match ty.decode_json(body) {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(e)) => Err(PlumeError::Decode {
                method: String::new(),
                message: format!("{ty}: {e}"),
            }),
            None => Err(PlumeError::Decode {
                method: String::new(),
                message: format!("{ty} cannot be decoded from a response body"),
            }),
        }
    }
}

/// Maps statuses to [`PlumeError::Status`], or to [`PlumeError::Retryable`]
/// when the server sent a `Retry-After` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorDecoder;

impl ErrorDecoder for DefaultErrorDecoder {
    fn decode(&self, config_key: &str, response: Response) -> PlumeError {
        let retry_after = response
            .header("Retry-After")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let status = response.status();
        match retry_after {
            Some(delay) => PlumeError::Retryable {
                method: config_key.to_string(),
                message: format!("status {status}"),
                status: Some(status),
                retry_after: Some(delay),
            },
            None => PlumeError::Status {
                method: config_key.to_string(),
                status,
                body: response.into_body(),
            },
        }
    }
}
