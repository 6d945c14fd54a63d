//! Targets: the remote endpoint a client instance talks to.

use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use url::Url;

use crate::error::PlumeError;
use crate::response::Request;
use crate::template::RequestTemplate;

/// The identity and URL resolution strategy of a client instance.
///
/// Proxies compare, hash and print through their target, so implementations
/// must keep `eq_target`, `hash_code` and `Display` consistent.
pub trait Target: fmt::Display + fmt::Debug + Send + Sync + 'static {
    /// Name of the interface this target serves.
    fn api(&self) -> &'static str;

    /// Logical name of the endpoint, usually its URL.
    fn name(&self) -> &str;

    /// Base URL of the endpoint.
    fn url(&self) -> &str;

    /// Turn a resolved template into a request against this endpoint.
    fn apply(&self, template: &RequestTemplate) -> Result<Request, PlumeError>;

    fn eq_target(&self, other: &dyn Target) -> bool;

    fn hash_code(&self) -> u64;

    fn as_any(&self) -> &dyn Any;
}

/// A target with a fixed base URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HardCodedTarget {
    api: &'static str,
    name: String,
    url: String,
}

impl HardCodedTarget {
    pub fn new(api: &'static str, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            api,
            name: url.clone(),
            url,
        }
    }

    pub fn with_name(api: &'static str, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            api,
            name: name.into(),
            url: url.into(),
        }
    }
}

impl Target for HardCodedTarget {
    fn api(&self) -> &'static str {
        self.api
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn apply(&self, template: &RequestTemplate) -> Result<Request, PlumeError> {
        let path = template.path();
        let joined = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.url.trim_end_matches('/'), path)
        };
        let mut url = Url::parse(&joined)
            .map_err(|e| PlumeError::Config(format!("invalid url `{joined}`: {e}")))?;
        if !template.queries().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in template.queries() {
                pairs.append_pair(name, value);
            }
        }
        Ok(Request {
            method: template.method().clone(),
            url,
            headers: template.headers().to_vec(),
            body: template.body().map(<[u8]>::to_vec),
        })
    }

    fn eq_target(&self, other: &dyn Target) -> bool {
        other
            .as_any()
            .downcast_ref::<HardCodedTarget>()
            .is_some_and(|other| self == other)
    }

    fn hash_code(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for HardCodedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.url {
            write!(f, "HardCodedTarget(type={}, url={})", self.api, self.url)
        } else {
            write!(
                f,
                "HardCodedTarget(type={}, name={}, url={})",
                self.api, self.name, self.url
            )
        }
    }
}
