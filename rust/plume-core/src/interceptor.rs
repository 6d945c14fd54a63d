//! Request interceptors run on every attempt, just before the target resolves
//! the request.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::template::RequestTemplate;

pub trait RequestInterceptor: Send + Sync {
    fn apply(&self, template: &mut RequestTemplate);
}

impl<F> RequestInterceptor for F
where
    F: Fn(&mut RequestTemplate) + Send + Sync,
{
    fn apply(&self, template: &mut RequestTemplate) {
        self(template)
    }
}

/// Adds an `Authorization: Basic ...` header.
#[derive(Debug, Clone)]
pub struct BasicAuthInterceptor {
    header: String,
}

impl BasicAuthInterceptor {
    pub fn new(username: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{username}:{password}"));
        Self {
            header: format!("Basic {token}"),
        }
    }
}

impl RequestInterceptor for BasicAuthInterceptor {
    fn apply(&self, template: &mut RequestTemplate) {
        template.header("Authorization", self.header.clone());
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;

    #[test]
    fn basic_auth_header() {
        let mut template = RequestTemplate::new(Method::GET, "/");
        BasicAuthInterceptor::new("Aladdin", "open sesame").apply(&mut template);
        assert_eq!(
            template.headers(),
            &[(
                "Authorization".to_string(),
                "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==".to_string()
            )]
        );
    }

    #[test]
    fn closures_are_interceptors() {
        let interceptor = |t: &mut RequestTemplate| {
            t.header("X-Trace", "abc");
        };
        let mut template = RequestTemplate::new(Method::GET, "/");
        interceptor.apply(&mut template);
        assert!(template.has_header("x-trace"));
    }
}
