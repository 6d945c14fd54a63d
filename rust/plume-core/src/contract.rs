//! Contracts turn interface declarations into per-method metadata.

use std::collections::BTreeMap;

use http::Method;
use tracing::trace;

use crate::decl::{ApiDecl, MethodDecl};
use crate::error::PlumeError;
use crate::template::RequestTemplate;
use crate::types::TypeRef;

/// Everything the base client needs to know to perform calls to one method.
#[derive(Debug, Clone)]
pub struct MethodMetadata {
    config_key: String,
    method_name: &'static str,
    return_type: TypeRef,
    template: RequestTemplate,
    body_index: Option<usize>,
    index_to_name: BTreeMap<usize, &'static str>,
    param_count: usize,
}

impl MethodMetadata {
    pub fn new(
        config_key: impl Into<String>,
        method_name: &'static str,
        return_type: TypeRef,
        template: RequestTemplate,
    ) -> Self {
        Self {
            config_key: config_key.into(),
            method_name,
            return_type,
            template,
            body_index: None,
            index_to_name: BTreeMap::new(),
            param_count: 0,
        }
    }

    /// `"Api#method(param,...)"`, used in logs and errors.
    pub fn config_key(&self) -> &str {
        &self.config_key
    }

    pub fn method_name(&self) -> &'static str {
        self.method_name
    }

    /// The type the decoder is asked to produce.
    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    pub fn set_return_type(&mut self, return_type: TypeRef) {
        self.return_type = return_type;
    }

    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    /// Index of the argument encoded as the request body.
    pub fn body_index(&self) -> Option<usize> {
        self.body_index
    }

    /// Arguments bound to template expressions, by index.
    pub fn index_to_name(&self) -> &BTreeMap<usize, &'static str> {
        &self.index_to_name
    }

    pub fn param_count(&self) -> usize {
        self.param_count
    }
}

/// Parses an interface declaration into method metadata.
pub trait Contract: Send + Sync {
    /// Produce one metadata entry per declared method, in declaration order.
    fn parse_and_validate(&self, api: &ApiDecl) -> Result<Vec<MethodMetadata>, PlumeError>;
}

/// The default contract: request lines, `Name: value` header lines and
/// `{name}` template expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContract;

impl Contract for DefaultContract {
    fn parse_and_validate(&self, api: &ApiDecl) -> Result<Vec<MethodMetadata>, PlumeError> {
        let mut parsed: Vec<MethodMetadata> = Vec::with_capacity(api.methods.len());
        for method in &api.methods {
            if parsed.iter().any(|m| m.method_name == method.name) {
                return Err(PlumeError::Contract(format!(
                    "{} declares `{}` more than once",
                    api.name, method.name
                )));
            }
            let metadata = parse_method(api, method)?;
            trace!(
                config_key = metadata.config_key(),
                return_type = %metadata.return_type(),
                "parsed method metadata"
            );
            parsed.push(metadata);
        }
        Ok(parsed)
    }
}

fn parse_method(api: &ApiDecl, method: &MethodDecl) -> Result<MethodMetadata, PlumeError> {
    let config_key = format!("{}#{}({})", api.name, method.name, method.params.join(","));

    let line = method.request_line.trim();
    if line.is_empty() {
        return Err(PlumeError::Contract(format!(
            "request line is empty on {config_key}"
        )));
    }
    let (verb, uri) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let http_method = Method::from_bytes(verb.as_bytes()).map_err(|_| {
        PlumeError::Contract(format!("`{verb}` is not an HTTP method on {config_key}"))
    })?;
    let uri = uri.trim();
    let uri = if uri.is_empty() { "/" } else { uri };

    let mut template = RequestTemplate::from_uri(http_method, uri);
    for header in api.headers.iter().chain(method.headers.iter()) {
        let (name, value) = header.split_once(':').ok_or_else(|| {
            PlumeError::Contract(format!(
                "header `{header}` on {config_key} is not formatted as `Name: value`"
            ))
        })?;
        template.header(name.trim(), value.trim());
    }

    let variables = template.variables();
    let mut metadata = MethodMetadata::new(
        config_key,
        method.name,
        method.return_type.clone(),
        template,
    );
    metadata.param_count = method.params.len();
    for (index, name) in method.params.iter().enumerate() {
        if variables.iter().any(|v| v == name) {
            metadata.index_to_name.insert(index, *name);
        } else if metadata.body_index.is_none() {
            metadata.body_index = Some(index);
        } else {
            return Err(PlumeError::Contract(format!(
                "{} has too many body parameters",
                metadata.config_key
            )));
        }
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(method: MethodDecl) -> ApiDecl {
        ApiDecl::new("Repos")
            .header("Accept: application/json")
            .method(method)
    }

    fn text(name: &'static str) -> MethodDecl {
        MethodDecl::new(name, TypeRef::of::<String>())
    }

    #[test]
    fn parses_request_line_headers_and_bindings() {
        let create = text("create")
            .request_line("POST /repos/{owner}?dry_run={dry}")
            .header("X-Owner: {owner}")
            .param("owner")
            .param("dry")
            .param("repo");
        let parsed = DefaultContract.parse_and_validate(&api(create)).unwrap();
        assert_eq!(parsed.len(), 1);

        let md = &parsed[0];
        assert_eq!(md.config_key(), "Repos#create(owner,dry,repo)");
        assert_eq!(md.template().method(), &Method::POST);
        assert_eq!(md.template().path(), "/repos/{owner}");
        assert_eq!(
            md.template().headers(),
            &[
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Owner".to_string(), "{owner}".to_string()),
            ]
        );
        assert_eq!(md.index_to_name().get(&0), Some(&"owner"));
        assert_eq!(md.index_to_name().get(&1), Some(&"dry"));
        assert_eq!(md.body_index(), Some(2));
        assert_eq!(md.return_type(), &TypeRef::of::<String>());
    }

    #[test]
    fn rejects_empty_request_line() {
        let decl = api(text("get"));
        let err = DefaultContract.parse_and_validate(&decl).unwrap_err();
        assert!(matches!(
            err,
            PlumeError::Contract(msg) if msg.contains("request line is empty")
        ));
    }

    #[test]
    fn rejects_invalid_method_and_header() {
        let bad_method = api(text("get").request_line("G(T /"));
        assert!(DefaultContract.parse_and_validate(&bad_method).is_err());

        let bad_header = api(text("get").request_line("GET /").header("no colon here"));
        assert!(DefaultContract.parse_and_validate(&bad_header).is_err());
    }

    #[test]
    fn rejects_two_body_parameters() {
        let decl = api(text("post").request_line("POST /").param("a").param("b"));
        let err = DefaultContract.parse_and_validate(&decl).unwrap_err();
        assert!(matches!(
            err,
            PlumeError::Contract(msg) if msg.contains("too many body parameters")
        ));
    }

    #[test]
    fn rejects_duplicate_methods() {
        let decl = ApiDecl::new("Dup")
            .method(text("get").request_line("GET /a"))
            .method(text("get").request_line("GET /b"));
        assert!(DefaultContract.parse_and_validate(&decl).is_err());
    }

    #[test]
    fn bare_request_line_targets_root() {
        let decl = api(text("root").request_line("GET"));
        let parsed = DefaultContract.parse_and_validate(&decl).unwrap();
        assert_eq!(parsed[0].template().path(), "/");
    }
}
