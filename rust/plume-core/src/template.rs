//! Request templates with `{name}` expressions.

use std::collections::HashMap;

use http::Method;

/// A request whose path, query values and header values may still contain
/// `{name}` expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    method: Method,
    path: String,
    queries: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RequestTemplate {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            queries: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Parse `"/path?a={a}&b=literal"` into a path and query templates.
    pub fn from_uri(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };
        let mut template = Self::new(method, path);
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            template.queries.push((name.to_string(), value.to_string()));
        }
        template
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn queries(&self) -> &[(String, String)] {
        &self.queries
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Append a query parameter.
    pub fn query(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.queries.push((name.into(), value.into()));
        self
    }

    /// Append a header.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    /// Names of every `{name}` expression in the path, query values and header values.
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        let sources = std::iter::once(self.path.as_str())
            .chain(self.queries.iter().map(|(_, v)| v.as_str()))
            .chain(self.headers.iter().map(|(_, v)| v.as_str()));
        for source in sources {
            for name in expressions(source) {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    /// Expand `{name}` expressions with `vars`.
    ///
    /// Values substituted into the path are percent-encoded as a single
    /// segment, so `/`, `?` and `#` cannot change the endpoint. Path and header
    /// expressions without a value are left as written; query parameters whose
    /// value stays unresolved are dropped.
    pub fn resolve(&self, vars: &HashMap<&str, String>) -> RequestTemplate {
        let queries = self
            .queries
            .iter()
            .filter_map(|(name, value)| {
                let (expanded, complete) = expand(value, vars, str::to_string);
                complete.then(|| (name.clone(), expanded))
            })
            .collect();
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), expand(value, vars, str::to_string).0))
            .collect();
        RequestTemplate {
            method: self.method.clone(),
            path: expand(&self.path, vars, encode_path_segment).0,
            queries,
            headers,
            body: self.body.clone(),
        }
    }
}

fn expressions(source: &str) -> impl Iterator<Item = &str> {
    source.split('{').skip(1).filter_map(|rest| {
        let (name, _) = rest.split_once('}')?;
        (!name.is_empty()).then_some(name)
    })
}

/// Percent-encode everything but unreserved characters. Spaces become `%20`.
fn encode_path_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .map(|chunk| if chunk == "+" { "%20" } else { chunk })
        .collect()
}

/// Returns the expanded text and whether every expression had a value.
fn expand(
    source: &str,
    vars: &HashMap<&str, String>,
    encode: fn(&str) -> String,
) -> (String, bool) {
    let mut out = String::with_capacity(source.len());
    let mut complete = true;
    let mut rest = source;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match vars.get(name) {
                    Some(value) => out.push_str(&encode(value)),
                    None => {
                        complete = false;
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    (out, complete)
}
