use crate::router::ParamVec;
use crate::types::{ApiType, TypeInfo};
use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Inbound request as seen by argument resolvers.
///
/// Built by the surrounding HTTP layer; path parameters are filled in by the
/// dispatcher once the router has matched the request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query: QueryParams,
    /// HTTP headers (lowercase keys)
    headers: HashMap<String, String>,
    body: Option<Value>,
    path_params: ParamVec,
}

impl HttpRequest {
    /// Create a request from a method and a URI (`/path?query`)
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, QueryParams::parse(query)),
            None => (uri, QueryParams::default()),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            headers: HashMap::new(),
            body: None,
            path_params: ParamVec::new(),
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Get a path parameter by name (last occurrence wins)
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_path_params(&mut self, params: ParamVec) {
        self.path_params = params;
    }

    #[must_use]
    pub fn with_path_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_params.push((Arc::from(name), value.into()));
        self
    }
}

impl ApiType for HttpRequest {
    fn type_info() -> TypeInfo {
        TypeInfo::Request
    }
}

/// Observable state of one query key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryValue<'a> {
    /// The key does not occur in the query string
    Absent,
    /// The key occurs without `=` (`?flag`)
    Flag,
    Value(&'a str),
}

/// Ordered, decoded query string.
///
/// Unlike a plain map, a key written without `=` is kept as a flag so that
/// `?flag` and an absent key stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, Option<String>)>,
}

impl QueryParams {
    pub fn parse(query: &str) -> Self {
        let pairs = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter_map(|pair| {
                let (key, value) = url::form_urlencoded::parse(pair.as_bytes()).next()?;
                let value = pair.contains('=').then(|| value.into_owned());
                Some((key.into_owned(), value))
            })
            .collect();
        Self { pairs }
    }

    /// Last value written for `name`, ignoring flags
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, v)| k == name && v.is_some())
            .and_then(|(_, v)| v.as_deref())
    }

    /// Every value written for `name` in order; a flag counts as an empty value
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_deref().unwrap_or(""))
            .collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == name)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> QueryValue<'_> {
        match self.pairs.iter().rfind(|(k, _)| k == name) {
            None => QueryValue::Absent,
            Some((_, None)) => QueryValue::Flag,
            Some((_, Some(v))) => QueryValue::Value(v),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_path_and_query() {
        let req = HttpRequest::get("/winter-simple/get/?hello_world&limit=10");
        assert_eq!(req.path(), "/winter-simple/get/");
        assert_eq!(req.query().lookup("hello_world"), QueryValue::Flag);
        assert_eq!(req.query().lookup("limit"), QueryValue::Value("10"));
        assert_eq!(req.query().lookup("missing"), QueryValue::Absent);
    }

    #[test]
    fn test_empty_value_is_not_a_flag() {
        let query = QueryParams::parse("a=&b");
        assert_eq!(query.lookup("a"), QueryValue::Value(""));
        assert_eq!(query.lookup("b"), QueryValue::Flag);
        assert_eq!(query.get("b"), None);
    }

    #[test]
    fn test_decoding_and_repeated_keys() {
        let query = QueryParams::parse("name=John+Doe&tag=a%2Fb&tag=c");
        assert_eq!(query.get("name"), Some("John Doe"));
        assert_eq!(query.get_all("tag"), vec!["a/b", "c"]);
        assert_eq!(query.get("tag"), Some("c"));
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = HttpRequest::get("/").with_header("X-Request-Id", "abc");
        assert_eq!(req.header("x-request-id"), Some("abc"));
        assert_eq!(req.header("X-REQUEST-ID"), Some("abc"));
    }

    #[test]
    fn test_path_param_last_write_wins() {
        let req = HttpRequest::get("/")
            .with_path_param("id", "1")
            .with_path_param("id", "2");
        assert_eq!(req.path_param("id"), Some("2"));
        assert_eq!(req.path_param("other"), None);
    }
}
