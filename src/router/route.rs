//! Route templates.
//!
//! Grammar: `segment ("/" segment)* ["{?" name ("," name)* "}"]` where a segment
//! is either a literal or exactly one `{name}` variable. A component prefix is
//! joined in front of the method template before parsing.

use crate::core::{Annotations, ArgumentSpec, RouteAnnotation};
use crate::error::ConfigurationError;
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static IDENT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok());

fn is_brace(c: char) -> bool {
    c == '{' || c == '}'
}

fn is_ident(name: &str) -> bool {
    IDENT.as_ref().is_some_and(|re| re.is_match(name))
}

/// One `/`-separated piece of a route path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Variable(String),
}

/// Query key bound to a method argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameter {
    pub name: String,
    pub argument_name: String,
}

/// Path and query names of a template, before argument binding
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedTemplate {
    pub segments: Vec<Segment>,
    pub query_names: Vec<String>,
}

impl ParsedTemplate {
    /// Parse a full (prefix-joined) template; the error is a human readable reason
    pub fn parse(template: &str) -> Result<Self, String> {
        let (path, query) = match template.find("{?") {
            Some(start) => {
                let group = &template[start..];
                let inner = group.strip_suffix('}').map(|g| &g[2..]);
                match inner {
                    Some(inner) if !inner.contains(is_brace) => (&template[..start], Some(inner)),
                    _ => return Err("query group must close the template".to_string()),
                }
            }
            None => (template, None),
        };

        let mut segments = Vec::new();
        let trimmed = path.trim_matches('/');
        if !trimmed.is_empty() {
            for raw in trimmed.split('/') {
                segments.push(parse_segment(raw)?);
            }
        }

        let mut variables: Vec<&str> = Vec::new();
        for segment in &segments {
            if let Segment::Variable(name) = segment {
                if variables.contains(&name.as_str()) {
                    return Err(format!("path variable `{name}` appears more than once"));
                }
                variables.push(name);
            }
        }

        let mut query_names: Vec<String> = Vec::new();
        if let Some(group) = query {
            for name in group.split(',').map(str::trim) {
                if !is_ident(name) {
                    return Err(format!("invalid query parameter name `{name}`"));
                }
                if query_names.iter().any(|n| n == name) {
                    return Err(format!("query parameter `{name}` appears more than once"));
                }
                query_names.push(name.to_string());
            }
        }

        Ok(Self { segments, query_names })
    }
}

fn parse_segment(raw: &str) -> Result<Segment, String> {
    if raw.is_empty() {
        return Err("empty path segment".to_string());
    }
    if !raw.contains(is_brace) {
        return Ok(Segment::Literal(raw.to_string()));
    }
    match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        Some(name) if is_ident(name) => Ok(Segment::Variable(name.to_string())),
        _ => Err(format!("segment `{raw}` must be a literal or a single `{{name}}`")),
    }
}

/// Join a component prefix and a method template
#[must_use]
pub fn join_template(prefix: Option<&str>, template: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => {
            let head = prefix.trim_end_matches('/');
            if template.is_empty() {
                head.to_string()
            } else if template.starts_with("{?") {
                format!("{head}/{template}")
            } else {
                format!("{head}/{}", template.trim_start_matches('/'))
            }
        }
        _ => template.to_string(),
    }
}

/// A method's resolved route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub http_method: Method,
    /// Template as declared, prefix included
    pub template: String,
    /// `/a/{b}/c` form without the query group or a trailing slash
    pub url_path: String,
    pub segments: Vec<Segment>,
    pub query_parameters: Vec<QueryParameter>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
}

impl Route {
    /// Parse and bind a route annotation against the method's arguments.
    ///
    /// Every path variable must name an argument; every query key must name an
    /// argument directly or through a query-parameter mapping.
    pub fn resolve(
        method: &str,
        annotation: &RouteAnnotation,
        prefix: Option<&str>,
        arguments: &[ArgumentSpec],
        annotations: &Annotations,
    ) -> Result<Route, Vec<ConfigurationError>> {
        let template = join_template(prefix, &annotation.template);
        let parsed = ParsedTemplate::parse(&template).map_err(|reason| {
            vec![ConfigurationError::MalformedTemplate {
                method: method.to_string(),
                template: template.clone(),
                reason,
            }]
        })?;

        let has_argument = |name: &str| arguments.iter().any(|a| a.name == name);
        let mut errors = Vec::new();

        let missing: Vec<String> = parsed
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Variable(name) if !has_argument(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        if !missing.is_empty() {
            errors.push(ConfigurationError::PathVariableMismatch {
                method: method.to_string(),
                template: template.clone(),
                missing,
            });
        }

        let mut query_parameters: Vec<QueryParameter> = Vec::with_capacity(parsed.query_names.len());
        for name in parsed.query_names {
            let argument_name = annotations
                .argument_for_query(&name)
                .map(str::to_string)
                .unwrap_or_else(|| name.clone());
            if let Some(bound) = query_parameters.iter().find(|q| q.argument_name == argument_name) {
                errors.push(ConfigurationError::DuplicateQueryBinding {
                    method: method.to_string(),
                    names: vec![bound.name.clone(), name],
                    argument: argument_name,
                });
            } else if has_argument(&argument_name) {
                query_parameters.push(QueryParameter { name, argument_name });
            } else {
                errors.push(ConfigurationError::UnknownQueryParameter {
                    method: method.to_string(),
                    name,
                });
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Route {
            http_method: annotation.http_method.clone(),
            url_path: render_path(&parsed.segments, false),
            template,
            segments: parsed.segments,
            query_parameters,
            consumes: annotation.consumes.clone(),
            produces: annotation.produces.clone(),
        })
    }

    /// Path with every variable replaced by `{}`; the duplicate-detection key
    #[must_use]
    pub fn normalized(&self) -> String {
        render_path(&self.segments, true)
    }

    /// Path variable names in template order
    pub fn path_variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    #[must_use]
    pub fn query_parameter_for(&self, argument_name: &str) -> Option<&QueryParameter> {
        self.query_parameters.iter().find(|q| q.argument_name == argument_name)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.http_method, self.url_path)
    }
}

fn render_path(segments: &[Segment], anonymous: bool) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut path = String::new();
    for segment in segments {
        path.push('/');
        match segment {
            Segment::Literal(text) => path.push_str(text),
            Segment::Variable(_) if anonymous => path.push_str("{}"),
            Segment::Variable(name) => {
                path.push('{');
                path.push_str(name);
                path.push('}');
            }
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Annotation;
    use crate::types::TypeInfo;

    fn args(names: &[&str]) -> Vec<ArgumentSpec> {
        names
            .iter()
            .map(|n| ArgumentSpec {
                name: (*n).to_string(),
                type_: TypeInfo::Integer,
                default: None,
            })
            .collect()
    }

    fn resolve(template: &str, names: &[&str]) -> Result<Route, Vec<ConfigurationError>> {
        Route::resolve(
            "Api.method",
            &RouteAnnotation::new(Method::GET, template),
            None,
            &args(names),
            &Annotations::default(),
        )
    }

    #[test]
    fn test_parse_path_and_query_group() {
        let parsed = ParsedTemplate::parse("users/{id}/posts/{?limit, offset}").unwrap();
        assert_eq!(
            parsed.segments,
            vec![
                Segment::Literal("users".into()),
                Segment::Variable("id".into()),
                Segment::Literal("posts".into()),
            ]
        );
        assert_eq!(parsed.query_names, vec!["limit", "offset"]);
    }

    #[test]
    fn test_parse_rejects_malformed_templates() {
        assert!(ParsedTemplate::parse("a/{?x}/b").is_err());
        assert!(ParsedTemplate::parse("a/pre{id}/").is_err());
        assert!(ParsedTemplate::parse("a/{1id}/").is_err());
        assert!(ParsedTemplate::parse("a//b").is_err());
        assert!(ParsedTemplate::parse("{id}/{id}").is_err());
        assert!(ParsedTemplate::parse("a/{?x,x}").is_err());
        assert!(ParsedTemplate::parse("a/{?x").is_err());
    }

    #[test]
    fn test_url_path_and_normalized_form() {
        let route = resolve("{path_param}/{?query_param}", &["path_param", "query_param"]).unwrap();
        assert_eq!(route.url_path, "/{path_param}");
        assert_eq!(route.normalized(), "/{}");
        assert_eq!(route.path_variables().collect::<Vec<_>>(), vec!["path_param"]);
        assert_eq!(route.query_parameters[0].argument_name, "query_param");
    }

    #[test]
    fn test_root_template() {
        let route = resolve("", &[]).unwrap();
        assert_eq!(route.url_path, "/");
    }

    #[test]
    fn test_prefix_join() {
        assert_eq!(join_template(Some("winter-simple/"), "get/"), "winter-simple/get/");
        assert_eq!(join_template(Some("/api"), "/items"), "/api/items");
        assert_eq!(join_template(Some("api/"), "{?q}"), "api/{?q}");
        assert_eq!(join_template(None, "x/"), "x/");
    }

    #[test]
    fn test_path_variable_without_argument() {
        let errors = resolve("{a}/{b}/", &["a"]).unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigurationError::PathVariableMismatch {
                method: "Api.method".into(),
                template: "{a}/{b}/".into(),
                missing: vec!["b".into()],
            }]
        );
    }

    #[test]
    fn test_query_name_mapping() {
        let mut annotations = Annotations::default();
        annotations
            .add(Annotation::QueryParameterMapping {
                query_name: "page_size".into(),
                argument_name: "size".into(),
            })
            .unwrap();
        let resolve_with = |template: &str| {
            Route::resolve(
                "Api.method",
                &RouteAnnotation::new(Method::GET, template),
                None,
                &args(&["size"]),
                &annotations,
            )
        };

        let route = resolve_with("items/{?page_size}").unwrap();
        assert_eq!(route.query_parameter_for("size").unwrap().name, "page_size");

        let errors = resolve_with("items/{?page_size,unknown}").unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigurationError::UnknownQueryParameter {
                method: "Api.method".into(),
                name: "unknown".into(),
            }]
        );
    }

    #[test]
    fn test_two_query_names_bound_to_one_argument() {
        let mut annotations = Annotations::default();
        annotations
            .add(Annotation::QueryParameterMapping {
                query_name: "page_size".into(),
                argument_name: "size".into(),
            })
            .unwrap();

        let errors = Route::resolve(
            "Api.method",
            &RouteAnnotation::new(Method::GET, "items/{?page_size,size}"),
            None,
            &args(&["size"]),
            &annotations,
        )
        .unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigurationError::DuplicateQueryBinding {
                method: "Api.method".into(),
                argument: "size".into(),
                names: vec!["page_size".into(), "size".into()],
            }]
        );
        assert_eq!(errors[0].kind(), "duplicate_query_binding");
    }
}
