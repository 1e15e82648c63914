//! Error taxonomy.
//!
//! Configuration errors are raised while components are built and routes are
//! registered; they are fatal to engine construction. Lookup errors come from
//! metadata queries. Dispatch errors are what the surrounding HTTP layer sees
//! when a request cannot be turned into a response.

use crate::exceptions::ApiException;
use crate::validator::ValidationIssue;
use http::Method;
use thiserror::Error;

/// Startup-time misconfiguration of a component, route or resolver chain
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("method `{component}.{method}` is declared more than once")]
    DuplicateMethod { component: String, method: String },

    #[error("`{method}` declares more than one `{kind}` annotation")]
    DuplicateAnnotation { method: String, kind: String },

    #[error("malformed route template `{template}` on `{method}`: {reason}")]
    MalformedTemplate {
        method: String,
        template: String,
        reason: String,
    },

    #[error("route `{template}` on `{method}` has path variables without a matching argument: {missing:?}")]
    PathVariableMismatch {
        method: String,
        template: String,
        missing: Vec<String>,
    },

    #[error("query parameter `{name}` on `{method}` does not map to any argument")]
    UnknownQueryParameter { method: String, name: String },

    #[error("query parameters {names:?} on `{method}` all bind argument `{argument}`")]
    DuplicateQueryBinding {
        method: String,
        argument: String,
        names: Vec<String>,
    },

    #[error("`{method}` refers to unknown argument `{argument}`")]
    UnknownArgument { method: String, argument: String },

    #[error("route {http_method} {template} is declared by both `{first}` and `{second}`")]
    DuplicateRoute {
        http_method: Method,
        template: String,
        first: String,
        second: String,
    },

    #[error("component name `{name}` is used by both `{first}` and `{second}`")]
    DuplicateComponentName {
        name: String,
        first: String,
        second: String,
    },

    #[error("no argument resolver supports argument `{argument}` of `{method}`")]
    UnresolvedArgument { method: String, argument: String },

    #[error("argument `{argument}` of `{method}` is claimed by several resolvers: {resolvers:?}")]
    AmbiguousArgument {
        method: String,
        argument: String,
        resolvers: Vec<String>,
    },

    #[error("`{method}` maps exceptions {exceptions:?} to status {status} with different response bodies")]
    AmbiguousResponseStatus {
        method: String,
        status: u16,
        exceptions: Vec<String>,
    },
}

impl ConfigurationError {
    /// Short machine-readable category
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateMethod { .. } => "duplicate_method",
            Self::DuplicateAnnotation { .. } => "duplicate_annotation",
            Self::MalformedTemplate { .. } => "malformed_template",
            Self::PathVariableMismatch { .. } => "path_variable_mismatch",
            Self::UnknownQueryParameter { .. } => "unknown_query_parameter",
            Self::DuplicateQueryBinding { .. } => "duplicate_query_binding",
            Self::UnknownArgument { .. } => "unknown_argument",
            Self::DuplicateRoute { .. } => "duplicate_route",
            Self::DuplicateComponentName { .. } => "duplicate_component_name",
            Self::UnresolvedArgument { .. } => "unresolved_argument",
            Self::AmbiguousArgument { .. } => "ambiguous_argument",
            Self::AmbiguousResponseStatus { .. } => "ambiguous_response_status",
        }
    }

    /// Qualified name of the offending method (`Component.method`), or the component name
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::DuplicateMethod { component, method } => format!("{component}.{method}"),
            Self::DuplicateAnnotation { method, .. }
            | Self::MalformedTemplate { method, .. }
            | Self::PathVariableMismatch { method, .. }
            | Self::UnknownQueryParameter { method, .. }
            | Self::DuplicateQueryBinding { method, .. }
            | Self::UnknownArgument { method, .. }
            | Self::UnresolvedArgument { method, .. }
            | Self::AmbiguousArgument { method, .. }
            | Self::AmbiguousResponseStatus { method, .. } => method.clone(),
            Self::DuplicateRoute { second, .. } => second.clone(),
            Self::DuplicateComponentName { name, .. } => name.clone(),
        }
    }
}

/// Every configuration error found while building, reported together
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} configuration error(s) found: {}", .errors.len(), summary(.errors))]
pub struct BuildError {
    pub errors: Vec<ConfigurationError>,
}

impl BuildError {
    #[must_use]
    pub fn issues(&self) -> Vec<ValidationIssue> {
        self.errors.iter().map(ValidationIssue::from).collect()
    }

    /// True when any collected error is of the given kind
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }
}

impl From<ConfigurationError> for BuildError {
    fn from(error: ConfigurationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

fn summary(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("component `{component}` declares no method `{method}`")]
    MethodNotFound { component: String, method: String },
}

/// Failure to produce a response for a request
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// No handler matched the raised exception; the HTTP layer answers with a generic failure
    #[error("unhandled exception: {0}")]
    Unhandled(ApiException),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_display_lists_every_error() {
        let err = BuildError {
            errors: vec![
                ConfigurationError::UnresolvedArgument {
                    method: "Api.get".into(),
                    argument: "x".into(),
                },
                ConfigurationError::UnknownQueryParameter {
                    method: "Api.get".into(),
                    name: "q".into(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("2 configuration error(s) found"));
        assert!(text.contains("argument `x`"));
        assert!(text.contains("query parameter `q`"));
        assert!(err.contains("unknown_query_parameter"));
        assert!(!err.contains("duplicate_route"));
    }

    #[test]
    fn test_location_of_duplicate_method() {
        let err = ConfigurationError::DuplicateMethod {
            component: "Api".into(),
            method: "get".into(),
        };
        assert_eq!(err.location(), "Api.get");
        assert_eq!(err.kind(), "duplicate_method");
    }
}
