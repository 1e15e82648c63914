//! # Argument Resolvers
//!
//! Each method argument is produced by exactly one [`ArgumentResolver`]. The
//! [`ArgumentsResolver`] chain holds the built-in resolvers followed by any the
//! application appends, checks at build time that every argument has exactly
//! one claimant, and resolves arguments in declaration order at request time.
//!
//! Built-in chain order:
//!
//! 1. [`HttpRequestArgumentResolver`] - arguments typed as the request itself
//! 2. [`RequestBodyArgumentResolver`] - the argument named by a request body or
//!    input serializer annotation
//! 3. [`PathParametersArgumentResolver`] - arguments named like a path variable
//! 4. [`QueryParameterArgumentResolver`] - arguments bound to a query key

use crate::converters::{coerce_str, ConversionIssue, ConverterRegistry};
use crate::core::{Arguments, ComponentMethod, ComponentMethodArgument};
use crate::error::ConfigurationError;
use crate::exceptions::ApiException;
use crate::types::TypeInfo;
use crate::web::{HttpRequest, QueryValue, ResponseHeaders};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Value produced for one argument
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedArgument {
    /// The inbound request; read it through [`Arguments::request`]
    Request,
    Value(Value),
    /// Not supplied and no default declared
    Missing,
}

pub trait ArgumentResolver: Send + Sync + fmt::Debug {
    /// Label used in build-time error reports
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("ArgumentResolver")
    }

    fn is_supported(&self, argument: &ComponentMethodArgument) -> bool;

    fn resolve_argument(
        &self,
        argument: &ComponentMethodArgument,
        request: &HttpRequest,
        response_headers: &mut ResponseHeaders,
    ) -> Result<ResolvedArgument, ApiException>;
}

#[derive(Debug, Default)]
pub struct HttpRequestArgumentResolver;

impl ArgumentResolver for HttpRequestArgumentResolver {
    fn is_supported(&self, argument: &ComponentMethodArgument) -> bool {
        argument.type_ == TypeInfo::Request
    }

    fn resolve_argument(
        &self,
        _argument: &ComponentMethodArgument,
        _request: &HttpRequest,
        _response_headers: &mut ResponseHeaders,
    ) -> Result<ResolvedArgument, ApiException> {
        Ok(ResolvedArgument::Request)
    }
}

/// Converts the request body to the argument's declared type.
///
/// With an input serializer the body is validated against the serializer's
/// fields first and only the validated fields are converted.
#[derive(Debug)]
pub struct RequestBodyArgumentResolver {
    converters: Arc<ConverterRegistry>,
}

impl RequestBodyArgumentResolver {
    pub fn new(converters: Arc<ConverterRegistry>) -> Self {
        Self { converters }
    }
}

impl ArgumentResolver for RequestBodyArgumentResolver {
    fn is_supported(&self, argument: &ComponentMethodArgument) -> bool {
        argument
            .method()
            .is_some_and(|method| method.annotations().request_body_argument() == Some(argument.name.as_str()))
    }

    fn resolve_argument(
        &self,
        argument: &ComponentMethodArgument,
        request: &HttpRequest,
        _response_headers: &mut ResponseHeaders,
    ) -> Result<ResolvedArgument, ApiException> {
        let body = request.body().cloned().unwrap_or(Value::Null);
        let serializer = argument
            .method()
            .and_then(|method| method.annotations().input_serializer().cloned());
        let data = match serializer {
            Some(serializer) => Value::Object(serializer.validate(&body)?),
            None => body,
        };
        let value = self.converters.convert(&data, &argument.type_)?;
        Ok(ResolvedArgument::Value(value))
    }
}

/// Reads path variables captured by the router
#[derive(Debug, Default)]
pub struct PathParametersArgumentResolver;

impl ArgumentResolver for PathParametersArgumentResolver {
    fn is_supported(&self, argument: &ComponentMethodArgument) -> bool {
        argument
            .method()
            .and_then(|method| {
                method
                    .route()
                    .map(|route| route.path_variables().any(|name| name == argument.name))
            })
            .unwrap_or(false)
    }

    fn resolve_argument(
        &self,
        argument: &ComponentMethodArgument,
        request: &HttpRequest,
        _response_headers: &mut ResponseHeaders,
    ) -> Result<ResolvedArgument, ApiException> {
        let Some(raw) = request.path_param(&argument.name) else {
            return Err(ApiException::internal(format!(
                "path variable `{}` was not captured",
                argument.name
            )));
        };
        coerce_str(raw, &argument.type_)
            .map(ResolvedArgument::Value)
            .map_err(|message| invalid_argument(&argument.name, message))
    }
}

/// Reads query keys declared in the route's query group
#[derive(Debug, Default)]
pub struct QueryParameterArgumentResolver;

impl ArgumentResolver for QueryParameterArgumentResolver {
    fn is_supported(&self, argument: &ComponentMethodArgument) -> bool {
        argument
            .method()
            .and_then(|method| {
                method
                    .route()
                    .map(|route| route.query_parameter_for(&argument.name).is_some())
            })
            .unwrap_or(false)
    }

    fn resolve_argument(
        &self,
        argument: &ComponentMethodArgument,
        request: &HttpRequest,
        _response_headers: &mut ResponseHeaders,
    ) -> Result<ResolvedArgument, ApiException> {
        let query_name = argument
            .method()
            .and_then(|method| {
                method
                    .route()
                    .and_then(|route| route.query_parameter_for(&argument.name).map(|q| q.name.clone()))
            })
            .unwrap_or_else(|| argument.name.clone());

        let declared = argument.type_.without_optional();
        if let TypeInfo::List(item) = declared {
            let values = request.query().get_all(&query_name);
            if values.is_empty() {
                return Ok(self.absent(argument));
            }
            let items = values
                .into_iter()
                .map(|raw| coerce_str(raw, item))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|message| invalid_argument(&query_name, message))?;
            return Ok(ResolvedArgument::Value(Value::Array(items)));
        }

        match request.query().lookup(&query_name) {
            QueryValue::Absent => Ok(self.absent(argument)),
            QueryValue::Flag if *declared == TypeInfo::Boolean => Ok(ResolvedArgument::Value(Value::Bool(true))),
            QueryValue::Flag => coerce_str("", &argument.type_)
                .map(ResolvedArgument::Value)
                .map_err(|message| invalid_argument(&query_name, message)),
            QueryValue::Value(raw) => coerce_str(raw, &argument.type_)
                .map(ResolvedArgument::Value)
                .map_err(|message| invalid_argument(&query_name, message)),
        }
    }
}

impl QueryParameterArgumentResolver {
    fn absent(&self, argument: &ComponentMethodArgument) -> ResolvedArgument {
        match &argument.default {
            Some(default) => ResolvedArgument::Value(default.clone()),
            None => ResolvedArgument::Missing,
        }
    }
}

fn invalid_argument(field: &str, message: String) -> ApiException {
    let issue = ConversionIssue {
        field: field.to_string(),
        message,
    };
    ApiException::validation(format!("invalid value for `{field}`"), std::slice::from_ref(&issue))
}

/// Ordered resolver chain
#[derive(Debug, Clone)]
pub struct ArgumentsResolver {
    resolvers: Vec<Arc<dyn ArgumentResolver>>,
}

impl ArgumentsResolver {
    /// Built-in resolvers in chain order
    pub fn with_defaults(converters: Arc<ConverterRegistry>) -> Self {
        Self {
            resolvers: vec![
                Arc::new(HttpRequestArgumentResolver),
                Arc::new(RequestBodyArgumentResolver::new(converters)),
                Arc::new(PathParametersArgumentResolver),
                Arc::new(QueryParameterArgumentResolver),
            ],
        }
    }

    /// Append a resolver after every resolver already in the chain
    pub fn add_resolver(&mut self, resolver: Arc<dyn ArgumentResolver>) {
        self.resolvers.push(resolver);
    }

    /// Every argument must be claimed by exactly one resolver
    #[must_use]
    pub fn validate(&self, method: &ComponentMethod) -> Vec<ConfigurationError> {
        let mut errors = Vec::new();
        for argument in method.arguments() {
            let claimants: Vec<String> = self
                .resolvers
                .iter()
                .filter(|r| r.is_supported(argument))
                .map(|r| r.name().to_string())
                .collect();
            match claimants.len() {
                1 => {}
                0 => errors.push(ConfigurationError::UnresolvedArgument {
                    method: method.qualified_name(),
                    argument: argument.name.clone(),
                }),
                _ => errors.push(ConfigurationError::AmbiguousArgument {
                    method: method.qualified_name(),
                    argument: argument.name.clone(),
                    resolvers: claimants,
                }),
            }
        }
        errors
    }

    /// Resolve every argument in declaration order; the first failure aborts
    pub fn resolve_arguments(
        &self,
        method: &ComponentMethod,
        request: HttpRequest,
        response_headers: &mut ResponseHeaders,
    ) -> Result<Arguments, ApiException> {
        let mut values = Vec::with_capacity(method.arguments().len());
        for argument in method.arguments() {
            let Some(resolver) = self.resolvers.iter().find(|r| r.is_supported(argument)) else {
                return Err(ApiException::internal(format!(
                    "no resolver for argument `{}` of `{}`",
                    argument.name,
                    method.qualified_name()
                )));
            };
            match resolver.resolve_argument(argument, &request, response_headers) {
                Ok(value) => values.push((argument.name.clone(), value)),
                Err(exception) => {
                    warn!(
                        handler_name = %method.qualified_name(),
                        argument = %argument.name,
                        resolver = resolver.name(),
                        error = %exception,
                        "Argument resolution failed"
                    );
                    return Err(exception);
                }
            }
        }
        debug!(handler_name = %method.qualified_name(), arguments_count = values.len(), "Arguments resolved");
        Ok(Arguments::new(request, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ApiComponent, Component, ComponentBuilder};
    use crate::types::ObjectType;
    use serde_json::json;

    struct Items;

    fn item_type() -> TypeInfo {
        ObjectType::new("ItemDTO")
            .field::<String>("title")
            .field_with_default::<i64>("count", json!(1))
            .into_type()
    }

    impl ApiComponent for Items {
        fn declare(component: &mut ComponentBuilder<Self>) {
            component
                .method("search")
                .get("items/{category}/{?limit,verbose,tag,q}")
                .argument::<String>("category")
                .argument_with_default::<i64>("limit", json!(20))
                .argument::<Option<bool>>("verbose")
                .argument::<Vec<String>>("tag")
                .argument::<String>("q")
                .argument::<HttpRequest>("request");
            component
                .method("create")
                .post("items/")
                .request_body("item")
                .argument_of("item", item_type(), None);
            component.method("orphan").get("orphans/").argument::<i64>("unbound");
        }
    }

    #[derive(Debug)]
    struct GreedyResolver;

    impl ArgumentResolver for GreedyResolver {
        fn is_supported(&self, argument: &ComponentMethodArgument) -> bool {
            argument.name == "category" || argument.name == "unbound"
        }

        fn resolve_argument(
            &self,
            _argument: &ComponentMethodArgument,
            _request: &HttpRequest,
            response_headers: &mut ResponseHeaders,
        ) -> Result<ResolvedArgument, ApiException> {
            response_headers.insert("x-greedy", "1");
            Ok(ResolvedArgument::Value(json!(0)))
        }
    }

    fn chain() -> ArgumentsResolver {
        ArgumentsResolver::with_defaults(Arc::new(ConverterRegistry::new()))
    }

    fn method(name: &str) -> Arc<ComponentMethod> {
        Component::get_by_cls::<Items>().unwrap().get_method(name).unwrap()
    }

    #[test]
    fn test_query_and_path_values() {
        let method = method("search");
        let request = HttpRequest::get("/items/books/?verbose&tag=a&tag=b&q=")
            .with_path_param("category", "books");
        let mut headers = ResponseHeaders::new();
        let args = chain().resolve_arguments(&method, request, &mut headers).unwrap();

        assert_eq!(args.value("category"), Some(&json!("books")));
        assert_eq!(args.value("limit"), Some(&json!(20)));
        assert_eq!(args.value("verbose"), Some(&json!(true)));
        assert_eq!(args.value("tag"), Some(&json!(["a", "b"])));
        assert_eq!(args.value("q"), Some(&json!("")));
        assert_eq!(args.resolved("request"), Some(&ResolvedArgument::Request));
    }

    #[test]
    fn test_absent_query_without_default_is_missing() {
        let method = method("search");
        let request = HttpRequest::get("/items/books/").with_path_param("category", "books");
        let args = chain()
            .resolve_arguments(&method, request, &mut ResponseHeaders::new())
            .unwrap();
        assert!(args.is_missing("verbose"));
        assert!(args.is_missing("q"));
        assert!(args.is_missing("tag"));
        assert_eq!(args.get::<Option<bool>>("verbose").unwrap(), None);
    }

    #[test]
    fn test_bad_query_value_is_validation_error() {
        let method = method("search");
        let request = HttpRequest::get("/items/books/?limit=ten").with_path_param("category", "books");
        let err = chain()
            .resolve_arguments(&method, request, &mut ResponseHeaders::new())
            .unwrap_err();
        assert_eq!(err.class().name, "RequestValidationException");
        assert_eq!(err.attributes()["errors"][0]["field"], json!("limit"));
    }

    #[test]
    fn test_request_body_conversion() {
        let method = method("create");
        let request = HttpRequest::post("/items/").with_json_body(json!({"title": "Pen", "extra": true}));
        let args = chain()
            .resolve_arguments(&method, request, &mut ResponseHeaders::new())
            .unwrap();
        assert_eq!(args.value("item"), Some(&json!({"title": "Pen", "count": 1})));

        let request = HttpRequest::post("/items/").with_json_body(json!({"count": 2}));
        let err = chain()
            .resolve_arguments(&method, request, &mut ResponseHeaders::new())
            .unwrap_err();
        assert!(err.is_instance_of(&crate::exceptions::REQUEST_VALIDATION_EXCEPTION));
    }

    #[test]
    fn test_validate_reports_unclaimed_and_ambiguous() {
        let resolver = chain();
        assert!(resolver.validate(&method("search")).is_empty());
        let errors = resolver.validate(&method("orphan"));
        assert_eq!(
            errors,
            vec![ConfigurationError::UnresolvedArgument {
                method: "Items.orphan".into(),
                argument: "unbound".into(),
            }]
        );

        let mut resolver = chain();
        resolver.add_resolver(Arc::new(GreedyResolver));
        assert!(resolver.validate(&method("orphan")).is_empty());
        let errors = resolver.validate(&method("search"));
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            ConfigurationError::AmbiguousArgument { argument, resolvers, .. } => {
                assert_eq!(argument, "category");
                assert_eq!(resolvers, &vec!["PathParametersArgumentResolver".to_string(), "GreedyResolver".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_custom_resolver_writes_headers() {
        let mut resolver = chain();
        resolver.add_resolver(Arc::new(GreedyResolver));
        let mut headers = ResponseHeaders::new();
        let args = resolver
            .resolve_arguments(&method("orphan"), HttpRequest::get("/orphans/"), &mut headers)
            .unwrap();
        assert_eq!(args.value("unbound"), Some(&json!(0)));
        assert_eq!(headers.get("x-greedy"), Some("1"));
    }
}
