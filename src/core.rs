//! # Metadata Model
//!
//! In-memory reflection of declared API classes. A type implementing
//! [`ApiComponent`] describes its methods once through a [`ComponentBuilder`];
//! the resulting [`Component`] is built lazily on first lookup, cached for the
//! lifetime of the process and never mutated afterwards.
//!
//! ```rust
//! use apibind::core::{ApiComponent, Component, ComponentBuilder};
//!
//! struct GreetingApi;
//!
//! impl ApiComponent for GreetingApi {
//!     fn declare(component: &mut ComponentBuilder<Self>) {
//!         component.route_prefix("greetings/");
//!         component
//!             .method("greet")
//!             .get("{name}/")
//!             .argument::<String>("name")
//!             .returns::<String>()
//!             .handler(|_api: &GreetingApi, args| Ok(format!("Hello, {}!", args.get::<String>("name")?)));
//!     }
//! }
//!
//! let component = Component::get_by_cls::<GreetingApi>().unwrap();
//! let method = component.get_method("greet").unwrap();
//! assert_eq!(method.route().unwrap().url_path, "/greetings/{name}");
//! ```

use crate::converters::InputSerializer;
use crate::docstring::{self, Docstring};
use crate::error::{BuildError, ConfigurationError, LookupError};
use crate::exceptions::{ApiException, ExceptionClass, ExceptionHandler};
use crate::resolvers::ResolvedArgument;
use crate::router::Route;
use crate::types::{ApiType, TypeInfo};
use crate::web::HttpRequest;
use dashmap::DashMap;
use http::{Method, StatusCode};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Route declaration on a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAnnotation {
    pub http_method: Method,
    pub template: String,
    /// Explicit media types, used verbatim; empty means the configured default
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
}

impl RouteAnnotation {
    pub fn new(http_method: Method, template: impl Into<String>) -> Self {
        Self {
            http_method,
            template: template.into(),
            consumes: Vec::new(),
            produces: Vec::new(),
        }
    }

    #[must_use]
    pub fn consumes<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consumes = media_types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn produces<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces = media_types.into_iter().map(Into::into).collect();
        self
    }
}

/// Exception declaration, optionally with a method-scoped handler
#[derive(Debug, Clone)]
pub struct RaisesAnnotation {
    pub exception: &'static ExceptionClass,
    pub handler: Option<(StatusCode, Arc<dyn ExceptionHandler>)>,
}

/// A typed, immutable fact attached to a method or a component
#[derive(Debug, Clone)]
pub enum Annotation {
    Route(RouteAnnotation),
    /// Component level: joined in front of every method template
    RoutePrefix(String),
    RequestBody {
        argument_name: String,
    },
    InputSerializer {
        serializer: Arc<InputSerializer>,
        argument_name: String,
    },
    Raises(RaisesAnnotation),
    /// Binds query key `query_name` to an argument with a different name
    QueryParameterMapping {
        query_name: String,
        argument_name: String,
    },
    ResponseStatus(StatusCode),
    Custom {
        kind: &'static str,
        value: Value,
    },
}

impl Annotation {
    #[must_use]
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Route(_) => AnnotationKind::Route,
            Annotation::RoutePrefix(_) => AnnotationKind::RoutePrefix,
            Annotation::RequestBody { .. } => AnnotationKind::RequestBody,
            Annotation::InputSerializer { .. } => AnnotationKind::InputSerializer,
            Annotation::Raises(_) => AnnotationKind::Raises,
            Annotation::QueryParameterMapping { .. } => AnnotationKind::QueryParameterMapping,
            Annotation::ResponseStatus(_) => AnnotationKind::ResponseStatus,
            Annotation::Custom { kind, .. } => AnnotationKind::Custom(kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Route,
    RoutePrefix,
    RequestBody,
    InputSerializer,
    Raises,
    QueryParameterMapping,
    ResponseStatus,
    Custom(&'static str),
}

impl AnnotationKind {
    /// Kinds that may be attached more than once
    #[must_use]
    pub fn is_multi_valued(self) -> bool {
        matches!(
            self,
            AnnotationKind::Raises | AnnotationKind::QueryParameterMapping | AnnotationKind::Custom(_)
        )
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationKind::Route => f.write_str("route"),
            AnnotationKind::RoutePrefix => f.write_str("route_prefix"),
            AnnotationKind::RequestBody => f.write_str("request_body"),
            AnnotationKind::InputSerializer => f.write_str("input_serializer"),
            AnnotationKind::Raises => f.write_str("raises"),
            AnnotationKind::QueryParameterMapping => f.write_str("query_parameter"),
            AnnotationKind::ResponseStatus => f.write_str("response_status"),
            AnnotationKind::Custom(kind) => f.write_str(kind),
        }
    }
}

/// Ordered annotation set, queried by kind
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    items: Vec<Annotation>,
}

impl Annotations {
    /// Add an annotation; a second one of a single-valued kind is refused
    pub fn add(&mut self, annotation: Annotation) -> Result<(), AnnotationKind> {
        let kind = annotation.kind();
        if !kind.is_multi_valued() && self.get_one_or_none(kind).is_some() {
            return Err(kind);
        }
        self.items.push(annotation);
        Ok(())
    }

    #[must_use]
    pub fn get_one_or_none(&self, kind: AnnotationKind) -> Option<&Annotation> {
        self.items.iter().find(|a| a.kind() == kind)
    }

    pub fn get_all(&self, kind: AnnotationKind) -> impl Iterator<Item = &Annotation> {
        self.items.iter().filter(move |a| a.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.items.iter()
    }

    #[must_use]
    pub fn route(&self) -> Option<&RouteAnnotation> {
        match self.get_one_or_none(AnnotationKind::Route) {
            Some(Annotation::Route(route)) => Some(route),
            _ => None,
        }
    }

    #[must_use]
    pub fn route_prefix(&self) -> Option<&str> {
        match self.get_one_or_none(AnnotationKind::RoutePrefix) {
            Some(Annotation::RoutePrefix(prefix)) => Some(prefix),
            _ => None,
        }
    }

    /// Name of the argument bound to the request body, by either body annotation
    #[must_use]
    pub fn request_body_argument(&self) -> Option<&str> {
        self.items.iter().find_map(|a| match a {
            Annotation::RequestBody { argument_name } | Annotation::InputSerializer { argument_name, .. } => {
                Some(argument_name.as_str())
            }
            _ => None,
        })
    }

    #[must_use]
    pub fn input_serializer(&self) -> Option<&Arc<InputSerializer>> {
        match self.get_one_or_none(AnnotationKind::InputSerializer) {
            Some(Annotation::InputSerializer { serializer, .. }) => Some(serializer),
            _ => None,
        }
    }

    pub fn raises(&self) -> impl Iterator<Item = &RaisesAnnotation> {
        self.items.iter().filter_map(|a| match a {
            Annotation::Raises(raises) => Some(raises),
            _ => None,
        })
    }

    /// Argument bound to a query key, when it was renamed
    #[must_use]
    pub fn argument_for_query(&self, query_name: &str) -> Option<&str> {
        self.items.iter().find_map(|a| match a {
            Annotation::QueryParameterMapping {
                query_name: name,
                argument_name,
            } if name == query_name => Some(argument_name.as_str()),
            _ => None,
        })
    }

    #[must_use]
    pub fn response_status(&self) -> Option<StatusCode> {
        match self.get_one_or_none(AnnotationKind::ResponseStatus) {
            Some(Annotation::ResponseStatus(status)) => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn custom(&self, kind: &str) -> Vec<&Value> {
        self.items
            .iter()
            .filter_map(|a| match a {
                Annotation::Custom { kind: k, value } if *k == kind => Some(value),
                _ => None,
            })
            .collect()
    }
}

/// One formal parameter of a declared method
#[derive(Debug, Clone)]
pub struct ComponentMethodArgument {
    pub name: String,
    pub type_: TypeInfo,
    /// Declared default, used when the request does not supply the argument
    pub default: Option<Value>,
    method: Weak<ComponentMethod>,
}

impl ComponentMethodArgument {
    /// Owning method; `None` only while the method is being torn down
    #[must_use]
    pub fn method(&self) -> Option<Arc<ComponentMethod>> {
        self.method.upgrade()
    }

    /// May be left out of a request
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.default.is_some() || self.type_.is_optional()
    }
}

/// Argument declaration before its method exists
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub name: String,
    pub type_: TypeInfo,
    pub default: Option<Value>,
}

/// Type-erased call into a component instance
pub type MethodInvoker =
    Arc<dyn Fn(&(dyn Any + Send + Sync), &Arguments) -> Result<Value, ApiException> + Send + Sync>;

/// One declared API operation
pub struct ComponentMethod {
    name: String,
    component_name: String,
    return_type: TypeInfo,
    arguments: Vec<ComponentMethodArgument>,
    annotations: Annotations,
    docstring: Option<String>,
    route: Option<Route>,
    invoker: MethodInvoker,
}

impl ComponentMethod {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    /// `Component.method`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.component_name, self.name)
    }

    #[must_use]
    pub fn return_type(&self) -> &TypeInfo {
        &self.return_type
    }

    #[must_use]
    pub fn arguments(&self) -> &[ComponentMethodArgument] {
        &self.arguments
    }

    #[must_use]
    pub fn get_argument(&self, name: &str) -> Option<&ComponentMethodArgument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    #[must_use]
    pub fn docstring(&self) -> Option<&str> {
        self.docstring.as_deref()
    }

    #[must_use]
    pub fn parsed_docstring(&self) -> Docstring {
        self.docstring.as_deref().map(docstring::parse).unwrap_or_default()
    }

    #[must_use]
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn invoke(&self, instance: &(dyn Any + Send + Sync), arguments: &Arguments) -> Result<Value, ApiException> {
        (self.invoker)(instance, arguments)
    }
}

impl fmt::Debug for ComponentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentMethod")
            .field("name", &self.qualified_name())
            .field("return_type", &self.return_type)
            .field("arguments", &self.arguments.iter().map(|a| &a.name).collect::<Vec<_>>())
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

/// Values bound to a method's arguments for one call
#[derive(Debug)]
pub struct Arguments {
    request: HttpRequest,
    values: Vec<(String, ResolvedArgument)>,
}

impl Arguments {
    pub fn new(request: HttpRequest, values: Vec<(String, ResolvedArgument)>) -> Self {
        Self { request, values }
    }

    #[must_use]
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    #[must_use]
    pub fn resolved(&self, name: &str) -> Option<&ResolvedArgument> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.resolved(name) {
            Some(ResolvedArgument::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// True when the argument was not supplied and has no default
    #[must_use]
    pub fn is_missing(&self, name: &str) -> bool {
        matches!(self.resolved(name), Some(ResolvedArgument::Missing))
    }

    /// Deserialize an argument; a missing argument reads as `null`
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ApiException> {
        let value = match self.resolved(name) {
            Some(ResolvedArgument::Value(value)) => value.clone(),
            Some(ResolvedArgument::Missing) => Value::Null,
            Some(ResolvedArgument::Request) => {
                return Err(ApiException::internal(format!(
                    "argument `{name}` is the request, use Arguments::request"
                )))
            }
            None => return Err(ApiException::internal(format!("unknown argument `{name}`"))),
        };
        serde_json::from_value(value)
            .map_err(|e| ApiException::internal(format!("argument `{name}` has an unexpected shape: {e}")))
    }
}

/// A declared API class
pub trait ApiComponent: Send + Sync + 'static {
    fn declare(component: &mut ComponentBuilder<Self>)
    where
        Self: Sized;
}

/// Collects method declarations for component `C`
pub struct ComponentBuilder<C> {
    name: String,
    doc: Option<String>,
    annotations: Annotations,
    methods: Vec<MethodBuilder<C>>,
    duplicate_kinds: Vec<AnnotationKind>,
}

impl<C: ApiComponent> ComponentBuilder<C> {
    fn new() -> Self {
        let full = std::any::type_name::<C>();
        let name = full.rsplit("::").next().unwrap_or(full).to_string();
        Self {
            name,
            doc: None,
            annotations: Annotations::default(),
            methods: Vec::new(),
            duplicate_kinds: Vec::new(),
        }
    }

    /// Override the component name (defaults to the type name)
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn doc(&mut self, doc: impl Into<String>) -> &mut Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn route_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.annotate(Annotation::RoutePrefix(prefix.into()))
    }

    pub fn annotate(&mut self, annotation: Annotation) -> &mut Self {
        if let Err(kind) = self.annotations.add(annotation) {
            self.duplicate_kinds.push(kind);
        }
        self
    }

    /// Start declaring a method; declaration order is kept
    pub fn method(&mut self, name: impl Into<String>) -> &mut MethodBuilder<C> {
        self.methods.push(MethodBuilder::new(name.into()));
        let last = self.methods.len() - 1;
        &mut self.methods[last]
    }

    fn build(self) -> Result<Component, BuildError> {
        let mut errors: Vec<ConfigurationError> = self
            .duplicate_kinds
            .iter()
            .map(|kind| ConfigurationError::DuplicateAnnotation {
                method: self.name.clone(),
                kind: kind.to_string(),
            })
            .collect();

        let prefix = self.annotations.route_prefix().map(str::to_string);
        let mut methods: IndexMap<String, Arc<ComponentMethod>> = IndexMap::new();
        let mut seen: Vec<String> = Vec::new();
        for builder in self.methods {
            if seen.contains(&builder.name) {
                errors.push(ConfigurationError::DuplicateMethod {
                    component: self.name.clone(),
                    method: builder.name.clone(),
                });
                continue;
            }
            seen.push(builder.name.clone());
            match builder.build(&self.name, prefix.as_deref()) {
                Ok(method) => {
                    methods.insert(method.name.clone(), method);
                }
                Err(method_errors) => errors.extend(method_errors),
            }
        }

        if !errors.is_empty() {
            return Err(BuildError { errors });
        }
        Ok(Component {
            name: self.name,
            type_id: TypeId::of::<C>(),
            type_name: std::any::type_name::<C>(),
            doc: self.doc,
            annotations: self.annotations,
            methods,
        })
    }
}

/// Declaration of one method on component `C`
pub struct MethodBuilder<C> {
    name: String,
    arguments: Vec<ArgumentSpec>,
    annotations: Annotations,
    duplicate_kinds: Vec<AnnotationKind>,
    return_type: TypeInfo,
    docstring: Option<String>,
    invoker: Option<MethodInvoker>,
    _component: PhantomData<fn(&C)>,
}

impl<C: ApiComponent> MethodBuilder<C> {
    fn new(name: String) -> Self {
        Self {
            name,
            arguments: Vec::new(),
            annotations: Annotations::default(),
            duplicate_kinds: Vec::new(),
            return_type: TypeInfo::None,
            docstring: None,
            invoker: None,
            _component: PhantomData,
        }
    }

    pub fn annotate(&mut self, annotation: Annotation) -> &mut Self {
        if let Err(kind) = self.annotations.add(annotation) {
            self.duplicate_kinds.push(kind);
        }
        self
    }

    pub fn route(&mut self, route: RouteAnnotation) -> &mut Self {
        self.annotate(Annotation::Route(route))
    }

    pub fn get(&mut self, template: &str) -> &mut Self {
        self.route(RouteAnnotation::new(Method::GET, template))
    }

    pub fn post(&mut self, template: &str) -> &mut Self {
        self.route(RouteAnnotation::new(Method::POST, template))
    }

    pub fn put(&mut self, template: &str) -> &mut Self {
        self.route(RouteAnnotation::new(Method::PUT, template))
    }

    pub fn patch(&mut self, template: &str) -> &mut Self {
        self.route(RouteAnnotation::new(Method::PATCH, template))
    }

    pub fn delete(&mut self, template: &str) -> &mut Self {
        self.route(RouteAnnotation::new(Method::DELETE, template))
    }

    pub fn argument<T: ApiType>(&mut self, name: &str) -> &mut Self {
        self.argument_of(name, T::type_info(), None)
    }

    pub fn argument_with_default<T: ApiType>(&mut self, name: &str, default: Value) -> &mut Self {
        self.argument_of(name, T::type_info(), Some(default))
    }

    pub fn argument_of(&mut self, name: &str, type_: TypeInfo, default: Option<Value>) -> &mut Self {
        self.arguments.push(ArgumentSpec {
            name: name.to_string(),
            type_,
            default,
        });
        self
    }

    pub fn request_body(&mut self, argument_name: &str) -> &mut Self {
        self.annotate(Annotation::RequestBody {
            argument_name: argument_name.to_string(),
        })
    }

    pub fn input_serializer(&mut self, serializer: InputSerializer, argument_name: &str) -> &mut Self {
        self.annotate(Annotation::InputSerializer {
            serializer: Arc::new(serializer),
            argument_name: argument_name.to_string(),
        })
    }

    /// Declare an exception handled by the shared registry
    pub fn raises(&mut self, exception: &'static ExceptionClass) -> &mut Self {
        self.annotate(Annotation::Raises(RaisesAnnotation {
            exception,
            handler: None,
        }))
    }

    /// Declare an exception with a handler scoped to this method
    pub fn raises_with<H>(&mut self, exception: &'static ExceptionClass, status: StatusCode, handler: H) -> &mut Self
    where
        H: ExceptionHandler + 'static,
    {
        self.annotate(Annotation::Raises(RaisesAnnotation {
            exception,
            handler: Some((status, Arc::new(handler))),
        }))
    }

    pub fn map_query_parameter(&mut self, query_name: &str, argument_name: &str) -> &mut Self {
        self.annotate(Annotation::QueryParameterMapping {
            query_name: query_name.to_string(),
            argument_name: argument_name.to_string(),
        })
    }

    pub fn response_status(&mut self, status: StatusCode) -> &mut Self {
        self.annotate(Annotation::ResponseStatus(status))
    }

    pub fn doc(&mut self, docstring: &str) -> &mut Self {
        self.docstring = Some(docstring.to_string());
        self
    }

    pub fn returns<T: ApiType>(&mut self) -> &mut Self {
        self.return_type = T::type_info();
        self
    }

    pub fn returns_type(&mut self, return_type: TypeInfo) -> &mut Self {
        self.return_type = return_type;
        self
    }

    /// Bind the method body. The return value is serialized to JSON.
    pub fn handler<F, R>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&C, &Arguments) -> Result<R, ApiException> + Send + Sync + 'static,
        R: Serialize,
    {
        let invoker: MethodInvoker = Arc::new(move |instance, arguments| {
            let component = instance
                .downcast_ref::<C>()
                .ok_or_else(|| ApiException::internal("component instance has an unexpected type"))?;
            let result = handler(component, arguments)?;
            serde_json::to_value(result)
                .map_err(|e| ApiException::internal(format!("return value is not serializable: {e}")))
        });
        self.invoker = Some(invoker);
        self
    }

    fn build(self, component_name: &str, prefix: Option<&str>) -> Result<Arc<ComponentMethod>, Vec<ConfigurationError>> {
        let qualified = format!("{component_name}.{}", self.name);
        let mut errors: Vec<ConfigurationError> = self
            .duplicate_kinds
            .iter()
            .map(|kind| ConfigurationError::DuplicateAnnotation {
                method: qualified.clone(),
                kind: kind.to_string(),
            })
            .collect();

        let body_annotations = self.annotations.get_all(AnnotationKind::RequestBody).count()
            + self.annotations.get_all(AnnotationKind::InputSerializer).count();
        if body_annotations > 1 {
            errors.push(ConfigurationError::DuplicateAnnotation {
                method: qualified.clone(),
                kind: AnnotationKind::RequestBody.to_string(),
            });
        }

        let mut seen: Vec<&str> = Vec::new();
        for argument in &self.arguments {
            if seen.contains(&argument.name.as_str()) {
                errors.push(ConfigurationError::DuplicateAnnotation {
                    method: qualified.clone(),
                    kind: format!("argument `{}`", argument.name),
                });
            }
            seen.push(&argument.name);
        }

        let referenced = self
            .annotations
            .request_body_argument()
            .into_iter()
            .chain(self.annotations.iter().filter_map(|a| match a {
                Annotation::QueryParameterMapping { argument_name, .. } => Some(argument_name.as_str()),
                _ => None,
            }));
        for name in referenced {
            if !self.arguments.iter().any(|a| a.name == name) {
                errors.push(ConfigurationError::UnknownArgument {
                    method: qualified.clone(),
                    argument: name.to_string(),
                });
            }
        }

        let route = match self.annotations.route() {
            Some(annotation) => match Route::resolve(&qualified, annotation, prefix, &self.arguments, &self.annotations) {
                Ok(route) => Some(route),
                Err(route_errors) => {
                    errors.extend(route_errors);
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let invoker = self.invoker.unwrap_or_else(|| Arc::new(|_, _| Ok(Value::Null)));
        let arguments = self.arguments;
        let method = Arc::new_cyclic(|weak: &Weak<ComponentMethod>| ComponentMethod {
            name: self.name,
            component_name: component_name.to_string(),
            return_type: self.return_type,
            arguments: arguments
                .into_iter()
                .map(|spec| ComponentMethodArgument {
                    name: spec.name,
                    type_: spec.type_,
                    default: spec.default,
                    method: weak.clone(),
                })
                .collect(),
            annotations: self.annotations,
            docstring: self.docstring,
            route,
            invoker,
        });
        debug!(method = %method.qualified_name(), routed = method.route.is_some(), "Method metadata built");
        Ok(method)
    }
}

/// Metadata of one declared API class
#[derive(Debug)]
pub struct Component {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    doc: Option<String>,
    annotations: Annotations,
    methods: IndexMap<String, Arc<ComponentMethod>>,
}

static COMPONENTS: Lazy<DashMap<TypeId, Arc<Component>>> = Lazy::new(DashMap::new);

impl Component {
    /// Cached component for `C`, built on first access.
    ///
    /// Concurrent first lookups may each build; the first stored instance is the
    /// one every caller receives. Failed builds are not cached.
    pub fn get_by_cls<C: ApiComponent>() -> Result<Arc<Component>, BuildError> {
        let key = TypeId::of::<C>();
        if let Some(existing) = COMPONENTS.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        let built = Arc::new(Self::build::<C>()?);
        let stored = Arc::clone(COMPONENTS.entry(key).or_insert(built).value());
        info!(
            component = %stored.name,
            methods_count = stored.methods.len(),
            "Component registered"
        );
        Ok(stored)
    }

    /// Build without touching the process-wide cache
    pub fn build<C: ApiComponent>() -> Result<Component, BuildError> {
        let mut builder = ComponentBuilder::<C>::new();
        C::declare(&mut builder);
        builder.build()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `TypeId` of the declaring Rust type
    #[must_use]
    pub fn class_id(&self) -> TypeId {
        self.type_id
    }

    /// Full path of the declaring Rust type
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    #[must_use]
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn get_method(&self, name: &str) -> Result<Arc<ComponentMethod>, LookupError> {
        self.methods
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| LookupError::MethodNotFound {
                component: self.name.clone(),
                method: name.to_string(),
            })
    }

    /// Methods in declaration order
    pub fn methods(&self) -> impl Iterator<Item = &Arc<ComponentMethod>> {
        self.methods.values()
    }
}
