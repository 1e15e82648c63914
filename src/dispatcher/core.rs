use crate::config::EngineConfig;
use crate::converters::{Converter, ConverterRegistry};
use crate::core::{ApiComponent, Arguments, Component, ComponentMethod};
use crate::error::{BuildError, ConfigurationError, DispatchError};
use crate::exceptions::{
    exception_handlers_registry, ApiException, ExceptionHandlersRegistry, HandlerEntry, MethodExceptionsManager,
};
use crate::interceptors::{Interceptor, InterceptorRegistry};
use crate::resolvers::{ArgumentResolver, ArgumentsResolver};
use crate::router::{RouteMatch, RouteRegistry, Router};
use crate::schema::SwaggerDocument;
use crate::types::TypeInfo;
use crate::validator;
use crate::web::{HttpRequest, HttpResponse, ResponseHeaders};
use http::StatusCode;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type Instance = Arc<dyn Any + Send + Sync>;
type MethodKey = (TypeId, String);

/// Collects everything an [`ApiEngine`] needs before validation runs
pub struct ApiEngineBuilder {
    components: Vec<(Arc<Component>, Instance)>,
    errors: Vec<ConfigurationError>,
    resolvers: Vec<Arc<dyn ArgumentResolver>>,
    interceptors: InterceptorRegistry,
    converters: ConverterRegistry,
    exception_handlers: Option<Arc<ExceptionHandlersRegistry>>,
    config: Option<EngineConfig>,
}

impl ApiEngineBuilder {
    fn new() -> Self {
        Self {
            components: Vec::new(),
            errors: Vec::new(),
            resolvers: Vec::new(),
            interceptors: InterceptorRegistry::new(),
            converters: ConverterRegistry::new(),
            exception_handlers: None,
            config: None,
        }
    }

    /// Register a component instance. Its metadata is built (or fetched from the
    /// process-wide cache) immediately; errors surface from [`build`](Self::build).
    #[must_use]
    pub fn component<C: ApiComponent>(mut self, instance: C) -> Self {
        match Component::get_by_cls::<C>() {
            Ok(component) => {
                if self.components.iter().any(|(c, _)| c.class_id() == component.class_id()) {
                    warn!(component = %component.name(), "Component registered twice, keeping the first instance");
                } else {
                    let instance: Instance = Arc::new(instance);
                    self.components.push((component, instance));
                }
            }
            Err(err) => self.errors.extend(err.errors),
        }
        self
    }

    /// Custom resolvers run after the built-in chain
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn ArgumentResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.add_interceptor(interceptor);
        self
    }

    #[must_use]
    pub fn converter(mut self, type_name: impl Into<String>, converter: Arc<dyn Converter>) -> Self {
        self.converters.register(type_name, converter);
        self
    }

    /// Use a private registry instead of the process-wide one
    #[must_use]
    pub fn exception_handlers(mut self, registry: Arc<ExceptionHandlersRegistry>) -> Self {
        self.exception_handlers = Some(registry);
        self
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Run every build-time check and assemble the engine.
    ///
    /// All problems are collected before failing: duplicate routes, arguments
    /// no resolver claims or several claim, conflicting exception statuses and
    /// two component types sharing a name.
    pub fn build(self) -> Result<ApiEngine, BuildError> {
        let config = self.config.unwrap_or_else(EngineConfig::from_env);
        let exception_handlers = self
            .exception_handlers
            .unwrap_or_else(|| shared_registry_for(&config));

        let mut resolver = ArgumentsResolver::with_defaults(Arc::new(self.converters));
        for custom in self.resolvers {
            resolver.add_resolver(custom);
        }

        let mut errors = self.errors;
        let mut routes = RouteRegistry::new();
        let mut managers = HashMap::new();
        let mut instances = HashMap::new();
        let mut components: Vec<Arc<Component>> = Vec::with_capacity(self.components.len());

        for (component, instance) in self.components {
            if let Some(first) = components.iter().find(|c| c.name() == component.name()) {
                errors.push(ConfigurationError::DuplicateComponentName {
                    name: component.name().to_string(),
                    first: first.type_name().to_string(),
                    second: component.type_name().to_string(),
                });
            }
            errors.extend(routes.register_component(&component));
            for method in component.methods() {
                errors.extend(resolver.validate(method));
                match MethodExceptionsManager::new(method, Arc::clone(&exception_handlers)) {
                    Ok(manager) => {
                        managers.insert((component.class_id(), method.name().to_string()), manager);
                    }
                    Err(err) => errors.push(err),
                }
            }
            instances.insert(component.class_id(), instance);
            components.push(component);
        }

        validator::fail_if_issues(errors)?;

        let router = Router::new(&routes);
        info!(
            components_count = components.len(),
            routes_count = routes.len(),
            "Engine built"
        );

        Ok(ApiEngine {
            components,
            instances,
            router,
            resolver,
            interceptors: self.interceptors,
            managers,
            exception_handlers,
            config,
        })
    }
}

fn shared_registry_for(config: &EngineConfig) -> Arc<ExceptionHandlersRegistry> {
    let shared = exception_handlers_registry();
    if shared.problem_type_prefix() == config.problem_type_prefix {
        shared
    } else {
        debug!(
            prefix = %config.problem_type_prefix,
            "Problem type prefix differs from the shared registry, using a private one"
        );
        Arc::new(ExceptionHandlersRegistry::with_defaults(config.problem_type_prefix.clone()))
    }
}

/// A validated set of components ready to serve requests.
///
/// Immutable after [`ApiEngineBuilder::build`]; `dispatch` takes `&self` and can
/// be called from any number of threads.
pub struct ApiEngine {
    components: Vec<Arc<Component>>,
    instances: HashMap<TypeId, Instance>,
    router: Router,
    resolver: ArgumentsResolver,
    interceptors: InterceptorRegistry,
    managers: HashMap<MethodKey, MethodExceptionsManager>,
    exception_handlers: Arc<ExceptionHandlersRegistry>,
    config: EngineConfig,
}

impl fmt::Debug for ApiEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiEngine")
            .field("components", &self.components.iter().map(|c| c.name()).collect::<Vec<_>>())
            .field("routes", &self.router.get_all_path_patterns())
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

impl ApiEngine {
    #[must_use]
    pub fn builder() -> ApiEngineBuilder {
        ApiEngineBuilder::new()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Components in registration order
    #[must_use]
    pub fn components(&self) -> &[Arc<Component>] {
        &self.components
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn exception_handlers(&self) -> &Arc<ExceptionHandlersRegistry> {
        &self.exception_handlers
    }

    /// Build the Swagger 2.0 document for every registered component
    pub fn swagger_document(&self) -> Result<SwaggerDocument, ConfigurationError> {
        SwaggerDocument::build(self)
    }

    /// Run one request through routing, interceptors, argument resolution,
    /// invocation and exception translation.
    pub fn dispatch(&self, mut request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        let Some(route_match) = self.router.route(request.method(), request.path()) else {
            return Err(DispatchError::RouteNotFound {
                method: request.method().clone(),
                path: request.path().to_string(),
            });
        };
        request.set_path_params(route_match.path_params.clone());

        let method = &route_match.method;
        let mut headers = ResponseHeaders::new();
        let arguments = match self.prepare(method, request, &mut headers) {
            Ok(arguments) => arguments,
            Err(exception) => {
                let entry = self.exception_handlers.get_handler(exception.class());
                return self.exception_response(method, entry, exception, headers);
            }
        };
        match self.invoke(&route_match, &arguments) {
            Ok(value) => Ok(self.success_response(method, value, headers)),
            Err(exception) => {
                let entry = self
                    .managers
                    .get(&(route_match.component.class_id(), method.name().to_string()))
                    .and_then(|manager| manager.get_handler(&exception));
                self.exception_response(method, entry, exception, headers)
            }
        }
    }

    /// Interceptors and argument resolution. Exceptions raised here are not
    /// declared by the method and are translated by the shared registry.
    fn prepare(
        &self,
        method: &ComponentMethod,
        request: HttpRequest,
        headers: &mut ResponseHeaders,
    ) -> Result<Arguments, ApiException> {
        self.interceptors.pre_handle(method, &request, headers)?;
        self.resolver.resolve_arguments(method, request, headers)
    }

    fn invoke(&self, route_match: &RouteMatch, arguments: &Arguments) -> Result<Value, ApiException> {
        let instance = self
            .instances
            .get(&route_match.component.class_id())
            .ok_or_else(|| ApiException::internal(format!("no instance for `{}`", route_match.component.name())))?;
        route_match.method.invoke(instance.as_ref(), arguments)
    }

    fn success_response(&self, method: &ComponentMethod, value: Value, headers: ResponseHeaders) -> HttpResponse {
        let status = method.annotations().response_status().unwrap_or(StatusCode::OK);
        let body = match method.return_type() {
            TypeInfo::None => None,
            _ => Some(value),
        };
        let content_type = body.as_ref().map(|_| {
            method
                .route()
                .and_then(|route| route.produces.first().cloned())
                .unwrap_or_else(|| self.config.default_media_type.clone())
        });
        debug!(handler_name = %method.qualified_name(), status = status.as_u16(), "Handler execution complete");
        HttpResponse {
            status,
            headers,
            body,
            content_type,
        }
    }

    fn exception_response(
        &self,
        method: &ComponentMethod,
        entry: Option<HandlerEntry>,
        exception: ApiException,
        mut headers: ResponseHeaders,
    ) -> Result<HttpResponse, DispatchError> {
        let Some(entry) = entry else {
            error!(
                handler_name = %method.qualified_name(),
                exception = %exception.class(),
                detail = %exception.detail(),
                "Unhandled exception"
            );
            return Err(DispatchError::Unhandled(exception));
        };

        let body = entry.handler.handle(&exception, &mut headers);
        let content_type = match entry.handler.content_type() {
            Some(content_type) => Some(content_type.to_string()),
            None => body.as_ref().map(|_| self.config.default_media_type.clone()),
        };
        info!(
            handler_name = %method.qualified_name(),
            exception = %exception.class(),
            handled_as = %entry.exception,
            status = entry.status.as_u16(),
            "Exception handled"
        );
        Ok(HttpResponse {
            status: entry.status,
            headers,
            body,
            content_type,
        })
    }
}
