use super::class::{ApiException, ExceptionClass, ProblemHandlingInfo, REDIRECT_EXCEPTION};
use super::problem::{default_title, default_type, Problem, PROBLEM_FIELDS};
use crate::config::EngineConfig;
use crate::types::{ObjectType, TypeInfo};
use crate::web::{MediaType, ResponseHeaders};
use http::StatusCode;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Translates a raised exception into a response body and headers
pub trait ExceptionHandler: Send + Sync + fmt::Debug {
    /// Produce the body (if any); headers may be written as a side effect
    fn handle(&self, exception: &ApiException, response_headers: &mut ResponseHeaders) -> Option<Value>;

    /// Declared body type for schema synthesis, `None` when the handler writes no body
    fn response_type(&self, class: &'static ExceptionClass) -> Option<TypeInfo> {
        let _ = class;
        None
    }

    /// Content type overriding the route's default for handled responses
    fn content_type(&self) -> Option<&'static str> {
        None
    }
}

/// Serializes the exception's public attributes
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributesExceptionHandler;

impl ExceptionHandler for AttributesExceptionHandler {
    fn handle(&self, exception: &ApiException, _response_headers: &mut ResponseHeaders) -> Option<Value> {
        if exception.class().attributes.is_none() && exception.attributes().is_empty() {
            return None;
        }
        Some(Value::Object(exception.attributes().clone()))
    }

    fn response_type(&self, class: &'static ExceptionClass) -> Option<TypeInfo> {
        class.attribute_type().map(ObjectType::into_type)
    }
}

/// Renders the problem convention for one exception class.
///
/// String attributes named `title`, `detail` or `type` on the raised exception
/// replace the values taken from [`ProblemHandlingInfo`] or derived from the
/// class. `status` always comes from the handling info. Other attributes become
/// extension fields.
#[derive(Debug, Clone)]
pub struct ProblemExceptionHandler {
    class: &'static ExceptionClass,
    info: ProblemHandlingInfo,
    type_prefix: String,
}

impl ProblemExceptionHandler {
    pub fn new(class: &'static ExceptionClass, info: ProblemHandlingInfo, type_prefix: impl Into<String>) -> Self {
        Self {
            class,
            info,
            type_prefix: type_prefix.into(),
        }
    }

    fn title(&self) -> String {
        self.info
            .title
            .map_or_else(|| default_title(self.class.name), str::to_string)
    }

    fn type_url(&self) -> String {
        self.info
            .type_
            .map_or_else(|| default_type(&self.type_prefix, self.class.name), str::to_string)
    }
}

impl ExceptionHandler for ProblemExceptionHandler {
    fn handle(&self, exception: &ApiException, response_headers: &mut ResponseHeaders) -> Option<Value> {
        if let Some(seconds) = exception.retry_after() {
            response_headers.insert("retry-after", seconds.to_string());
        }
        let attribute = |name: &str| exception.attributes().get(name).and_then(Value::as_str).map(str::to_string);
        let title = attribute("title").unwrap_or_else(|| self.title());
        let detail = attribute("detail").unwrap_or_else(|| match self.info.detail {
            Some(detail) => detail.to_string(),
            None => exception.detail().to_string(),
        });
        let type_url = attribute("type").unwrap_or_else(|| self.type_url());
        let problem = exception.attributes().iter().fold(
            Problem::new(self.info.status, title, detail).with_type(type_url),
            |problem, (name, value)| problem.with_extension(name.clone(), value.clone()),
        );
        serde_json::to_value(problem).ok()
    }

    fn response_type(&self, class: &'static ExceptionClass) -> Option<TypeInfo> {
        let mut object = ObjectType::new(class.name)
            .field::<i64>("status")
            .field::<String>("title")
            .field::<String>("detail")
            .field::<String>("type");
        if let Some(doc) = class.doc {
            object = object.doc(doc);
        }
        if let Some(attributes) = class.attribute_type() {
            for field in attributes.fields {
                if !PROBLEM_FIELDS.contains(&field.name.as_str()) {
                    object.fields.push(field);
                }
            }
        }
        Some(object.into_type())
    }

    fn content_type(&self) -> Option<&'static str> {
        Some(MediaType::APPLICATION_PROBLEM_JSON)
    }
}

/// Writes the redirect target into `Location`; no body
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectExceptionHandler;

impl ExceptionHandler for RedirectExceptionHandler {
    fn handle(&self, exception: &ApiException, response_headers: &mut ResponseHeaders) -> Option<Value> {
        if let Some(location) = exception.redirect_to() {
            response_headers.insert("location", location);
        }
        None
    }
}

type HandleFn = dyn Fn(&ApiException, &mut ResponseHeaders) -> Option<Value> + Send + Sync;

/// Handler built from a closure, with an explicitly declared body type
#[derive(Clone)]
pub struct FnExceptionHandler {
    handle: Arc<HandleFn>,
    response_type: Option<TypeInfo>,
}

impl FnExceptionHandler {
    pub fn new<F>(handle: F) -> Self
    where
        F: Fn(&ApiException, &mut ResponseHeaders) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            handle: Arc::new(handle),
            response_type: None,
        }
    }

    #[must_use]
    pub fn with_response_type(mut self, response_type: TypeInfo) -> Self {
        self.response_type = Some(response_type);
        self
    }
}

impl fmt::Debug for FnExceptionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExceptionHandler")
            .field("response_type", &self.response_type)
            .finish_non_exhaustive()
    }
}

impl ExceptionHandler for FnExceptionHandler {
    fn handle(&self, exception: &ApiException, response_headers: &mut ResponseHeaders) -> Option<Value> {
        (self.handle)(exception, response_headers)
    }

    fn response_type(&self, _class: &'static ExceptionClass) -> Option<TypeInfo> {
        self.response_type.clone()
    }
}

/// Registered translation of an exception class
#[derive(Debug, Clone)]
pub struct HandlerEntry {
    pub exception: &'static ExceptionClass,
    pub status: StatusCode,
    pub handler: Arc<dyn ExceptionHandler>,
}

impl HandlerEntry {
    /// Body type this entry documents for its own exception class
    #[must_use]
    pub fn response_type(&self) -> Option<TypeInfo> {
        self.handler.response_type(self.exception)
    }
}

/// Exception class -> handler registry consulted after method-scoped handlers.
///
/// Lookup walks the class chain nearest first. Classes carrying
/// [`ProblemHandlingInfo`] get a problem handler generated on first lookup.
#[derive(Debug)]
pub struct ExceptionHandlersRegistry {
    entries: RwLock<Vec<HandlerEntry>>,
    problem_type_prefix: String,
}

impl ExceptionHandlersRegistry {
    pub fn new(problem_type_prefix: impl Into<String>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            problem_type_prefix: problem_type_prefix.into(),
        }
    }

    /// Registry with the redirect handler pre-registered; validation and throttle
    /// classes are problem classes and need no explicit entry
    pub fn with_defaults(problem_type_prefix: impl Into<String>) -> Self {
        let registry = Self::new(problem_type_prefix);
        registry.add_handler(&REDIRECT_EXCEPTION, StatusCode::FOUND, Arc::new(RedirectExceptionHandler));
        registry
    }

    #[must_use]
    pub fn problem_type_prefix(&self) -> &str {
        &self.problem_type_prefix
    }

    /// Register (or replace) the handler for `exception`
    pub fn add_handler(
        &self,
        exception: &'static ExceptionClass,
        status: StatusCode,
        handler: Arc<dyn ExceptionHandler>,
    ) {
        let entry = HandlerEntry {
            exception,
            status,
            handler,
        };
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.exception == exception) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        debug!(exception = %exception, status = status.as_u16(), "Exception handler registered");
    }

    pub fn get_handler(&self, exception: &'static ExceptionClass) -> Option<HandlerEntry> {
        for ancestor in exception.ancestors() {
            if let Some(entry) = self.find(ancestor) {
                return Some(entry);
            }
            if let Some(info) = ancestor.problem {
                return Some(self.register_problem(ancestor, info));
            }
        }
        None
    }

    fn find(&self, exception: &ExceptionClass) -> Option<HandlerEntry> {
        self.entries.read().iter().find(|e| e.exception == exception).cloned()
    }

    fn register_problem(&self, exception: &'static ExceptionClass, info: ProblemHandlingInfo) -> HandlerEntry {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.iter().find(|e| e.exception == exception) {
            return existing.clone();
        }
        let entry = HandlerEntry {
            exception,
            status: info.status,
            handler: Arc::new(ProblemExceptionHandler::new(exception, info, self.problem_type_prefix.clone())),
        };
        entries.push(entry.clone());
        debug!(exception = %exception, status = info.status.as_u16(), "Problem handler generated");
        entry
    }
}

static EXCEPTION_HANDLERS: Lazy<Arc<ExceptionHandlersRegistry>> = Lazy::new(|| {
    Arc::new(ExceptionHandlersRegistry::with_defaults(
        EngineConfig::from_env().problem_type_prefix,
    ))
});

/// Process-wide fallback registry
pub fn exception_handlers_registry() -> Arc<ExceptionHandlersRegistry> {
    Arc::clone(&EXCEPTION_HANDLERS)
}
