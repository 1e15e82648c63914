use crate::converters::{ConversionError, ConversionIssue};
use crate::types::{ObjectType, TypeInfo};
use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Marks an exception class whose responses follow the problem body convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemHandlingInfo {
    pub status: StatusCode,
    pub title: Option<&'static str>,
    pub detail: Option<&'static str>,
    pub type_: Option<&'static str>,
}

impl ProblemHandlingInfo {
    pub const fn new(status: StatusCode) -> Self {
        Self {
            status,
            title: None,
            detail: None,
            type_: None,
        }
    }

    pub const fn with_title(mut self, title: &'static str) -> Self {
        self.title = Some(title);
        self
    }

    pub const fn with_detail(mut self, detail: &'static str) -> Self {
        self.detail = Some(detail);
        self
    }

    pub const fn with_type(mut self, type_: &'static str) -> Self {
        self.type_ = Some(type_);
        self
    }
}

/// Static descriptor of an exception type.
///
/// Classes form a single-inheritance tree through `parent` and are compared by
/// identity, so each class must live in a `static`:
///
/// ```rust
/// use apibind::exceptions::{ExceptionClass, EXCEPTION};
///
/// static NOT_FOUND: ExceptionClass = ExceptionClass::new("NotFoundException").extends(&EXCEPTION);
///
/// assert!(NOT_FOUND.is_subclass_of(&EXCEPTION));
/// ```
pub struct ExceptionClass {
    pub name: &'static str,
    pub parent: Option<&'static ExceptionClass>,
    pub doc: Option<&'static str>,
    /// Public attributes carried by instances, used for bodies and schemas
    pub attributes: Option<fn() -> ObjectType>,
    pub problem: Option<ProblemHandlingInfo>,
}

impl ExceptionClass {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            parent: None,
            doc: None,
            attributes: None,
            problem: None,
        }
    }

    pub const fn extends(mut self, parent: &'static ExceptionClass) -> Self {
        self.parent = Some(parent);
        self
    }

    pub const fn with_doc(mut self, doc: &'static str) -> Self {
        self.doc = Some(doc);
        self
    }

    pub const fn with_attributes(mut self, attributes: fn() -> ObjectType) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub const fn problem(mut self, info: ProblemHandlingInfo) -> Self {
        self.problem = Some(info);
        self
    }

    /// This class followed by its parents, nearest first
    pub fn ancestors(&'static self) -> impl Iterator<Item = &'static ExceptionClass> {
        std::iter::successors(Some(self), |class| class.parent)
    }

    #[must_use]
    pub fn is_subclass_of(&'static self, other: &ExceptionClass) -> bool {
        self.ancestors().any(|class| class == other)
    }

    /// Declared attribute type, if the class declares one
    #[must_use]
    pub fn attribute_type(&self) -> Option<ObjectType> {
        self.attributes.map(|attributes| attributes())
    }
}

impl PartialEq for ExceptionClass {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for ExceptionClass {}

impl fmt::Debug for ExceptionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionClass")
            .field("name", &self.name)
            .field("parent", &self.parent.map(|p| p.name))
            .field("problem", &self.problem)
            .finish()
    }
}

impl fmt::Display for ExceptionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Root of the hierarchy. Raised on its own it is never handled by default.
pub static EXCEPTION: ExceptionClass = ExceptionClass::new("Exception");

pub static REQUEST_VALIDATION_EXCEPTION: ExceptionClass = ExceptionClass::new("RequestValidationException")
    .extends(&EXCEPTION)
    .with_attributes(validation_attributes)
    .problem(ProblemHandlingInfo::new(StatusCode::BAD_REQUEST));

pub static REDIRECT_EXCEPTION: ExceptionClass = ExceptionClass::new("RedirectException").extends(&EXCEPTION);

pub static THROTTLE_EXCEPTION: ExceptionClass = ExceptionClass::new("ThrottleException")
    .extends(&EXCEPTION)
    .problem(ProblemHandlingInfo::new(StatusCode::TOO_MANY_REQUESTS));

fn validation_attributes() -> ObjectType {
    let issue = ObjectType::new("ValidationIssue")
        .field::<String>("field")
        .field::<String>("message")
        .into_type();
    ObjectType::new("RequestValidationException").field_of("errors", TypeInfo::list(issue), None)
}

/// A raised exception instance
#[derive(Debug, Clone, Error)]
#[error("{}: {detail}", .class.name)]
pub struct ApiException {
    class: &'static ExceptionClass,
    detail: String,
    attributes: Map<String, Value>,
    redirect_to: Option<String>,
    retry_after: Option<u64>,
}

impl ApiException {
    pub fn new(class: &'static ExceptionClass, detail: impl Into<String>) -> Self {
        Self {
            class,
            detail: detail.into(),
            attributes: Map::new(),
            redirect_to: None,
            retry_after: None,
        }
    }

    /// Exception whose public attributes are the serialized fields of `data`
    pub fn from_data<T: Serialize>(class: &'static ExceptionClass, detail: impl Into<String>, data: &T) -> Self {
        let mut exception = Self::new(class, detail);
        if let Ok(Value::Object(attributes)) = serde_json::to_value(data) {
            exception.attributes = attributes;
        }
        exception
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        let location = location.into();
        let mut exception = Self::new(&REDIRECT_EXCEPTION, format!("redirect to {location}"));
        exception.redirect_to = Some(location);
        exception
    }

    pub fn throttle(retry_after_secs: u64) -> Self {
        let mut exception = Self::new(&THROTTLE_EXCEPTION, "Too many requests");
        exception.retry_after = Some(retry_after_secs);
        exception
    }

    pub fn validation(detail: impl Into<String>, issues: &[ConversionIssue]) -> Self {
        let errors = issues
            .iter()
            .map(|issue| serde_json::json!({ "field": issue.field, "message": issue.message }))
            .collect();
        Self::new(&REQUEST_VALIDATION_EXCEPTION, detail).with_attribute("errors", Value::Array(errors))
    }

    /// Programming error inside the engine or a method body; unhandled unless registered
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(&EXCEPTION, detail)
    }

    #[must_use]
    pub fn class(&self) -> &'static ExceptionClass {
        self.class
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    #[must_use]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    #[must_use]
    pub fn redirect_to(&self) -> Option<&str> {
        self.redirect_to.as_deref()
    }

    #[must_use]
    pub fn retry_after(&self) -> Option<u64> {
        self.retry_after
    }

    #[must_use]
    pub fn is_instance_of(&self, class: &ExceptionClass) -> bool {
        self.class.is_subclass_of(class)
    }
}

impl From<ConversionError> for ApiException {
    fn from(err: ConversionError) -> Self {
        ApiException::validation(err.to_string(), &err.issues)
    }
}
