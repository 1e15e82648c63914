//! # Converters
//!
//! Turn raw request data into values shaped like a declared [`TypeInfo`].
//!
//! - [`ConverterRegistry::convert`] handles JSON payloads: primitives are checked,
//!   objects are rebuilt field by field (defaults filled, unknown keys dropped),
//!   lists are converted element-wise. A custom [`Converter`] registered for a type
//!   name takes precedence over the structural rules.
//! - [`coerce_str`] handles single path/query strings.
//! - [`InputSerializer`] validates a payload against a declared field list before
//!   it is converted, like a form serializer would.
//!
//! Every problem found in a payload is collected into one [`ConversionError`].

use crate::types::TypeInfo;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionIssue {
    /// Dotted path of the offending field, empty for the payload itself
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid payload: {}", render(.issues))]
pub struct ConversionError {
    pub issues: Vec<ConversionIssue>,
}

impl ConversionError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ConversionIssue {
                field: field.into(),
                message: message.into(),
            }],
        }
    }
}

fn render(issues: &[ConversionIssue]) -> String {
    issues
        .iter()
        .map(|issue| {
            if issue.field.is_empty() {
                issue.message.clone()
            } else {
                format!("{}: {}", issue.field, issue.message)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// User-supplied conversion for one declared type
pub trait Converter: Send + Sync + fmt::Debug {
    fn convert(&self, data: &Value, ty: &TypeInfo, registry: &ConverterRegistry) -> Result<Value, ConversionError>;
}

/// Converters keyed by declared type name
#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    custom: HashMap<String, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_name: impl Into<String>, converter: Arc<dyn Converter>) {
        self.custom.insert(type_name.into(), converter);
    }

    #[must_use]
    pub fn has_converter(&self, type_name: &str) -> bool {
        self.custom.contains_key(type_name)
    }

    pub fn convert(&self, data: &Value, ty: &TypeInfo) -> Result<Value, ConversionError> {
        let mut issues = Vec::new();
        let value = self.convert_at(data, ty, "", &mut issues);
        if issues.is_empty() {
            Ok(value)
        } else {
            Err(ConversionError { issues })
        }
    }

    fn convert_at(&self, data: &Value, ty: &TypeInfo, path: &str, issues: &mut Vec<ConversionIssue>) -> Value {
        if let Some(converter) = self.custom.get(&ty.name()) {
            return match converter.convert(data, ty, self) {
                Ok(value) => value,
                Err(err) => {
                    issues.extend(err.issues.into_iter().map(|issue| ConversionIssue {
                        field: join_path(path, &issue.field),
                        message: issue.message,
                    }));
                    Value::Null
                }
            };
        }

        let fail = |issues: &mut Vec<ConversionIssue>, message: &str| {
            issues.push(ConversionIssue {
                field: path.to_string(),
                message: message.to_string(),
            });
            Value::Null
        };

        match ty {
            TypeInfo::None => Value::Null,
            TypeInfo::Any | TypeInfo::Request => data.clone(),
            TypeInfo::Boolean if data.is_boolean() => data.clone(),
            TypeInfo::Boolean => fail(issues, "must be a boolean"),
            TypeInfo::Integer if data.is_i64() || data.is_u64() => data.clone(),
            TypeInfo::Integer => fail(issues, "must be an integer"),
            TypeInfo::Number if data.is_number() => data.clone(),
            TypeInfo::Number => fail(issues, "must be a number"),
            TypeInfo::String if data.is_string() => data.clone(),
            TypeInfo::String => fail(issues, "must be a string"),
            TypeInfo::Optional(_) if data.is_null() => Value::Null,
            TypeInfo::Optional(inner) => self.convert_at(data, inner, path, issues),
            TypeInfo::List(inner) => match data.as_array() {
                Some(items) => Value::Array(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| self.convert_at(item, inner, &join_path(path, &i.to_string()), issues))
                        .collect(),
                ),
                None => fail(issues, "must be a list"),
            },
            TypeInfo::Object(object) => {
                let Some(input) = data.as_object() else {
                    return fail(issues, "must be an object");
                };
                let mut output = Map::new();
                for field in &object.fields {
                    let field_path = join_path(path, &field.name);
                    let value = match input.get(&field.name) {
                        Some(value) if !(value.is_null() && !field.ty.is_optional()) => {
                            self.convert_at(value, &field.ty, &field_path, issues)
                        }
                        _ => match (&field.default, field.ty.is_optional()) {
                            (Some(default), _) => default.clone(),
                            (None, true) => Value::Null,
                            (None, false) => {
                                issues.push(ConversionIssue {
                                    field: field_path,
                                    message: "field is required".to_string(),
                                });
                                continue;
                            }
                        },
                    };
                    output.insert(field.name.clone(), value);
                }
                Value::Object(output)
            }
        }
    }
}

fn join_path(parent: &str, child: &str) -> String {
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}.{child}"),
    }
}

/// Coerce one path or query string to a primitive declared type
pub fn coerce_str(raw: &str, ty: &TypeInfo) -> Result<Value, String> {
    match ty {
        TypeInfo::Optional(inner) => coerce_str(raw, inner),
        TypeInfo::String | TypeInfo::Any => Ok(Value::String(raw.to_string())),
        TypeInfo::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("'{raw}' is not a valid integer")),
        TypeInfo::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("'{raw}' is not a valid number")),
        TypeInfo::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(format!("'{raw}' is not a valid boolean")),
        },
        other => Err(format!("cannot read {other} from a string")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Char,
    Integer,
    Float,
    Boolean,
}

/// One declared serializer field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub allow_blank: bool,
    pub label: Option<String>,
    pub max_length: Option<usize>,
}

impl SerializerField {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            allow_blank: false,
            label: None,
            max_length: None,
        }
    }

    pub fn char(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Char)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn allow_blank(mut self) -> Self {
        self.allow_blank = true;
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Human label: explicit label, else `first_name` -> `First name`
    #[must_use]
    pub fn title(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        let spaced = self.name.replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn validate(&self, value: &Value) -> Result<Value, String> {
        if value.is_null() {
            return Err("This field may not be null.".to_string());
        }
        match self.kind {
            FieldKind::Char => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return Err("Not a valid string.".to_string()),
                };
                if !self.allow_blank && text.trim().is_empty() {
                    return Err("This field may not be blank.".to_string());
                }
                if let Some(max) = self.max_length.filter(|&max| text.chars().count() > max) {
                    return Err(format!("Ensure this field has no more than {max} characters."));
                }
                Ok(Value::String(text))
            }
            FieldKind::Integer => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| "A valid integer is required.".to_string()),
                _ => Err("A valid integer is required.".to_string()),
            },
            FieldKind::Float => match value {
                Value::Number(_) => Ok(value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| "A valid number is required.".to_string()),
                _ => Err("A valid number is required.".to_string()),
            },
            FieldKind::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                other => coerce_str(other.as_str().unwrap_or_default(), &TypeInfo::Boolean)
                    .map_err(|_| "Must be a valid boolean.".to_string()),
            },
        }
    }
}

/// Declared field list validating a request body before conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSerializer {
    pub name: String,
    pub fields: Vec<SerializerField>,
}

impl InputSerializer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: SerializerField) -> Self {
        self.fields.push(field);
        self
    }

    /// Definition name: `UserSerializer` -> `User`
    #[must_use]
    pub fn reference_name(&self) -> &str {
        match self.name.strip_suffix("Serializer") {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => &self.name,
        }
    }

    /// Validated data restricted to the declared fields
    pub fn validate(&self, data: &Value) -> Result<Map<String, Value>, ConversionError> {
        let Some(input) = data.as_object() else {
            return Err(ConversionError::single("", "Invalid data. Expected a dictionary."));
        };
        let mut issues = Vec::new();
        let mut output = Map::new();
        for field in &self.fields {
            match input.get(&field.name) {
                None if field.required => issues.push(ConversionIssue {
                    field: field.name.clone(),
                    message: "This field is required.".to_string(),
                }),
                None => {}
                Some(value) => match field.validate(value) {
                    Ok(value) => {
                        output.insert(field.name.clone(), value);
                    }
                    Err(message) => issues.push(ConversionIssue {
                        field: field.name.clone(),
                        message,
                    }),
                },
            }
        }
        if issues.is_empty() {
            Ok(output)
        } else {
            Err(ConversionError { issues })
        }
    }
}
