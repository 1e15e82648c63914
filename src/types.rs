//! # Declared Types
//!
//! Every argument, return value and exception attribute declared on a component
//! is described by a [`TypeInfo`]. The same descriptor drives three things:
//!
//! - request payload conversion (see [`crate::converters`])
//! - path/query coercion in the argument resolvers
//! - schema synthesis (see [`crate::schema`])
//!
//! Primitive Rust types get their descriptor through the [`ApiType`] trait. Structured
//! types describe themselves with an [`ObjectType`]:
//!
//! ```rust
//! use apibind::types::{ApiType, ObjectType, TypeInfo};
//! use serde_json::json;
//!
//! struct UserDto;
//!
//! impl ApiType for UserDto {
//!     fn type_info() -> TypeInfo {
//!         ObjectType::new("UserDTO")
//!             .field::<String>("name")
//!             .field_with_default::<String>("surname", json!(""))
//!             .field::<Option<i64>>("age")
//!             .into_type()
//!     }
//! }
//!
//! assert!(UserDto::type_info().as_object().is_some());
//! ```

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Descriptor of a declared type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeInfo {
    /// No value (a method without a return value)
    None,
    /// Any JSON value, passed through unconverted
    Any,
    Boolean,
    Integer,
    Number,
    String,
    /// A value that may be absent or `null`
    Optional(Box<TypeInfo>),
    List(Box<TypeInfo>),
    Object(Arc<ObjectType>),
    /// The framework's inbound request representation
    Request,
}

impl TypeInfo {
    pub fn optional(inner: TypeInfo) -> Self {
        TypeInfo::Optional(Box::new(inner))
    }

    pub fn list(inner: TypeInfo) -> Self {
        TypeInfo::List(Box::new(inner))
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, TypeInfo::Optional(_))
    }

    /// The wrapped type for optionals, `self` otherwise
    #[must_use]
    pub fn without_optional(&self) -> &TypeInfo {
        match self {
            TypeInfo::Optional(inner) => inner.without_optional(),
            other => other,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectType> {
        match self.without_optional() {
            TypeInfo::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// True for types that can be read from a single path or query string
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self.without_optional(),
            TypeInfo::Boolean | TypeInfo::Integer | TypeInfo::Number | TypeInfo::String
        )
    }

    /// Stable name used to key custom converters
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            TypeInfo::None => "none".to_string(),
            TypeInfo::Any => "any".to_string(),
            TypeInfo::Boolean => "bool".to_string(),
            TypeInfo::Integer => "int".to_string(),
            TypeInfo::Number => "float".to_string(),
            TypeInfo::String => "str".to_string(),
            TypeInfo::Optional(inner) => format!("optional[{}]", inner.name()),
            TypeInfo::List(inner) => format!("list[{}]", inner.name()),
            TypeInfo::Object(obj) => obj.name.clone(),
            TypeInfo::Request => "request".to_string(),
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A structured type with named fields (the equivalent of a dataclass)
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub name: String,
    /// Docstring: summary, long description and an `Attributes` table
    pub doc: Option<String>,
    pub fields: Vec<FieldInfo>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn field<T: ApiType>(self, name: impl Into<String>) -> Self {
        self.field_of(name, T::type_info(), None)
    }

    #[must_use]
    pub fn field_with_default<T: ApiType>(self, name: impl Into<String>, default: Value) -> Self {
        self.field_of(name, T::type_info(), Some(default))
    }

    #[must_use]
    pub fn field_of(mut self, name: impl Into<String>, ty: TypeInfo, default: Option<Value>) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            ty,
            default,
        });
        self
    }

    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn into_type(self) -> TypeInfo {
        TypeInfo::Object(Arc::new(self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: TypeInfo,
    pub default: Option<Value>,
}

impl FieldInfo {
    /// A field must be supplied on input unless it has a default or is optional
    #[must_use]
    pub fn is_required_on_input(&self) -> bool {
        self.default.is_none() && !self.ty.is_optional()
    }
}

/// Types that can describe themselves as a [`TypeInfo`]
pub trait ApiType {
    fn type_info() -> TypeInfo;
}

macro_rules! impl_api_type {
    ($variant:ident => $($ty:ty),+) => {
        $(
            impl ApiType for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::$variant
                }
            }
        )+
    };
}

impl_api_type!(Integer => i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);
impl_api_type!(Number => f32, f64);
impl_api_type!(Boolean => bool);
impl_api_type!(String => String);
impl_api_type!(Any => Value);

impl ApiType for () {
    fn type_info() -> TypeInfo {
        TypeInfo::None
    }
}

impl<T: ApiType> ApiType for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::optional(T::type_info())
    }
}

impl<T: ApiType> ApiType for Vec<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::list(T::type_info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_descriptors() {
        assert_eq!(i64::type_info(), TypeInfo::Integer);
        assert_eq!(u8::type_info(), TypeInfo::Integer);
        assert_eq!(f64::type_info(), TypeInfo::Number);
        assert_eq!(String::type_info(), TypeInfo::String);
        assert_eq!(<()>::type_info(), TypeInfo::None);
        assert_eq!(
            Option::<Vec<bool>>::type_info(),
            TypeInfo::optional(TypeInfo::list(TypeInfo::Boolean))
        );
    }

    #[test]
    fn test_names_are_stable() {
        assert_eq!(Option::<i32>::type_info().name(), "optional[int]");
        assert_eq!(Vec::<String>::type_info().name(), "list[str]");
        let obj = ObjectType::new("NestedDTO").field::<i64>("a").into_type();
        assert_eq!(obj.name(), "NestedDTO");
    }

    #[test]
    fn test_required_on_input() {
        let obj = ObjectType::new("UserDTO")
            .field::<String>("name")
            .field_with_default::<String>("surname", json!(""))
            .field::<Option<i64>>("age");
        let required: Vec<_> = obj
            .fields
            .iter()
            .filter(|f| f.is_required_on_input())
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(required, vec!["name"]);
    }

    #[test]
    fn test_as_object_sees_through_optional() {
        let ty = TypeInfo::optional(ObjectType::new("A").into_type());
        assert_eq!(ty.as_object().map(|o| o.name.as_str()), Some("A"));
        assert!(!ty.is_primitive());
        assert!(Option::<i32>::type_info().is_primitive());
    }
}
