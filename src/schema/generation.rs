//! Declared type -> schema.

use super::types::{Schema, SchemaType};
use crate::docstring;
use crate::types::{ObjectType, TypeInfo};

/// Whether a schema describes input or output; only `required` differs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Fields with a default or an optional type are not required
    Request,
    /// Every field is always present
    Response,
}

/// Schema for a declared type; `None` for no value and for the request itself
#[must_use]
pub fn schema_for(ty: &TypeInfo, direction: Direction) -> Option<Schema> {
    match ty {
        TypeInfo::None | TypeInfo::Request => None,
        TypeInfo::Any => Some(Schema::default()),
        TypeInfo::Boolean => Some(Schema::of_type(SchemaType::Boolean)),
        TypeInfo::Integer => Some(Schema::of_type(SchemaType::Integer)),
        TypeInfo::Number => Some(Schema::of_type(SchemaType::Number)),
        TypeInfo::String => Some(Schema::of_type(SchemaType::String)),
        TypeInfo::Optional(inner) => schema_for(inner, direction).map(|mut schema| {
            schema.x_nullable = true;
            schema
        }),
        TypeInfo::List(inner) => {
            let mut schema = Schema::of_type(SchemaType::Array);
            schema.items = Some(Box::new(schema_for(inner, direction).unwrap_or_default()));
            Some(schema)
        }
        TypeInfo::Object(object) => Some(object_schema(object, direction)),
    }
}

fn object_schema(object: &ObjectType, direction: Direction) -> Schema {
    let doc = object.doc.as_deref().map(docstring::parse).unwrap_or_default();
    let mut schema = Schema::of_type(SchemaType::Object);
    schema.title = Some(object.name.clone());
    schema.description = doc.description();

    for field in &object.fields {
        let attribute = doc.attribute(&field.name);
        let mut property = schema_for(&field.ty, direction).unwrap_or_default();
        if let Some(description) = attribute.map(|a| a.description.as_str()).filter(|d| !d.is_empty()) {
            property.description = Some(description.to_string());
        }
        let required = match direction {
            Direction::Response => true,
            Direction::Request => field.is_required_on_input() && !attribute.is_some_and(|a| a.optional),
        };
        if required {
            schema.required.push(field.name.clone());
        }
        schema.properties.insert(field.name.clone(), property);
    }
    schema
}

/// Primitive parameter type; `None` when the type cannot be read from a string
#[must_use]
pub fn parameter_type(ty: &TypeInfo) -> Option<SchemaType> {
    match ty.without_optional() {
        TypeInfo::Boolean => Some(SchemaType::Boolean),
        TypeInfo::Integer => Some(SchemaType::Integer),
        TypeInfo::Number => Some(SchemaType::Number),
        TypeInfo::String => Some(SchemaType::String),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_dto() -> TypeInfo {
        let nested = ObjectType::new("NestedDTO")
            .field::<i64>("a")
            .field::<String>("b")
            .into_type();
        ObjectType::new("UserDTO")
            .doc(
                "
                This is a short one line description.

                Attributes
                ----------
                name : str
                    user name
                nested_dto: NestedDTO
                    a nested dto object.
                age: int, optional
                    user age
                ",
            )
            .field::<String>("name")
            .field_of("nested_dto", nested, None)
            .field::<Option<i64>>("age")
            .into_type()
    }

    #[test]
    fn test_request_and_response_required_lists() {
        let request = schema_for(&user_dto(), Direction::Request).unwrap();
        assert_eq!(request.required, vec!["name", "nested_dto"]);
        let response = schema_for(&user_dto(), Direction::Response).unwrap();
        assert_eq!(response.required, vec!["name", "nested_dto", "age"]);
    }

    #[test]
    fn test_object_schema_shape() {
        let schema = schema_for(&user_dto(), Direction::Request).unwrap();
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "title": "UserDTO",
                "description": "This is a short one line description.",
                "type": "object",
                "properties": {
                    "name": {"description": "user name", "type": "string"},
                    "nested_dto": {
                        "title": "NestedDTO",
                        "description": "a nested dto object.",
                        "type": "object",
                        "properties": {"a": {"type": "integer"}, "b": {"type": "string"}},
                        "required": ["a", "b"]
                    },
                    "age": {"description": "user age", "type": "integer", "x-nullable": true}
                },
                "required": ["name", "nested_dto"]
            })
        );
    }

    #[test]
    fn test_void_and_list_types() {
        assert!(schema_for(&TypeInfo::None, Direction::Response).is_none());
        let list = schema_for(&TypeInfo::list(TypeInfo::Integer), Direction::Response).unwrap();
        assert_eq!(serde_json::to_value(list).unwrap(), json!({"type": "array", "items": {"type": "integer"}}));
        assert_eq!(parameter_type(&TypeInfo::optional(TypeInfo::Boolean)), Some(SchemaType::Boolean));
        assert_eq!(parameter_type(&user_dto()), None);
    }
}
