use super::types::{Schema, SchemaType};
use crate::converters::{FieldKind, InputSerializer};
use std::collections::BTreeMap;

/// Named definitions shared across operations (`#/definitions/...`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaComponents {
    definitions: BTreeMap<String, Schema>,
}

impl SchemaComponents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a serializer once under its reference name and return a `$ref` to it
    pub fn register_serializer(&mut self, serializer: &InputSerializer) -> Schema {
        let name = serializer.reference_name().to_string();
        let target = format!("#/definitions/{name}");
        self.definitions
            .entry(name)
            .or_insert_with(|| serializer_schema(serializer));
        Schema::reference(target)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.definitions.get(name)
    }

    #[must_use]
    pub fn definitions(&self) -> &BTreeMap<String, Schema> {
        &self.definitions
    }

    #[must_use]
    pub fn into_definitions(self) -> BTreeMap<String, Schema> {
        self.definitions
    }
}

fn serializer_schema(serializer: &InputSerializer) -> Schema {
    let mut schema = Schema::of_type(SchemaType::Object);
    for field in &serializer.fields {
        let mut property = Schema::of_type(match field.kind {
            FieldKind::Char => SchemaType::String,
            FieldKind::Integer => SchemaType::Integer,
            FieldKind::Float => SchemaType::Number,
            FieldKind::Boolean => SchemaType::Boolean,
        });
        property.title = Some(field.title());
        if field.kind == FieldKind::Char {
            if !field.allow_blank {
                property.min_length = Some(1);
            }
            property.max_length = field.max_length;
        }
        if field.required {
            schema.required.push(field.name.clone());
        }
        schema.properties.insert(field.name.clone(), property);
    }
    schema
}
