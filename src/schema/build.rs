use super::components::SchemaComponents;
use super::generation::{parameter_type, schema_for, Direction};
use super::types::{Operation, Parameter, ParameterLocation, Response, Schema, SchemaType};
use crate::core::{ComponentMethod, ComponentMethodArgument};
use crate::docstring::Docstring;
use crate::error::ConfigurationError;
use crate::exceptions::{exception_handlers_registry, ExceptionHandlersRegistry, MethodExceptionsManager};
use crate::router::Route;
use crate::types::TypeInfo;
use crate::web::MediaType;
use http::{Method, StatusCode};
use std::collections::BTreeMap;
use std::sync::Arc;

const TYPE_NOTE: &str = " (Note: parameter type can be wrong)";

/// Synthesizes one [`Operation`] from a method's static metadata.
///
/// No request is involved: parameters come from the route and the argument
/// declarations, descriptions from the docstring, and error responses from the
/// exceptions the method declares.
#[derive(Debug, Clone)]
pub struct SwaggerAutoSchema<'a> {
    method: Option<&'a ComponentMethod>,
    http_method: Method,
    exception_handlers: Arc<ExceptionHandlersRegistry>,
    default_media_type: String,
}

impl<'a> SwaggerAutoSchema<'a> {
    /// `method` is `None` for a view without any routed method
    #[must_use]
    pub fn new(method: Option<&'a ComponentMethod>, http_method: Method) -> Self {
        Self {
            method,
            http_method,
            exception_handlers: exception_handlers_registry(),
            default_media_type: MediaType::APPLICATION_JSON.to_string(),
        }
    }

    #[must_use]
    pub fn with_exception_handlers(mut self, registry: Arc<ExceptionHandlersRegistry>) -> Self {
        self.exception_handlers = registry;
        self
    }

    #[must_use]
    pub fn with_default_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.default_media_type = media_type.into();
        self
    }

    #[must_use]
    pub fn http_method(&self) -> &Method {
        &self.http_method
    }

    /// Build the operation. `operation_keys` is the tag path; its first key is the tag.
    pub fn get_operation(
        &self,
        operation_keys: &[&str],
        components: &mut SchemaComponents,
    ) -> Result<Operation, ConfigurationError> {
        let tags: Vec<String> = operation_keys.first().map(|t| (*t).to_string()).into_iter().collect();

        let Some((method, route)) = self.method.and_then(|m| m.route().map(|r| (m, r))) else {
            return Ok(self.unrouted_operation(operation_keys, tags));
        };

        let docstring = method.parsed_docstring();
        let mut parameters = Vec::new();
        if let Some(body) = self.body_parameter(method, components) {
            parameters.push(body);
        }
        parameters.extend(self.path_parameters(method, route, &docstring));
        parameters.extend(self.query_parameters(method, route, &docstring));

        Ok(Operation {
            operation_id: method.qualified_name(),
            description: docstring.description(),
            tags,
            parameters,
            consumes: self.media_types(&route.consumes),
            produces: self.media_types(&route.produces),
            responses: self.responses(method)?,
        })
    }

    fn unrouted_operation(&self, operation_keys: &[&str], tags: Vec<String>) -> Operation {
        let return_schema = self
            .method
            .and_then(|m| schema_for(m.return_type(), Direction::Response));
        let mut responses = BTreeMap::new();
        responses.insert(StatusCode::OK.as_u16().to_string(), Response::new(return_schema));
        Operation {
            operation_id: operation_keys.join("_"),
            description: Some(String::new()),
            tags,
            parameters: Vec::new(),
            consumes: vec![self.default_media_type.clone()],
            produces: vec![self.default_media_type.clone()],
            responses,
        }
    }

    fn media_types(&self, declared: &[String]) -> Vec<String> {
        if declared.is_empty() {
            vec![self.default_media_type.clone()]
        } else {
            declared.to_vec()
        }
    }

    fn body_parameter(&self, method: &ComponentMethod, components: &mut SchemaComponents) -> Option<Parameter> {
        let argument = method.get_argument(method.annotations().request_body_argument()?)?;
        let schema = match method.annotations().input_serializer() {
            Some(serializer) => components.register_serializer(serializer),
            None => schema_for(&argument.type_, Direction::Request).unwrap_or_default(),
        };
        Some(Parameter::body(schema))
    }

    fn path_parameters(&self, method: &ComponentMethod, route: &Route, docstring: &Docstring) -> Vec<Parameter> {
        route
            .path_variables()
            .filter_map(|name| method.get_argument(name))
            .map(|argument| {
                let mut description = param_description(docstring, &argument.name);
                let type_ = parameter_type(&argument.type_).unwrap_or_else(|| {
                    description.push_str(TYPE_NOTE);
                    SchemaType::String
                });
                Parameter::simple(argument.name.clone(), ParameterLocation::Path, description, true, type_)
            })
            .collect()
    }

    fn query_parameters(&self, method: &ComponentMethod, route: &Route, docstring: &Docstring) -> Vec<Parameter> {
        method
            .arguments()
            .iter()
            .filter_map(|argument| {
                let query = route.query_parameter_for(&argument.name)?;
                Some(query_parameter(&query.name, argument, docstring))
            })
            .collect()
    }

    fn responses(&self, method: &ComponentMethod) -> Result<BTreeMap<String, Response>, ConfigurationError> {
        let mut responses = BTreeMap::new();
        let success = method.annotations().response_status().unwrap_or(StatusCode::OK);
        responses.insert(
            success.as_u16().to_string(),
            Response::new(schema_for(method.return_type(), Direction::Response)),
        );

        let manager = MethodExceptionsManager::new(method, Arc::clone(&self.exception_handlers))?;
        for entry in manager.declared_handlers() {
            let schema = entry
                .response_type()
                .and_then(|ty| schema_for(&ty, Direction::Response));
            responses
                .entry(entry.status.as_u16().to_string())
                .or_insert_with(|| Response::new(schema));
        }
        Ok(responses)
    }
}

fn param_description(docstring: &Docstring, name: &str) -> String {
    docstring
        .param(name)
        .map(|p| p.description.clone())
        .unwrap_or_default()
}

fn query_parameter(query_name: &str, argument: &ComponentMethodArgument, docstring: &Docstring) -> Parameter {
    let mut description = param_description(docstring, query_name);
    let required = argument.default.is_none() && !argument.type_.is_optional();

    let mut parameter = match argument.type_.without_optional() {
        TypeInfo::List(item) => {
            let mut parameter =
                Parameter::simple(query_name, ParameterLocation::Query, String::new(), required, SchemaType::Array);
            parameter.items = Some(Box::new(
                parameter_type(item).map(Schema::of_type).unwrap_or_default(),
            ));
            parameter.collection_format = Some("multi".to_string());
            parameter
        }
        declared => {
            let type_ = parameter_type(declared).unwrap_or_else(|| {
                description.push_str(TYPE_NOTE);
                SchemaType::String
            });
            Parameter::simple(query_name, ParameterLocation::Query, String::new(), required, type_)
        }
    };
    parameter.description = Some(description);
    parameter.default = argument.default.clone();
    parameter
}
