mod common;

use apibind::converters::{ConversionError, Converter, ConverterRegistry};
use apibind::core::{ApiComponent, ComponentBuilder, ComponentMethodArgument};
use apibind::exceptions::ApiException;
use apibind::resolvers::{ArgumentResolver, ResolvedArgument};
use apibind::types::{ObjectType, TypeInfo};
use apibind::web::{HttpRequest, ResponseHeaders};
use apibind::ApiEngine;
use common::{test_config, ItemsAPI, TestAPI};
use http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

/// Supplies `user_agent` arguments from the request header of the same name
#[derive(Debug)]
struct UserAgentResolver;

impl ArgumentResolver for UserAgentResolver {
    fn is_supported(&self, argument: &ComponentMethodArgument) -> bool {
        argument.name == "user_agent"
    }

    fn resolve_argument(
        &self,
        _argument: &ComponentMethodArgument,
        request: &HttpRequest,
        response_headers: &mut ResponseHeaders,
    ) -> Result<ResolvedArgument, ApiException> {
        response_headers.insert("vary", "user-agent");
        Ok(match request.header("user-agent") {
            Some(agent) => ResolvedArgument::Value(json!(agent)),
            None => ResolvedArgument::Missing,
        })
    }
}

#[derive(Debug, Default)]
struct AgentAPI;

impl ApiComponent for AgentAPI {
    fn declare(component: &mut ComponentBuilder<Self>) {
        component
            .method("whoami")
            .get("whoami/")
            .argument::<Option<String>>("user_agent")
            .returns::<String>()
            .handler(|_, args| {
                Ok(args
                    .get::<Option<String>>("user_agent")?
                    .unwrap_or_else(|| "anonymous".to_string()))
            });
    }
}

fn agent_engine() -> ApiEngine {
    ApiEngine::builder()
        .component(AgentAPI)
        .resolver(Arc::new(UserAgentResolver))
        .config(test_config())
        .build()
        .unwrap()
}

#[test]
fn test_custom_resolver_reads_header() {
    let engine = agent_engine();
    let response = engine
        .dispatch(HttpRequest::get("/whoami/").with_header("user-agent", "curl/8.0"))
        .unwrap();
    assert_eq!(response.body, Some(json!("curl/8.0")));
    assert_eq!(response.header("vary"), Some("user-agent"));

    let response = engine.dispatch(HttpRequest::get("/whoami/")).unwrap();
    assert_eq!(response.body, Some(json!("anonymous")));
}

#[test]
fn test_missing_custom_resolver_fails_the_build() {
    let err = ApiEngine::builder()
        .component(AgentAPI)
        .config(test_config())
        .build()
        .unwrap_err();
    assert!(err.contains("unresolved_argument"));
}

/// Claims every `category` argument, which the path resolver also claims on `ItemsAPI.search`
#[derive(Debug)]
struct CategoryResolver;

impl ArgumentResolver for CategoryResolver {
    fn is_supported(&self, argument: &ComponentMethodArgument) -> bool {
        argument.name == "category"
    }

    fn resolve_argument(
        &self,
        _argument: &ComponentMethodArgument,
        _request: &HttpRequest,
        _response_headers: &mut ResponseHeaders,
    ) -> Result<ResolvedArgument, ApiException> {
        Ok(ResolvedArgument::Value(json!("fixed")))
    }
}

#[test]
fn test_overlapping_resolvers_are_ambiguous() {
    let err = ApiEngine::builder()
        .component(ItemsAPI::default())
        .resolver(Arc::new(CategoryResolver))
        .config(test_config())
        .build()
        .unwrap_err();

    assert!(err.contains("ambiguous_argument"));
    let issue = &err.issues()[0];
    assert_eq!(issue.location, "ItemsAPI.search");
    assert!(issue.message.contains("CategoryResolver"), "{}", issue.message);
}

/// Parses readings like `"21.5C"` into `{"celsius": 21.5}`
#[derive(Debug)]
struct ReadingConverter;

impl Converter for ReadingConverter {
    fn convert(&self, data: &Value, _ty: &TypeInfo, _registry: &ConverterRegistry) -> Result<Value, ConversionError> {
        data.as_str()
            .and_then(|raw| raw.strip_suffix('C'))
            .and_then(|degrees| degrees.parse::<f64>().ok())
            .map(|celsius| json!({ "celsius": celsius }))
            .ok_or_else(|| ConversionError::single("", "expected a reading such as 21.5C"))
    }
}

fn reading_type() -> TypeInfo {
    ObjectType::new("Reading").field::<f64>("celsius").into_type()
}

#[derive(Debug, Default)]
struct ThermometerAPI;

impl ApiComponent for ThermometerAPI {
    fn declare(component: &mut ComponentBuilder<Self>) {
        component
            .method("record")
            .post("readings/")
            .request_body("reading")
            .argument_of("reading", reading_type(), None)
            .returns::<Value>()
            .handler(|_, args| args.get::<Value>("reading"));
    }
}

#[test]
fn test_custom_converter_shapes_request_body() {
    let engine = ApiEngine::builder()
        .component(ThermometerAPI)
        .converter("Reading", Arc::new(ReadingConverter))
        .config(test_config())
        .build()
        .unwrap();

    let response = engine
        .dispatch(HttpRequest::post("/readings/").with_json_body(json!("21.5C")))
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Some(json!({"celsius": 21.5})));

    let response = engine
        .dispatch(HttpRequest::post("/readings/").with_json_body(json!("warm")))
        .unwrap();
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.body.unwrap();
    assert_eq!(body["errors"][0]["message"], json!("expected a reading such as 21.5C"));
}

#[test]
fn test_input_serializer_rejects_missing_fields() {
    let engine = ApiEngine::builder()
        .component(TestAPI)
        .config(test_config())
        .build()
        .unwrap();

    let response = engine
        .dispatch(HttpRequest::post("/with-serializer/").with_json_body(json!({"surname": "Doe"})))
        .unwrap();
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.body.unwrap();
    assert_eq!(body["errors"][0]["field"], json!("name"));
    assert_eq!(body["errors"][0]["message"], json!("This field is required."));

    let response = engine
        .dispatch(HttpRequest::post("/with-serializer/").with_json_body(json!([1, 2])))
        .unwrap();
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
