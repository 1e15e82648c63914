//! Shared component fixtures for the integration tests.
//!
//! Each test binary compiles this module separately and uses only part of it.
#![allow(dead_code)]

use apibind::converters::{InputSerializer, SerializerField};
use apibind::core::{ApiComponent, Arguments, ComponentBuilder, RouteAnnotation};
use apibind::dispatcher::ApiEngine;
use apibind::exceptions::{
    ApiException, AttributesExceptionHandler, ExceptionClass, ExceptionHandlersRegistry, FnExceptionHandler,
    ProblemHandlingInfo, EXCEPTION, REDIRECT_EXCEPTION, THROTTLE_EXCEPTION,
};
use apibind::interceptors::{MethodNameHeaderInterceptor, QueryFlagHeaderInterceptor};
use apibind::types::{ApiType, ObjectType, TypeInfo};
use apibind::web::MediaType;
use apibind::EngineConfig;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub const PROBLEM_TYPE_PREFIX: &str = "urn:problem-type:";

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

pub const USER_DTO_DOC: &str = "
    This is a short one line description.

    This is a long multi-line description.
    It spans multiple lines.

    Attributes
    ----------
    name : str
        user name
    nested_dto: NestedDTO
        a nested dto object.
        It contains some extra data.
    surname: str, optional
        user lastname
    age: int, optional
        user age
    ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedDto {
    pub a: i64,
    pub b: String,
}

impl ApiType for NestedDto {
    fn type_info() -> TypeInfo {
        ObjectType::new("NestedDTO")
            .field::<i64>("a")
            .field::<String>("b")
            .into_type()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub name: String,
    pub nested_dto: NestedDto,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub age: Option<i64>,
}

impl ApiType for UserDto {
    fn type_info() -> TypeInfo {
        ObjectType::new("UserDTO")
            .doc(USER_DTO_DOC)
            .field::<String>("name")
            .field::<NestedDto>("nested_dto")
            .field_with_default::<String>("surname", json!(""))
            .field::<Option<i64>>("age")
            .into_type()
    }
}

pub fn user_serializer() -> InputSerializer {
    InputSerializer::new("UserSerializer").field(SerializerField::char("name"))
}

// ---------------------------------------------------------------------------
// TestAPI: schema synthesis fixtures
// ---------------------------------------------------------------------------

pub const POST_DOC: &str = "
    This is post method

    This is a long multi-line text that provides a comprehensive description
    of all the details of the method.
    It is so long that does not fit in one line.
    So it spans multiple lines.
    :param path_param:
    :param query_param: some parameter description
    :param request_body:
    :return:
    ";

#[derive(Debug, Default)]
pub struct TestAPI;

impl ApiComponent for TestAPI {
    fn declare(component: &mut ComponentBuilder<Self>) {
        component
            .method("post")
            .route(
                RouteAnnotation::new(Method::POST, "{path_param}/{?query_param}")
                    .produces([MediaType::APPLICATION_JSON_UTF8])
                    .consumes([MediaType::APPLICATION_JSON_UTF8]),
            )
            .request_body("request_body")
            .argument::<i64>("path_param")
            .argument::<i64>("query_param")
            .argument::<UserDto>("request_body")
            .returns::<UserDto>()
            .doc(POST_DOC)
            .handler(|_, args| args.get::<UserDto>("request_body"));

        component
            .method("post_with_serializer")
            .post("with-serializer/")
            .input_serializer(user_serializer(), "request_body")
            .argument::<UserDto>("request_body")
            .returns::<UserDto>()
            .handler(|_, args| args.get::<UserDto>("request_body"));

        component.method("get").get("without-body/").handler(|_, _| Ok(()));
    }
}

// ---------------------------------------------------------------------------
// Exceptions
// ---------------------------------------------------------------------------

fn custom_exception_attributes() -> ObjectType {
    ObjectType::new("CustomExceptionDTO")
        .doc("CustomExceptionDTO(message: str)")
        .field::<String>("message")
}

pub static CUSTOM_EXCEPTION: ExceptionClass = ExceptionClass::new("CustomException")
    .extends(&EXCEPTION)
    .with_attributes(custom_exception_attributes);

pub static CHILD_CUSTOM_EXCEPTION: ExceptionClass =
    ExceptionClass::new("ChildCustomException").extends(&CUSTOM_EXCEPTION);

pub static EXCEPTION_WITHOUT_HANDLER: ExceptionClass =
    ExceptionClass::new("ExceptionWithoutHandler").extends(&EXCEPTION);

pub fn custom_exception(message: &str) -> ApiException {
    ApiException::new(&CUSTOM_EXCEPTION, message).with_attribute("message", json!(message))
}

/// Shared handlers for [`APIWithExceptions`]: `CustomException` answers 400 with its attributes
pub fn exceptions_registry() -> Arc<ExceptionHandlersRegistry> {
    let registry = ExceptionHandlersRegistry::with_defaults(PROBLEM_TYPE_PREFIX);
    registry.add_handler(&CUSTOM_EXCEPTION, StatusCode::BAD_REQUEST, Arc::new(AttributesExceptionHandler));
    Arc::new(registry)
}

#[derive(Debug, Default)]
pub struct APIWithExceptions;

impl ApiComponent for APIWithExceptions {
    fn declare(component: &mut ComponentBuilder<Self>) {
        component.route_prefix("with-exceptions/");

        component
            .method("declared_and_thrown")
            .get("declared_and_thrown/")
            .raises(&CUSTOM_EXCEPTION)
            .returns::<String>()
            .handler(|_, _| -> Result<String, ApiException> { Err(custom_exception("declared_and_thrown")) });

        component
            .method("declared_but_not_thrown")
            .get("declared_but_not_thrown/")
            .raises(&CUSTOM_EXCEPTION)
            .returns::<String>()
            .handler(|_, _| Ok("Hello, sir!".to_string()));

        component
            .method("not_declared_but_thrown")
            .get("not_declared_but_thrown/")
            .returns::<String>()
            .handler(|_, _| -> Result<String, ApiException> { Err(custom_exception("not_declared_but_thrown")) });

        component
            .method("declared_but_no_handler")
            .get("declared_but_no_handler/")
            .raises(&EXCEPTION_WITHOUT_HANDLER)
            .returns::<String>()
            .handler(|_, _| -> Result<String, ApiException> {
                Err(ApiException::new(&EXCEPTION_WITHOUT_HANDLER, "nobody handles this"))
            });

        component
            .method("with_custom_handler")
            .get("with_custom_handler/")
            .raises_with(
                &CUSTOM_EXCEPTION,
                StatusCode::UNAUTHORIZED,
                FnExceptionHandler::new(|_, _| Some(json!(21))).with_response_type(TypeInfo::Integer),
            )
            .returns::<String>()
            .handler(|_, _| -> Result<String, ApiException> { Err(custom_exception("with_custom_handler")) });

        component
            .method("exception_subclass_thrown")
            .get("exception_subclass_thrown/")
            .raises(&CUSTOM_EXCEPTION)
            .returns::<String>()
            .handler(|_, _| -> Result<String, ApiException> {
                Err(ApiException::new(&CHILD_CUSTOM_EXCEPTION, "child").with_attribute("message", json!("child")))
            });

        component
            .method("redirect")
            .get("redirect/")
            .raises(&REDIRECT_EXCEPTION)
            .handler(|_, _| -> Result<(), ApiException> { Err(ApiException::redirect("http://1.2.3.4/")) });
    }
}

// ---------------------------------------------------------------------------
// Problem exceptions
// ---------------------------------------------------------------------------

fn problem_dataclass_attributes() -> ObjectType {
    ObjectType::new("ProblemExistsDataclassException").field::<String>("custom_field")
}

pub static PROBLEM_EXISTS_EXCEPTION: ExceptionClass = ExceptionClass::new("ProblemExistsException")
    .extends(&EXCEPTION)
    .problem(ProblemHandlingInfo::new(StatusCode::FORBIDDEN));

pub static PROBLEM_EXISTS_DATACLASS_EXCEPTION: ExceptionClass =
    ExceptionClass::new("ProblemExistsDataclassException")
        .extends(&EXCEPTION)
        .with_doc(
            "ProblemExistsDataclassException(status: int, title: str, detail: str, type: str, custom_field: str)",
        )
        .with_attributes(problem_dataclass_attributes)
        .problem(ProblemHandlingInfo::new(StatusCode::FORBIDDEN));

pub static ALL_FIELD_CONST_PROBLEM_EXCEPTION: ExceptionClass = ExceptionClass::new("AllFieldConstProblemException")
    .extends(&EXCEPTION)
    .problem(
        ProblemHandlingInfo::new(StatusCode::NOT_FOUND)
            .with_title("All fields const title")
            .with_detail("All fields const detail")
            .with_type("urn:problem-type:all-field-const"),
    );

pub static INHERITED_PROBLEM_EXCEPTION: ExceptionClass =
    ExceptionClass::new("InheritedProblemExistsException").extends(&PROBLEM_EXISTS_EXCEPTION);

#[derive(Debug, Default)]
pub struct APIWithProblemExceptions;

impl ApiComponent for APIWithProblemExceptions {
    fn declare(component: &mut ComponentBuilder<Self>) {
        component.route_prefix("problem/");

        component
            .method("problem_exists_exception")
            .get("exists/")
            .raises(&PROBLEM_EXISTS_EXCEPTION)
            .returns::<String>()
            .handler(|_, _| -> Result<String, ApiException> {
                Err(ApiException::new(&PROBLEM_EXISTS_EXCEPTION, "Implicit string of detail"))
            });

        component
            .method("problem_exists_dataclass_exception")
            .get("dataclass/")
            .raises(&PROBLEM_EXISTS_DATACLASS_EXCEPTION)
            .returns::<String>()
            .handler(|_, _| -> Result<String, ApiException> {
                Err(ApiException::new(&PROBLEM_EXISTS_DATACLASS_EXCEPTION, "Dataclass detail")
                    .with_attribute("custom_field", json!("custom value")))
            });

        component
            .method("all_field_const_problem_exception")
            .get("all-field-const/")
            .raises(&ALL_FIELD_CONST_PROBLEM_EXCEPTION)
            .returns::<String>()
            .handler(|_, _| -> Result<String, ApiException> {
                Err(ApiException::new(&ALL_FIELD_CONST_PROBLEM_EXCEPTION, "ignored"))
            });

        component
            .method("inherited_problem_exception")
            .get("inherited/")
            .raises(&PROBLEM_EXISTS_EXCEPTION)
            .returns::<String>()
            .handler(|_, _| -> Result<String, ApiException> {
                Err(ApiException::new(&INHERITED_PROBLEM_EXCEPTION, "Inherited detail"))
            });
    }
}

// ---------------------------------------------------------------------------
// SimpleAPI: interceptor fixtures
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SimpleAPI;

impl ApiComponent for SimpleAPI {
    fn declare(component: &mut ComponentBuilder<Self>) {
        component.route_prefix("winter-simple/");
        component
            .method("get")
            .get("get/")
            .returns::<String>()
            .handler(|_, _| Ok("Hello, World!".to_string()));
    }
}

// ---------------------------------------------------------------------------
// ItemsAPI: argument resolution and response shaping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDto {
    pub title: String,
    #[serde(default)]
    pub count: i64,
}

impl ApiType for ItemDto {
    fn type_info() -> TypeInfo {
        ObjectType::new("ItemDTO")
            .field::<String>("title")
            .field_with_default::<i64>("count", json!(1))
            .into_type()
    }
}

#[derive(Debug)]
pub struct ItemsAPI {
    pub greeting: String,
}

impl Default for ItemsAPI {
    fn default() -> Self {
        Self {
            greeting: "items".to_string(),
        }
    }
}

fn search(api: &ItemsAPI, args: &Arguments) -> Result<serde_json::Value, ApiException> {
    Ok(json!({
        "greeting": api.greeting,
        "category": args.get::<String>("category")?,
        "limit": args.get::<i64>("limit")?,
        "verbose": args.get::<bool>("verbose")?,
        "tags": args.get::<Vec<String>>("tags")?,
        "text": args.get::<Option<String>>("text")?,
    }))
}

impl ApiComponent for ItemsAPI {
    fn declare(component: &mut ComponentBuilder<Self>) {
        component.route_prefix("items/");

        component
            .method("search")
            .get("{category}/{?limit,verbose,tag,q}")
            .map_query_parameter("tag", "tags")
            .map_query_parameter("q", "text")
            .argument::<String>("category")
            .argument_with_default::<i64>("limit", json!(10))
            .argument_with_default::<bool>("verbose", json!(false))
            .argument_with_default::<Vec<String>>("tags", json!([]))
            .argument::<Option<String>>("text")
            .returns::<serde_json::Value>()
            .handler(search);

        component
            .method("create")
            .post("")
            .request_body("item")
            .argument::<ItemDto>("item")
            .response_status(StatusCode::CREATED)
            .returns::<ItemDto>()
            .handler(|_, args| args.get::<ItemDto>("item"));

        component
            .method("remove")
            .delete("by-id/{item_id}/")
            .argument::<i64>("item_id")
            .response_status(StatusCode::NO_CONTENT)
            .handler(|_, args| args.get::<i64>("item_id").map(|_| ()));

        component
            .method("echo_path")
            .get("echo/{name}/")
            .argument::<String>("name")
            .argument_of("request", TypeInfo::Request, None)
            .returns::<String>()
            .handler(|_, args| Ok(format!("{} {}", args.request().path(), args.get::<String>("name")?)));

        component
            .method("throttled")
            .get("throttled/")
            .raises(&THROTTLE_EXCEPTION)
            .returns::<String>()
            .handler(|_, _| -> Result<String, ApiException> { Err(ApiException::throttle(30)) });

        component.method("unrouted").returns::<i64>().handler(|_, _| Ok(7));
    }
}

// ---------------------------------------------------------------------------
// Engines
// ---------------------------------------------------------------------------

pub fn test_config() -> EngineConfig {
    EngineConfig {
        problem_type_prefix: PROBLEM_TYPE_PREFIX.to_string(),
        ..EngineConfig::default()
    }
}

pub fn simple_engine() -> ApiEngine {
    ApiEngine::builder()
        .component(SimpleAPI)
        .interceptor(Arc::new(MethodNameHeaderInterceptor::default()))
        .interceptor(Arc::new(QueryFlagHeaderInterceptor::new(
            "hello_world",
            "x-hello-world",
            "Hello, World!",
        )))
        .config(test_config())
        .build()
        .expect("simple engine builds")
}

pub fn exceptions_engine() -> ApiEngine {
    ApiEngine::builder()
        .component(APIWithExceptions)
        .component(APIWithProblemExceptions)
        .exception_handlers(exceptions_registry())
        .config(test_config())
        .build()
        .expect("exceptions engine builds")
}

pub fn items_engine() -> ApiEngine {
    ApiEngine::builder()
        .component(ItemsAPI::default())
        .config(test_config())
        .build()
        .expect("items engine builds")
}
