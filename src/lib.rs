//! # apibind
//!
//! **apibind** binds plain Rust components to an HTTP-shaped API from declared
//! metadata. A component describes its methods once (route template, argument
//! types, declared exceptions, docstrings) and the engine derives everything
//! else from that description.
//!
//! ## Architecture
//!
//! - **[`core`]** - Component and method metadata, annotations, argument bindings
//! - **[`router`]** - Route templates, the route registry and request matching
//! - **[`resolvers`]** - The argument resolver chain (request, body, path, query)
//! - **[`converters`]** - Typed conversion of JSON bodies and textual parameters
//! - **[`interceptors`]** - Hooks that run before each handled request
//! - **[`exceptions`]** - Exception classes, handlers and the problem convention
//! - **[`schema`]** - Swagger 2.0 operation and document synthesis
//! - **[`dispatcher`]** - [`ApiEngine`], which builds everything and dispatches requests
//! - **[`config`]** / **[`logging`]** - Engine configuration and tracing setup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use apibind::prelude::*;
//!
//! #[derive(Default)]
//! struct Greetings;
//!
//! impl ApiComponent for Greetings {
//!     fn declare(component: &mut ComponentBuilder<Self>) {
//!         component
//!             .method("hello")
//!             .get("hello/{name}/")
//!             .argument::<String>("name")
//!             .returns::<String>()
//!             .handler(|_, args| Ok(format!("Hello, {}", args.get::<String>("name")?)));
//!     }
//! }
//!
//! let engine = ApiEngine::builder().component(Greetings).build()?;
//! let response = engine.dispatch(HttpRequest::get("/hello/world/"))?;
//! let document = engine.swagger_document()?.to_json()?;
//! ```
//!
//! Build-time problems (duplicate routes, unresolvable arguments, template
//! variables without an argument) are collected and returned together as a
//! [`BuildError`]. Nothing is validated lazily at request time.

pub mod config;
pub mod converters;
pub mod core;
pub mod dispatcher;
pub mod docstring;
pub mod error;
pub mod exceptions;
pub mod interceptors;
pub mod logging;
pub mod resolvers;
pub mod router;
pub mod schema;
pub mod types;
pub mod validator;
pub mod web;

pub use config::EngineConfig;
pub use crate::core::{ApiComponent, Arguments, Component, ComponentBuilder, ComponentMethod, MethodBuilder};
pub use dispatcher::{ApiEngine, ApiEngineBuilder};
pub use error::{BuildError, ConfigurationError, DispatchError, LookupError};
pub use exceptions::ApiException;
pub use schema::{SwaggerAutoSchema, SwaggerDocument};
pub use types::{ApiType, ObjectType, TypeInfo};
pub use web::{HttpRequest, HttpResponse};

/// Everything a component declaration usually needs
pub mod prelude {
    pub use crate::core::{ApiComponent, Arguments, ComponentBuilder, RouteAnnotation};
    pub use crate::dispatcher::ApiEngine;
    pub use crate::exceptions::{ApiException, ExceptionClass};
    pub use crate::types::{ApiType, ObjectType, TypeInfo};
    pub use crate::web::{HttpRequest, HttpResponse, MediaType};
    pub use http::{Method, StatusCode};
}
