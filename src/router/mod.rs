//! # Router Module
//!
//! Route templates, the route registry and request matching.
//!
//! ## Overview
//!
//! - [`Route`] is derived once per method from its route annotation and the
//!   component prefix. Templates are validated against the method's arguments
//!   while the component is built.
//! - [`RouteRegistry`] collects every routed method and rejects a second route
//!   with the same HTTP method and normalized path (`/users/{}`).
//! - [`Router`] compiles the registry into a radix tree and matches live
//!   requests, extracting percent-decoded path variables.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut registry = RouteRegistry::new();
//! registry.register_component(&component);
//! let router = Router::new(&registry);
//!
//! if let Some(m) = router.route(&Method::GET, "/users/123") {
//!     println!("{} id={:?}", m.method.qualified_name(), m.get_path_param("id"));
//! }
//! ```

mod core;
mod radix;
mod registry;
mod route;

pub use core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use registry::RouteRegistry;
pub use route::{join_template, ParsedTemplate, QueryParameter, Route, Segment};
