//! # Dispatcher Module
//!
//! [`ApiEngine`] ties the pieces together. It is built once from component
//! instances and then answers requests.
//!
//! ## Build
//!
//! ```rust,ignore
//! use apibind::dispatcher::ApiEngine;
//!
//! let engine = ApiEngine::builder()
//!     .component(UsersApi::default())
//!     .interceptor(Arc::new(MethodNameHeaderInterceptor::default()))
//!     .build()?;
//! ```
//!
//! `build` collects component metadata, registers routes and checks every
//! method's arguments and declared exceptions. Any problem fails the build with
//! the complete list.
//!
//! ## Request Flow
//!
//! 1. The router matches method and path; no match is `RouteNotFound`
//! 2. Interceptors run in registration order and may short-circuit
//! 3. Arguments are resolved in declaration order
//! 4. The method is invoked with its component instance
//! 5. A raised exception goes to the method's handler, or propagates as
//!    `Unhandled` when none matches

mod core;

pub use core::{ApiEngine, ApiEngineBuilder};
