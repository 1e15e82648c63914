//! # Exceptions Module
//!
//! Maps exceptions raised while handling a request to structured responses.
//!
//! ## Lookup order
//!
//! Exceptions raised by a method body are handled only when the method declares
//! their class (or an ancestor) with `raises`:
//!
//! 1. method-scoped handlers declared with `raises_with` (exact class, then nearest parent)
//! 2. the shared [`ExceptionHandlersRegistry`] (explicit entries, then generated problem handlers)
//! 3. nothing: the exception propagates to the HTTP layer as a generic failure
//!
//! Exceptions raised before the body runs, by interceptors or argument
//! resolution, go straight to the shared registry.
//!
//! The same lookup, run over the statically declared classes, feeds the documented
//! responses of every operation.

mod class;
mod handlers;
mod manager;
pub mod problem;

pub use class::{
    ApiException, ExceptionClass, ProblemHandlingInfo, EXCEPTION, REDIRECT_EXCEPTION,
    REQUEST_VALIDATION_EXCEPTION, THROTTLE_EXCEPTION,
};
pub use handlers::{
    exception_handlers_registry, AttributesExceptionHandler, ExceptionHandler, ExceptionHandlersRegistry,
    FnExceptionHandler, HandlerEntry, ProblemExceptionHandler, RedirectExceptionHandler,
};
pub use manager::MethodExceptionsManager;
pub use problem::Problem;
