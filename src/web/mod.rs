//! # Web Module
//!
//! The boundary types exchanged with the surrounding HTTP layer: the inbound
//! [`HttpRequest`] the resolver chain reads from, the [`ResponseHeaders`] map
//! resolvers and interceptors may write into, and the [`HttpResponse`] the
//! dispatcher produces. No socket handling lives here.

pub mod request;
pub mod response;

pub use request::{HttpRequest, QueryParams, QueryValue};
pub use response::{HttpResponse, ResponseHeaders};

/// Media type constants used in route declarations and responses
#[derive(Debug, Clone, Copy)]
pub struct MediaType;

impl MediaType {
    pub const APPLICATION_JSON: &'static str = "application/json";
    pub const APPLICATION_JSON_UTF8: &'static str = "application/json; charset=utf-8";
    /// Content type for problem bodies (RFC 9457)
    pub const APPLICATION_PROBLEM_JSON: &'static str = "application/problem+json";
}
