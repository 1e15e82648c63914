//! Request interceptors.
//!
//! Interceptors run after routing and before argument resolution, in
//! registration order. They may write response headers or abort the request
//! by returning an exception, which is translated like one raised by the method.

use crate::core::ComponentMethod;
use crate::exceptions::ApiException;
use crate::web::{HttpRequest, ResponseHeaders};
use std::fmt;
use std::sync::Arc;

pub trait Interceptor: Send + Sync + fmt::Debug {
    fn pre_handle(
        &self,
        _method: &ComponentMethod,
        _request: &HttpRequest,
        _response_headers: &mut ResponseHeaders,
    ) -> Result<(), ApiException> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterceptorRegistry {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Run every interceptor; the first error stops the chain
    pub fn pre_handle(
        &self,
        method: &ComponentMethod,
        request: &HttpRequest,
        response_headers: &mut ResponseHeaders,
    ) -> Result<(), ApiException> {
        self.interceptors
            .iter()
            .try_for_each(|interceptor| interceptor.pre_handle(method, request, response_headers))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

/// Writes `x-method: Component.method` on every response
#[derive(Debug, Clone)]
pub struct MethodNameHeaderInterceptor {
    header: String,
}

impl Default for MethodNameHeaderInterceptor {
    fn default() -> Self {
        Self {
            header: "x-method".to_string(),
        }
    }
}

impl MethodNameHeaderInterceptor {
    pub fn with_header(header: impl Into<String>) -> Self {
        Self { header: header.into() }
    }
}

impl Interceptor for MethodNameHeaderInterceptor {
    fn pre_handle(
        &self,
        method: &ComponentMethod,
        _request: &HttpRequest,
        response_headers: &mut ResponseHeaders,
    ) -> Result<(), ApiException> {
        response_headers.insert(&self.header, method.qualified_name());
        Ok(())
    }
}

/// Writes a fixed header when a query key is present, as a flag or with a value
#[derive(Debug, Clone)]
pub struct QueryFlagHeaderInterceptor {
    query_key: String,
    header: String,
    value: String,
}

impl QueryFlagHeaderInterceptor {
    pub fn new(query_key: impl Into<String>, header: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            query_key: query_key.into(),
            header: header.into(),
            value: value.into(),
        }
    }
}

impl Interceptor for QueryFlagHeaderInterceptor {
    fn pre_handle(
        &self,
        _method: &ComponentMethod,
        request: &HttpRequest,
        response_headers: &mut ResponseHeaders,
    ) -> Result<(), ApiException> {
        if request.query().contains(&self.query_key) {
            response_headers.insert(&self.header, self.value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ApiComponent, Component, ComponentBuilder};

    struct Pinged;

    impl ApiComponent for Pinged {
        fn declare(component: &mut ComponentBuilder<Self>) {
            component.method("ping").get("ping/");
        }
    }

    #[derive(Debug)]
    struct Deny;

    impl Interceptor for Deny {
        fn pre_handle(
            &self,
            _method: &ComponentMethod,
            _request: &HttpRequest,
            _response_headers: &mut ResponseHeaders,
        ) -> Result<(), ApiException> {
            Err(ApiException::throttle(5))
        }
    }

    fn registry() -> InterceptorRegistry {
        let mut registry = InterceptorRegistry::new();
        registry.add_interceptor(Arc::new(MethodNameHeaderInterceptor::default()));
        registry.add_interceptor(Arc::new(QueryFlagHeaderInterceptor::new(
            "hello_world",
            "x-hello-world",
            "Hello, World!",
        )));
        registry
    }

    #[test]
    fn test_headers_written_in_order() {
        let method = Component::get_by_cls::<Pinged>().unwrap().get_method("ping").unwrap();
        let mut headers = ResponseHeaders::new();
        registry()
            .pre_handle(&method, &HttpRequest::get("/ping/?hello_world"), &mut headers)
            .unwrap();
        assert_eq!(headers.get("x-method"), Some("Pinged.ping"));
        assert_eq!(headers.get("x-hello-world"), Some("Hello, World!"));

        let mut headers = ResponseHeaders::new();
        registry()
            .pre_handle(&method, &HttpRequest::get("/ping/"), &mut headers)
            .unwrap();
        assert!(!headers.contains("x-hello-world"));
    }

    #[test]
    fn test_error_stops_the_chain() {
        let method = Component::get_by_cls::<Pinged>().unwrap().get_method("ping").unwrap();
        let mut registry = InterceptorRegistry::new();
        registry.add_interceptor(Arc::new(Deny));
        registry.add_interceptor(Arc::new(MethodNameHeaderInterceptor::default()));
        let mut headers = ResponseHeaders::new();
        let err = registry
            .pre_handle(&method, &HttpRequest::get("/ping/"), &mut headers)
            .unwrap_err();
        assert_eq!(err.retry_after(), Some(5));
        assert!(headers.is_empty());
    }
}
