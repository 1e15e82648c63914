use super::class::{ApiException, ExceptionClass};
use super::handlers::{ExceptionHandlersRegistry, HandlerEntry};
use crate::core::ComponentMethod;
use crate::error::ConfigurationError;
use crate::types::TypeInfo;
use http::StatusCode;
use std::sync::Arc;
use tracing::debug;

/// Exception translation for one method.
///
/// Only exceptions whose class is, or descends from, a class named in the
/// method's `Raises` annotations are handled here. Method-scoped handlers win
/// over the shared registry. Anything else propagates unhandled.
#[derive(Debug, Clone)]
pub struct MethodExceptionsManager {
    method: String,
    success: (StatusCode, Option<TypeInfo>),
    declared: Vec<&'static ExceptionClass>,
    scoped: Vec<HandlerEntry>,
    global: Arc<ExceptionHandlersRegistry>,
}

impl MethodExceptionsManager {
    pub fn new(method: &ComponentMethod, global: Arc<ExceptionHandlersRegistry>) -> Result<Self, ConfigurationError> {
        let mut declared: Vec<&'static ExceptionClass> = Vec::new();
        let mut scoped = Vec::new();
        for raises in method.annotations().raises() {
            if !declared.contains(&raises.exception) {
                declared.push(raises.exception);
            }
            if let Some((status, handler)) = &raises.handler {
                scoped.push(HandlerEntry {
                    exception: raises.exception,
                    status: *status,
                    handler: Arc::clone(handler),
                });
            }
        }

        let success_type = match method.return_type() {
            TypeInfo::None => None,
            other => Some(other.clone()),
        };
        let manager = Self {
            method: method.qualified_name(),
            success: (
                method.annotations().response_status().unwrap_or(StatusCode::OK),
                success_type,
            ),
            declared,
            scoped,
            global,
        };
        manager.check_statuses()?;
        Ok(manager)
    }

    /// Most specific handler for a raised exception, or `None` if it must propagate
    #[must_use]
    pub fn get_handler(&self, exception: &ApiException) -> Option<HandlerEntry> {
        let class = exception.class();
        if !class.ancestors().any(|ancestor| self.declared.contains(&ancestor)) {
            return None;
        }
        self.scoped_handler(class)
            .or_else(|| self.global.get_handler(class))
    }

    /// One entry per declared exception class that resolves to a handler
    #[must_use]
    pub fn declared_handlers(&self) -> Vec<HandlerEntry> {
        self.declared
            .iter()
            .filter_map(|&class| {
                let entry = self
                    .scoped_handler(class)
                    .or_else(|| self.global.get_handler(class));
                if entry.is_none() {
                    debug!(method = %self.method, exception = %class, "Declared exception has no handler");
                }
                entry.map(|entry| HandlerEntry {
                    exception: class,
                    ..entry
                })
            })
            .collect()
    }

    fn scoped_handler(&self, class: &'static ExceptionClass) -> Option<HandlerEntry> {
        class
            .ancestors()
            .find_map(|ancestor| self.scoped.iter().find(|e| e.exception == ancestor).cloned())
    }

    /// Same status with different documented bodies cannot be represented in one
    /// response map. The success response takes part in the comparison.
    fn check_statuses(&self) -> Result<(), ConfigurationError> {
        let handlers = self.declared_handlers();
        let (success_status, success_type) = &self.success;
        if let Some(entry) = handlers
            .iter()
            .find(|e| e.status == *success_status && e.response_type() != *success_type)
        {
            return Err(ConfigurationError::AmbiguousResponseStatus {
                method: self.method.clone(),
                status: success_status.as_u16(),
                exceptions: vec![entry.exception.name.to_string()],
            });
        }
        for (i, entry) in handlers.iter().enumerate() {
            let clashing: Vec<&HandlerEntry> = handlers[i + 1..]
                .iter()
                .filter(|other| other.status == entry.status && other.response_type() != entry.response_type())
                .collect();
            if !clashing.is_empty() {
                let exceptions = std::iter::once(entry)
                    .chain(clashing)
                    .map(|e| e.exception.name.to_string())
                    .collect();
                return Err(ConfigurationError::AmbiguousResponseStatus {
                    method: self.method.clone(),
                    status: entry.status.as_u16(),
                    exceptions,
                });
            }
        }
        Ok(())
    }
}
