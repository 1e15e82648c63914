use super::build::SwaggerAutoSchema;
use super::components::SchemaComponents;
use super::types::{Operation, Schema};
use crate::config::DocumentInfo;
use crate::dispatcher::ApiEngine;
use crate::error::ConfigurationError;
use anyhow::Context;
use http::Method;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&DocumentInfo> for Info {
    fn from(info: &DocumentInfo) -> Self {
        Self {
            title: info.title.clone(),
            version: info.version.clone(),
            description: info.description.clone(),
        }
    }
}

/// A complete Swagger 2.0 document.
///
/// Paths keep insertion order; within a path, operations are keyed by the
/// lowercase HTTP method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwaggerDocument {
    pub swagger: String,
    pub info: Info,
    pub paths: IndexMap<String, IndexMap<String, Operation>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, Schema>,
}

impl SwaggerDocument {
    #[must_use]
    pub fn new(info: Info) -> Self {
        Self {
            swagger: "2.0".to_string(),
            info,
            paths: IndexMap::new(),
            definitions: BTreeMap::new(),
        }
    }

    /// Synthesize the document for every component of `engine`.
    ///
    /// Routed methods are keyed by their full path (prefix joined, query group
    /// dropped). Unrouted methods appear only when the engine config asks for
    /// them, as `GET /{component}/{method}`.
    pub fn build(engine: &ApiEngine) -> Result<Self, ConfigurationError> {
        let config = engine.config();
        let mut document = Self::new(Info::from(&config.document));
        let mut components = SchemaComponents::new();

        for component in engine.components() {
            for method in component.methods() {
                let keys = [component.name(), method.name()];
                let (path, http_method) = match method.route() {
                    Some(route) => (route.url_path.clone(), route.http_method.clone()),
                    None if config.include_unrouted => {
                        (format!("/{}/{}", component.name(), method.name()), Method::GET)
                    }
                    None => continue,
                };
                let operation = SwaggerAutoSchema::new(Some(method.as_ref()), http_method.clone())
                    .with_exception_handlers(Arc::clone(engine.exception_handlers()))
                    .with_default_media_type(config.default_media_type.clone())
                    .get_operation(&keys, &mut components)?;
                document.add_operation(&path, &http_method, operation);
            }
        }
        document.definitions = components.into_definitions();
        debug!(paths_count = document.paths.len(), "Swagger document built");
        Ok(document)
    }

    pub fn add_operation(&mut self, path: &str, http_method: &Method, operation: Operation) {
        self.paths
            .entry(path.to_string())
            .or_default()
            .insert(http_method.as_str().to_lowercase(), operation);
    }

    #[must_use]
    pub fn operation(&self, path: &str, http_method: &Method) -> Option<&Operation> {
        self.paths
            .get(path)
            .and_then(|ops| ops.get(&http_method.as_str().to_lowercase()))
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize document as JSON")
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize document as YAML")
    }
}
