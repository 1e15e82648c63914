//! # Engine Configuration
//!
//! Settings that shape responses and the generated document. Values come from
//! a YAML/JSON file, from `APIBIND_*` environment variables, or from defaults.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `APIBIND_DEFAULT_MEDIA_TYPE` | `default_media_type` | `application/json` |
//! | `APIBIND_PROBLEM_TYPE_PREFIX` | `problem_type_prefix` | `urn:problem-type:` |
//! | `APIBIND_INCLUDE_UNROUTED` | `include_unrouted` | `false` |
//! | `APIBIND_DOC_TITLE` | `document.title` | `API` |
//! | `APIBIND_DOC_VERSION` | `document.version` | `1.0.0` |
//! | `APIBIND_DOC_DESCRIPTION` | `document.description` | unset |
//!
//! ## File Format
//!
//! ```yaml
//! default_media_type: application/json
//! problem_type_prefix: "https://errors.example.com/"
//! include_unrouted: true
//! document:
//!   title: Example API
//!   version: 2.1.0
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Used for consumes/produces when a route declares none, and as the success content type
    pub default_media_type: String,
    /// Prefix of generated problem `type` values
    pub problem_type_prefix: String,
    /// List methods without a route in the document under `/{component}/{method}`
    pub include_unrouted: bool,
    pub document: DocumentInfo,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_media_type: "application/json".to_string(),
            problem_type_prefix: "urn:problem-type:".to_string(),
            include_unrouted: false,
            document: DocumentInfo::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `APIBIND_*` environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with a custom variable source
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            default_media_type: lookup("APIBIND_DEFAULT_MEDIA_TYPE").unwrap_or(defaults.default_media_type),
            problem_type_prefix: lookup("APIBIND_PROBLEM_TYPE_PREFIX").unwrap_or(defaults.problem_type_prefix),
            include_unrouted: lookup("APIBIND_INCLUDE_UNROUTED")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.include_unrouted),
            document: DocumentInfo {
                title: lookup("APIBIND_DOC_TITLE").unwrap_or(defaults.document.title),
                version: lookup("APIBIND_DOC_VERSION").unwrap_or(defaults.document.version),
                description: lookup("APIBIND_DOC_DESCRIPTION").or(defaults.document.description),
            },
        }
    }

    /// Load from a file; `.json` is read as JSON, anything else as YAML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        if is_json {
            serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON config {}", path.display()))
        } else {
            Self::from_yaml_str(&content).with_context(|| format!("Failed to parse YAML config {}", path.display()))
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Invalid engine configuration")
    }
}
