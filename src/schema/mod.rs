//! # Schema Module
//!
//! Synthesizes Swagger 2.0 operations from method metadata.
//!
//! - [`generation`] turns declared types into schemas. Object types expand
//!   recursively; their docstring attribute tables supply field descriptions.
//! - [`SchemaComponents`] holds named definitions referenced by `$ref`.
//! - [`SwaggerAutoSchema`] builds one [`Operation`] per method.
//! - [`SwaggerDocument`] collects every operation into a full document.
//!
//! Synthesis is deterministic: repeated runs over unchanged metadata produce
//! equal structures and identical serialized output.

mod build;
mod components;
mod document;
pub mod generation;
mod types;

pub use build::SwaggerAutoSchema;
pub use components::SchemaComponents;
pub use document::{Info, SwaggerDocument};
pub use generation::{schema_for, Direction};
pub use types::{Operation, Parameter, ParameterLocation, Response, Schema, SchemaType};
