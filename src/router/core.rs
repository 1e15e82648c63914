//! Router core: matches live requests against the registered routes.

use super::radix::{PatternSegment, RadixTree};
use super::registry::RouteRegistry;
use super::route::Segment;
use crate::core::{Component, ComponentMethod};
use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Path parameter storage. Names are shared with the route tree.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request path to a route
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub component: Arc<Component>,
    pub method: Arc<ComponentMethod>,
    /// Percent-decoded path variables in template order
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name (last occurrence wins)
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

struct RouteEntry {
    component: Arc<Component>,
    method: Arc<ComponentMethod>,
}

/// Request router built from a validated [`RouteRegistry`]
pub struct Router {
    tree: RadixTree<RouteEntry>,
    patterns: Vec<String>,
}

impl Router {
    #[must_use]
    pub fn new(registry: &RouteRegistry) -> Self {
        let mut tree = RadixTree::new();
        let mut patterns = Vec::with_capacity(registry.len());

        for (component, method) in registry.iter() {
            let Some(route) = method.route() else {
                continue;
            };
            let segments: Vec<PatternSegment<'_>> = route
                .segments
                .iter()
                .map(|s| match s {
                    Segment::Literal(text) => PatternSegment::Literal(text),
                    Segment::Variable(name) => PatternSegment::Variable(name),
                })
                .collect();
            tree.insert(
                &segments,
                route.http_method.clone(),
                Arc::new(RouteEntry {
                    component: Arc::clone(component),
                    method: Arc::clone(method),
                }),
            );
            patterns.push(format!("{} {}", route.http_method, route.url_path));
        }

        let routes_summary: Vec<&String> = patterns.iter().take(10).collect();
        info!(
            routes_count = tree.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Self { tree, patterns }
    }

    /// Match an HTTP request to a route.
    ///
    /// Trailing slashes are ignored. Path variables are percent-decoded; a
    /// variable that does not decode to UTF-8 is kept verbatim.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "Route match attempt");

        let match_start = std::time::Instant::now();
        let Some((entry, raw_params)) = self.tree.lookup(method, path) else {
            warn!(
                method = %method,
                path = %path,
                duration_us = match_start.elapsed().as_micros(),
                "No route matched"
            );
            return None;
        };

        let path_params: ParamVec = raw_params
            .into_iter()
            .map(|(name, raw)| {
                let value = urlencoding::decode(&raw)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| raw.clone());
                (name, value)
            })
            .collect();

        info!(
            method = %method,
            path = %path,
            handler_name = %entry.method.qualified_name(),
            path_params = ?path_params,
            duration_us = match_start.elapsed().as_micros(),
            "Route matched"
        );

        Some(RouteMatch {
            component: Arc::clone(&entry.component),
            method: Arc::clone(&entry.method),
            path_params,
        })
    }

    /// `METHOD /path` for every routed method, in registration order
    #[must_use]
    pub fn get_all_path_patterns(&self) -> &[String] {
        &self.patterns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }
}
