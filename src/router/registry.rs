use crate::core::{Component, ComponentMethod};
use crate::error::ConfigurationError;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Every routed method, keyed by HTTP method and normalized path.
///
/// Registration order is kept so the document and the routing table list
/// operations the way they were declared.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<(Arc<Component>, Arc<ComponentMethod>)>,
    index: HashMap<(Method, String), usize>,
}

impl RouteRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a routed method. Unrouted methods are ignored.
    pub fn register(&mut self, component: &Arc<Component>, method: &Arc<ComponentMethod>) -> Result<(), ConfigurationError> {
        let Some(route) = method.route() else {
            return Ok(());
        };
        let key = (route.http_method.clone(), route.normalized());
        if let Some(&existing) = self.index.get(&key) {
            let (_, first) = &self.routes[existing];
            return Err(ConfigurationError::DuplicateRoute {
                http_method: route.http_method.clone(),
                template: route.url_path.clone(),
                first: first.qualified_name(),
                second: method.qualified_name(),
            });
        }
        debug!(
            method = %route.http_method,
            path = %route.url_path,
            handler_name = %method.qualified_name(),
            "Route registered"
        );
        self.index.insert(key, self.routes.len());
        self.routes.push((Arc::clone(component), Arc::clone(method)));
        Ok(())
    }

    /// Register every routed method of a component, collecting all conflicts
    pub fn register_component(&mut self, component: &Arc<Component>) -> Vec<ConfigurationError> {
        component
            .methods()
            .filter_map(|method| self.register(component, method).err())
            .collect()
    }

    #[must_use]
    pub fn get(&self, http_method: &Method, normalized: &str) -> Option<&Arc<ComponentMethod>> {
        self.index
            .get(&(http_method.clone(), normalized.to_string()))
            .map(|&i| &self.routes[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<Component>, &Arc<ComponentMethod>)> {
        self.routes.iter().map(|(c, m)| (c, m))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
