//! Radix tree for route matching.
//!
//! Each node is one path segment. Literal children are tried before variable
//! children, so `/users/me` wins over `/users/{id}` regardless of declaration
//! order. Entries are stored at terminal nodes, keyed by HTTP method.
//!
//! Lookup is O(k) in the number of request segments; backtracking only happens
//! when a literal branch fails deeper down.

use super::core::ParamVec;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
struct RadixNode<T> {
    segment: String,
    entries: HashMap<Method, Arc<T>>,
    param_name: Option<Arc<str>>,
    children: Vec<RadixNode<T>>,
    /// Variables with different names at the same depth get separate nodes
    param_children: Vec<RadixNode<T>>,
}

impl<T> RadixNode<T> {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            entries: HashMap::new(),
            param_name: None,
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn new_param(param_name: &str) -> Self {
        Self {
            param_name: Some(Arc::from(param_name)),
            ..Self::new("")
        }
    }

    fn insert(&mut self, segments: &[PatternSegment<'_>], method: Method, entry: Arc<T>) {
        let Some((segment, remaining)) = segments.split_first() else {
            self.entries.insert(method, entry);
            return;
        };

        match segment {
            PatternSegment::Variable(name) => {
                if let Some(child) = self
                    .param_children
                    .iter_mut()
                    .find(|c| c.param_name.as_deref() == Some(*name))
                {
                    child.insert(remaining, method, entry);
                    return;
                }
                let mut child = RadixNode::new_param(name);
                child.insert(remaining, method, entry);
                self.param_children.push(child);
            }
            PatternSegment::Literal(text) => {
                if let Some(child) = self.children.iter_mut().find(|c| c.segment == *text) {
                    child.insert(remaining, method, entry);
                    return;
                }
                let mut child = RadixNode::new(text);
                child.insert(remaining, method, entry);
                self.children.push(child);
            }
        }
    }

    fn search(&self, segments: &[&str], method: &Method, params: &mut ParamVec) -> Option<Arc<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.entries.get(method).cloned();
        };

        for child in &self.children {
            if child.segment == *segment {
                if let Some(entry) = child.search(remaining, method, params) {
                    return Some(entry);
                }
            }
        }

        for child in &self.param_children {
            if let Some(name) = &child.param_name {
                params.push((Arc::clone(name), (*segment).to_string()));
                if let Some(entry) = child.search(remaining, method, params) {
                    return Some(entry);
                }
                params.pop();
            }
        }

        None
    }
}

/// Borrowed view of a route segment used while inserting
#[derive(Debug, Clone, Copy)]
pub(crate) enum PatternSegment<'a> {
    Literal(&'a str),
    Variable(&'a str),
}

/// Method-keyed radix tree over `/`-separated paths
#[derive(Clone)]
pub(crate) struct RadixTree<T> {
    root: RadixNode<T>,
    len: usize,
}

impl<T> RadixTree<T> {
    pub(crate) fn new() -> Self {
        Self {
            root: RadixNode::new(""),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, segments: &[PatternSegment<'_>], method: Method, entry: Arc<T>) {
        self.root.insert(segments, method, entry);
        self.len += 1;
    }

    /// Match raw path segments; extracted values are not yet percent-decoded
    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Option<(Arc<T>, ParamVec)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = ParamVec::new();
        let entry = self.root.search(&segments, method, &mut params)?;
        Some((entry, params))
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
