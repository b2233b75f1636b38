//! Route table module
//!
//! Static `(METHOD, path) -> handler identifier` mapping. Built once during setup,
//! then only read.

use crate::config::RouteConfig;
use crate::error::ConfigError;
use std::collections::{BTreeMap, HashMap};

/// One registered route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub method: String,
    pub path: String,
    /// Symbolic handler identifier, resolved against the registry at dispatch time
    pub handler: String,
}

/// Exact-match route table
///
/// Indexed by path first so that the set of methods for a path is available
/// without scanning the whole table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, BTreeMap<String, RouteEntry>>,
    len: usize,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Build a table from `[[routes]]` configuration entries
    pub fn from_config(routes: &[RouteConfig]) -> Result<Self, ConfigError> {
        routes
            .iter()
            .fold(Self::builder(), |builder, route| {
                builder.route(&route.method, &route.path, &route.handler)
            })
            .build()
    }

    /// Insert a route. The method is uppercased; path and handler are stored as given.
    pub fn add(&mut self, method: &str, path: &str, handler: &str) -> Result<(), ConfigError> {
        let method = method.to_ascii_uppercase();
        let methods = self.routes.entry(path.to_string()).or_default();

        if methods.contains_key(&method) {
            return Err(ConfigError::DuplicateRoute {
                method,
                path: path.to_string(),
            });
        }

        methods.insert(
            method.clone(),
            RouteEntry {
                method,
                path: path.to_string(),
                handler: handler.to_string(),
            },
        );
        self.len += 1;
        Ok(())
    }

    /// Exact lookup; `method` must already be uppercase
    pub fn lookup(&self, method: &str, path: &str) -> Option<&RouteEntry> {
        self.routes.get(path)?.get(method)
    }

    /// Methods registered for `path`, sorted. Empty when the path is unknown.
    pub fn allowed_methods(&self, path: &str) -> Vec<String> {
        self.routes
            .get(path)
            .map(|methods| methods.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.values().flat_map(BTreeMap::values)
    }
}

/// Declarative route table builder
///
/// Registration errors are deferred to [`RouteTableBuilder::build`], which reports
/// the first duplicate.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    entries: Vec<(String, String, String)>,
}

impl RouteTableBuilder {
    #[must_use]
    pub fn route(mut self, method: &str, path: &str, handler: &str) -> Self {
        self.entries
            .push((method.to_string(), path.to_string(), handler.to_string()));
        self
    }

    #[must_use]
    pub fn get(self, path: &str, handler: &str) -> Self {
        self.route("GET", path, handler)
    }

    #[must_use]
    pub fn post(self, path: &str, handler: &str) -> Self {
        self.route("POST", path, handler)
    }

    #[must_use]
    pub fn put(self, path: &str, handler: &str) -> Self {
        self.route("PUT", path, handler)
    }

    #[must_use]
    pub fn patch(self, path: &str, handler: &str) -> Self {
        self.route("PATCH", path, handler)
    }

    #[must_use]
    pub fn delete(self, path: &str, handler: &str) -> Self {
        self.route("DELETE", path, handler)
    }

    #[must_use]
    pub fn head(self, path: &str, handler: &str) -> Self {
        self.route("HEAD", path, handler)
    }

    #[must_use]
    pub fn options(self, path: &str, handler: &str) -> Self {
        self.route("OPTIONS", path, handler)
    }

    pub fn build(self) -> Result<RouteTable, ConfigError> {
        let mut table = RouteTable::new();
        for (method, path, handler) in &self.entries {
            table.add(method, path, handler)?;
        }
        Ok(table)
    }
}
