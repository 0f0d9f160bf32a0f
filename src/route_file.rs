//! Route files: route tables kept in TOML and bound to handlers by name.
//!
//! ```toml
//! [[routes]]
//! method = "GET"
//! path = "/"
//! handler = "list_posts"
//!
//! [[routes]]
//! method = "GET"
//! path = "/#id"
//! handler = "show_post"
//! ```
//!
//! Routes register in file order, which matters: the router's first
//! structural match decides between `405` and a handler.

use std::collections::HashMap;
use std::path::Path;

use http::Method;
use serde::Deserialize;

use crate::chain::Chain;
use crate::error::Error;
use crate::handler::Handler;
use crate::router::Target;

/// Handlers that route files may refer to, by name.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Target>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: impl Into<String>, handler: impl Handler) -> Self {
        self.insert(name.into(), Target::Handler(handler.into_boxed_handler()));
        self
    }

    /// Registers a route-scoped chain under `name`.
    pub fn register_chain(mut self, name: impl Into<String>, chain: Chain) -> Self {
        self.insert(name.into(), Target::Chain(chain));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    fn insert(&mut self, name: String, target: Target) {
        self.handlers.insert(name, target);
    }

    fn get(&self, name: &str) -> Result<Target, Error> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownHandler(name.to_owned()))
    }
}

/// A parsed route file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RouteFile {
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

/// One `[[routes]]` entry.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    pub method: String,
    pub path: String,
    pub handler: String,
}

impl RouteFile {
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        Ok(toml::from_str(source)?)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let source = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&source)
    }

    /// Resolves every entry into `(method, path, target)`, applying `prefix`.
    /// Fails on the first unknown method or handler name.
    pub(crate) fn resolve(
        self,
        prefix: &str,
        registry: &HandlerRegistry,
    ) -> Result<Vec<(Method, String, Target)>, Error> {
        self.routes
            .into_iter()
            .map(|spec| -> Result<_, Error> {
                let method = Method::from_bytes(spec.method.to_ascii_uppercase().as_bytes())
                    .map_err(|_| Error::InvalidMethod(spec.method.clone()))?;
                let target = registry.get(&spec.handler)?;
                Ok((method, prefixed(prefix, &spec.path), target))
            })
            .collect()
    }
}

/// `prefix + path`, except that the root of a prefixed file is the prefix
/// itself (`/posts`, not `/posts/`).
pub fn prefixed(prefix: &str, path: &str) -> String {
    if !prefix.is_empty() && path == "/" {
        prefix.to_owned()
    } else {
        format!("{prefix}{path}")
    }
}
