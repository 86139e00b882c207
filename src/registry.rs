//! Kind registry for declaratively described nodes.
//!
//! The registry is owned by the application and filled during start-up, then
//! handed to [`TreeBuilder::mount`](crate::TreeBuilder::mount).

use crate::context::RouterContext;
use crate::handler::HandlerResult;
use crate::router::{parse_default_page, NodeKind, RouterError};

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Describes a node as data: a kind name, a match name and free-form options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSpec {
    pub kind: String,
    pub name: String,
    pub options: HashMap<String, String>,
}

impl NodeSpec {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            options: HashMap::new(),
        }
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    fn require(&self, key: &'static str) -> Result<&str, RouterError> {
        self.get(key).ok_or_else(|| RouterError::MissingOption {
            kind: self.kind.as_str().into(),
            option: key,
        })
    }
}

pub type Creator<D> = Box<dyn Fn(&NodeSpec) -> Result<NodeKind<D>, RouterError> + Send + Sync>;

pub struct NodeRegistry<D> {
    creators: HashMap<String, Creator<D>>,
}

impl<D: 'static> Default for NodeRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: 'static> NodeRegistry<D> {
    pub fn new() -> Self {
        Self {
            creators: HashMap::new(),
        }
    }

    /// A registry knowing `space` (option `default`) and `static` (options `root`
    /// and `index`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register("space", |spec: &NodeSpec| {
                let default = match spec.get("default") {
                    Some(page) => Some(parse_default_page(&spec.name, page)?),
                    None => None,
                };
                Ok(NodeKind::Space { default })
            })
            .register("static", |spec: &NodeSpec| {
                let root = PathBuf::from(spec.require("root")?);
                Ok(match spec.get("index") {
                    Some(index) => NodeKind::static_dir_with_index(root, index),
                    None => NodeKind::static_dir(root),
                })
            });
        registry
    }

    /// Registers a creator for `kind`, replacing any earlier one.
    pub fn register<F>(&mut self, kind: &str, creator: F) -> &mut Self
    where
        F: Fn(&NodeSpec) -> Result<NodeKind<D>, RouterError> + Send + Sync + 'static,
    {
        self.creators.insert(kind.to_owned(), Box::new(creator));
        self
    }

    /// Registers `kind` as a function node running `callback`.
    pub fn register_function<F>(&mut self, kind: &str, callback: F) -> &mut Self
    where
        F: Fn(&mut RouterContext<D>) -> HandlerResult + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        self.register(kind, move |_: &NodeSpec| {
            let callback = Arc::clone(&callback);
            Ok(NodeKind::function(move |ctx: &mut RouterContext<D>| callback(ctx)))
        })
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.creators.contains_key(kind)
    }

    pub fn create(&self, spec: &NodeSpec) -> Result<NodeKind<D>, RouterError> {
        match self.creators.get(&spec.kind) {
            Some(creator) => creator(spec),
            None => Err(RouterError::UnknownKind {
                kind: spec.kind.as_str().into(),
            }),
        }
    }
}

impl<D> fmt::Debug for NodeRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.creators.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("NodeRegistry").field("kinds", &kinds).finish()
    }
}
