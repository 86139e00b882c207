mod builder;
mod core;
mod error;
mod params;

pub use self::builder::TreeBuilder;
pub(crate) use self::builder::parse_default_page;
pub use self::error::RouterError;
pub use self::params::Params;

use crate::filter::{BoxPostFilter, BoxPreFilter};
use crate::handler::{BoxCallback, MethodRoute, Resource};
use crate::pattern::SegmentPattern;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use http::Method;

/// Index of a node inside the tree that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An immutable routing tree.
///
/// Built once by [`TreeBuilder`], then shared by every in-flight request.
pub struct Router<D = ()> {
    nodes: Vec<Node<D>>,
    max_redirects: usize,
}

pub struct Node<D> {
    name: Box<str>,
    pattern: SegmentPattern,
    parent: Option<NodeId>,
    named: HashMap<Box<str>, NodeId>,
    unnamed: Vec<NodeId>,
    pre_filters: Vec<BoxPreFilter<D>>,
    post_filters: Vec<BoxPostFilter<D>>,
    kind: NodeKind<D>,
}

/// The behavior carried by a node.
pub enum NodeKind<D> {
    /// Pure namespace, optionally redirecting to a default page when the path stops here.
    Space { default: Option<Box<[Box<str>]>> },
    /// Serves files below `root`.
    Static {
        root: PathBuf,
        index: Option<Box<str>>,
    },
    /// Handler bound to one method, followed by extension segment patterns.
    Method(MethodRoute<D>),
    /// Handler dispatching to get/post/put/delete.
    Restful(Box<dyn Resource<D>>),
    Function(BoxCallback<D>),
    /// Catch-all leaf which swallows every remaining segment.
    Unlimited(BoxCallback<D>),
}

impl<D> NodeKind<D> {
    pub fn space() -> Self {
        Self::Space { default: None }
    }

    pub fn static_dir(root: impl Into<PathBuf>) -> Self {
        Self::Static {
            root: root.into(),
            index: None,
        }
    }

    pub fn static_dir_with_index(root: impl Into<PathBuf>, index: &str) -> Self {
        Self::Static {
            root: root.into(),
            index: Some(index.into()),
        }
    }

    pub fn restful(resource: impl Resource<D> + 'static) -> Self {
        Self::Restful(Box::new(resource))
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut crate::RouterContext<D>) -> crate::HandlerResult + Send + Sync + 'static,
    {
        Self::Function(Box::new(f))
    }

    pub fn unlimited<F>(f: F) -> Self
    where
        F: Fn(&mut crate::RouterContext<D>) -> crate::HandlerResult + Send + Sync + 'static,
    {
        Self::Unlimited(Box::new(f))
    }

    /// A method node. Each extension is a segment pattern matched, in order,
    /// against the segments following the node's own name.
    pub fn method<F>(method: Method, extensions: &[&str], f: F) -> Result<Self, RouterError>
    where
        F: Fn(&mut crate::RouterContext<D>) -> crate::HandlerResult + Send + Sync + 'static,
    {
        Ok(Self::Method(MethodRoute::new(method, extensions, Box::new(f))?))
    }

    /// Whether nodes of this kind may be given children.
    pub fn accepts_children(&self) -> bool {
        match self {
            Self::Space { .. } | Self::Restful(_) | Self::Function(_) => true,
            Self::Static { .. } | Self::Method(_) | Self::Unlimited(_) => false,
        }
    }

    /// Whether the node can terminate a route, i.e. it has an executor.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Space { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Space { .. } => "space",
            Self::Static { .. } => "static",
            Self::Method(_) => "method",
            Self::Restful(_) => "restful",
            Self::Function(_) => "function",
            Self::Unlimited(_) => "unlimited",
        }
    }
}

impl<D> Node<D> {
    pub(crate) fn new(pattern: SegmentPattern, kind: NodeKind<D>) -> Self {
        Self {
            name: pattern.source().into(),
            pattern,
            parent: None,
            named: HashMap::new(),
            unnamed: Vec::new(),
            pre_filters: Vec::new(),
            post_filters: Vec::new(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind<D> {
        &self.kind
    }

    pub fn pattern(&self) -> &SegmentPattern {
        &self.pattern
    }

    pub(crate) fn pre_filters(&self) -> &[BoxPreFilter<D>] {
        &self.pre_filters
    }

    pub(crate) fn post_filters(&self) -> &[BoxPostFilter<D>] {
        &self.post_filters
    }

    /// All children: named ones in creation order, then pattern children in
    /// registration order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut v: Vec<NodeId> = self.named.values().copied().collect();
        v.sort_unstable();
        v.extend(self.unnamed.iter().copied());
        v
    }

    pub(crate) fn named_child(&self, segment: &str) -> Option<NodeId> {
        self.named.get(&*crate::pattern::fold_case(segment)).copied()
    }

    pub(crate) fn unnamed_children(&self) -> &[NodeId] {
        &self.unnamed
    }
}

impl<D> Router<D> {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<D>> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).map(Node::children).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node by walking plain names from the root.
    pub fn lookup(&self, path: &[&str]) -> Option<NodeId> {
        let mut id = self.root();
        for part in path {
            id = self.get(id).named_child(part)?;
        }
        Some(id)
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<D> {
        &self.nodes[id.0]
    }
}

impl<D> fmt::Debug for NodeKind<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Space { default } => f.debug_struct("Space").field("default", default).finish(),
            Self::Static { root, index } => f
                .debug_struct("Static")
                .field("root", root)
                .field("index", index)
                .finish(),
            Self::Method(route) => f.debug_tuple("Method").field(route).finish(),
            Self::Restful(_) => f.write_str("Restful"),
            Self::Function(_) => f.write_str("Function"),
            Self::Unlimited(_) => f.write_str("Unlimited"),
        }
    }
}

impl<D> fmt::Debug for Node<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("kind", &self.kind)
            .field("children", &self.children())
            .field("pre_filters", &self.pre_filters.len())
            .field("post_filters", &self.post_filters.len())
            .finish()
    }
}

impl<D> fmt::Debug for Router<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("nodes", &self.nodes)
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}
