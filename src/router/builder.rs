use super::{Node, NodeId, NodeKind, Router, RouterError};

use crate::context::RouterContext;
use crate::filter::{PostFilter, PreFilter};
use crate::handler::{Reply, RouteDescriptor};
use crate::pattern::{fold_case, SegmentPattern};
use crate::registry::{NodeRegistry, NodeSpec};

use std::sync::Arc;

use tracing::trace;

const DEFAULT_MAX_REDIRECTS: usize = 8;

/// Builds a routing tree during start-up.
///
/// Nodes are created detached and wired with [`attach`](TreeBuilder::attach), or
/// created and attached in one step with [`add`](TreeBuilder::add). The finished
/// tree is frozen by [`build`](TreeBuilder::build).
pub struct TreeBuilder<D = ()> {
    nodes: Vec<Node<D>>,
    max_redirects: usize,
}

impl<D: 'static> Default for TreeBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: 'static> TreeBuilder<D> {
    pub fn new() -> Self {
        Self::with_root(NodeKind::space())
    }

    pub fn with_root(kind: NodeKind<D>) -> Self {
        let root = Node::new(SegmentPattern::Plain("".into()), kind);
        Self {
            nodes: vec![root],
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Caps how many default-page redirects a single match may follow.
    pub fn max_redirects(&mut self, n: usize) -> &mut Self {
        self.max_redirects = n;
        self
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<D>> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).map(Node::children).unwrap_or_default()
    }

    /// Creates a detached node.
    pub fn create(&mut self, name: &str, kind: NodeKind<D>) -> Result<NodeId, RouterError> {
        let pattern = SegmentPattern::compile(name)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(pattern, kind));
        Ok(id)
    }

    /// Creates a node under `parent`.
    ///
    /// # Panics
    /// Panics if the node can not be created or attached, see [`try_add`](TreeBuilder::try_add).
    pub fn add(&mut self, parent: NodeId, name: &str, kind: NodeKind<D>) -> NodeId {
        match self.try_add(parent, name, kind) {
            Ok(id) => id,
            Err(e) => panic!("{}: name = {:?}", e, name),
        }
    }

    pub fn try_add(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind<D>,
    ) -> Result<NodeId, RouterError> {
        self.check(parent)?;
        let id = self.create(name, kind)?;
        if let Err(e) = self.attach(parent, id) {
            self.nodes.pop();
            return Err(e);
        }
        Ok(id)
    }

    pub fn space(&mut self, parent: NodeId, name: &str) -> Result<NodeId, RouterError> {
        self.try_add(parent, name, NodeKind::space())
    }

    pub fn function<F>(&mut self, parent: NodeId, name: &str, f: F) -> Result<NodeId, RouterError>
    where
        F: Fn(&mut RouterContext<D>) -> crate::HandlerResult + Send + Sync + 'static,
    {
        self.try_add(parent, name, NodeKind::function(f))
    }

    /// Creates a space node named `name` holding one method node per descriptor.
    /// Every request gets a fresh controller from `factory`.
    ///
    /// Nothing is added to the tree if any descriptor fails.
    pub fn controller<C, F>(
        &mut self,
        parent: NodeId,
        name: &str,
        factory: F,
        routes: Vec<RouteDescriptor<C, D>>,
    ) -> Result<NodeId, RouterError>
    where
        C: 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let mark = self.nodes.len();
        let space = self.try_add(parent, name, NodeKind::space())?;
        if let Err(e) = self.add_routes(space, Arc::new(factory), routes) {
            self.detach(space);
            self.nodes.truncate(mark);
            return Err(e);
        }
        Ok(space)
    }

    fn add_routes<C, F>(
        &mut self,
        space: NodeId,
        factory: Arc<F>,
        routes: Vec<RouteDescriptor<C, D>>,
    ) -> Result<(), RouterError>
    where
        C: 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        for route in routes {
            let factory = Arc::clone(&factory);
            let action = route.action;
            let extensions: Vec<&str> = route.extensions.iter().map(String::as_str).collect();
            let kind = NodeKind::method(route.method, &extensions, move |ctx| {
                let mut controller = factory();
                action(&mut controller, ctx)
            })?;
            self.try_add(space, &route.name, kind)?;
        }
        Ok(())
    }

    /// Creates a node described by `spec` through `registry` and attaches it.
    pub fn mount(
        &mut self,
        parent: NodeId,
        spec: &NodeSpec,
        registry: &NodeRegistry<D>,
    ) -> Result<NodeId, RouterError> {
        let kind = registry.create(spec)?;
        self.try_add(parent, &spec.name, kind)
    }

    /// Attaches `child` to `parent`, detaching it from its previous parent first.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<&mut Self, RouterError> {
        self.check(parent)?;
        self.check(child)?;

        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(RouterError::CyclicAttach {
                    name: self.nodes[child.0].name.clone(),
                });
            }
            cursor = self.nodes[id.0].parent;
        }

        let p = &self.nodes[parent.0];
        if !p.kind.accepts_children() {
            return Err(RouterError::NotAttachable {
                name: p.name.clone(),
            });
        }

        let c = &self.nodes[child.0];
        let key = if c.pattern.is_plain() {
            let key = fold_case(&c.name);
            if let Some(&other) = p.named.get(&key) {
                if other != child {
                    return Err(RouterError::DuplicateChild {
                        parent: p.name.clone(),
                        name: c.name.clone(),
                    });
                }
            }
            Some(key)
        } else {
            None
        };

        self.detach(child);
        match key {
            Some(key) => {
                self.nodes[parent.0].named.insert(key, child);
            }
            None => self.nodes[parent.0].unnamed.push(child),
        }
        self.nodes[child.0].parent = Some(parent);
        trace!(parent = %self.nodes[parent.0].name, child = %self.nodes[child.0].name, "attach");
        Ok(self)
    }

    /// Removes `child` from its parent. The node stays in the builder and may be
    /// attached again.
    pub fn detach(&mut self, child: NodeId) {
        let parent = match self.nodes.get_mut(child.0).and_then(|c| c.parent.take()) {
            Some(p) => p,
            None => return,
        };
        let p = &mut self.nodes[parent.0];
        p.named.retain(|_, &mut id| id != child);
        p.unnamed.retain(|&id| id != child);
    }

    /// Sets the page a space node falls back to when the path stops at it, e.g. `"index"`
    /// or `"docs/intro"`.
    pub fn default_page(&mut self, id: NodeId, page: &str) -> Result<&mut Self, RouterError> {
        self.check(id)?;
        let node = &mut self.nodes[id.0];
        let segments = parse_default_page(&node.name, page)?;

        match &mut node.kind {
            NodeKind::Space { default } => {
                *default = Some(segments);
                Ok(self)
            }
            _ => Err(RouterError::InvalidDefault {
                name: node.name.clone(),
            }),
        }
    }

    pub fn pre_filter<F>(&mut self, id: NodeId, f: F) -> Result<&mut Self, RouterError>
    where
        F: Fn(&mut RouterContext<D>) -> bool + Send + Sync + 'static,
    {
        self.pre_filter_with(id, f)
    }

    pub fn post_filter<F>(&mut self, id: NodeId, f: F) -> Result<&mut Self, RouterError>
    where
        F: Fn(&mut RouterContext<D>, &mut Reply) -> bool + Send + Sync + 'static,
    {
        self.post_filter_with(id, f)
    }

    pub fn pre_filter_with(
        &mut self,
        id: NodeId,
        filter: impl PreFilter<D> + 'static,
    ) -> Result<&mut Self, RouterError> {
        self.check(id)?;
        self.nodes[id.0].pre_filters.push(Box::new(filter));
        Ok(self)
    }

    pub fn post_filter_with(
        &mut self,
        id: NodeId,
        filter: impl PostFilter<D> + 'static,
    ) -> Result<&mut Self, RouterError> {
        self.check(id)?;
        self.nodes[id.0].post_filters.push(Box::new(filter));
        Ok(self)
    }

    /// Validates default pages and freezes the tree.
    pub fn build(self) -> Result<Router<D>, RouterError> {
        for (i, node) in self.nodes.iter().enumerate() {
            if let NodeKind::Space { default: Some(_) } = node.kind {
                self.check_default(NodeId(i))?;
            }
        }
        Ok(Router {
            nodes: self.nodes,
            max_redirects: self.max_redirects,
        })
    }
}

/// Splits a default page into segments, rejecting pages that can not resolve
/// below the node they belong to.
pub(crate) fn parse_default_page(name: &str, page: &str) -> Result<Box<[Box<str>]>, RouterError> {
    let segments: Vec<Box<str>> = page.trim_matches('/').split('/').map(Into::into).collect();

    if segments.iter().any(|s| &**s == ".") {
        return Err(RouterError::SelfReferentialDefault { name: name.into() });
    }
    if segments.iter().any(|s| s.is_empty() || &**s == "..") {
        return Err(RouterError::InvalidDefault { name: name.into() });
    }
    Ok(segments.into_boxed_slice())
}

impl<D> TreeBuilder<D> {
    fn check(&self, id: NodeId) -> Result<(), RouterError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(RouterError::UnknownNode)
        }
    }

    /// Follows default pages from `start` and fails if the chain revisits a node
    /// or a page names no child at all.
    fn check_default(&self, start: NodeId) -> Result<(), RouterError> {
        let mut visited: Vec<NodeId> = vec![start];
        let mut current = start;

        while let NodeKind::Space {
            default: Some(ref page),
        } = self.nodes[current.0].kind
        {
            let mut id = current;
            for (i, segment) in page.iter().enumerate() {
                let node = &self.nodes[id.0];
                let next = node
                    .named
                    .get(&fold_case(segment))
                    .copied()
                    .or_else(|| {
                        node.unnamed
                            .iter()
                            .copied()
                            .find(|&c| self.nodes[c.0].pattern.is_match(segment))
                    });
                id = match next {
                    Some(next) => next,
                    None if i == 0 => {
                        return Err(RouterError::InvalidDefault {
                            name: self.nodes[current.0].name.clone(),
                        })
                    }
                    None => return Ok(()),
                };
                if !self.nodes[id.0].kind.accepts_children() {
                    return Ok(());
                }
            }
            if visited.contains(&id) {
                return Err(RouterError::SelfReferentialDefault {
                    name: self.nodes[start.0].name.clone(),
                });
            }
            visited.push(id);
            current = id;
        }
        Ok(())
    }
}
