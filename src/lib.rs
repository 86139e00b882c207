//! A segment-tree request router.
//!
//! A request is a sequence of path segments plus a method. The tree matches the
//! segments node by node, backtracking through pattern children when a branch
//! dead-ends, collects `{key=regex}` captures, and hands back an [`Executor`]
//! bound to the terminal node. Executing it runs the pre-filters root-to-leaf,
//! the node's handler, then the post-filters leaf-to-root.
//!
//! ```
//! use trellis_router::{DispatchError, Method, NodeKind, Reply, TreeBuilder};
//!
//! let mut builder = TreeBuilder::<()>::new();
//! let shop = builder.space(builder.root(), "shop").unwrap();
//! let item = NodeKind::method(Method::GET, &["{id=[0-9]+}.html"], |ctx| {
//!     Ok(Reply::text(format!("item {}", ctx.param("id").unwrap_or_default())))
//! })
//! .unwrap();
//! builder.add(shop, "Item", item);
//! let router = builder.build().unwrap();
//!
//! let reply = router.dispatch(vec!["shop", "Item", "42.html"], Method::GET, ()).unwrap();
//! assert_eq!(reply, Reply::text("item 42"));
//!
//! let err = router.dispatch(vec!["shop", "Item", "42.html"], Method::POST, ()).unwrap_err();
//! assert!(matches!(err, DispatchError::NotFound));
//! ```

#![forbid(unsafe_code)]

mod context;
mod executor;
mod filter;
mod handler;
mod pattern;
mod registry;
mod router;

pub mod fs;

#[cfg(feature = "hyper-service")]
pub mod hyper_service;

pub use crate::context::{split_path, RouterContext};
pub use crate::executor::{DispatchError, Executor};
pub use crate::filter::{PostFilter, PreFilter};
pub use crate::handler::{
    Action, HandlerError, HandlerResult, MethodRoute, Reply, Resource, RouteDescriptor,
};
pub use crate::pattern::SegmentPattern;
pub use crate::registry::{NodeRegistry, NodeSpec};
pub use crate::router::{Node, NodeId, NodeKind, Params, Router, RouterError, TreeBuilder};

pub use http::Method;
