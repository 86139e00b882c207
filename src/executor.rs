use crate::context::RouterContext;
use crate::filter::{run_post, run_pre};
use crate::handler::{call_resource, HandlerError, Reply};
use crate::router::{NodeId, NodeKind, Router};

use http::StatusCode;
use smallvec::SmallVec;
use tracing::{trace, warn};

/// Why a dispatch did not produce a reply.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no route matched")]
    NotFound,

    #[error("request rejected by a filter")]
    Rejected,

    #[error("handler failed: {0}")]
    Handler(#[source] HandlerError),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Rejected => StatusCode::FORBIDDEN,
            Self::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    fn from_handler(err: HandlerError) -> Self {
        match err.downcast::<DispatchError>() {
            Ok(e) => *e,
            Err(e) => Self::Handler(e),
        }
    }
}

/// Runs the filter pipeline and the handler of one matched route.
///
/// An executor is created for a single successful match and consumed by
/// [`Executor::execute`].
pub struct Executor<'r, 'c, D> {
    router: &'r Router<D>,
    node: NodeId,
    ctx: &'c mut RouterContext<D>,
}

impl<'r, 'c, D> Executor<'r, 'c, D> {
    /// # Panics
    /// Panics if `node` can not terminate a route. The matcher never produces such
    /// an executor, so reaching the panic means the tree itself is inconsistent.
    pub(crate) fn new(router: &'r Router<D>, node: NodeId, ctx: &'c mut RouterContext<D>) -> Self {
        assert!(
            router.get(node).kind().is_terminal(),
            "executor bound to non-terminal node {:?}",
            router.get(node).name()
        );
        Self { router, node, ctx }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn context(&self) -> &RouterContext<D> {
        self.ctx
    }

    pub fn execute(self) -> Result<Reply, DispatchError> {
        let Self { router, node, ctx } = self;
        let chain: SmallVec<[NodeId; 8]> = ctx.matched_chain().iter().copied().collect();

        if !run_pre(router, &chain, ctx) {
            return Err(DispatchError::Rejected);
        }

        let target = router.get(node);
        trace!(node = target.name(), kind = target.kind().kind_name(), "invoke handler");

        let ret = match target.kind() {
            NodeKind::Space { .. } => unreachable!("space nodes have no executor"),
            NodeKind::Static { root, index } => {
                crate::fs::serve(root, index.as_deref(), ctx.remaining())
            }
            NodeKind::Method(route) => route.call(ctx).map_err(DispatchError::from_handler),
            NodeKind::Restful(resource) => {
                call_resource(&**resource, ctx).map_err(DispatchError::from_handler)
            }
            NodeKind::Function(f) | NodeKind::Unlimited(f) => {
                f(ctx).map_err(DispatchError::from_handler)
            }
        };

        let mut reply = match ret {
            Ok(r) => r,
            Err(e) => {
                if let DispatchError::Handler(ref cause) = e {
                    warn!(node = target.name(), error = %cause, "handler failed");
                }
                return Err(e);
            }
        };

        if !run_post(router, &chain, ctx, &mut reply) {
            return Err(DispatchError::Rejected);
        }
        Ok(reply)
    }
}
