//! Pre- and post-filters.
//!
//! Pre-filters run root-to-leaf along the matched chain before the handler,
//! post-filters run leaf-to-root after it. A filter returning `false`, or
//! terminating the context, stops the phase and rejects the request.

use crate::context::RouterContext;
use crate::handler::Reply;
use crate::router::{NodeId, Router};

use tracing::debug;

pub trait PreFilter<D>: Send + Sync {
    fn pre(&self, ctx: &mut RouterContext<D>) -> bool;
}

pub trait PostFilter<D>: Send + Sync {
    fn post(&self, ctx: &mut RouterContext<D>, reply: &mut Reply) -> bool;
}

pub type BoxPreFilter<D> = Box<dyn PreFilter<D>>;

pub type BoxPostFilter<D> = Box<dyn PostFilter<D>>;

impl<D, F> PreFilter<D> for F
where
    F: Fn(&mut RouterContext<D>) -> bool + Send + Sync,
{
    fn pre(&self, ctx: &mut RouterContext<D>) -> bool {
        (self)(ctx)
    }
}

impl<D, F> PostFilter<D> for F
where
    F: Fn(&mut RouterContext<D>, &mut Reply) -> bool + Send + Sync,
{
    fn post(&self, ctx: &mut RouterContext<D>, reply: &mut Reply) -> bool {
        (self)(ctx, reply)
    }
}

pub(crate) fn run_pre<D>(router: &Router<D>, chain: &[NodeId], ctx: &mut RouterContext<D>) -> bool {
    for &id in chain {
        let node = router.get(id);
        for filter in node.pre_filters() {
            if ctx.is_terminated() || !filter.pre(ctx) || ctx.is_terminated() {
                debug!(node = node.name(), "pre-filter rejected request");
                return false;
            }
        }
    }
    true
}

pub(crate) fn run_post<D>(
    router: &Router<D>,
    chain: &[NodeId],
    ctx: &mut RouterContext<D>,
    reply: &mut Reply,
) -> bool {
    for &id in chain.iter().rev() {
        let node = router.get(id);
        for filter in node.post_filters() {
            if ctx.is_terminated() || !filter.post(ctx, reply) || ctx.is_terminated() {
                debug!(node = node.name(), "post-filter suppressed reply");
                return false;
            }
        }
    }
    true
}
