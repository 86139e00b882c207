use super::{NodeId, NodeKind, Router};

use crate::context::RouterContext;
use crate::executor::{DispatchError, Executor};
use crate::handler::{is_restful_method, Reply};
use crate::pattern::CapturedValues;

use http::Method;
use smallvec::SmallVec;
use tracing::{debug, debug_span, trace};

struct MatchState {
    redirects: usize,
    max_redirects: usize,
}

/// Outcome of matching one node.
enum Step {
    Matched(NodeId),
    Miss,
    /// Refused for security reasons; siblings must not be tried.
    Deny,
}

impl Step {
    fn is_matched(&self) -> bool {
        matches!(self, Step::Matched(_))
    }
}

impl<D> Router<D> {
    /// Matches the context against the tree.
    ///
    /// On success the context holds the captured params and the matched chain
    /// (root first), and the returned executor is bound to the terminal node.
    /// On failure the context is left at level 0 with no params added.
    pub fn find<'r, 'c>(&'r self, ctx: &'c mut RouterContext<D>) -> Option<Executor<'r, 'c, D>> {
        ctx.reset_match();
        if ctx.is_terminated() {
            return None;
        }

        let mut state = MatchState {
            redirects: 0,
            max_redirects: self.max_redirects,
        };
        let root = self.root();
        let terminal = match self.descend(root, ctx, &mut state) {
            Step::Matched(terminal) => terminal,
            Step::Miss => return None,
            Step::Deny => {
                debug!("match denied");
                return None;
            }
        };
        ctx.push_chain(root);
        ctx.finish_chain();
        Some(Executor::new(self, terminal, ctx))
    }

    /// The dispatch entry point used by transports.
    pub fn dispatch<I, S>(&self, segments: I, method: Method, data: D) -> Result<Reply, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ctx = RouterContext::new(segments, method, data);
        self.dispatch_context(&mut ctx)
    }

    pub fn dispatch_context(&self, ctx: &mut RouterContext<D>) -> Result<Reply, DispatchError> {
        let span = debug_span!("dispatch", method = %ctx.method(), segments = ctx.segments().len());
        let _enter = span.enter();

        let terminated = ctx.is_terminated();
        match self.find(ctx) {
            Some(executor) => executor.execute(),
            None if terminated => Err(DispatchError::Rejected),
            None => {
                debug!("no route matched");
                Err(DispatchError::NotFound)
            }
        }
    }

    /// Tries `id` against `segments[level]`, restoring the level unless it matched.
    fn match_node(&self, id: NodeId, ctx: &mut RouterContext<D>, state: &mut MatchState) -> Step {
        let node = self.get(id);
        let level = ctx.level();

        let captured = match ctx.segment().and_then(|s| node.pattern().captures(s)) {
            Some(values) => values,
            None => return Step::Miss,
        };
        ctx.set_level(level + 1);

        let step = match node.kind() {
            NodeKind::Static { .. } => {
                if crate::fs::is_traversal(ctx.remaining()) {
                    debug!(node = node.name(), "path traversal rejected");
                    Step::Deny
                } else {
                    Step::Matched(id)
                }
            }
            NodeKind::Unlimited(_) => Step::Matched(id),
            NodeKind::Method(_) => self.match_method(id, ctx),
            _ => self.descend(id, ctx, state),
        };

        match step {
            Step::Matched(terminal) => {
                record(ctx, node.pattern().names(), captured);
                ctx.push_chain(id);
                Step::Matched(terminal)
            }
            other => {
                trace!(node = node.name(), level, "backtrack");
                ctx.set_level(level);
                other
            }
        }
    }

    /// Matches whatever remains below `id`, whose own segment is already consumed.
    ///
    /// A denied child ends the search: no sibling is tried after it.
    fn descend(&self, id: NodeId, ctx: &mut RouterContext<D>, state: &mut MatchState) -> Step {
        if ctx.is_terminated() {
            return Step::Miss;
        }
        let node = self.get(id);

        let segment = match ctx.segment() {
            Some(s) => s,
            None => {
                return match node.kind() {
                    NodeKind::Space { default: Some(default) } => {
                        self.redirect(id, default, ctx, state)
                    }
                    NodeKind::Space { default: None } => Step::Miss,
                    NodeKind::Restful(_) if !is_restful_method(ctx.method()) => Step::Miss,
                    _ => Step::Matched(id),
                }
            }
        };

        if let Some(child) = node.named_child(segment) {
            match self.match_node(child, ctx, state) {
                Step::Miss => {}
                step => return step,
            }
        }
        for &child in node.unnamed_children() {
            match self.match_node(child, ctx, state) {
                Step::Miss => {}
                step => return step,
            }
        }
        Step::Miss
    }

    /// Re-enters matching below `id` with the default page appended.
    fn redirect(
        &self,
        id: NodeId,
        default: &[Box<str>],
        ctx: &mut RouterContext<D>,
        state: &mut MatchState,
    ) -> Step {
        if state.redirects >= state.max_redirects {
            debug!(node = self.get(id).name(), "default page redirect limit reached");
            return Step::Miss;
        }
        state.redirects += 1;

        let len = ctx.segments().len();
        ctx.extend_segments(default);
        let step = self.descend(id, ctx, state);
        if !step.is_matched() {
            ctx.truncate_segments(len);
        }
        step
    }

    fn match_method(&self, id: NodeId, ctx: &mut RouterContext<D>) -> Step {
        let route = match self.get(id).kind() {
            NodeKind::Method(route) => route,
            _ => return Step::Miss,
        };
        if route.method() != ctx.method() {
            return Step::Miss;
        }

        let remaining = ctx.remaining();
        let extensions = route.extensions();
        if remaining.len() < extensions.len() {
            return Step::Miss;
        }

        let mut captured: SmallVec<[(&str, String); 4]> = SmallVec::new();
        for (pattern, segment) in extensions.iter().zip(remaining) {
            let values = match pattern.captures(segment) {
                Some(values) => values,
                None => return Step::Miss,
            };
            captured.extend(pattern.names().iter().map(|n| &**n).zip(values));
        }
        let extras = remaining[extensions.len()..].to_vec();

        for (name, value) in captured {
            ctx.params_mut().insert(name, value);
        }
        ctx.set_extras(extras);
        Step::Matched(id)
    }
}

fn record<D>(ctx: &mut RouterContext<D>, names: &[Box<str>], values: CapturedValues) {
    for (name, value) in names.iter().zip(values) {
        ctx.params_mut().insert(name, value);
    }
}
