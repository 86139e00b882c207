use crate::router::{NodeId, Params};

use http::Method;
use smallvec::SmallVec;

const SLASH: char = '/';

/// Per-request routing state.
///
/// A context is created for exactly one request and dropped when the request
/// completes. It is never shared between requests.
#[derive(Debug)]
pub struct RouterContext<D = ()> {
    segments: Vec<String>,
    level: usize,
    params: Params,
    method: Method,
    terminated: bool,
    data: D,
    chain: SmallVec<[NodeId; 8]>,
    extras: Vec<String>,
}

impl<D> RouterContext<D> {
    pub fn new<I, S>(segments: I, method: Method, data: D) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            level: 0,
            params: Params::new(),
            method,
            terminated: false,
            data,
            chain: SmallVec::new(),
            extras: Vec::new(),
        }
    }

    /// Builds a context from a slash-delimited request target.
    pub fn from_path(path: &str, method: Method, data: D) -> Self {
        Self::new(split_path(path), method, data)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Segments not yet consumed by the nodes matched so far.
    pub fn remaining(&self) -> &[String] {
        &self.segments[self.level..]
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    pub fn into_data(self) -> D {
        self.data
    }

    /// Stops any further matching or filter execution for this request.
    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Nodes on the matched path, root first.
    pub fn matched_chain(&self) -> &[NodeId] {
        &self.chain
    }

    /// Trailing segments left over after a method node's extensions.
    pub fn extras(&self) -> &[String] {
        &self.extras
    }
}

impl<D> RouterContext<D> {
    pub(crate) fn segment(&self) -> Option<&str> {
        self.segments.get(self.level).map(String::as_str)
    }

    pub(crate) fn set_level(&mut self, level: usize) {
        debug_assert!(level <= self.segments.len());
        self.level = level;
    }

    pub(crate) fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub(crate) fn push_chain(&mut self, id: NodeId) {
        self.chain.push(id);
    }

    pub(crate) fn finish_chain(&mut self) {
        self.chain.reverse();
    }

    pub(crate) fn reset_match(&mut self) {
        self.level = 0;
        self.chain.clear();
        self.extras.clear();
    }

    pub(crate) fn set_extras(&mut self, extras: Vec<String>) {
        self.extras = extras;
    }

    pub(crate) fn extend_segments(&mut self, tail: &[Box<str>]) {
        self.segments.extend(tail.iter().map(|s| s.to_string()));
    }

    pub(crate) fn truncate_segments(&mut self, len: usize) {
        self.segments.truncate(len);
    }
}

/// Splits a request target into path segments.
///
/// The query string is discarded and empty segments are skipped, so `"/a//b/"`
/// yields `["a", "b"]`.
pub fn split_path(path: &str) -> Vec<String> {
    let path = match path.find(|c| c == '?' || c == '#') {
        Some(i) => &path[..i],
        None => path,
    };
    path.split(SLASH)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
