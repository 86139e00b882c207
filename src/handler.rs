use crate::context::RouterContext;
use crate::executor::DispatchError;
use crate::pattern::SegmentPattern;
use crate::router::RouterError;

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use http::Method;

pub type HandlerError = Box<dyn StdError + Send + Sync>;

pub type HandlerResult = Result<Reply, HandlerError>;

pub type BoxCallback<D> = Box<dyn Fn(&mut RouterContext<D>) -> HandlerResult + Send + Sync>;

/// What a handler produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    /// A static file. `contents` holds the whole file; nothing is streamed.
    File { path: PathBuf, contents: Vec<u8> },
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Empty | Self::Bytes(_) => "application/octet-stream",
            Self::Text(_) => "text/plain; charset=utf-8",
            Self::File { path, .. } => crate::fs::content_type(path),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            Self::Text(s) => s.as_bytes(),
            Self::Bytes(b) => b,
            Self::File { contents, .. } => contents,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Empty => Vec::new(),
            Self::Text(s) => s.into_bytes(),
            Self::Bytes(b) => b,
            Self::File { contents, .. } => contents,
        }
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for Reply {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

/// A resource served by a restful node.
///
/// Operations left unimplemented answer as if the route did not exist.
pub trait Resource<D>: Send + Sync {
    fn get(&self, _ctx: &mut RouterContext<D>) -> HandlerResult {
        Err(DispatchError::NotFound.into())
    }

    fn post(&self, _ctx: &mut RouterContext<D>) -> HandlerResult {
        Err(DispatchError::NotFound.into())
    }

    fn put(&self, _ctx: &mut RouterContext<D>) -> HandlerResult {
        Err(DispatchError::NotFound.into())
    }

    fn delete(&self, _ctx: &mut RouterContext<D>) -> HandlerResult {
        Err(DispatchError::NotFound.into())
    }
}

impl<D, R: Resource<D> + ?Sized> Resource<D> for Arc<R> {
    fn get(&self, ctx: &mut RouterContext<D>) -> HandlerResult {
        (**self).get(ctx)
    }

    fn post(&self, ctx: &mut RouterContext<D>) -> HandlerResult {
        (**self).post(ctx)
    }

    fn put(&self, ctx: &mut RouterContext<D>) -> HandlerResult {
        (**self).put(ctx)
    }

    fn delete(&self, ctx: &mut RouterContext<D>) -> HandlerResult {
        (**self).delete(ctx)
    }
}

pub(crate) fn is_restful_method(method: &Method) -> bool {
    *method == Method::GET
        || *method == Method::POST
        || *method == Method::PUT
        || *method == Method::DELETE
}

pub(crate) fn call_resource<D>(
    resource: &dyn Resource<D>,
    ctx: &mut RouterContext<D>,
) -> HandlerResult {
    let method = ctx.method().clone();
    if method == Method::GET {
        resource.get(ctx)
    } else if method == Method::POST {
        resource.post(ctx)
    } else if method == Method::PUT {
        resource.put(ctx)
    } else if method == Method::DELETE {
        resource.delete(ctx)
    } else {
        Err(DispatchError::NotFound.into())
    }
}

/// Terminal binding of a method node.
pub struct MethodRoute<D> {
    method: Method,
    extensions: Box<[SegmentPattern]>,
    action: BoxCallback<D>,
}

impl<D> MethodRoute<D> {
    pub(crate) fn new(
        method: Method,
        extensions: &[&str],
        action: BoxCallback<D>,
    ) -> Result<Self, RouterError> {
        let extensions = extensions
            .iter()
            .map(|p| SegmentPattern::compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            method,
            extensions: extensions.into_boxed_slice(),
            action,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn extensions(&self) -> &[SegmentPattern] {
        &self.extensions
    }

    pub(crate) fn call(&self, ctx: &mut RouterContext<D>) -> HandlerResult {
        (self.action)(ctx)
    }
}

impl<D> fmt::Debug for MethodRoute<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRoute")
            .field("method", &self.method)
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// An operation of controller `C`.
pub type Action<C, D> = fn(&mut C, &mut RouterContext<D>) -> HandlerResult;

/// Describes one method node created for a controller.
pub struct RouteDescriptor<C, D> {
    pub(crate) name: String,
    pub(crate) method: Method,
    pub(crate) extensions: Vec<String>,
    pub(crate) action: Action<C, D>,
}

impl<C, D> RouteDescriptor<C, D> {
    pub fn new(method: Method, name: impl Into<String>, action: Action<C, D>) -> Self {
        Self {
            name: name.into(),
            method,
            extensions: Vec::new(),
            action,
        }
    }

    pub fn get(name: impl Into<String>, action: Action<C, D>) -> Self {
        Self::new(Method::GET, name, action)
    }

    pub fn post(name: impl Into<String>, action: Action<C, D>) -> Self {
        Self::new(Method::POST, name, action)
    }

    pub fn put(name: impl Into<String>, action: Action<C, D>) -> Self {
        Self::new(Method::PUT, name, action)
    }

    pub fn delete(name: impl Into<String>, action: Action<C, D>) -> Self {
        Self::new(Method::DELETE, name, action)
    }

    /// Appends a segment pattern that must follow the route name.
    pub fn extension(mut self, pattern: impl Into<String>) -> Self {
        self.extensions.push(pattern.into());
        self
    }
}

impl<C, D> fmt::Debug for RouteDescriptor<C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("extensions", &self.extensions)
            .finish()
    }
}
