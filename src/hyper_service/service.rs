use super::payload::HttpPayload;
use super::{BoxError, BoxFuture, Request, Response};

use crate::context::split_path;
use crate::executor::DispatchError;
use crate::handler::Reply;
use crate::router::Router;

use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::Service;
use hyper::Body;

/// Serves a routing tree over hyper.
#[derive(Debug)]
pub struct RouterService {
    router: Arc<Router<HttpPayload>>,
}

impl Clone for RouterService {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
        }
    }
}

impl Service<Request> for RouterService {
    type Response = Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Response, BoxError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let router = Arc::clone(&self.router);
        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = match hyper::body::to_bytes(body).await {
                Ok(b) => b,
                Err(e) => return Err(Box::new(e) as BoxError),
            };

            let segments = split_path(parts.uri.path());
            let method = parts.method.clone();
            let ret = router.dispatch(segments, method, HttpPayload { parts, body });
            Ok(into_response(ret))
        })
    }
}

impl RouterService {
    pub fn new(router: Router<HttpPayload>) -> Self {
        Self::from_shared(Arc::new(router))
    }

    pub fn from_shared(router: Arc<Router<HttpPayload>>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Router<HttpPayload> {
        &self.router
    }
}

/// Converts a dispatch outcome into a response.
pub fn into_response(ret: Result<Reply, DispatchError>) -> Response {
    match ret {
        Ok(reply) => {
            let content_type = reply.content_type();
            let mut res = Response::new(Body::from(reply.into_bytes()));
            res.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            res
        }
        Err(e) => {
            let status = e.status();
            let reason = status.canonical_reason().unwrap_or("");
            let mut res = Response::new(Body::from(format!("{} {}", status.as_u16(), reason)));
            *res.status_mut() = status;
            res
        }
    }
}
