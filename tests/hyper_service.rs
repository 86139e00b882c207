#![cfg(feature = "hyper-service")]

use hyper::service::Service;
use hyper::{Body, Request, StatusCode};

use trellis_router::hyper_service::{HttpPayload, RouterService};
use trellis_router::{Method, NodeKind, Reply, RouteDescriptor, RouterContext, TreeBuilder};

#[derive(Default)]
struct Notes;

impl Notes {
    fn show(&mut self, ctx: &mut RouterContext<HttpPayload>) -> Result<Reply, trellis_router::HandlerError> {
        let verbose = ctx.data().query_param("verbose").is_some();
        let id = ctx.param("id").unwrap_or_default();
        Ok(Reply::text(if verbose {
            format!("note #{} (verbose)", id)
        } else {
            format!("note #{}", id)
        }))
    }

    fn create(&mut self, ctx: &mut RouterContext<HttpPayload>) -> Result<Reply, trellis_router::HandlerError> {
        let body = String::from_utf8_lossy(&ctx.data().body).into_owned();
        Ok(Reply::text(format!("created {}", body)))
    }
}

fn service() -> RouterService {
    let mut b = TreeBuilder::<HttpPayload>::new();
    let root = b.root();
    b.controller(
        root,
        "notes",
        Notes::default,
        vec![
            RouteDescriptor::get("show", Notes::show).extension("{id=[0-9]+}"),
            RouteDescriptor::post("create", Notes::create),
        ],
    )
    .unwrap();
    let admin = b
        .try_add(root, "admin", NodeKind::function(|_| Ok(Reply::text("admin"))))
        .unwrap();
    b.pre_filter(admin, |ctx| ctx.data().headers().contains_key("x-token")).unwrap();
    b.try_add(
        root,
        "echo",
        NodeKind::function(|ctx: &mut RouterContext<HttpPayload>| {
            let name = ctx.data().query_param("name").unwrap_or_default();
            Ok(Reply::text(name.into_owned()))
        }),
    )
    .unwrap();
    RouterService::new(b.build().unwrap())
}

async fn call(svc: &mut RouterService, req: Request<Body>) -> (StatusCode, String) {
    let res = svc.call(req).await.unwrap();
    let status = res.status();
    let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn request(method: Method, uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn routes_requests() {
    let mut svc = service();

    let (status, body) = call(&mut svc, request(Method::GET, "/notes/show/12", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "note #12");

    let (_, body) = call(&mut svc, request(Method::GET, "/notes/show/12?verbose=1", "")).await;
    assert_eq!(body, "note #12 (verbose)");

    let (status, body) = call(&mut svc, request(Method::POST, "/notes/create", "hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "created hello");
}

#[tokio::test]
async fn query_params_are_decoded() {
    let mut svc = service();

    let (_, body) = call(&mut svc, request(Method::GET, "/echo?name=caf%C3%A9+au+lait", "")).await;
    assert_eq!(body, "café au lait");

    let (_, body) = call(&mut svc, request(Method::GET, "/echo?x=1&na%6De=a%26b", "")).await;
    assert_eq!(body, "a&b");

    let (_, body) = call(&mut svc, request(Method::GET, "/echo?other=1", "")).await;
    assert_eq!(body, "");
}

#[tokio::test]
async fn maps_failures_to_status_codes() {
    let mut svc = service();

    let (status, _) = call(&mut svc, request(Method::GET, "/nowhere", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&mut svc, request(Method::POST, "/notes/show/12", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&mut svc, request(Method::GET, "/admin", "")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = Request::builder()
        .uri("/admin")
        .header("x-token", "t")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&mut svc, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "admin");
}

#[tokio::test]
async fn content_type_header() {
    let mut svc = service();
    let res = svc.call(request(Method::GET, "/notes/show/1", "")).await.unwrap();
    assert_eq!(
        res.headers()[hyper::header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
}
