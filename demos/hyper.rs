use trellis_router::hyper_service::{HttpPayload, RouterService};
use trellis_router::{Method, NodeKind, Reply, RouterContext, TreeBuilder};

use std::convert::Infallible as Never;

use hyper::service::make_service_fn;

fn hello(ctx: &mut RouterContext<HttpPayload>) -> trellis_router::HandlerResult {
    let name = ctx.param("name").unwrap_or("world");
    Ok(Reply::text(format!("hello, {}!", name)))
}

#[tokio::main]
async fn main() {
    let mut b = TreeBuilder::<HttpPayload>::new();
    let root = b.root();
    b.add(
        root,
        "hello",
        NodeKind::method(Method::GET, &["{name}"], hello).unwrap(),
    );
    let api = b.space(root, "api").unwrap();
    let v1 = b.space(api, "v1").unwrap();
    b.add(v1, "static", NodeKind::static_dir("public"));
    b.add(
        v1,
        "file",
        NodeKind::unlimited(|ctx: &mut RouterContext<HttpPayload>| {
            Ok(Reply::text(format!("access file: {}", ctx.remaining().join("/"))))
        }),
    );
    b.pre_filter(api, |ctx| {
        println!("{} {:?}", ctx.method(), ctx.segments());
        true
    })
    .unwrap();
    let service = RouterService::new(b.build().unwrap());

    let make = make_service_fn(|_| {
        let service = service.clone();
        async move { Ok::<_, Never>(service) }
    });

    let addr = "127.0.0.1:3000";

    let server = hyper::Server::bind(&addr.parse().unwrap()).serve(make);

    println!("Server is listening on: http://{}", addr);
    println!("hello: http://{}/hello/world", addr);
    println!("api: http://{}/api/v1/file/path/to/public/file", addr);
    println!("404: http://{}/other/path", addr);
    println!();

    server.await.unwrap();
}
