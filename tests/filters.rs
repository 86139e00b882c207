use std::sync::{Arc, Mutex};

use trellis_router::{
    HandlerResult, Method, PostFilter, PreFilter, Reply, RouterContext, TreeBuilder,
};

type Log = Arc<Mutex<Vec<String>>>;

fn push(log: &Log, s: impl Into<String>) {
    log.lock().unwrap().push(s.into());
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

struct Tag {
    log: Log,
    name: &'static str,
    pass: bool,
}

impl PreFilter<()> for Tag {
    fn pre(&self, _: &mut RouterContext) -> bool {
        push(&self.log, format!("pre:{}", self.name));
        self.pass
    }
}

impl PostFilter<()> for Tag {
    fn post(&self, _: &mut RouterContext, reply: &mut Reply) -> bool {
        push(
            &self.log,
            format!("post:{}:{}", self.name, String::from_utf8_lossy(reply.as_bytes())),
        );
        self.pass
    }
}

fn tag(log: &Log, name: &'static str, pass: bool) -> Tag {
    Tag {
        log: Arc::clone(log),
        name,
        pass,
    }
}

fn handler(log: &Log) -> impl Fn(&mut RouterContext) -> HandlerResult + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_| {
        push(&log, "handler");
        Ok(Reply::text("raw"))
    }
}

#[test]
fn pipeline_order() {
    let log: Log = Log::default();

    let mut b = TreeBuilder::new();
    let root = b.root();
    let a = b.space(root, "a").unwrap();
    let leaf = b.function(a, "b", handler(&log)).unwrap();

    for &(id, name) in &[(root, "root"), (a, "a"), (leaf, "leaf")] {
        b.pre_filter_with(id, tag(&log, name, true)).unwrap();
        b.post_filter_with(id, tag(&log, name, true)).unwrap();
    }
    let router = b.build().unwrap();

    let reply = router.dispatch(vec!["a", "b"], Method::GET, ()).unwrap();
    assert_eq!(reply, Reply::text("raw"));
    assert_eq!(
        entries(&log),
        [
            "pre:root",
            "pre:a",
            "pre:leaf",
            "handler",
            "post:leaf:raw",
            "post:a:raw",
            "post:root:raw",
        ]
    );
}

#[test]
fn ancestor_pre_filter_vetoes() {
    let log: Log = Log::default();

    let mut b = TreeBuilder::new();
    let admin = b.space(b.root(), "admin").unwrap();
    let panel = b.function(admin, "panel", handler(&log)).unwrap();
    b.pre_filter_with(admin, tag(&log, "auth", false)).unwrap();
    b.pre_filter_with(panel, tag(&log, "panel", true)).unwrap();
    b.post_filter_with(panel, tag(&log, "panel", true)).unwrap();
    b.post_filter_with(admin, tag(&log, "admin", true)).unwrap();
    let router = b.build().unwrap();

    let err = router
        .dispatch(vec!["admin", "panel"], Method::GET, ())
        .unwrap_err();
    assert!(err.is_rejected());
    assert_eq!(err.status(), http::StatusCode::FORBIDDEN);
    assert_eq!(entries(&log), ["pre:auth"]);
}

#[test]
fn post_filter_sees_raw_result_first() {
    let mut b = TreeBuilder::new();
    let a = b.space(b.root(), "a").unwrap();
    let leaf = b.function(a, "b", |_| Ok(Reply::text("raw"))).unwrap();

    b.post_filter(leaf, |_, reply| {
        assert_eq!(*reply, Reply::text("raw"));
        *reply = Reply::text("leaf(raw)");
        true
    })
    .unwrap();
    b.post_filter(a, |_, reply| {
        let inner = String::from_utf8_lossy(reply.as_bytes()).into_owned();
        *reply = Reply::text(format!("a({})", inner));
        true
    })
    .unwrap();
    let router = b.build().unwrap();

    let reply = router.dispatch(vec!["a", "b"], Method::GET, ()).unwrap();
    assert_eq!(reply, Reply::text("a(leaf(raw))"));
}

#[test]
fn post_filter_suppresses_reply() {
    let log: Log = Log::default();

    let mut b = TreeBuilder::new();
    let root = b.root();
    let leaf = b.function(root, "x", handler(&log)).unwrap();
    b.post_filter_with(leaf, tag(&log, "leaf", false)).unwrap();
    b.post_filter_with(root, tag(&log, "root", true)).unwrap();
    let router = b.build().unwrap();

    let err = router.dispatch(vec!["x"], Method::GET, ()).unwrap_err();
    assert!(err.is_rejected());
    assert_eq!(entries(&log), ["handler", "post:leaf:raw"]);
}

#[test]
fn terminate_stops_pipeline() {
    let log: Log = Log::default();

    let mut b = TreeBuilder::new();
    let root = b.root();
    let leaf = b.function(root, "x", handler(&log)).unwrap();
    b.pre_filter(root, |ctx| {
        ctx.terminate();
        true
    })
    .unwrap();
    b.pre_filter_with(leaf, tag(&log, "leaf", true)).unwrap();
    let router = b.build().unwrap();

    let err = router.dispatch(vec!["x"], Method::GET, ()).unwrap_err();
    assert!(err.is_rejected());
    assert!(entries(&log).is_empty());
}

#[test]
fn filters_only_run_on_matched_path() {
    let log: Log = Log::default();

    let mut b = TreeBuilder::new();
    let root = b.root();
    let other = b.space(root, "other").unwrap();
    b.function(other, "x", handler(&log)).unwrap();
    b.function(root, "x", handler(&log)).unwrap();
    b.pre_filter_with(other, tag(&log, "other", false)).unwrap();
    let router = b.build().unwrap();

    router.dispatch(vec!["x"], Method::GET, ()).unwrap();
    assert_eq!(entries(&log), ["handler"]);
}

#[test]
fn pre_filter_reads_captures() {
    let mut b = TreeBuilder::new();
    let users = b.space(b.root(), "users").unwrap();
    let uid = b
        .function(users, "{uid=[0-9]+}", |ctx| {
            Ok(Reply::text(ctx.param("uid").unwrap_or_default().to_owned()))
        })
        .unwrap();
    b.pre_filter(uid, |ctx| ctx.param("uid") != Some("0")).unwrap();
    let router = b.build().unwrap();

    assert_eq!(
        router.dispatch(vec!["users", "12"], Method::GET, ()).unwrap(),
        Reply::text("12")
    );
    assert!(router
        .dispatch(vec!["users", "0"], Method::GET, ())
        .unwrap_err()
        .is_rejected());
}
