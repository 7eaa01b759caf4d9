use http::Method;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{RequestAborted, Route, RouteMethod, RouteTable, Router};
use crate::context::{RequestEvent, State};
use crate::handler::{handler, shared, HandlerResult};
use crate::pattern::compile;
use crate::server::{AbortSignal, Request, Response};

fn event(method: Method, path: &str) -> RequestEvent {
    RequestEvent::new(Request::new(method, path), State::new())
}

fn text(body: &'static str) -> impl Fn(&mut RequestEvent) -> HandlerResult + Send + Sync + 'static {
    move |_ev: &mut RequestEvent| Ok(Some(Response::text(body)))
}

fn body(result: HandlerResult) -> Option<String> {
    result.unwrap().map(|r| r.body_text())
}

#[test]
fn test_routes_for_interleaves_all_routes() {
    let mut table = RouteTable::new();
    table.add(Route::new(RouteMethod::Only(Method::GET), None, vec![shared(text("a"))]));
    table.add(Route::new(RouteMethod::All, None, vec![shared(text("b"))]));
    table.add(Route::new(RouteMethod::Only(Method::POST), None, vec![shared(text("c"))]));
    table.add(Route::new(RouteMethod::Only(Method::GET), None, vec![shared(text("d"))]));

    let get: Vec<_> = table
        .routes_for(&Method::GET)
        .map(|r| r.method().to_string())
        .collect();
    assert_eq!(get, vec!["GET", "ALL", "GET"]);
    assert_eq!(table.routes_for(&Method::DELETE).count(), 1);
}

#[test]
fn test_first_match_wins() {
    let mut table = RouteTable::new();
    table.add(Route::new(
        RouteMethod::Only(Method::GET),
        Some(compile("/x").unwrap()),
        vec![shared(text("first"))],
    ));
    table.add(Route::new(
        RouteMethod::Only(Method::GET),
        Some(compile("/x").unwrap()),
        vec![shared(text("second"))],
    ));
    assert_eq!(body(table.dispatch(&mut event(Method::GET, "/x"))), Some("first".into()));
}

#[test]
fn test_passing_route_continues_to_next() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut router = Router::new();
    router.use_handler(move |ev: &mut RequestEvent| -> HandlerResult {
        counter.fetch_add(1, Ordering::SeqCst);
        ev.headers_mut().set("X-Test", "1");
        Ok(None)
    });
    router.get("/", text("done")).unwrap();

    let mut ev = event(Method::GET, "/");
    assert_eq!(body(router.handle(&mut ev)), Some("done".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(ev.headers().get("x-test"), Some("1"));
}

#[test]
fn test_handler_chain_stops_at_first_response() {
    let later = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&later);

    let mut router = Router::new();
    router
        .route(
            RouteMethod::Only(Method::GET),
            "/chain",
            vec![
                shared(handler(|_| Ok(None))),
                shared(text("second")),
                shared(move |_ev: &mut RequestEvent| -> HandlerResult {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(Response::text("third")))
                }),
            ],
        )
        .unwrap();

    assert_eq!(
        body(router.handle(&mut event(Method::GET, "/chain"))),
        Some("second".into())
    );
    assert_eq!(later.load(Ordering::SeqCst), 0);
}

#[test]
fn test_no_match_returns_none() {
    let mut router = Router::new();
    router.get("/a", text("a")).unwrap();
    assert!(body(router.handle(&mut event(Method::GET, "/b"))).is_none());
    assert!(body(router.handle(&mut event(Method::POST, "/a"))).is_none());
}

#[test]
fn test_prefixed_use_handler_matches_prefix_and_below() {
    let mut router = Router::with_prefix("/test").unwrap();
    router.use_handler(text("hit"));

    assert_eq!(body(router.handle(&mut event(Method::GET, "/test"))), Some("hit".into()));
    assert_eq!(
        body(router.handle(&mut event(Method::DELETE, "/test/a/b"))),
        Some("hit".into())
    );
    assert!(body(router.handle(&mut event(Method::GET, "/testing"))).is_none());
    assert!(body(router.handle(&mut event(Method::GET, "/"))).is_none());
}

#[test]
fn test_use_chain_runs_handlers_in_order() {
    let mut router = Router::with_prefix("/chain").unwrap();
    router.use_chain(vec![
        shared(handler(|ev| {
            ev.state_mut().set("step", "one");
            Ok(None)
        })),
        shared(handler(|ev| {
            let step = ev.state().get_str("step").unwrap_or_default().to_string();
            Ok(Some(Response::text(format!("{step} two"))))
        })),
        shared(text("never")),
    ]);

    assert_eq!(router.routes().len(), 1);
    assert_eq!(router.routes()[0].handler_count(), 3);
    assert_eq!(
        body(router.handle(&mut event(Method::PUT, "/chain/x"))),
        Some("one two".into())
    );
    assert!(body(router.handle(&mut event(Method::GET, "/other"))).is_none());
}

#[test]
fn test_prefix_params_and_route_params_merge() {
    let mut router = Router::with_prefix("/api/:version").unwrap();
    router
        .get(
            "/users/:id",
            handler(|ev| {
                Ok(Some(Response::text(format!(
                    "{} {}",
                    ev.param("version").unwrap_or_default(),
                    ev.param("id").unwrap_or_default()
                ))))
            }),
        )
        .unwrap();
    assert_eq!(
        body(router.handle(&mut event(Method::GET, "/api/v1/users/7"))),
        Some("v1 7".into())
    );
}

#[test]
fn test_base_params_are_kept_and_overwritten() {
    let mut router = Router::new();
    router
        .get(
            "/items/:id",
            handler(|ev| {
                Ok(Some(Response::text(format!(
                    "{} {}",
                    ev.param("tenant").unwrap_or("-"),
                    ev.param("id").unwrap_or("-")
                ))))
            }),
        )
        .unwrap();

    let mut ev = event(Method::GET, "/items/9");
    ev.set_params([("tenant", "acme"), ("id", "stale")].into_iter().collect());
    assert_eq!(body(router.handle(&mut ev)), Some("acme 9".into()));
}

#[test]
fn test_router_state_is_scoped() {
    let mut router = Router::new().with_state([("bye", "bye")].into_iter().collect());
    router.use_handler(handler(|ev| {
        ev.state_mut().set("test", "test");
        Ok(None)
    }));
    router.use_handler(handler(|ev| {
        Ok(Some(Response::text(format!(
            "{} {} {}",
            ev.state().get_str("hello").unwrap_or_default(),
            ev.state().get_str("test").unwrap_or_default(),
            ev.state().get_str("bye").unwrap_or_default()
        ))))
    }));

    let mut ev = RequestEvent::new(Request::get("/"), [("hello", "world")].into_iter().collect());
    assert_eq!(body(router.handle(&mut ev)), Some("world test bye".into()));
    assert_eq!(ev.state().get_str("hello"), Some("world"));
    assert!(!ev.state().contains("bye"));
    assert!(!ev.state().contains("test"));
}

#[test]
fn test_mounted_child_state_invisible_to_parent_routes() {
    let mut child = Router::with_prefix("/child")
        .unwrap()
        .with_state([("secret", "child")].into_iter().collect());
    child.get("/pass", handler(|_| Ok(None))).unwrap();

    let mut parent = Router::new();
    parent.mount(child).unwrap();
    parent
        .get(
            "/*",
            handler(|ev| {
                let seen = ev.state().get_str("secret").unwrap_or("none").to_string();
                Ok(Some(Response::text(seen)))
            }),
        )
        .unwrap();

    assert_eq!(
        body(parent.handle(&mut event(Method::GET, "/child/pass"))),
        Some("none".into())
    );
}

#[test]
fn test_mounted_child_sees_its_state_and_nested_prefixes() {
    let mut inner = Router::with_prefix("/test4/deeper")
        .unwrap()
        .with_state([("level", "inner")].into_iter().collect());
    inner
        .get(
            "/fourth",
            handler(|ev| {
                let outer = ev.state().get_str("outer").unwrap_or_default().to_string();
                let level = ev.state().get_str("level").unwrap_or_default().to_string();
                Ok(Some(Response::text(format!("{outer} {level}"))))
            }),
        )
        .unwrap();

    let mut middle = Router::with_prefix("/test3")
        .unwrap()
        .with_state([("outer", "middle"), ("level", "middle")].into_iter().collect());
    middle.mount(inner).unwrap();

    let mut root = Router::new();
    root.mount_at("/test2", middle).unwrap();

    assert_eq!(
        root.routes()[0].pattern(),
        Some("/test2/test3/test4/deeper/fourth")
    );
    assert_eq!(
        body(root.handle(&mut event(Method::GET, "/test2/test3/test4/deeper/fourth"))),
        Some("middle inner".into())
    );
}

#[test]
fn test_state_restored_on_error() {
    let mut child = Router::new().with_state([("scoped", true)].into_iter().collect());
    child.use_handler(handler(|_| Err(anyhow::anyhow!("boom"))));

    let mut root = Router::new().with_state([("root", true)].into_iter().collect());
    root.mount(child).unwrap();

    let mut ev = event(Method::GET, "/");
    assert!(root.handle(&mut ev).is_err());
    assert!(ev.state().is_empty());
}

#[test]
fn test_router_as_handler() {
    let mut inner = Router::new().with_state([("from", "inner")].into_iter().collect());
    inner.get(
        "/x",
        handler(|ev| {
            Ok(Some(Response::text(
                ev.state().get_str("from").unwrap_or_default().to_string(),
            )))
        }),
    )
    .unwrap();

    let mut outer = Router::new();
    outer.use_handler(inner);
    assert_eq!(body(outer.handle(&mut event(Method::GET, "/x"))), Some("inner".into()));
}

#[test]
fn test_abort_stops_dispatch() {
    let signal = AbortSignal::new();
    let trigger = signal.clone();

    let mut router = Router::new();
    router.use_handler(move |_ev: &mut RequestEvent| -> HandlerResult {
        trigger.abort();
        Ok(None)
    });
    router.use_handler(text("unreachable"));

    let mut ev = RequestEvent::new(
        Request::get("/").with_abort_signal(signal),
        State::new(),
    );
    let err = router.handle(&mut ev).unwrap_err();
    assert!(err.downcast_ref::<RequestAborted>().is_some());
}

#[test]
fn test_invalid_pattern_is_reported_at_registration() {
    let mut router = Router::new();
    assert!(router.get("/users/:", text("x")).is_err());
    assert!(Router::with_prefix("/api/:").is_err());
}

#[test]
fn test_summary_lists_routes() {
    let mut router = Router::new();
    router.get("/a", text("a")).unwrap();
    router.use_handler(text("b"));
    assert_eq!(router.summary(), vec!["GET     /a", "ALL     *"]);
}
