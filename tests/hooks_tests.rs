//! Integration tests for hooks wrapped around server dispatch.

use http::StatusCode;
use routechain::{handler, HandlerResult, Hook, RequestEvent, Response, Server};

mod common;
use common::{assert_response, get};

fn token_server() -> Server {
    let mut server = Server::new();
    server
        .use_hook(Hook::new().pre(handler(|ev| {
            if ev.cookie("token").is_none() {
                return Ok(Some(Response::text("Missing token").with_status(StatusCode::UNAUTHORIZED)));
            }
            Ok(None)
        })))
        .use_hook(Hook::new().pre(handler(|ev| {
            if ev.cookie("token") != Some("123") {
                return Ok(Some(Response::text("Invalid token").with_status(StatusCode::UNAUTHORIZED)));
            }
            Ok(None)
        })))
        .get(
            "/",
            handler(|ev| {
                let token = ev.cookie("token").unwrap_or_default().to_string();
                Ok(Some(Response::text(format!("Token: {token}"))))
            }),
        )
        .unwrap();
    server
}

#[test]
fn test_missing_token_rejected_by_first_hook() {
    let res = token_server().handle(get("/")).unwrap();
    assert_response(&res, StatusCode::UNAUTHORIZED, "Missing token");
}

#[test]
fn test_wrong_token_rejected_by_second_hook() {
    let res = token_server()
        .handle(get("/").with_header("Cookie", "token=456"))
        .unwrap();
    assert_response(&res, StatusCode::UNAUTHORIZED, "Invalid token");
}

#[test]
fn test_valid_token_reaches_route() {
    let res = token_server()
        .handle(get("/").with_header("Cookie", "token=123"))
        .unwrap();
    assert_response(&res, StatusCode::OK, "Token: 123");
}

fn tracer(name: &'static str) -> Hook {
    Hook::new()
        .pre(move |ev: &mut RequestEvent| -> HandlerResult {
            ev.headers_mut().append("X-Order", format!("{name}.pre"));
            Ok(None)
        })
        .post(move |ev: &mut RequestEvent, _res: &Response| -> HandlerResult {
            ev.headers_mut().append("X-Order", format!("{name}.post"));
            Ok(None)
        })
}

#[test]
fn test_hooks_wrap_dispatch_in_onion_order() {
    let mut server = Server::new();
    server
        .use_hook(tracer("H1"))
        .use_hook(tracer("H2"))
        .use_handler(handler(|ev| {
            ev.headers_mut().append("X-Order", "handler");
            Ok(Some(Response::text("ok")))
        }));

    let res = server.handle(get("/")).unwrap();
    assert_eq!(
        res.headers().get_all("x-order").collect::<Vec<_>>(),
        vec!["H1.pre", "H2.pre", "handler", "H2.post", "H1.post"]
    );
}

#[test]
fn test_hooks_wrap_not_found() {
    let mut server = Server::new();
    server.use_hook(Hook::new().post(|_ev: &mut RequestEvent, res: &Response| -> HandlerResult {
        Ok(Some(Response::text(format!("[{}] {}", res.status().as_u16(), res.body_text()))
            .with_status(res.status())))
    }));

    let res = server.handle(get("/nowhere")).unwrap();
    assert_response(&res, StatusCode::NOT_FOUND, "[404] Cannot GET /nowhere");
}

#[test]
fn test_patterned_hook_only_runs_on_matching_paths() {
    let mut server = Server::new();
    server
        .use_hook(Hook::at("/admin/:section").unwrap().pre(handler(|ev| {
            let section = ev.param("section").unwrap_or_default().to_string();
            Ok(Some(Response::text(format!("admin {section} locked")).with_status(StatusCode::FORBIDDEN)))
        })))
        .use_handler(handler(|ev| Ok(Some(Response::text(ev.path().to_string())))));

    assert_response(&server.handle(get("/admin/users")).unwrap(), StatusCode::FORBIDDEN, "admin users locked");
    assert_response(&server.handle(get("/public")).unwrap(), StatusCode::OK, "/public");
}

#[test]
fn test_hook_params_stay_out_of_route_params() {
    let mut server = Server::new();
    server
        .use_hook(Hook::at("/users/:id").unwrap().pre(handler(|ev| {
            let id = ev.param("id").unwrap_or_default().to_string();
            ev.state_mut().set("hook_id", id);
            Ok(None)
        })))
        .get(
            "/users/:uid",
            handler(|ev| {
                let params: Vec<String> = ev.params().iter().map(|(k, v)| format!("{k}={v}")).collect();
                let hook_id = ev.state().get_str("hook_id").unwrap_or_default();
                Ok(Some(Response::text(format!("{} hook={hook_id}", params.join(",")))))
            }),
        )
        .unwrap();

    let res = server.handle(get("/users/7")).unwrap();
    assert_response(&res, StatusCode::OK, "uid=7 hook=7");
}

#[test]
fn test_logger_hook_leaves_response_untouched() {
    let mut server = Server::new();
    server
        .use_hook(Hook::logger())
        .use_handler(handler(|_ev| Ok(Some(Response::text("Hello")))));

    let res = server.handle(get("/")).unwrap();
    assert_response(&res, StatusCode::OK, "Hello");
}

#[test]
fn test_hook_error_becomes_internal_error() {
    let mut server = Server::new();
    server
        .use_hook(Hook::new().pre(handler(|_ev| Err(anyhow::anyhow!("auth backend down")))))
        .use_handler(handler(|_ev| Ok(Some(Response::text("unreachable")))));

    assert!(server.handle(get("/")).is_err());
    let res = server.respond(get("/"));
    assert_response(&res, StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
}
