//! End-to-end behavior of `Road::request`.

use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use byway::handler::immediate;
use byway::http::header::LOCATION;
use byway::http::HeaderValue;
use byway::{
    middleware, Arg, BoxError, Chain, Config, Error, HandlerRegistry, HeaderMap, Method, Next,
    Reply, Request, Response, Road, StatusCode,
};

#[path = "../demos/basic.rs"]
#[allow(dead_code)]
mod demo;

async fn send(road: &Road, method: Method, url: &str) -> Response {
    road.request(method, url, None, HeaderMap::new()).await.unwrap()
}

async fn send_with(road: &Road, method: Method, url: &str, headers: &[(&'static str, &'static str)]) -> Response {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(*name, HeaderValue::from_static(*value));
    }
    road.request(method, url, None, map).await.unwrap()
}

fn answer(body: &'static str) -> impl byway::Handler {
    immediate(move |_req: Request| body)
}

#[derive(Debug, PartialEq)]
struct Boom(u32);

impl fmt::Display for Boom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "boom #{}", self.0)
    }
}

impl std::error::Error for Boom {}

// ── Normalization ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_road_answers_not_found() {
    let res = send(&Road::new(), Method::GET, "/").await;

    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(res.body_text(), Some("Page not found"));
}

#[tokio::test]
async fn raw_bodies_are_wrapped_as_plain_200s() {
    let road = Road::new().add_route(Method::GET, "/hello", answer("hello"));
    let res = send(&road, Method::GET, "/hello").await;

    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.body_text(), Some("hello"));
    assert!(res.headers().is_empty());
}

#[tokio::test]
async fn handler_responses_come_back_untouched() {
    let road = Road::new().add_route(Method::POST, "/users", |_req: Request, _next: Next| async {
        Response::builder()
            .status(StatusCode::CREATED)
            .header(LOCATION, HeaderValue::from_static("/users/99"))
            .json(br#"{"id":99}"#.to_vec())
    });

    let res = send(&road, Method::POST, "/users").await;

    assert_eq!(res.status_code(), StatusCode::CREATED);
    assert_eq!(res.headers()[LOCATION], "/users/99");
    assert_eq!(res.body_text(), Some(r#"{"id":99}"#));
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn synchronous_handler_errors_reach_the_caller_unchanged() {
    let road = Road::new().add_route(
        Method::GET,
        "/fail",
        immediate(|_req: Request| -> Result<Response, Boom> { Err(Boom(7)) }),
    );

    let err = road.request(Method::GET, "/fail", None, HeaderMap::new()).await.unwrap_err();

    assert_eq!(err.downcast_ref::<Boom>(), Some(&Boom(7)));
    assert_eq!(err.to_string(), "boom #7");
}

#[tokio::test]
async fn asynchronous_handler_errors_pass_through_middleware() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    let road = Road::new()
        .use_middleware(move |req: Request, next: Next| {
            let counter = Arc::clone(&counter);
            async move {
                let outcome = next.run(req).await;
                counter.fetch_add(1, Ordering::SeqCst);
                outcome
            }
        })
        .add_route(Method::GET, "/fail", |_req: Request, _next: Next| async {
            tokio::task::yield_now().await;
            Err::<Response, _>(Boom(3))
        });

    let err = road.request(Method::GET, "/fail", None, HeaderMap::new()).await.unwrap_err();

    assert_eq!(err.downcast_ref::<Boom>(), Some(&Boom(3)));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn catch_errors_converts_failures_into_replies() {
    let road = Road::new()
        .use_middleware(middleware::catch_errors(|err: BoxError| {
            Response::text(err.to_string()).with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }))
        .add_route(Method::GET, "/fail", immediate(|_req: Request| -> Result<(), Boom> { Err(Boom(1)) }));

    let res = send(&road, Method::GET, "/fail").await;

    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body_text(), Some("boom #1"));
}

#[tokio::test]
async fn unparsable_urls_fail_the_request() {
    let err = Road::new().request(Method::GET, "", None, HeaderMap::new()).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidUrl(_))));
}

// ── Middleware ────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Flag(&'static str);

#[tokio::test]
async fn middleware_run_in_onion_order_and_share_the_context() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (a, b) = (Arc::clone(&log), Arc::clone(&log));

    let road = Road::new()
        .use_middleware(move |mut req: Request, next: Next| {
            let log = Arc::clone(&a);
            async move {
                log.lock().unwrap().push("A-before".to_owned());
                req.context_mut().insert(Flag("A"));
                let reply = next.run(req).await;
                log.lock().unwrap().push("A-after".to_owned());
                reply
            }
        })
        .use_middleware(move |req: Request, next: Next| {
            let log = Arc::clone(&b);
            async move {
                let flag = req.context().get::<Flag>().map_or("-", |f| f.0);
                log.lock().unwrap().push(format!("B-before saw {flag}"));
                let reply = next.run(req).await;
                log.lock().unwrap().push("B-after".to_owned());
                reply
            }
        });

    send(&road, Method::GET, "/").await;

    assert_eq!(*log.lock().unwrap(), ["A-before", "B-before saw A", "B-after", "A-after"]);
}

#[tokio::test]
async fn middleware_may_post_process_replies() {
    let road = Road::new()
        .use_middleware(|req: Request, next: Next| async move {
            let mut reply = next.run(req).await?;
            reply.response_mut().headers_mut().insert("x-wrapped", HeaderValue::from_static("yes"));
            Ok::<Reply, BoxError>(reply)
        })
        .add_route(Method::GET, "/", answer("home"));

    let res = send(&road, Method::GET, "/").await;

    assert_eq!(res.body_text(), Some("home"));
    assert_eq!(res.headers()["x-wrapped"], "yes");
}

#[tokio::test]
async fn middleware_may_short_circuit_routing() {
    let road = Road::new()
        .use_middleware(|_req: Request, _next: Next| async { StatusCode::SERVICE_UNAVAILABLE })
        .add_route(Method::GET, "/", answer("home"));

    let res = send(&road, Method::GET, "/").await;
    assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn middleware_registered_after_routes_still_runs_first() {
    let road = Road::new()
        .add_route(Method::GET, "/", |req: Request, _next: Next| async move {
            req.context().get::<Flag>().map_or("missing", |f| f.0)
        })
        .use_middleware(middleware::provide(Flag("provided")));

    let res = send(&road, Method::GET, "/").await;
    assert_eq!(res.body_text(), Some("provided"));
}

#[tokio::test]
async fn concurrent_requests_get_their_own_context() {
    #[derive(Clone)]
    struct Visit(String);

    let road = Road::new()
        .use_middleware(|mut req: Request, next: Next| async move {
            let visit = Visit(req.path().to_owned());
            req.context_mut().insert(visit);
            tokio::task::yield_now().await;
            next.run(req).await
        })
        .add_route(Method::GET, "/visits/$who", |req: Request, _next: Next| async move {
            req.context().get::<Visit>().map(|v| v.0.clone()).unwrap_or_default()
        });

    let (one, two) = tokio::join!(
        road.request(Method::GET, "/visits/one", None, HeaderMap::new()),
        road.request(Method::GET, "/visits/two", None, HeaderMap::new()),
    );

    assert_eq!(one.unwrap().body_text(), Some("/visits/one"));
    assert_eq!(two.unwrap().body_text(), Some("/visits/two"));
}

#[tokio::test]
async fn trailing_slashes_redirect_when_asked_to() {
    let road = Road::new()
        .use_middleware(middleware::remove_trailing_slash())
        .add_route(Method::GET, "/users", answer("users"));

    let res = send(&road, Method::GET, "/users/?page=2").await;
    assert_eq!(res.status_code(), StatusCode::FOUND);
    assert_eq!(res.headers()[LOCATION], "/users?page=2");

    let res = send(&road, Method::GET, "/").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn without_the_middleware_trailing_slashes_do_not_match() {
    let road = Road::new().add_route(Method::GET, "/users", answer("users"));
    assert_eq!(send(&road, Method::GET, "/users/").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trace_middleware_is_transparent() {
    let road = Road::new()
        .use_middleware(middleware::trace())
        .add_route(Method::GET, "/", answer("home"));

    assert_eq!(send(&road, Method::GET, "/").await.body_text(), Some("home"));
}

// ── Matching ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn numeric_variables_reach_handlers_as_numbers() {
    let road = Road::new().add_route(Method::GET, "/users/#id", |req: Request, _next: Next| async move {
        match req.arg("id") {
            Some(Arg::Number(n)) => format!("number {n}"),
            other => format!("unexpected {other:?}"),
        }
    });

    assert_eq!(send(&road, Method::GET, "/users/42").await.body_text(), Some("number 42"));
    assert_eq!(send(&road, Method::GET, "/users/abc").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn string_variables_reach_handlers_as_text() {
    let road = Road::new().add_route(Method::GET, "/users/$name", |req: Request, _next: Next| async move {
        req.url().args().text("name").unwrap_or_default().to_owned()
    });

    let res = send(&road, Method::GET, "/users/anything-but-slash").await;
    assert_eq!(res.body_text(), Some("anything-but-slash"));
}

#[tokio::test]
async fn raw_spaces_in_urls_still_match_text_variables() {
    let road = Road::new().add_route(Method::GET, "/users/$name", |req: Request, _next: Next| async move {
        req.url().args().text("name").unwrap_or_default().to_owned()
    });

    let res = send(&road, Method::GET, "/users/a b").await;
    assert_eq!(res.body_text(), Some("a%20b"));
}

#[tokio::test]
async fn several_paths_share_one_handler() {
    let road = Road::new().add_route(Method::GET, ["/a", "/b"], answer("shared"));

    assert_eq!(send(&road, Method::GET, "/a").await.body_text(), Some("shared"));
    assert_eq!(send(&road, Method::GET, "/b").await.body_text(), Some("shared"));
}

#[test]
#[should_panic(expected = "invalid route template")]
fn invalid_templates_panic_at_registration() {
    let _ = Road::new().add_route(Method::GET, "no-leading-slash", answer("x"));
}

#[test]
fn try_add_route_reports_invalid_templates() {
    let err = Road::new().try_add_route(Method::GET, ["/ok", "/#"], answer("x")).err().unwrap();
    assert!(matches!(err, Error::InvalidTemplate { template, .. } if template == "/#"));
}

// ── 404 / 405 ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn wrong_method_is_405_and_unknown_path_is_404() {
    let road = Road::new().add_route(Method::PUT, "/widgets", answer("put"));

    let res = send(&road, Method::GET, "/widgets").await;
    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.body_text(), Some("Method Not Allowed"));

    let res = send(&road, Method::GET, "/nonexistent").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(res.body_text(), Some("Page not found"));
}

#[tokio::test]
async fn first_structural_match_decides_even_with_a_later_method_match() {
    let road = Road::new()
        .add_route(Method::GET, "/widgets", answer("get"))
        .add_route(Method::PUT, "/widgets", answer("put"));

    assert_eq!(send(&road, Method::GET, "/widgets").await.body_text(), Some("get"));
    assert_eq!(send(&road, Method::PUT, "/widgets").await.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn a_variable_route_shadows_a_later_literal_for_other_methods() {
    let road = Road::new()
        .add_route(Method::PUT, "/items/$name", answer("put item"))
        .add_route(Method::GET, "/items/special", answer("special"));

    let res = send(&road, Method::GET, "/items/special").await;
    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn configured_fallback_bodies() {
    let config = Config {
        not_found_body: "nothing here".to_owned(),
        method_not_allowed_body: "try another verb".to_owned(),
        ..Config::default()
    };
    let road = Road::with_config(config).add_route(Method::GET, "/x", answer("x"));

    assert_eq!(send(&road, Method::GET, "/y").await.body_text(), Some("nothing here"));
    assert_eq!(send(&road, Method::POST, "/x").await.body_text(), Some("try another verb"));
}

// ── Method override ───────────────────────────────────────────────────────────

#[tokio::test]
async fn post_with_override_header_reaches_put_routes() {
    let road = Road::new().add_route(Method::PUT, "/widgets", |req: Request, _next: Next| async move {
        format!("handled as {}", req.method())
    });

    let res = send_with(&road, Method::POST, "/widgets", &[("x-http-method-override", "put")]).await;
    assert_eq!(res.body_text(), Some("handled as PUT"));

    let res = send_with(&road, Method::GET, "/widgets", &[("x-http-method-override", "PUT")]).await;
    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn override_is_ignored_for_non_post_methods() {
    let road = Road::new().add_route(Method::GET, "/widgets", answer("get"));

    let res = send_with(&road, Method::GET, "/widgets", &[("x-http-method-override", "PUT")]).await;
    assert_eq!(res.body_text(), Some("get"));
}

#[tokio::test]
async fn override_query_parameter_and_header_precedence() {
    let road = Road::new().add_route(Method::DELETE, "/widgets/#id", answer("deleted"));

    let res = send(&road, Method::POST, "/widgets/3?_method=DELETE").await;
    assert_eq!(res.body_text(), Some("deleted"));

    let res = send_with(&road, Method::POST, "/widgets/3?_method=PATCH", &[("x-http-method-override", "DELETE")]).await;
    assert_eq!(res.body_text(), Some("deleted"));

    let res = send_with(&road, Method::POST, "/widgets/3?_method=DELETE", &[("x-http-method-override", "PATCH")]).await;
    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unparsable_override_values_leave_the_post_alone() {
    let road = Road::new().add_route(Method::POST, "/widgets", |req: Request, _next: Next| async move {
        format!("handled as {}", req.method())
    });

    let res = send_with(&road, Method::POST, "/widgets", &[("x-http-method-override", "NOT A METHOD")]).await;
    assert_eq!(res.body_text(), Some("handled as POST"));

    let res = send(&road, Method::POST, "/widgets?_method=%28bad%29").await;
    assert_eq!(res.body_text(), Some("handled as POST"));
}

#[tokio::test]
async fn config_loaded_from_a_file_drives_the_router() {
    let file = temp_file(
        r#"
        override_header = "X-Verb"
        not_found_body = "no such page"
        "#,
    );
    let config = Config::load(file.path()).await.unwrap();
    assert_eq!(config.override_header, "x-verb");
    assert!(config.method_override);

    let road = Road::with_config(config).add_route(Method::PATCH, "/widgets", answer("patched"));

    let res = send_with(&road, Method::POST, "/widgets", &[("x-verb", "patch")]).await;
    assert_eq!(res.body_text(), Some("patched"));

    let res = send_with(&road, Method::POST, "/widgets", &[("x-http-method-override", "PATCH")]).await;
    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);

    assert_eq!(send(&road, Method::GET, "/gone").await.body_text(), Some("no such page"));
}

#[tokio::test]
async fn override_can_be_switched_off() {
    let config = Config { method_override: false, ..Config::default() };
    let road = Road::with_config(config).add_route(Method::PUT, "/widgets", answer("put"));

    let res = send_with(&road, Method::POST, "/widgets", &[("x-http-method-override", "PUT")]).await;
    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

// ── Route targets ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn route_chains_run_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (first, second) = (Arc::clone(&log), Arc::clone(&log));

    let chain = Chain::new()
        .with(move |req: Request, next: Next| {
            let log = Arc::clone(&first);
            async move {
                log.lock().unwrap().push("mw1");
                let mut reply = next.run(req).await?;
                reply.response_mut().headers_mut().insert("x-mw1", HeaderValue::from_static("wrapped"));
                Ok::<_, BoxError>(reply)
            }
        })
        .with(move |_req: Request, _next: Next| {
            let log = Arc::clone(&second);
            async move {
                log.lock().unwrap().push("mw2");
                Response::text("from mw2")
            }
        });

    let road = Road::new().add_route(Method::GET, "/x", chain);
    let res = send(&road, Method::GET, "/x").await;

    assert_eq!(*log.lock().unwrap(), ["mw1", "mw2"]);
    assert_eq!(res.body_text(), Some("from mw2"));
    assert_eq!(res.headers()["x-mw1"], "wrapped");
}

#[tokio::test]
async fn route_handlers_calling_next_get_not_found() {
    let road = Road::new().add_route(Method::GET, "/pass", |req: Request, next: Next| next.run(req));
    assert_eq!(send(&road, Method::GET, "/pass").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nested_roads_rematch_the_original_request() {
    let api = Road::new()
        .use_middleware(middleware::provide(Flag("api")))
        .add_route(Method::PUT, "/api/users/#id", |req: Request, _next: Next| async move {
            let scope = req.context().get::<Flag>().map_or("-", |f| f.0);
            let id = req.arg("id").and_then(Arg::as_i64).unwrap_or_default();
            format!("{scope} updated {id} with {:?}", req.body())
        });

    let road = Road::new()
        .use_middleware(middleware::provide(Flag("outer")))
        .add_route(Method::PUT, "/api/users/#id", api);

    let res = road
        .request(Method::PUT, "/api/users/5", Some("payload".into()), HeaderMap::new())
        .await
        .unwrap();

    assert_eq!(res.body_text(), Some(r#"api updated 5 with Some(b"payload")"#));
}

#[tokio::test]
async fn nested_roads_answer_with_their_own_fallbacks() {
    let api = Road::new().add_route(Method::GET, "/api/other", answer("other"));
    let road = Road::new().add_route(Method::GET, "/api/users", api);

    let res = send(&road, Method::GET, "/api/users").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

// ── Hooks ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn before_route_hooks_can_veto() {
    let road = Road::new()
        .before_route(|req: &mut Request| {
            let authorized = req.header("authorization").is_some();
            async move { (!authorized).then(|| Response::status(StatusCode::UNAUTHORIZED)) }
        })
        .add_route(Method::GET, "/secret", answer("secret"));

    assert_eq!(send(&road, Method::GET, "/secret").await.status_code(), StatusCode::UNAUTHORIZED);

    let res = send_with(&road, Method::GET, "/secret", &[("authorization", "Bearer t")]).await;
    assert_eq!(res.body_text(), Some("secret"));
}

#[tokio::test]
async fn before_route_hooks_may_prepare_the_context() {
    let road = Road::new()
        .before_route(|req: &mut Request| {
            req.context_mut().insert(Flag("prepared"));
            async { None::<Response> }
        })
        .add_route(Method::GET, "/", |req: Request, _next: Next| async move {
            req.context().get::<Flag>().map_or("-", |f| f.0)
        });

    assert_eq!(send(&road, Method::GET, "/").await.body_text(), Some("prepared"));
}

#[tokio::test]
async fn hooks_only_run_for_matched_routes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (before, after) = (Arc::clone(&calls), Arc::clone(&calls));

    let road = Road::new()
        .before_route(move |_req: &mut Request| {
            before.fetch_add(1, Ordering::SeqCst);
            async { None::<Response> }
        })
        .after_route(move |_req: &Request, _reply: &Reply| {
            after.fetch_add(1, Ordering::SeqCst);
            async { None::<Response> }
        })
        .add_route(Method::GET, "/x", answer("x"));

    send(&road, Method::GET, "/missing").await;
    send(&road, Method::POST, "/x").await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    send(&road, Method::GET, "/x").await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn after_route_hooks_replace_replies_in_order() {
    let road = Road::new()
        .after_route(|_req: &Request, reply: &Reply| {
            let status = reply.status();
            async move { Some(format!("first saw {}", status.as_u16())) }
        })
        .after_route(|req: &Request, reply: &Reply| {
            let seen = reply.clone().into_response().body_text().map(str::to_owned);
            let path = req.path().to_owned();
            async move { Ok::<_, BoxError>(seen.map(|body| format!("{body} at {path}"))) }
        })
        .add_route(Method::GET, "/x", answer("original"));

    let res = send(&road, Method::GET, "/x").await;
    assert_eq!(res.body_text(), Some("first saw 200 at /x"));
}

#[tokio::test]
async fn after_route_hooks_run_when_the_handler_ignores_next() {
    let road = Road::new()
        .after_route(|_req: &Request, _reply: &Reply| async { Some("replaced") })
        .add_route(Method::GET, "/x", immediate(|_req: Request| "original"));

    assert_eq!(send(&road, Method::GET, "/x").await.body_text(), Some("replaced"));
}

#[tokio::test]
async fn a_veto_skips_the_after_hooks() {
    let road = Road::new()
        .before_route(|_req: &mut Request| async { Some("vetoed") })
        .after_route(|_req: &Request, _reply: &Reply| async { Some("replaced") })
        .add_route(Method::GET, "/x", answer("original"));

    assert_eq!(send(&road, Method::GET, "/x").await.body_text(), Some("vetoed"));
}

#[tokio::test]
async fn hook_errors_propagate() {
    let road = Road::new()
        .before_route(|_req: &mut Request| async { Err::<Option<Response>, _>(Boom(9)) })
        .add_route(Method::GET, "/x", answer("x"));

    let err = road.request(Method::GET, "/x", None, HeaderMap::new()).await.unwrap_err();
    assert_eq!(err.downcast_ref::<Boom>(), Some(&Boom(9)));
}

// ── Route files ───────────────────────────────────────────────────────────────

fn temp_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn route_files_register_under_a_prefix() {
    let file = temp_file(
        r#"
        [[routes]]
        method = "GET"
        path = "/"
        handler = "list"

        [[routes]]
        method = "GET"
        path = "/#id"
        handler = "show"
        "#,
    );
    let registry = HandlerRegistry::new()
        .register("list", answer("all posts"))
        .register("show", |req: Request, _next: Next| async move {
            format!("post {}", req.arg("id").map(ToString::to_string).unwrap_or_default())
        });

    let road = Road::new().add_route_file(file.path(), "/posts", &registry).await.unwrap();

    assert_eq!(send(&road, Method::GET, "/posts").await.body_text(), Some("all posts"));
    assert_eq!(send(&road, Method::GET, "/posts/3").await.body_text(), Some("post 3"));
    assert_eq!(send(&road, Method::GET, "/").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn route_file_failures_are_errors() {
    let registry = HandlerRegistry::new();

    let missing = Road::new().add_route_file("/no/such/routes.toml", "", &registry).await;
    assert!(matches!(missing, Err(Error::Io(_))));

    let malformed = temp_file("[[routes]]\nmethod = 1");
    let res = Road::new().add_route_file(malformed.path(), "", &registry).await;
    assert!(matches!(res, Err(Error::Config(_))));

    let unknown = temp_file("[[routes]]\nmethod = \"GET\"\npath = \"/\"\nhandler = \"ghost\"");
    let res = Road::new().add_route_file(unknown.path(), "", &registry).await;
    assert!(matches!(res, Err(Error::UnknownHandler(name)) if name == "ghost"));
}

#[tokio::test]
async fn route_files_with_bad_templates_or_methods_are_rejected() {
    let registry = HandlerRegistry::new().register("list", answer("all posts"));

    let bad_template = temp_file("[[routes]]\nmethod = \"GET\"\npath = \"posts\"\nhandler = \"list\"");
    let res = Road::new().add_route_file(bad_template.path(), "", &registry).await;
    assert!(matches!(res, Err(Error::InvalidTemplate { template, .. }) if template == "posts"));

    let bad_method = temp_file("[[routes]]\nmethod = \"NOT A METHOD\"\npath = \"/\"\nhandler = \"list\"");
    let res = Road::new().add_route_file(bad_method.path(), "/posts", &registry).await;
    assert!(matches!(res, Err(Error::InvalidMethod(method)) if method == "NOT A METHOD"));
}

// ── Demo ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_demo_route_is_reachable() {
    let road = demo::road();

    let res = send(&road, Method::GET, "/users").await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = send(&road, Method::GET, "/users/42").await;
    assert_eq!(res.body_text(), Some(r#"{"id":42,"name":"alice"}"#));

    let res = road
        .request(Method::POST, "/signup", Some(r#"{"name":"alice"}"#.into()), HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(res.status_code(), StatusCode::CREATED);
    assert_eq!(res.headers()[LOCATION], "/users/99");

    let res = send(&road, Method::POST, "/accounts/42?_method=DELETE").await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);

    let res = send(&road, Method::PUT, "/users/42").await;
    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);

    let res = send(&road, Method::GET, "/users/").await;
    assert_eq!(res.status_code(), StatusCode::FOUND);
    assert_eq!(res.headers()[LOCATION], "/users");
}
