//! Minimal byway example: a small users API behind hyper.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/signup -d '{"name":"alice"}'
//!   curl -X POST 'http://localhost:3000/accounts/42?_method=DELETE'
//!   curl -X PUT http://localhost:3000/users/42           # 405
//!   curl http://localhost:3000/users/                    # 302 to /users
//!
//! A path answers to the method it was first registered with; any other
//! method on that path gets 405. That is why creating and deleting live on
//! their own paths here.

use std::sync::Arc;

use byway::http::header::LOCATION;
use byway::http::HeaderValue;
use byway::{middleware, service, BoxError, Method, Next, Request, Response, Road, StatusCode};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt::init();

    let road = Arc::new(road());

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!(addr = %listener.local_addr()?, "listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let road = Arc::clone(&road);
        tokio::spawn(async move {
            if let Err(e) = service::serve_connection(stream, road).await {
                warn!(%peer, "connection error: {e}");
            }
        });
    }
}

pub fn road() -> Road {
    Road::new()
        .use_middleware(middleware::trace())
        .use_middleware(middleware::remove_trailing_slash())
        .use_middleware(middleware::catch_errors(|err| {
            Response::text(format!("internal error: {err}")).with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }))
        .add_route(Method::GET, "/users", list_users)
        .add_route(Method::GET, "/users/#id", get_user)
        .add_route(Method::POST, "/signup", create_user)
        .add_route(Method::DELETE, "/accounts/#id", delete_user)
}

// GET /users
async fn list_users(_req: Request, _next: Next) -> Response {
    Response::json(br#"[{"id":42,"name":"alice"}]"#.to_vec())
}

// GET /users/#id
//
// `#id` only matches numeric segments, so `/users/abc` never gets here.
async fn get_user(req: Request, _next: Next) -> Response {
    let id = req.arg("id").and_then(|a| a.as_i64()).unwrap_or_default();
    Response::json(format!(r#"{{"id":{id},"name":"alice"}}"#).into_bytes())
}

// POST /signup
//
// The body arrives untouched as bytes; parse it with whatever you like.
async fn create_user(req: Request, _next: Next) -> Response {
    if req.body().is_none() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header(LOCATION, HeaderValue::from_static("/users/99"))
        .json(br#"{"id":99,"name":"new_user"}"#.to_vec())
}

// DELETE /accounts/#id, also reachable as POST with `_method=DELETE`
async fn delete_user(_req: Request, _next: Next) -> StatusCode {
    StatusCode::NO_CONTENT
}
