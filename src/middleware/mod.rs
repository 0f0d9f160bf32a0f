//! Built-in middleware.
//!
//! Middleware intercept requests on the way in and replies on the way out,
//! and are the right place for cross-cutting concerns. Each function here
//! returns a [`Handler`] for [`Road::use_middleware`](crate::Road::use_middleware)
//! or for a route-scoped [`Chain`](crate::Chain).
//!
//! - [`trace`]: per-request span with method, path, status, latency
//! - [`remove_trailing_slash`]: redirect `/users/` to `/users`
//! - [`catch_errors`]: turn a downstream error into a reply
//! - [`provide`]: put a value into every request's context

mod trace;

use std::sync::Arc;

use http::HeaderValue;
use tracing::debug;

use crate::chain::Next;
use crate::error::BoxError;
use crate::handler::{Handler, Outcome};
use crate::request::Request;
use crate::response::{IntoReply, Response};

pub use trace::trace;

/// Answers `302 Found` for paths ending in `/` (other than `/` itself),
/// pointing at the same path without trailing slashes. The query string is
/// kept. Routing never strips slashes on its own.
pub fn remove_trailing_slash() -> impl Handler {
    |req: Request, next: Next| async move {
        if let Some(location) = without_trailing_slash(&req) {
            debug!(from = req.path(), to = ?location, "trailing slash redirect");
            return Ok(Response::redirect(location).into_reply());
        }
        next.run(req).await
    }
}

fn without_trailing_slash(req: &Request) -> Option<HeaderValue> {
    let path = req.path();
    if path.len() <= 1 || !path.ends_with('/') {
        return None;
    }

    let trimmed = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    let location = match req.url().query() {
        Some(query) => format!("{trimmed}?{query}"),
        None => trimmed.to_owned(),
    };
    HeaderValue::try_from(location).ok()
}

/// Recovers from errors raised further down the chain by converting them
/// into a reply with `f`. Everything registered after this middleware is
/// covered; everything before it is not.
///
/// ```rust
/// use byway::{middleware, Road, Response, StatusCode};
///
/// let road = Road::new().use_middleware(middleware::catch_errors(|err| {
///     Response::text(format!("failed: {err}")).with_status(StatusCode::INTERNAL_SERVER_ERROR)
/// }));
/// ```
pub fn catch_errors<F, R>(f: F) -> impl Handler
where
    F: Fn(BoxError) -> R + Send + Sync + 'static,
    R: IntoReply,
{
    let f = Arc::new(f);
    move |req: Request, next: Next| {
        let f = Arc::clone(&f);
        async move {
            next.run(req).await.or_else(|err| -> Outcome {
                debug!(error = %err, "converted handler error into a reply");
                Ok(f(err).into_reply())
            })
        }
    }
}

/// Inserts a clone of `value` into the context of every request.
///
/// ```rust
/// use byway::{middleware, Next, Request, Road};
///
/// #[derive(Clone)]
/// struct Db(&'static str);
///
/// let road = Road::new()
///     .use_middleware(middleware::provide(Db("primary")))
///     .add_route(byway::Method::GET, "/", |req: Request, _next: Next| async move {
///         req.context().get::<Db>().map(|db| db.0).unwrap_or("none")
///     });
/// ```
pub fn provide<T>(value: T) -> impl Handler
where
    T: Clone + Send + Sync + 'static,
{
    move |mut req: Request, next: Next| {
        req.context_mut().insert(value.clone());
        next.run(req)
    }
}
