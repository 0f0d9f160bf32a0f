//! # byway
//!
//! A lightweight request pipeline: a middleware chain with a router at its
//! end. You hand it a method, a url, a body, and headers. It hands you back a
//! [`Response`]. Nothing more.
//!
//! ## The contract
//!
//! byway owns exactly three things:
//!
//! - **Composition**: middleware run in registration order, each wrapping
//!   everything registered after it ([`Chain`], [`Next`])
//! - **Matching**: `/`-separated templates with literal, numeric (`#id`) and
//!   string (`$name`) segments, no regex, no wildcards ([`matcher`])
//! - **Normalization**: every request ends as a [`Response`] or as the exact
//!   error a handler failed with ([`wrap`])
//!
//! Everything else is a middleware written against that contract, or a
//! transport that calls [`Road::request`]. Sockets, TLS, cookies, CORS, and
//! body formats are not byway's business. [`service`] shows the seam for
//! hyper.
//!
//! ## Quick start
//!
//! ```rust
//! use byway::{middleware, Method, Next, Request, Response, Road, StatusCode};
//!
//! # async fn run() -> Result<(), byway::BoxError> {
//! let road = Road::new()
//!     .use_middleware(middleware::trace())
//!     .add_route(Method::GET, "/users/#id", get_user)
//!     .add_route(Method::PUT, "/widgets/$name", put_widget);
//!
//! let res = road.request(Method::GET, "/users/42", None, Default::default()).await?;
//! assert_eq!(res.body_text(), Some("user 42"));
//!
//! // a path that matched with the wrong method
//! let res = road.request(Method::GET, "/widgets/gear", None, Default::default()).await?;
//! assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
//! # Ok(())
//! # }
//!
//! async fn get_user(req: Request, _next: Next) -> Response {
//!     let id = req.arg("id").and_then(|a| a.as_i64()).unwrap_or_default();
//!     Response::text(format!("user {id}"))
//! }
//!
//! async fn put_widget(req: Request, _next: Next) -> String {
//!     format!("stored {}", req.arg("name").map(ToString::to_string).unwrap_or_default())
//! }
//! ```

mod chain;
mod config;
mod error;
mod request;
mod response;
mod road;
mod route_file;
mod router;

pub mod handler;
pub mod matcher;
pub mod middleware;
pub mod service;

pub use chain::{Chain, Next};
pub use config::Config;
pub use error::{BoxError, Error};
pub use handler::{Handler, IntoOutcome, Outcome};
pub use request::{Arg, Args, Context, ParsedUrl, Request};
pub use response::{wrap, IntoReply, Reply, Response, ResponseBuilder};
pub use road::Road;
pub use route_file::{prefixed, HandlerRegistry, RouteFile, RouteSpec};
pub use router::{HookFuture, IntoTarget, IntoVerdict, RoutePaths, Router, Target};

pub use bytes::Bytes;
pub use http::{self, HeaderMap, Method, StatusCode};
