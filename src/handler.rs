//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! Chains and routers hold handlers of *different* concrete types in one
//! list, so every handler is erased behind `dyn ErasedHandler` and shared
//! through an `Arc`:
//!
//! ```text
//! async fn hello(req: Request, next: Next) -> Response { … }   ← user writes this
//!        ↓ road.use_middleware(hello)
//! hello.into_boxed_handler()                                   ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                                   ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req, next)  at request time                     ← one vtable dispatch
//!        ↓
//! Box::pin(async { hello(req, next).await.into_outcome() })    ← BoxFuture
//! ```
//!
//! Middleware and route handlers share the one signature. A handler that
//! never looks at `next` simply ignores it.
//!
//! # Handler shapes
//!
//! * `Fn(Request, Next) -> impl Future<Output = R>`: the normal, async shape.
//! * [`immediate`]: a synchronous `Fn(Request) -> R` for leaf handlers that
//!   never wait on anything. Its result (including an `Err`) still reaches
//!   the caller through a future, like every other handler's.
//!
//! `R` is anything [`IntoOutcome`]: a [`Response`](crate::Response), a raw
//! body, or a `Result` of those whose error converts into [`BoxError`].

use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;

use crate::chain::Next;
use crate::error::BoxError;
use crate::request::Request;
use crate::response::{IntoReply, Reply, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// The result of running a handler or the rest of a chain.
pub type Outcome = Result<Reply, BoxError>;

/// A heap-allocated, type-erased future that resolves to an [`Outcome`].
///
/// `Send + 'static` lets a multi-threaded runtime move it across threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Outcome> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Outcome conversion ────────────────────────────────────────────────────────

/// Conversion of a handler's return value into an [`Outcome`].
///
/// Implemented for every [`IntoReply`] type shipped with the crate and for
/// `Result<T, E>` where `T: IntoReply` and `E: Into<BoxError>`. The error is
/// boxed once and never touched again.
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

macro_rules! outcome_from_reply {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoOutcome for $ty {
                fn into_outcome(self) -> Outcome { Ok(self.into_reply()) }
            }
        )*
    };
}

outcome_from_reply!(
    Reply,
    Response,
    String,
    &'static str,
    bytes::Bytes,
    Vec<u8>,
    (),
    http::StatusCode,
);

impl<T: IntoReply> IntoOutcome for Option<T> {
    fn into_outcome(self) -> Outcome { Ok(self.into_reply()) }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Outcome {
        self.map(IntoReply::into_reply).map_err(Into::into)
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid handler or middleware.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure shaped like
///
/// ```text
/// async fn name(req: Request, next: Next) -> impl IntoOutcome
/// ```
///
/// and by the [`immediate`] adapter. The trait is **sealed** (via the private
/// `Sealed` supertrait) so only those impls can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Async functions ───────────────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype wrapper that holds a concrete handler `F` and implements
/// [`ErasedHandler`], bridging the typed world to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self.0)(req, next);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

// ── Synchronous functions ─────────────────────────────────────────────────────

/// A leaf handler that answers synchronously. Built by [`immediate`].
pub struct Immediate<F>(F);

/// Adapts a synchronous `Fn(Request) -> R` into a [`Handler`].
///
/// ```rust
/// use byway::{handler, Method, Request, Road};
///
/// let road = Road::new().add_route(
///     Method::GET,
///     "/ping",
///     handler::immediate(|_req: Request| "pong"),
/// );
/// ```
pub fn immediate<F, R>(f: F) -> Immediate<F>
where
    F: Fn(Request) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    Immediate(f)
}

impl<F> private::Sealed for Immediate<F> {}

impl<F, R> Handler for Immediate<F>
where
    F: Fn(Request) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl<F, R> ErasedHandler for Immediate<F>
where
    F: Fn(Request) -> R + Send + Sync,
    R: IntoOutcome,
{
    fn call(&self, req: Request, _next: Next) -> BoxFuture {
        Box::pin(future::ready((self.0)(req).into_outcome()))
    }
}
