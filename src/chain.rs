//! Middleware chain.
//!
//! A [`Chain`] is an append-only list of handlers. Walking it produces a
//! [`Next`]: a continuation that runs the handler under its cursor and hands
//! that handler a fresh `Next` pointing one step further. Every `Next` owns
//! its own cursor and [`Next::run`] consumes it, so two requests walking the
//! same chain never see each other's progress, and no handler can advance
//! the same walk twice.
//!
//! Ordering is the usual onion: the first handler registered acts first on
//! the way in and last on the way out.
//!
//! ```text
//!  A before ─▶ B before ─▶ (end) ─▶ B after ─▶ A after
//! ```

use std::sync::Arc;

use tracing::trace;

use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::request::Request;
use crate::response::{Reply, Response};

/// An ordered, append-only list of handlers.
///
/// Cloning is cheap: the list lives behind an `Arc` and is copied on write
/// only if it is extended while a clone is alive.
#[derive(Clone, Default)]
pub struct Chain {
    handlers: Arc<Vec<BoxedHandler>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    pub fn add(&mut self, handler: impl Handler) -> &mut Self {
        self.push(handler.into_boxed_handler());
        self
    }

    /// Appends a handler, builder style.
    ///
    /// ```rust
    /// use byway::{Chain, Next, Request};
    ///
    /// async fn audit(req: Request, next: Next) -> byway::Outcome {
    ///     next.run(req).await
    /// }
    ///
    /// let chain = Chain::new()
    ///     .with(audit)
    ///     .with(|_req: Request, _next: Next| async { "done" });
    /// assert_eq!(chain.len(), 2);
    /// ```
    pub fn with(mut self, handler: impl Handler) -> Self {
        self.add(handler);
        self
    }

    pub(crate) fn push(&mut self, handler: BoxedHandler) {
        Arc::make_mut(&mut self.handlers).push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Starts a walk. Past the last handler the walk answers
    /// `404 Page not found`.
    pub fn walk(&self) -> Next {
        Next { handlers: Arc::clone(&self.handlers), cursor: 0, endpoint: None }
    }

    /// Starts a walk that hands over to `endpoint` once every handler has
    /// called through.
    pub(crate) fn walk_into(&self, endpoint: BoxedHandler) -> Next {
        Next { handlers: Arc::clone(&self.handlers), cursor: 0, endpoint: Some(endpoint) }
    }

    /// Runs `req` through the whole chain.
    pub fn run(&self, req: Request) -> BoxFuture {
        self.walk().run(req)
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("len", &self.handlers.len()).finish()
    }
}

/// The rest of a chain walk.
pub struct Next {
    handlers: Arc<Vec<BoxedHandler>>,
    cursor: usize,
    endpoint: Option<BoxedHandler>,
}

impl Next {
    /// A continuation with nothing left to run. Handlers that are not part of
    /// a chain (plain route handlers) receive one of these.
    pub(crate) fn terminal() -> Self {
        Self { handlers: Arc::default(), cursor: 0, endpoint: None }
    }

    /// Runs the remainder of the chain.
    ///
    /// Always returns a future, whatever shape the next handler has; an error
    /// it reports comes back as the future's `Err`.
    pub fn run(self, req: Request) -> BoxFuture {
        let Self { handlers, cursor, endpoint } = self;

        if let Some(handler) = handlers.get(cursor).map(Arc::clone) {
            trace!(cursor, len = handlers.len(), "chain advance");
            let next = Self { handlers, cursor: cursor + 1, endpoint };
            return handler.call(req, next);
        }

        match endpoint {
            Some(endpoint) => {
                trace!("chain exhausted, handing over to endpoint");
                endpoint.call(req, Self::terminal())
            }
            None => {
                trace!("chain exhausted");
                Box::pin(async { Ok(Reply::Response(Response::not_found())) })
            }
        }
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("cursor", &self.cursor)
            .field("len", &self.handlers.len())
            .field("endpoint", &self.endpoint.is_some())
            .finish()
    }
}
