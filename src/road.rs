//! The outward-facing request pipeline.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method};

use crate::chain::Chain;
use crate::config::Config;
use crate::error::{BoxError, Error};
use crate::handler::Handler;
use crate::request::Request;
use crate::response::{wrap, Reply, Response};
use crate::route_file::{HandlerRegistry, RouteFile};
use crate::router::{IntoTarget, IntoVerdict, RoutePaths, Router, RouterEndpoint};

/// A middleware chain with a [`Router`] at its end.
///
/// Build it once at startup. Each registration method returns `self` so
/// calls chain naturally; [`Road::request`] then runs any number of requests,
/// concurrently if you like, through the finished pipeline.
///
/// ```rust
/// use byway::{Method, Next, Request, Response, Road};
///
/// # async fn demo() -> Result<(), byway::BoxError> {
/// let road = Road::new()
///     .use_middleware(|req: Request, next: Next| async move {
///         let mut reply = next.run(req).await?;
///         reply.response_mut().headers_mut().insert("x-served-by", "byway".parse()?);
///         Ok::<_, byway::BoxError>(reply)
///     })
///     .add_route(Method::GET, "/users/#id", |req: Request, _next: Next| async move {
///         let id = req.arg("id").and_then(|a| a.as_i64()).unwrap_or_default();
///         Response::text(format!("user {id}"))
///     });
///
/// let res = road.request(Method::GET, "/users/42", None, Default::default()).await?;
/// assert_eq!(res.body_text(), Some("user 42"));
/// assert_eq!(res.headers()["x-served-by"], "byway");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Road {
    chain: Chain,
    router: Arc<Router>,
}

impl Road {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { chain: Chain::new(), router: Arc::new(Router::with_config(config)) }
    }

    pub fn config(&self) -> &Config {
        self.router.config()
    }

    /// Appends global middleware. It runs on every request, around routing.
    pub fn use_middleware(mut self, handler: impl Handler) -> Self {
        self.chain.add(handler);
        self
    }

    /// Registers a route.
    ///
    /// `paths` is one template or several; `target` is a handler, a
    /// [`Chain`] of route-scoped handlers, or a nested `Road`.
    ///
    /// # Panics
    ///
    /// Panics if a path is not a valid template. Use
    /// [`try_add_route`](Road::try_add_route) to get the error instead.
    pub fn add_route(self, method: Method, paths: impl RoutePaths, target: impl IntoTarget) -> Self {
        self.try_add_route(method, paths, target)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_add_route(
        mut self,
        method: Method,
        paths: impl RoutePaths,
        target: impl IntoTarget,
    ) -> Result<Self, Error> {
        Arc::make_mut(&mut self.router).add(method, paths, target)?;
        Ok(self)
    }

    /// Adds a hook that runs once a route has matched, before its target.
    /// Returning `Some(reply)` answers the request without running the target
    /// or any after-hook.
    ///
    /// ```rust
    /// use byway::{Method, Request, Response, Road, StatusCode};
    ///
    /// let road = Road::new().before_route(|req: &mut Request| {
    ///     let allowed = req.header("authorization").is_some();
    ///     async move { (!allowed).then(|| Response::status(StatusCode::UNAUTHORIZED)) }
    /// });
    /// ```
    pub fn before_route<F, Fut, R>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoVerdict + 'static,
    {
        Arc::make_mut(&mut self.router).before(hook);
        self
    }

    /// Adds a hook that runs after a matched route's target. Returning
    /// `Some(reply)` replaces the reply.
    pub fn after_route<F, Fut, R>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, &Reply) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoVerdict + 'static,
    {
        Arc::make_mut(&mut self.router).after(hook);
        self
    }

    /// Registers every route of a parsed route file, binding handler names
    /// through `registry`. See [`add_route_file`](Road::add_route_file) for
    /// the prefix rule.
    pub fn add_routes(mut self, file: RouteFile, prefix: &str, registry: &HandlerRegistry) -> Result<Self, Error> {
        let router = Arc::make_mut(&mut self.router);
        for (method, path, target) in file.resolve(prefix, registry)? {
            router.add(method, path, target)?;
        }
        Ok(self)
    }

    /// Reads a TOML route file and registers its routes.
    ///
    /// With a non-empty `prefix`, a route at `/` is registered at exactly
    /// `prefix`; every other path becomes `prefix + path`.
    pub async fn add_route_file(
        self,
        path: impl AsRef<Path>,
        prefix: &str,
        registry: &HandlerRegistry,
    ) -> Result<Self, Error> {
        let file = RouteFile::load(path).await?;
        self.add_routes(file, prefix, registry)
    }

    /// Runs one request through the pipeline.
    ///
    /// Always resolves to a [`Response`] unless a handler fails and nothing
    /// along the way recovers; that error is returned exactly as the handler
    /// produced it. Raw spaces and other bytes a request target may not
    /// carry are percent-encoded before matching; a `url` that still does not
    /// parse fails with [`Error::InvalidUrl`].
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<Bytes>,
        headers: HeaderMap,
    ) -> Result<Response, BoxError> {
        let req = Request::new(method, url, body, headers)?;
        self.handle(req).await
    }

    /// Runs an already-built request, context included.
    pub async fn handle(&self, req: Request) -> Result<Response, BoxError> {
        let endpoint = Arc::new(RouterEndpoint(Arc::clone(&self.router)));
        wrap(self.chain.walk_into(endpoint).run(req)).await
    }
}

impl std::fmt::Debug for Road {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Road")
            .field("middleware", &self.chain.len())
            .field("routes", &self.router.len())
            .finish()
    }
}
