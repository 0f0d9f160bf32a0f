//! Ordered request router.
//!
//! Routes are kept in registration order and scanned front to back. The
//! first route whose template fits the path decides the outcome, whatever
//! its method:
//!
//! - template and method fit: before-hooks, the route's target, after-hooks;
//! - template fits, method does not: `405`, and the scan stops there;
//! - no template fits: `404`.
//!
//! Registering the same path twice with different methods therefore leaves
//! the second registration unreachable. The scan never looks past the first
//! structural match.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::{debug, trace};

use crate::chain::{Chain, Next};
use crate::config::Config;
use crate::error::{BoxError, Error};
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler, Outcome};
use crate::matcher::Template;
use crate::request::Request;
use crate::response::{IntoReply, Reply, Response};
use crate::road::Road;

// ── Targets ───────────────────────────────────────────────────────────────────

/// What a route runs once it matches.
#[derive(Clone)]
pub enum Target {
    /// A single handler, given a `Next` that answers `404` if called.
    Handler(BoxedHandler),
    /// A route-scoped chain, walked in order.
    Chain(Chain),
    /// A nested road. It receives the original method, url, body, and
    /// headers and matches them from scratch.
    Road(Road),
}

/// Conversion into a route [`Target`]: any [`Handler`], a [`Chain`], or a
/// [`Road`].
pub trait IntoTarget {
    fn into_target(self) -> Target;
}

impl<H: Handler> IntoTarget for H {
    fn into_target(self) -> Target { Target::Handler(self.into_boxed_handler()) }
}

impl IntoTarget for Chain {
    fn into_target(self) -> Target { Target::Chain(self) }
}

impl IntoTarget for Road {
    fn into_target(self) -> Target { Target::Road(self) }
}

impl IntoTarget for Target {
    fn into_target(self) -> Target { self }
}

/// One path or several. A route registered with several paths becomes one
/// entry per path, in the order given.
pub trait RoutePaths {
    fn into_paths(self) -> Vec<String>;
}

impl RoutePaths for &str {
    fn into_paths(self) -> Vec<String> { vec![self.to_owned()] }
}

impl RoutePaths for String {
    fn into_paths(self) -> Vec<String> { vec![self] }
}

impl RoutePaths for &[&str] {
    fn into_paths(self) -> Vec<String> { self.iter().map(|p| (*p).to_owned()).collect() }
}

impl<const N: usize> RoutePaths for [&str; N] {
    fn into_paths(self) -> Vec<String> { self.iter().map(|p| (*p).to_owned()).collect() }
}

impl RoutePaths for Vec<&str> {
    fn into_paths(self) -> Vec<String> { self.into_iter().map(str::to_owned).collect() }
}

impl RoutePaths for Vec<String> {
    fn into_paths(self) -> Vec<String> { self }
}

// ── Hooks ─────────────────────────────────────────────────────────────────────

/// Future returned by a before- or after-route hook.
pub type HookFuture = Pin<Box<dyn Future<Output = Result<Option<Reply>, BoxError>> + Send + 'static>>;

type BeforeHook = Arc<dyn Fn(&mut Request) -> HookFuture + Send + Sync>;
type AfterHook = Arc<dyn Fn(&Request, &Reply) -> HookFuture + Send + Sync>;

/// Conversion of a hook's return value. `None` lets the request carry on;
/// `Some(reply)` vetoes (before-hooks) or replaces the reply (after-hooks).
pub trait IntoVerdict {
    fn into_verdict(self) -> Result<Option<Reply>, BoxError>;
}

impl<T: IntoReply> IntoVerdict for Option<T> {
    fn into_verdict(self) -> Result<Option<Reply>, BoxError> {
        Ok(self.map(IntoReply::into_reply))
    }
}

impl<T, E> IntoVerdict for Result<Option<T>, E>
where
    T: IntoReply,
    E: Into<BoxError>,
{
    fn into_verdict(self) -> Result<Option<Reply>, BoxError> {
        self.map(|v| v.map(IntoReply::into_reply)).map_err(Into::into)
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Route {
    method: Method,
    template: Template,
    target: Target,
}

/// The route table plus before/after hooks.
///
/// Usually driven through [`Road`], which places the router at the end of
/// its middleware chain.
#[derive(Clone, Default)]
pub struct Router {
    config: Config,
    before: Vec<BeforeHook>,
    routes: Vec<Route>,
    after: Vec<AfterHook>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registers `target` under `method` for each of `paths`.
    ///
    /// Every template is validated before anything is registered, so a bad
    /// path leaves the router unchanged.
    pub fn add(&mut self, method: Method, paths: impl RoutePaths, target: impl IntoTarget) -> Result<(), Error> {
        let templates = paths
            .into_paths()
            .iter()
            .map(|path| Template::parse(path))
            .collect::<Result<Vec<_>, _>>()?;
        let target = target.into_target();

        for template in templates {
            debug!(method = %method, template = %template, "route registered");
            self.routes.push(Route { method: method.clone(), template, target: target.clone() });
        }
        Ok(())
    }

    /// Adds a hook that runs after a route matched and before its target.
    pub fn before<F, Fut, R>(&mut self, hook: F)
    where
        F: Fn(&mut Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoVerdict + 'static,
    {
        self.before.push(Arc::new(move |req: &mut Request| -> HookFuture {
            let fut = hook(req);
            Box::pin(async move { fut.await.into_verdict() })
        }));
    }

    /// Adds a hook that runs after a matched route's target.
    pub fn after<F, Fut, R>(&mut self, hook: F)
    where
        F: Fn(&Request, &Reply) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoVerdict + 'static,
    {
        self.after.push(Arc::new(move |req: &Request, reply: &Reply| -> HookFuture {
            let fut = hook(req, reply);
            Box::pin(async move { fut.await.into_verdict() })
        }));
    }

    /// The method used for matching.
    ///
    /// Only a `POST` can be overridden, by the override header first and the
    /// override query parameter second. Values are upper-cased; values that
    /// are not valid methods are ignored.
    pub fn effective_method(&self, req: &Request) -> Method {
        let method = req.method();
        if *method != Method::POST || !self.config.method_override {
            return method.clone();
        }

        let signal = req
            .header(&self.config.override_header)
            .map(str::to_owned)
            .or_else(|| req.url().query_param(&self.config.override_query_param));

        match signal.and_then(|s| Method::from_bytes(s.trim().to_ascii_uppercase().as_bytes()).ok()) {
            Some(overridden) => {
                trace!(to = %overridden, "method override");
                overridden
            }
            None => method.clone(),
        }
    }

    /// Routes one request.
    pub async fn route(&self, mut req: Request) -> Outcome {
        let original = req.method.clone();
        let method = self.effective_method(&req);

        let mut wrong_method = false;
        for route in &self.routes {
            let Some(args) = route.template.extract(req.path()) else { continue };

            if route.method != method {
                debug!(method = %method, template = %route.template, "path matched, method did not");
                wrong_method = true;
                break;
            }

            debug!(method = %method, template = %route.template, "route matched");
            req.url.bind(args)?;
            req.method = method;
            return self.dispatch(route, req, original).await;
        }

        if wrong_method {
            Ok(self.fallback(StatusCode::METHOD_NOT_ALLOWED, &self.config.method_not_allowed_body))
        } else {
            debug!(method = %method, path = req.path(), "no route");
            Ok(self.fallback(StatusCode::NOT_FOUND, &self.config.not_found_body))
        }
    }

    async fn dispatch(&self, route: &Route, mut req: Request, original: Method) -> Outcome {
        for hook in &self.before {
            if let Some(veto) = hook(&mut req).await? {
                trace!("before-route hook answered");
                return Ok(veto);
            }
        }

        // After-hooks look at the request as the target received it.
        let seen = (!self.after.is_empty()).then(|| req.clone());

        let mut reply = match &route.target {
            Target::Handler(handler) => handler.call(req, Next::terminal()).await?,
            Target::Chain(chain) => chain.run(req).await?,
            Target::Road(road) => {
                let url = req.url().href().to_owned();
                let res = road.request(original, &url, req.body, req.headers).await?;
                Reply::Response(res)
            }
        };

        if let Some(req) = &seen {
            for hook in &self.after {
                if let Some(replacement) = hook(req, &reply).await? {
                    trace!("after-route hook replaced the reply");
                    reply = replacement;
                }
            }
        }

        Ok(reply)
    }

    fn fallback(&self, status: StatusCode, body: &str) -> Reply {
        Reply::Response(Response::new(body.to_owned()).with_status(status))
    }
}

/// Adapts a shared [`Router`] into a chain endpoint.
pub(crate) struct RouterEndpoint(pub(crate) Arc<Router>);

impl ErasedHandler for RouterEndpoint {
    fn call(&self, req: Request, _next: Next) -> BoxFuture {
        let router = Arc::clone(&self.0);
        Box::pin(async move { router.route(req).await })
    }
}
