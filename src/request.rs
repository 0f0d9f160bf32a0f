//! Request descriptor and the per-request context.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};

use crate::error::Error;

/// One request travelling through a chain.
///
/// Built fresh by [`Road::request`](crate::Road::request) for every call, and
/// owned by that single walk: handlers receive it by value and pass it on to
/// `next.run`.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) url: ParsedUrl,
    pub(crate) body: Option<Bytes>,
    pub(crate) headers: HeaderMap,
    pub(crate) context: Context,
}

impl Request {
    /// Builds a request with an empty context.
    ///
    /// `url` may be origin-form (`/users/42?x=1`) or absolute
    /// (`https://example.com/users/42`).
    pub fn new(
        method: Method,
        url: &str,
        body: Option<Bytes>,
        headers: HeaderMap,
    ) -> Result<Self, Error> {
        Ok(Self {
            method,
            url: ParsedUrl::parse(url)?,
            body,
            headers,
            context: Context::default(),
        })
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn url(&self) -> &ParsedUrl { &self.url }
    pub fn body(&self) -> Option<&Bytes> { self.body.as_ref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn context(&self) -> &Context { &self.context }

    pub fn method_mut(&mut self) -> &mut Method { &mut self.method }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body_mut(&mut self) -> &mut Option<Bytes> { &mut self.body }
    pub fn context_mut(&mut self) -> &mut Context { &mut self.context }

    /// Shorthand for `self.url().pathname()`.
    pub fn path(&self) -> &str { self.url.pathname() }

    /// Case-insensitive header lookup. Returns the first value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// A variable captured by the matched route template.
    ///
    /// For a route `/users/#id`, `req.arg("id")` on `/users/42` returns
    /// `Some(&Arg::Number(42.0))`.
    pub fn arg(&self, name: &str) -> Option<&Arg> {
        self.url.args.get(name)
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Per-request capability bag.
///
/// Middleware attach values for handlers further down the *same* request;
/// values are keyed by type, so independent middleware compose without
/// agreeing on field names.
///
/// ```rust
/// use byway::Context;
///
/// #[derive(Clone)]
/// struct CurrentUser(u64);
///
/// let mut cx = Context::default();
/// cx.insert(CurrentUser(7));
/// assert_eq!(cx.get::<CurrentUser>().map(|u| u.0), Some(7));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Context(Extensions);

impl Context {
    /// Stores `value`, returning the previous value of the same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.0.insert(value)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.0.get()
    }

    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.0.get_mut()
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.0.remove()
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.0.get::<T>().is_some()
    }
}

// ── ParsedUrl ─────────────────────────────────────────────────────────────────

/// The request url split into path and query, plus the variables bound by
/// the route template that matched it.
#[derive(Clone, Debug)]
pub struct ParsedUrl {
    href: String,
    pathname: String,
    query: Option<String>,
    pub(crate) args: Args,
}

impl ParsedUrl {
    /// Parses `url` as a request target. Bytes a target may not carry raw
    /// (spaces, control characters, non-ASCII) are percent-encoded first;
    /// `href` keeps the url as given.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let uri = match url.parse::<Uri>() {
            Ok(uri) => uri,
            Err(err) => match escape_target(url) {
                Some(escaped) => escaped.parse::<Uri>()?,
                None => return Err(err.into()),
            },
        };
        Ok(Self {
            href: url.to_owned(),
            pathname: uri.path().to_owned(),
            query: uri.query().map(str::to_owned),
            args: Args::default(),
        })
    }

    /// The url exactly as the caller supplied it.
    pub fn href(&self) -> &str { &self.href }
    pub fn pathname(&self) -> &str { &self.pathname }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn args(&self) -> &Args { &self.args }

    /// First value of query parameter `name`, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Binds every variable in `args`. Fails on the first name that is
    /// already bound.
    pub(crate) fn bind(&mut self, args: Args) -> Result<(), Error> {
        for (name, value) in args.0 {
            self.args.bind(name, value)?;
        }
        Ok(())
    }
}

fn escape_target(url: &str) -> Option<String> {
    let raw = |b: u8| b <= b' ' || b >= 0x7f || b"\"<>\\^`{|}".contains(&b);
    if !url.bytes().any(raw) {
        return None;
    }

    let mut escaped = String::with_capacity(url.len() + 8);
    for b in url.bytes() {
        if raw(b) {
            escaped.push_str(&format!("%{b:02X}"));
        } else {
            escaped.push(char::from(b));
        }
    }
    Some(escaped)
}

// ── Args ──────────────────────────────────────────────────────────────────────

/// A value captured from a path segment.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// From a `#name` segment.
    Number(f64),
    /// From a `$name` segment.
    Text(String),
}

impl Arg {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// The number, if it has no fractional part and fits an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        let n = self.as_f64()?;
        (n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64).then_some(n as i64)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Variables bound while matching a template, by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args(HashMap<String, Arg>);

impl Args {
    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.0.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Arg::as_f64)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Arg::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arg)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Binds `name`. A name is bound at most once; rebinding is an error
    /// rather than a silent overwrite.
    pub fn bind(&mut self, name: String, value: Arg) -> Result<(), Error> {
        if self.0.contains_key(&name) {
            return Err(Error::DuplicateArg(name));
        }
        self.0.insert(name, value);
        Ok(())
    }
}
