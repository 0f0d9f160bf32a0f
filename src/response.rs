//! Outgoing response type, the [`Reply`] that travels back through the chain,
//! and the single normalization point [`wrap`].
//!
//! Handlers may answer with a finished [`Response`] or with a raw body
//! (`String`, `&'static str`, `Bytes`, `()`). Middleware see that value as a
//! [`Reply`] when their `next` resolves. Only at the very end of a request
//! does [`wrap`] turn whatever is left into a `Response`.

use std::future::Future;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;

use crate::error::BoxError;

const NOT_FOUND_BODY: &str = "Page not found";
const METHOD_NOT_ALLOWED_BODY: &str = "Method Not Allowed";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing response: status, optional body, headers.
///
/// A response stays writable while it is inside the chain. Middleware that
/// post-process the result of `next` may touch its status, body, or headers
/// through the `_mut` accessors before handing it further up.
///
/// ```rust
/// use byway::{Response, StatusCode};
/// use byway::http::header::LOCATION;
/// use byway::http::HeaderValue;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header(LOCATION, HeaderValue::from_static("/users/42"))
///     .json(br#"{"id":42}"#.to_vec());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) body: Option<Bytes>,
    pub(crate) headers: HeaderMap,
}

impl Response {
    /// `200 OK` with `body` and no headers. This is what [`wrap`] builds
    /// around raw handler output.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { status: StatusCode::OK, body: Some(body.into()), headers: HeaderMap::new() }
    }

    /// `200 OK` with neither body nor headers.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `200 OK`, `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// `200 OK`, `text/html; charset=utf-8`.
    pub fn html(body: impl Into<String>) -> Self {
        Self::builder().html(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, body: None, headers: HeaderMap::new() }
    }

    /// `302 Found` pointing at `location`.
    pub fn redirect(location: HeaderValue) -> Self {
        Self::builder().status(StatusCode::FOUND).header(LOCATION, location).no_body()
    }

    /// `404`, `"Page not found"`. Returned when nothing in a chain or router
    /// answered the request.
    pub fn not_found() -> Self {
        Self::new(NOT_FOUND_BODY).with_status(StatusCode::NOT_FOUND)
    }

    /// `405`, `"Method Not Allowed"`.
    pub fn method_not_allowed() -> Self {
        Self::new(METHOD_NOT_ALLOWED_BODY).with_status(StatusCode::METHOD_NOT_ALLOWED)
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn with_status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn body(&self) -> Option<&Bytes> { self.body.as_ref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    pub fn status_mut(&mut self) -> &mut StatusCode { &mut self.status }
    pub fn body_mut(&mut self) -> &mut Option<Bytes> { &mut self.body }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }

    /// The body as UTF-8, if there is one and it is valid.
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Converts into the `http` crate's response type for a transport to
    /// write out. A missing body becomes an empty one.
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body.unwrap_or_default()));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`. Terminated by a
/// typed body method.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Appends a header. Repeating a name keeps every value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish("application/json", body.into())
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        let body: String = body.into();
        self.finish("text/plain; charset=utf-8", body.into())
    }

    /// Terminate with an HTML body (`text/html; charset=utf-8`).
    pub fn html(self, body: impl Into<String>) -> Response {
        let body: String = body.into();
        self.finish("text/html; charset=utf-8", body.into())
    }

    /// Terminate with raw bytes and no content type.
    pub fn bytes(self, body: impl Into<Bytes>) -> Response {
        Response { body: Some(body.into()), headers: self.headers, status: self.status }
    }

    /// Terminate with no body (e.g. `204 No Content`, redirects).
    pub fn no_body(self) -> Response {
        Response { body: None, headers: self.headers, status: self.status }
    }

    fn finish(mut self, content_type: &'static str, body: Bytes) -> Response {
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        Response { body: Some(body), headers: self.headers, status: self.status }
    }
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// What a continuation resolves to: a finished response or a raw body that
/// has not been wrapped yet.
#[derive(Clone, Debug)]
pub enum Reply {
    Response(Response),
    Text(String),
    Bytes(Bytes),
    Empty,
}

impl Reply {
    /// Normalizes into a [`Response`]. A `Response` passes through untouched;
    /// raw bodies become `200 OK` with no headers.
    pub fn into_response(self) -> Response {
        match self {
            Self::Response(res) => res,
            Self::Text(text) => Response::new(text),
            Self::Bytes(bytes) => Response::new(bytes),
            Self::Empty => Response::empty(),
        }
    }

    /// The status this reply will carry once wrapped.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Response(res) => res.status,
            _ => StatusCode::OK,
        }
    }

    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Self::Response(res) => Some(res),
            _ => None,
        }
    }

    /// Mutable access to the response, wrapping a raw body first if needed.
    pub fn response_mut(&mut self) -> &mut Response {
        if !matches!(self, Self::Response(_)) {
            let res = std::mem::replace(self, Self::Empty).into_response();
            *self = Self::Response(res);
        }
        match self {
            Self::Response(res) => res,
            _ => unreachable!("reply was normalized above"),
        }
    }
}

impl From<Response> for Reply {
    fn from(res: Response) -> Self { Self::Response(res) }
}

// ── IntoReply ─────────────────────────────────────────────────────────────────

/// Conversion into a [`Reply`].
///
/// Implement on your own types to return them directly from handlers.
///
/// ```rust,ignore
/// use byway::{IntoReply, Reply, Response, StatusCode};
/// use serde::Serialize;
///
/// struct Json<T: Serialize>(T);
///
/// impl<T: Serialize> IntoReply for Json<T> {
///     fn into_reply(self) -> Reply {
///         match serde_json::to_vec(&self.0) {
///             Ok(bytes) => Response::json(bytes).into(),
///             Err(_) => Response::status(StatusCode::INTERNAL_SERVER_ERROR).into(),
///         }
///     }
/// }
/// ```
pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply { self }
}

impl IntoReply for Response {
    fn into_reply(self) -> Reply { Reply::Response(self) }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply { Reply::Text(self) }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Reply { Reply::Text(self.to_owned()) }
}

impl IntoReply for Bytes {
    fn into_reply(self) -> Reply { Reply::Bytes(self) }
}

impl IntoReply for Vec<u8> {
    fn into_reply(self) -> Reply { Reply::Bytes(self.into()) }
}

impl IntoReply for () {
    fn into_reply(self) -> Reply { Reply::Empty }
}

/// Return a bare status from a handler: `return StatusCode::NO_CONTENT`
impl IntoReply for StatusCode {
    fn into_reply(self) -> Reply { Reply::Response(Response::status(self)) }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Reply {
        self.map_or(Reply::Empty, IntoReply::into_reply)
    }
}

// ── wrap ──────────────────────────────────────────────────────────────────────

/// Awaits a chain result and normalizes it into a [`Response`].
///
/// A reply that already is a `Response` comes out as that same value. Errors
/// pass through untouched.
pub async fn wrap<F>(reply: F) -> Result<Response, BoxError>
where
    F: Future<Output = Result<Reply, BoxError>>,
{
    reply.await.map(Reply::into_response)
}
