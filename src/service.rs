//! hyper integration.
//!
//! byway does not own sockets. This module is the seam a transport plugs
//! into: [`RoadService`] is a hyper `Service` that feeds each HTTP request
//! through a [`Road`], and [`serve_connection`] drives one HTTP/1 or HTTP/2
//! connection over an IO object the caller already accepted.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use byway::{Road, service};
//!
//! # async fn run(road: Road) -> std::io::Result<()> {
//! let road = Arc::new(road);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! loop {
//!     let (stream, _) = listener.accept().await?;
//!     tokio::spawn(service::serve_connection(stream, Arc::clone(&road)));
//! }
//! # }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::service::Service;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::error;

use crate::error::BoxError;
use crate::response::Response;
use crate::road::Road;

/// A hyper [`Service`] backed by a [`Road`].
///
/// Handler errors that reach the top of the road are logged and answered
/// with `500`; a request body that cannot be read is answered with `400`.
#[derive(Clone, Debug)]
pub struct RoadService {
    road: Arc<Road>,
}

impl RoadService {
    pub fn new(road: Road) -> Self {
        Self { road: Arc::new(road) }
    }
}

impl From<Arc<Road>> for RoadService {
    fn from(road: Arc<Road>) -> Self {
        Self { road }
    }
}

impl<B> Service<http::Request<B>> for RoadService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Infallible>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let road = Arc::clone(&self.road);
        Box::pin(async move { Ok(dispatch(&road, req).await) })
    }
}

/// Routes one HTTP request and produces one HTTP response. Never fails:
/// every error becomes a status code here.
async fn dispatch<B>(road: &Road, req: http::Request<B>) -> http::Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let e: BoxError = e.into();
            error!(method = %parts.method, uri = %parts.uri, "reading request body: {e}");
            return Response::status(StatusCode::BAD_REQUEST).into_http();
        }
    };
    let body = (!body.is_empty()).then_some(body);
    let url = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());

    match road.request(parts.method.clone(), url, body, parts.headers).await {
        Ok(res) => res.into_http(),
        Err(e) => {
            error!(method = %parts.method, uri = %parts.uri, "unhandled error: {e}");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR).into_http()
        }
    }
}

/// Serves every request arriving on `io` through `road` until the peer
/// closes the connection.
///
/// `auto::Builder` transparently handles both HTTP/1.1 and HTTP/2, whatever
/// the client speaks.
pub async fn serve_connection<I>(io: I, road: Arc<Road>) -> Result<(), BoxError>
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    ConnBuilder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(io), RoadService::from(road))
        .await
}
