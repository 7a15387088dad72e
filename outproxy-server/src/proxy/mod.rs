//! HTTP forward proxy engine
//!
//! Every outbound connection, plain HTTP or CONNECT tunnel, is opened through
//! the shared [`FilteringDialer`](outproxy::FilteringDialer). Dial failures
//! become `502 Bad Gateway`; malformed targets become `400 Bad Request`.
//! A dial abandoned because the server is shutting down is
//! `503 Service Unavailable`.

pub mod connect;
pub mod forward;
pub mod server;

pub use server::{ProxyServer, ProxyServerConfig};

use crate::error::ProxyError;
use outproxy::DialError;
use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};

/// Response body type produced by the proxy
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

pub(crate) fn empty_body() -> ProxyBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

fn full_body(content: String) -> ProxyBody {
    Full::new(Bytes::from(content))
        .map_err(|never| match never {})
        .boxed()
}

fn text_response(status: StatusCode, message: String) -> Response<ProxyBody> {
    let mut response = Response::new(full_body(message));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Map a request failure to the response the client sees
pub(crate) fn error_response(err: &ProxyError) -> Response<ProxyBody> {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if matches!(err, ProxyError::Dial(DialError::Cancelled)) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::BAD_GATEWAY
    };
    text_response(status, format!("{err}\n"))
}
