//! HTTP response building module
//!
//! Builders for the handful of responses the demo emits.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderName;
use hyper::{Response, StatusCode};

/// Body of every 404 response
pub const NOT_FOUND_BODY: &str = "page not found";

/// Build 200 response carrying a page body and its cache headers
pub fn build_page_response(
    body: &'static str,
    headers: &[(HeaderName, String)],
) -> Response<Full<Bytes>> {
    let builder = headers
        .iter()
        .fold(Response::builder().status(StatusCode::OK), |b, (name, value)| {
            b.header(name, value)
        });

    builder
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::from_static(body.as_bytes())))
        })
}

/// Build 304 Not Modified response: empty body, no validator headers
pub fn build_304_response() -> Response<Full<Bytes>> {
    build_empty_response(StatusCode::NOT_MODIFIED)
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(NOT_FOUND_BODY.as_bytes())));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

/// Build 500 Internal Server Error response with an empty body
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_empty_response(StatusCode::INTERNAL_SERVER_ERROR)
}

fn build_empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
