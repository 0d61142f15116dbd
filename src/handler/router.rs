//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: extracts the conditional headers,
//! dispatches to the matching demo page and writes the access log line.

use crate::config::AppState;
use crate::handler::pages;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH, REFERER, USER_AGENT};
use hyper::{HeaderMap, Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating the only inputs the pages look at
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self {
            path: req.uri().path(),
            if_none_match: header_str(req.headers(), IF_NONE_MATCH),
            if_modified_since: header_str(req.headers(), IF_MODIFIED_SINCE),
        }
    }
}

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let ctx = RequestContext::from_request(&req);
    let response = route_request(&ctx);

    if !state.config.logging.access_log {
        return Ok(response);
    }

    let mut entry = access_log_entry(&req, peer_addr);
    entry.status = response.status().as_u16();
    // hyper drops the body of a HEAD response, so nothing is sent
    entry.body_bytes = if req.method() == Method::HEAD {
        0
    } else {
        response.body().size_hint().exact().unwrap_or(0)
    };
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    if let Err(e) = logger::log_access(
        &state.log_writer,
        &entry,
        &state.config.logging.access_log_format,
    ) {
        logger::log_error(&format!("Access log write failed: {e}"));
        return Ok(http::build_500_response());
    }

    Ok(response)
}

/// Route request to its page; the query string never takes part in matching
fn route_request(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    pages::lookup(ctx.path).map_or_else(http::build_404_response, |page| page.respond(ctx))
}

fn access_log_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_str(req.version()).to_string();
    entry.referer = header_str(req.headers(), REFERER).map(ToString::to_string);
    entry.user_agent = header_str(req.headers(), USER_AGENT).map(ToString::to_string);
    entry
}

/// Header value as text; non-ASCII values count as absent
fn header_str(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}
