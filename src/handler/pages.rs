//! Demo page table
//!
//! Each page pairs a canned body with one `Cache-Control` policy and at most
//! one validator. The `ETag`s are fixed literals so that browser behavior
//! stays reproducible across restarts; they never track the body.

use chrono::Utc;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CACHE_CONTROL, ETAG, LAST_MODIFIED};
use hyper::Response;

use super::router::RequestContext;
use crate::http::cache::{self, CachePolicy};
use crate::http::{build_304_response, build_page_response};

/// How a page lets the browser revalidate its cached copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Always served fresh
    None,
    /// `ETag` checked against `If-None-Match`
    ETag(&'static str),
    /// `Last-Modified` stamped with the current time; any `If-Modified-Since` is a hit
    LastModified,
}

/// A single demo route
#[derive(Debug)]
pub struct DemoPage {
    pub path: &'static str,
    pub body: &'static str,
    pub cache_control: CachePolicy,
    pub validator: Validator,
}

pub static PAGES: [DemoPage; 7] = [
    // Nothing lands in the browser cache
    DemoPage {
        path: "/no-store",
        body: "no store page",
        cache_control: CachePolicy::NoStore,
        validator: Validator::None,
    },
    // Cached, but every use goes back to the server
    DemoPage {
        path: "/no-cache",
        body: "no cache page",
        cache_control: CachePolicy::NoCache,
        validator: Validator::ETag("00bc63c3a47875d37eb7004340988ca4"),
    },
    DemoPage {
        path: "/zero-max-age",
        body: "zero max age page",
        cache_control: CachePolicy::MaxAge(0),
        validator: Validator::ETag("28335d48c8ca388e4dd927c063e3723f"),
    },
    // A reload still revalidates; opening the URL in a new tab does not until it is stale
    DemoPage {
        path: "/positive-max-age",
        body: "positive max age",
        cache_control: CachePolicy::MaxAge(10),
        validator: Validator::ETag("7740a362f5773e77efdb601ea1e0c3b7"),
    },
    DemoPage {
        path: "/last-modified",
        body: "last modified page",
        cache_control: CachePolicy::MaxAge(0),
        validator: Validator::LastModified,
    },
    DemoPage {
        path: "/example-1",
        body: "example 1",
        cache_control: CachePolicy::PrivateMustRevalidate(0),
        validator: Validator::None,
    },
    DemoPage {
        path: "/example-2",
        body: "example 2",
        cache_control: CachePolicy::Public(86400),
        validator: Validator::None,
    },
];

/// Exact-match lookup; no prefix, case or trailing-slash folding
pub fn lookup(path: &str) -> Option<&'static DemoPage> {
    PAGES.iter().find(|page| page.path == path)
}

impl DemoPage {
    /// Answer a request for this page, honoring its conditional header
    pub fn respond(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        let not_modified = match self.validator {
            Validator::None => false,
            Validator::ETag(etag) => cache::check_etag_match(ctx.if_none_match, etag),
            Validator::LastModified => cache::check_modified_since(ctx.if_modified_since),
        };
        if not_modified {
            return build_304_response();
        }

        let mut headers = vec![(CACHE_CONTROL, self.cache_control.to_header_value())];
        match self.validator {
            Validator::None => {}
            Validator::ETag(etag) => headers.push((ETAG, etag.to_string())),
            Validator::LastModified => headers.push((LAST_MODIFIED, cache::http_date(Utc::now()))),
        }

        build_page_response(self.body, &headers)
    }
}
