//! HTTP cache control module
//!
//! `Cache-Control` policies and conditional request checks used by the demo pages.

use chrono::{DateTime, Utc};

/// Check if client's `If-None-Match` header matches the page's `ETag`
///
/// The demo `ETag`s are fixed literals and the comparison is exact: lists,
/// weak validators and `*` are treated as any other non-matching value.
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match == Some(etag)
}

/// Check if the client sent a non-empty `If-Modified-Since` header
///
/// The date itself is never compared: any cached copy counts as fresh.
pub fn check_modified_since(if_modified_since: Option<&str>) -> bool {
    if_modified_since.is_some_and(|v| !v.is_empty())
}

/// Format a timestamp as an HTTP-date (IMF-fixdate), e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Never stored by the browser
    NoStore,
    /// Stored, but revalidated on every use
    NoCache,
    /// Fresh for the given number of seconds
    MaxAge(u32),
    /// Browser-only cache that must revalidate once stale
    PrivateMustRevalidate(u32),
    /// Shared caches may store it too
    Public(u32),
}

impl CachePolicy {
    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::NoStore => "no-store".to_string(),
            Self::NoCache => "no-cache".to_string(),
            Self::MaxAge(max_age) => format!("max-age={max_age}"),
            Self::PrivateMustRevalidate(max_age) => {
                format!("max-age={max_age}, private, must-revalidate")
            }
            Self::Public(max_age) => format!("max-age={max_age}, public"),
        }
    }
}
