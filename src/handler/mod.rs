//! Request handler module
//!
//! Routes each request to one of the fixed demo pages and writes the access log.

pub mod pages;
pub mod router;

// Re-export main entry point
pub use pages::PAGES;
pub use router::handle_request;
