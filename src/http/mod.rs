//! HTTP protocol layer module
//!
//! Cache validators, `Cache-Control` policies and response builders,
//! decoupled from the page table that uses them.

pub mod cache;
pub mod response;

// Re-export commonly used builders
pub use response::{build_304_response, build_404_response, build_500_response, build_page_response};
