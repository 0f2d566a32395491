//! Request and report models for a cache invocation
//!
//! `CacheRequest` is what the command surface hands to the controller;
//! `CacheReport` is what the binary prints afterwards.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{interpolate, CacheRequest};
pub use responses::CacheReport;
