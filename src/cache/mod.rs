//! Caching subsystem.
//!
//! [`ResponseCache`] maps a query string to a previously generated answer
//! for a fixed time window. It is constructed explicitly and shared by
//! reference (usually behind an `Arc`), so independent instances can live
//! side by side in tests.

pub mod response;

pub use response::{CacheConfig, ResponseCache};
