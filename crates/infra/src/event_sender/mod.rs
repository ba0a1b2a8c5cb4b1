//! Infrastructure event sender implementations.
//!
//! The sender abstraction lives in `k6svc-events` as pure mechanics.
//! This module provides network-backed implementations.

pub mod http;

pub use http::HttpEventSender;
