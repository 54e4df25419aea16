//! Shared HTTP plumbing: errors, response envelopes, extractors, health.

pub mod api_common;
pub mod error;
pub mod health_api;
pub mod middleware;
