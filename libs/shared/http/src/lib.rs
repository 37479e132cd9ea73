//! Outbound HTTP plumbing shared by every upstream integration.
//!
//! All calls to the auth provider and the practice-management API go through
//! [`ApiClient`], which retries server errors and rate limiting according to a
//! [`RetryPolicy`] and surfaces everything else immediately.

pub mod client;
pub mod error;
pub mod retry;

pub use client::ApiClient;
pub use error::ApiError;
pub use retry::RetryPolicy;
pub use reqwest::Method;
