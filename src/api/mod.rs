//! HTTP client for the E-Filing REST API.

pub mod client;
pub mod error;
pub mod types;

pub use client::EfilingClient;
pub use error::ApiError;
