//! REST API client module for the SoportePlus authentication service.
//!
//! This module provides the `ApiClient` for logging in and fetching the
//! current user. Authenticated calls carry a JWT bearer token obtained
//! from the login endpoint.

pub mod client;
pub mod error;

pub use client::{ApiClient, Preflight};
pub use error::ApiError;
