//! Core library for authprobe.
//!
//! A small client for the SoportePlus authentication API plus the smoke run
//! that exercises it: log in, keep the access token, fetch the current user.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod smoke;

pub use api::{ApiClient, ApiError, Preflight};
pub use auth::{Credentials, Session, SessionData};
pub use config::Config;
pub use smoke::SmokeReport;
