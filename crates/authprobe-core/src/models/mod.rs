//! Data models for the authentication API.
//!
//! - `LoginRequest`, `LoginResponse`, `Tokens`: the login exchange
//! - `CurrentUserResponse`: the `/auth/me` payload

pub mod user;

pub use user::{CurrentUserResponse, LoginRequest, LoginResponse, Tokens};
