//! Authentication module for login credentials and the token session.
//!
//! This module provides:
//! - `Credentials`: the email/password pair sent to the login endpoint
//! - `Session`: holder for the access token between login and later calls
//!
//! A session may be backed by a JSON file so `--me` can reuse the token of an
//! earlier run. Tokens are kept until the next login or an explicit clear.

pub mod credentials;
pub mod session;

pub use credentials::Credentials;
pub use session::{Session, SessionData};
