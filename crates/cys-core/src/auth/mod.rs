//! Authentication: sessions and credentials.
//!
//! This module provides:
//! - `SessionManager`: the single owner of the persisted session
//!   (`cys_auth_token` + `cys_user`), handing out `Session` values
//! - `Auth`: login, registration, logout and profile edits against the
//!   `users` collection
//! - `credentials`: salted argon2 password hashing and session tokens

pub mod credentials;
pub mod service;
pub mod session;

pub use service::Auth;
pub use session::{Session, SessionManager, AUTH_TOKEN_KEY, USER_KEY};
