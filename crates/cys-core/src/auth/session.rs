use std::sync::Arc;

use tracing::{debug, info, warn};

use super::credentials;
use crate::error::Result;
use crate::models::User;
use crate::record::Record;
use crate::storage::KeyValueStore;

/// Key holding the opaque session token
pub const AUTH_TOKEN_KEY: &str = "cys_auth_token";

/// Key holding the signed-in user's record
pub const USER_KEY: &str = "cys_user";

/// An authenticated identity, passed by reference to anything that needs one.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    token: String,
    user: Record,
}

impl Session {
    pub fn new(token: impl Into<String>, user: Record) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &Record {
        &self.user
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.id()
    }

    /// Typed view of the signed-in user
    pub fn profile(&self) -> Result<User> {
        self.user.to_model()
    }

    /// A session is usable when it carries a non-blank token
    pub fn is_valid(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

/// Owns the persisted session keys. Nothing else reads or writes them.
#[derive(Clone)]
pub struct SessionManager {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionManager {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The stored token, if any
    pub fn auth_token(&self) -> Result<Option<String>> {
        Ok(self
            .kv
            .get(AUTH_TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty()))
    }

    /// The stored user record. A corrupted entry is cleared and reads as
    /// signed out.
    pub fn current_user(&self) -> Result<Option<Record>> {
        let Some(contents) = self.kv.get(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<serde_json::Value>(&contents)
            .map_err(crate::error::StoreError::from)
            .and_then(Record::try_from)
        {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(key = USER_KEY, error = %e, "Discarding corrupted session user");
                self.sign_out()?;
                Ok(None)
            }
        }
    }

    /// The active session, present only when both token and user exist
    pub fn current(&self) -> Result<Option<Session>> {
        let Some(token) = self.auth_token()? else {
            debug!("No session token");
            return Ok(None);
        };
        Ok(self.current_user()?.map(|user| Session::new(token, user)))
    }

    /// Start a new session for `user` with a fresh token.
    pub fn begin(&self, user: &Record) -> Result<Session> {
        let session = Session::new(credentials::generate_token(), credentials::public_user(user));
        self.kv
            .set(USER_KEY, &serde_json::to_string(session.user())?)?;
        self.kv.set(AUTH_TOKEN_KEY, session.token())?;
        info!(user_id = ?session.user_id(), "Session started");
        Ok(session)
    }

    /// Rewrite the stored user after a profile change, keeping the token
    pub fn replace_user(&self, user: &Record) -> Result<()> {
        let public = credentials::public_user(user);
        self.kv.set(USER_KEY, &serde_json::to_string(&public)?)
    }

    pub fn sign_out(&self) -> Result<()> {
        self.kv.remove(AUTH_TOKEN_KEY)?;
        self.kv.remove(USER_KEY)?;
        info!("Signed out");
        Ok(())
    }
}
