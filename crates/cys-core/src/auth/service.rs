//! Login, registration and profile edits over the `users` collection.

use chrono::Utc;
use tracing::{info, warn};

use super::credentials::{self, PASSWORD_HASH_FIELD, PROTECTED_USER_FIELDS};
use super::session::{Session, SessionManager};
use crate::error::{Result, StoreError};
use crate::record::{timestamp, Record, CREATED_AT_FIELD, ID_FIELD};
use crate::resource::{ResourceType, USERS};
use crate::seed::SeedSource;
use crate::store::ResourceStore;

/// Prefix for ids of registered users
const USER_ID_PREFIX: &str = "user_";

pub struct Auth<'a, F> {
    store: &'a ResourceStore<F>,
    sessions: &'a SessionManager,
}

impl<'a, F: SeedSource> Auth<'a, F> {
    pub fn new(store: &'a ResourceStore<F>, sessions: &'a SessionManager) -> Self {
        Self { store, sessions }
    }

    /// Verify credentials against the stored hash and start a session.
    /// Returns the public user record.
    pub async fn login(&self, email: &str, password: &str) -> Result<Record> {
        let users = self.store.fetch_collection(USERS).await?;
        let user = users
            .iter()
            .find(|user| email_matches(user, email))
            .ok_or(StoreError::InvalidCredentials)?;

        let Some(stored_hash) = user.get_str(PASSWORD_HASH_FIELD) else {
            warn!(user_id = ?user.id(), "User has no password hash, refusing login");
            return Err(StoreError::InvalidCredentials);
        };
        if !credentials::verify_password(password, stored_hash)? {
            return Err(StoreError::InvalidCredentials);
        }

        let session = self.sessions.begin(user)?;
        info!(user_id = ?session.user_id(), "Login successful");
        Ok(session.user().clone())
    }

    /// Create an account, add it to `users`, and sign it in.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Record> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(StoreError::InvalidInput("Please fill in all fields".to_string()));
        }

        let now = Utc::now();
        let user = Record::new()
            .with("name", name)
            .with("email", email)
            .with(PASSWORD_HASH_FIELD, credentials::hash_password(password)?)
            .with("avatar", serde_json::Value::Null)
            .with("bio", "")
            .with("role", "user")
            .with(CREATED_AT_FIELD, timestamp(now));

        let resource = ResourceType::from_path(USERS)?;
        let stored = self
            .store
            .append(&resource, user, USER_ID_PREFIX, |users| {
                if users.iter().any(|user| email_matches(user, email)) {
                    return Err(StoreError::DuplicateEmail(email.to_string()));
                }
                Ok(())
            })
            .await?;

        let session = self.sessions.begin(&stored)?;
        info!(user_id = ?session.user_id(), "Registration successful");
        Ok(session.user().clone())
    }

    pub fn logout(&self) -> Result<()> {
        self.sessions.sign_out()
    }

    /// Merge profile fields into the signed-in user's record and refresh
    /// the stored session user. Identity and credential fields are ignored.
    pub async fn update_profile(&self, session: &Session, mut fields: Record) -> Result<Record> {
        let user_id = session.user_id().ok_or(StoreError::AuthRequired)?;
        for field in [ID_FIELD, CREATED_AT_FIELD].into_iter().chain(PROTECTED_USER_FIELDS) {
            fields.remove(field);
        }

        let updated = self
            .store
            .update_record(Some(session), USERS, user_id, fields)
            .await?;
        self.sessions.replace_user(&updated)?;
        Ok(credentials::public_user(&updated))
    }
}

fn email_matches(user: &Record, email: &str) -> bool {
    user.get_str("email")
        .map_or(false, |stored| stored.trim().eq_ignore_ascii_case(email.trim()))
}
