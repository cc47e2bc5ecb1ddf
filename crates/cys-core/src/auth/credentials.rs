use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::record::Record;

/// Field holding the PHC-format argon2 hash on user records
pub const PASSWORD_HASH_FIELD: &str = "passwordHash";

/// Plaintext field found in older seed documents
pub const PLAINTEXT_PASSWORD_FIELD: &str = "password";

/// User fields only the auth flows may set
pub const PROTECTED_USER_FIELDS: [&str; 4] = [
    "email",
    "role",
    PASSWORD_HASH_FIELD,
    PLAINTEXT_PASSWORD_FIELD,
];

/// Length of the random part of a session token
const TOKEN_LENGTH: usize = 32;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Credential(e.to_string()))
}

/// Check `password` against a stored PHC hash string.
/// A hash that cannot be parsed is an error, a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| StoreError::Credential(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Replace a plaintext `password` field with `passwordHash`.
/// An existing hash wins; the plaintext is dropped either way.
pub fn seal_plaintext_password(mut record: Record) -> Result<Record> {
    if let Some(plaintext) = record.remove(PLAINTEXT_PASSWORD_FIELD) {
        if !record.contains(PASSWORD_HASH_FIELD) {
            if let Value::String(password) = plaintext {
                record.insert(PASSWORD_HASH_FIELD, hash_password(&password)?);
            }
        }
    }
    Ok(record)
}

/// Copy of a user record without any credential fields
pub fn public_user(record: &Record) -> Record {
    let mut public = record.clone();
    public.remove(PASSWORD_HASH_FIELD);
    public.remove(PLAINTEXT_PASSWORD_FIELD);
    public
}

pub fn generate_token() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();
    format!("token_{}", random)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("password124", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("x", "password123").is_err());
    }

    #[test]
    fn test_seal_plaintext_password() {
        let record = Record::new().with("email", "a@b.c").with("password", "secret");
        let sealed = seal_plaintext_password(record).unwrap();
        assert!(!sealed.contains("password"));
        let hash = sealed.get_str(PASSWORD_HASH_FIELD).unwrap();
        assert!(verify_password("secret", hash).unwrap());
    }

    #[test]
    fn test_public_user_strips_credentials() {
        let record = Record::new()
            .with("id", "user_1")
            .with("password", "x")
            .with(PASSWORD_HASH_FIELD, "y");
        let public = public_user(&record);
        assert_eq!(public.id(), Some("user_1"));
        assert!(!public.contains("password"));
        assert!(!public.contains(PASSWORD_HASH_FIELD));
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        let random = token.strip_prefix("token_").unwrap();
        assert_eq!(random.len(), TOKEN_LENGTH);
        assert!(random.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token());
    }
}
