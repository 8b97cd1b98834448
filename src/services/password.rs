use std::sync::OnceLock;

use ring::rand::{SecureRandom, SystemRandom};
use tokio::task::JoinError;

const SALT_LEN: usize = 16;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(thiserror::Error, Debug)]
pub enum PasswordError {
    #[error("Failed to generate salt")]
    SaltGeneration,

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] argon2::Error),

    #[error("Password task failed: {0}")]
    Task(#[from] JoinError),
}

/// Stand-in hash checked when no account matches, so unknown emails take
/// as long to reject as wrong passwords
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hashes a password into an encoded argon2 string (salt and parameters included)
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| PasswordError::SaltGeneration)?;

    let config = argon2::Config::default();
    Ok(argon2::hash_encoded(password.as_bytes(), &salt, &config)?)
}

/// Malformed hashes verify as false
pub fn verify_password(encoded: &str, password: &str) -> bool {
    argon2::verify_encoded(encoded, password.as_bytes()).unwrap_or(false)
}

/// `hash_password` on the blocking pool
pub async fn hash_password_async(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// Verifies against the stored hash on the blocking pool. Without a hash the
/// same work is done against a stand-in and the result is always false.
pub async fn verify_password_async(
    encoded: Option<String>,
    password: String,
) -> Result<bool, PasswordError> {
    let verified = tokio::task::spawn_blocking(move || match encoded {
        Some(encoded) => verify_password(&encoded, &password),
        None => {
            let dummy = DUMMY_HASH
                .get_or_init(|| hash_password("unused-password").unwrap_or_default());
            verify_password(dummy, &password);
            false
        }
    })
    .await?;

    Ok(verified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "wrong horse"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        assert!(!verify_password("not-a-hash", "anything"));
    }

    #[tokio::test]
    async fn test_async_hash_and_verify() {
        let hash = hash_password_async("correct horse".to_string()).await.unwrap();

        assert!(verify_password_async(Some(hash.clone()), "correct horse".to_string())
            .await
            .unwrap());
        assert!(!verify_password_async(Some(hash), "wrong horse".to_string())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_missing_account_never_verifies() {
        assert!(!verify_password_async(None, "unused-password".to_string())
            .await
            .unwrap());
        assert!(DUMMY_HASH.get().is_some_and(|hash| hash.starts_with("$argon2")));
    }
}
