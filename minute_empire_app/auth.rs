use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

use minute_empire_types::errors::AppError;

/// Hashes a plaintext password with a fresh per-user salt, PHC-encoded for
/// storage on the user document.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(AppError::PasswordHash)
}

/// Checks a candidate password against the stored hash. A mismatch and an
/// unreadable stored hash both collapse into `WrongAuthCredentials`, so the
/// response never reveals which of the two it was.
pub fn verify_password(stored_hash: &str, candidate: &str) -> Result<(), AppError> {
    let parsed_hash =
        PasswordHash::new(stored_hash).map_err(|_| AppError::WrongAuthCredentials)?;
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::WrongAuthCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password(&hash, "hunter2hunter2").is_ok());
        assert!(matches!(
            verify_password(&hash, "wrong-password"),
            Err(AppError::WrongAuthCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_corrupt_stored_hash_reads_as_bad_credentials() {
        assert!(matches!(
            verify_password("not-a-phc-string", "whatever"),
            Err(AppError::WrongAuthCredentials)
        ));
    }
}
