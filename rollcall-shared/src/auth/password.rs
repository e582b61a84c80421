/// Password hashing with Argon2id
///
/// Hashes are stored in PHC string format, so the parameters travel with the
/// hash and verification never needs out-of-band configuration.
///
/// # Example
///
/// ```
/// use rollcall_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("classroom#42")?;
/// assert!(verify_password("classroom#42", &hash)?);
/// assert!(!verify_password("classroom#43", &hash)?);
/// # Ok(())
/// # }
/// ```
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Error type for password operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with Argon2id and a fresh random salt
///
/// # Errors
///
/// Returns [`PasswordError::HashError`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored hash
///
/// Returns `Ok(false)` for a wrong password; errors are reserved for
/// malformed hashes.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Validates the account password policy
///
/// Passwords must be at least 8 characters and contain at least one letter
/// and one digit.
///
/// # Example
///
/// ```
/// use rollcall_shared::auth::password::validate_password_policy;
///
/// assert!(validate_password_policy("classroom42").is_ok());
/// assert!(validate_password_policy("short1").is_err());
/// assert!(validate_password_policy("nodigitshere").is_err());
/// ```
pub fn validate_password_policy(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("Password must contain at least one letter".to_string());
    }

    if !password.chars().any(|c| c.is_numeric()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_phc_string() {
        let hash = hash_password("classroom42").expect("hash should succeed");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_uses_random_salt() {
        let a = hash_password("same-password1").unwrap();
        let b = hash_password("same-password1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_correct_and_incorrect() {
        let hash = hash_password("classroom42").unwrap();
        assert!(verify_password("classroom42", &hash).unwrap());
        assert!(!verify_password("classroom43", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-hash").is_err());
        assert!(verify_password("anything", "$argon2id$broken").is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password_policy("classroom42").is_ok());
        assert!(validate_password_policy("Str0ng-enough").is_ok());

        let short = validate_password_policy("ab1");
        assert!(short.unwrap_err().contains("8 characters"));

        let no_digit = validate_password_policy("lettersonly");
        assert!(no_digit.unwrap_err().contains("digit"));

        let no_letter = validate_password_policy("12345678");
        assert!(no_letter.unwrap_err().contains("letter"));
    }

    #[test]
    fn test_hash_verify_roundtrip_unicode() {
        for password in ["plain old pw 1", "accénted-pw-9", "日本語パスワード7"] {
            let hash = hash_password(password).unwrap();
            assert!(verify_password(password, &hash).unwrap(), "{}", password);
        }
    }
}
