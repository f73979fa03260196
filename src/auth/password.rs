use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::{AppError, AppResult};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Passwords must mix upper case, lower case and digits on top of the
/// length check done by the request validator.
pub fn check_password_strength(password: &str) -> AppResult<()> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if password.len() < 8 || !has_upper || !has_lower || !has_digit {
        return Err(AppError::Validation(
            "Password must be at least 8 characters and contain an uppercase letter, a lowercase letter and a number".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("Correct-horse1").unwrap();
        assert!(verify_password("Correct-horse1", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("Same-password1").unwrap();
        let b = hash_password("Same-password1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn strength_check_requires_character_classes() {
        assert!(check_password_strength("Abcdef12").is_ok());
        assert!(check_password_strength("abcdef12").is_err()); // no upper
        assert!(check_password_strength("ABCDEF12").is_err()); // no lower
        assert!(check_password_strength("Abcdefgh").is_err()); // no digit
        assert!(check_password_strength("Ab1").is_err()); // too short
    }
}
