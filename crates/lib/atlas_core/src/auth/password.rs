//! Password hashing and strength policy via bcrypt.
//!
//! Hashes are self-describing PHC strings (algorithm tag, cost, salt and
//! digest in one), so verification needs no side-channel state.

use crate::auth::AuthError;

/// Default bcrypt cost factor. Hashing at this cost takes tens of
/// milliseconds; the configuration layer keeps it within 10–14.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// bcrypt reads at most 72 bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Minimum length accepted by the strength policy.
const MIN_PASSWORD_BYTES: usize = 8;

/// Symbol set the strength policy accepts.
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Passwords rejected outright, compared case-insensitively.
const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password123",
    "12345678",
    "qwerty",
    "abc123",
    "password1",
    "password123!",
    "welcome",
    "welcome123",
    "admin",
    "admin123",
    "letmein",
    "monkey",
    "1234567890",
];

/// Hash a password with bcrypt at the given cost.
///
/// Every call salts independently, so hashing the same plaintext twice
/// produces different digests that both verify.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    if password.is_empty() {
        return Err(AuthError::InvalidInput("password cannot be empty".into()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::InvalidInput(format!(
            "password too long: maximum {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    bcrypt::hash(password, cost).map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// bcrypt compares digests in constant time, so mismatch position leaks no
/// timing signal.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

/// Check a password against the strength policy.
///
/// Rules run in a fixed order and stop at the first violation, so the
/// reported reason is deterministic.
pub fn validate_strength(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_BYTES {
        return Err(AuthError::WeakPassword(
            "password must be at least 8 characters long".into(),
        ));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::WeakPassword(format!(
            "password too long: maximum {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one number".into(),
        ));
    }
    if !password.chars().any(|c| SYMBOLS.contains(c)) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one special character".into(),
        ));
    }
    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        return Err(AuthError::WeakPassword(
            "password is too common, please choose a stronger password".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the suite fast; cost policy is enforced at
    // the configuration layer, not here.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("Secure123!", TEST_COST).expect("hash");
        assert!(hash.starts_with("$2"), "expected a bcrypt PHC string");
        assert!(verify_password("Secure123!", &hash).expect("verify"));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let hash = hash_password("Secure123!", TEST_COST).expect("hash");
        assert!(!verify_password("WrongPass1!", &hash).expect("verify"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash_password("Secure123!", TEST_COST).expect("hash");
        let second = hash_password("Secure123!", TEST_COST).expect("hash");
        assert_ne!(first, second, "salts must differ between hashes");
        assert!(verify_password("Secure123!", &first).expect("verify"));
        assert!(verify_password("Secure123!", &second).expect("verify"));
    }

    #[test]
    fn empty_password_fails_to_hash() {
        let err = hash_password("", TEST_COST).unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }

    #[test]
    fn oversized_password_fails_to_hash() {
        let long = "a".repeat(MAX_PASSWORD_BYTES + 1);
        let err = hash_password(&long, TEST_COST).unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }

    #[test]
    fn garbled_hash_is_an_error() {
        assert!(verify_password("whatever", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn strength_accepts_a_good_password() {
        assert!(validate_strength("Secure123!").is_ok());
    }

    #[test]
    fn strength_checks_length_first() {
        // Fails several rules at once but length must win.
        let err = validate_strength("Short1!").unwrap_err();
        assert!(err.to_string().contains("at least 8 characters"));
    }

    #[test]
    fn strength_requires_lowercase() {
        let err = validate_strength("UPPERCASE123!").unwrap_err();
        assert!(err.to_string().contains("lowercase"));
    }

    #[test]
    fn strength_requires_uppercase() {
        let err = validate_strength("lowercase123!").unwrap_err();
        assert!(err.to_string().contains("uppercase"));
    }

    #[test]
    fn strength_requires_a_digit() {
        let err = validate_strength("NoDigitsHere!").unwrap_err();
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn strength_requires_a_symbol() {
        let err = validate_strength("NoSymbols123").unwrap_err();
        assert!(err.to_string().contains("special character"));
    }

    #[test]
    fn strength_rejects_common_passwords_case_insensitively() {
        // Passes every structural rule; the deny list catches it last.
        let err = validate_strength("Password123!").unwrap_err();
        assert!(err.to_string().contains("too common"));
    }

    #[test]
    fn strength_accepts_exactly_72_bytes() {
        let mut password = String::from("Aa1!");
        password.push_str(&"x".repeat(MAX_PASSWORD_BYTES - password.len()));
        assert_eq!(password.len(), MAX_PASSWORD_BYTES);
        assert!(validate_strength(&password).is_ok());
    }

    #[test]
    fn strength_rejects_73_bytes() {
        let mut password = String::from("Aa1!");
        password.push_str(&"x".repeat(MAX_PASSWORD_BYTES + 1 - password.len()));
        let err = validate_strength(&password).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }
}
