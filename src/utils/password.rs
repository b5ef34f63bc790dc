use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use regex::Regex;

const MAX_PASSWORD_LENGTH: usize = 64;

pub fn hash(password: impl Into<String>) -> Result<String, String> {
    let password = password.into();

    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must not be more than {} characters",
            MAX_PASSWORD_LENGTH
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hashed_password = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();

    Ok(hashed_password)
}

pub fn compare(password: &str, hashed_password: &str) -> Result<bool, String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must not be more than {} characters",
            MAX_PASSWORD_LENGTH
        ));
    }

    let parsed_hash = PasswordHash::new(hashed_password).map_err(|e| e.to_string())?;

    let password_matched = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_or(false, |_| true);

    Ok(password_matched)
}

/// Minimum strength rule: at least 8 characters, with at least one letter
/// and one digit.
pub fn is_strong_enough(password: &str) -> bool {
    if password.len() < 8 {
        return false;
    }
    let has_letter = Regex::new(r"[A-Za-z]").unwrap().is_match(password);
    let has_digit = Regex::new(r"\d").unwrap().is_match(password);
    has_letter && has_digit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_compare_round_trip() {
        let hashed = hash("Renovate2024").unwrap();
        assert!(compare("Renovate2024", &hashed).unwrap());
        assert!(!compare("renovate2024x", &hashed).unwrap());
    }

    #[test]
    fn empty_password_rejected() {
        assert!(hash("").is_err());
    }

    #[test]
    fn strength_rule_needs_length_letter_and_digit() {
        assert!(is_strong_enough("abcdefg1"));
        assert!(is_strong_enough("Reno2024!"));
        assert!(!is_strong_enough("short1"));
        assert!(!is_strong_enough("allletters"));
        assert!(!is_strong_enough("12345678"));
    }
}
