//! Field validators for user input.
//!
//! Each predicate is pure and tied to one entity field. The `*_rule`
//! adapters wrap them for `#[validate(custom(...))]` on [`crate::User`].

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

use crate::constants::{
    MAX_PHONE_DIGITS, MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, MIN_PHONE_DIGITS, MIN_USERNAME_LENGTH,
    PASSWORD_RULE_MESSAGE, PASSWORD_SYMBOLS,
};

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^[a-zA-Z0-9._-]{{{},{}}}$", MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH))
        .expect("valid username pattern")
});

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

static PASSWORD_CHARSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\d@$!%*?&]+$").expect("valid password pattern"));

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^[0-9]{{{},{}}}$", MIN_PHONE_DIGITS, MAX_PHONE_DIGITS)).expect("valid phone pattern")
});

/// 3-16 characters of letters, digits, `.`, `_` or `-`.
pub fn username(value: &str) -> bool {
    USERNAME_RE.is_match(value)
}

/// `local@domain.tld` with no embedded whitespace.
pub fn email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// At least 8 characters with a letter, a digit and one of `@$!%*?&`,
/// drawn only from those classes.
pub fn password(value: &str) -> bool {
    value.chars().count() >= MIN_PASSWORD_LENGTH
        && PASSWORD_CHARSET_RE.is_match(value)
        && value.chars().any(|c| c.is_ascii_alphabetic())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

/// 10-15 ASCII digits.
pub fn phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

fn rule(ok: bool, code: &'static str, message: &'static str) -> Result<(), ValidationError> {
    if ok {
        return Ok(());
    }
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    Err(error)
}

pub fn username_rule(value: &str) -> Result<(), ValidationError> {
    rule(
        username(value),
        "username",
        "Invalid username format. Must be 3-16 characters long with letters, numbers, or _ . -.",
    )
}

pub fn email_rule(value: &str) -> Result<(), ValidationError> {
    rule(email(value), "email", "Invalid email address.")
}

pub fn password_rule(value: &str) -> Result<(), ValidationError> {
    rule(password(value), "password", PASSWORD_RULE_MESSAGE)
}

pub fn phone_rule(value: &str) -> Result<(), ValidationError> {
    rule(phone(value), "phone", "Invalid phone number format.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username() {
        assert!(!username("ab"));
        assert!(username("john_doe-1"));
        assert!(username("j.doe"));
        assert!(!username("seventeen_chars_x"));
        assert!(!username("john doe"));
    }

    #[test]
    fn test_password() {
        assert!(!password("abcdefgh"));
        assert!(password("abc123!@"));
        assert!(!password("abc12!@"));
        assert!(!password("12345678!"));
        assert!(!password("abc123!@#"), "'#' is outside the allowed symbol set");
    }

    #[test]
    fn test_email() {
        assert!(!email("not-an-email"));
        assert!(email("user@example.com"));
        assert!(!email("user name@example.com"));
        assert!(!email("user@example"));
    }

    #[test]
    fn test_phone() {
        assert!(!phone("12345"));
        assert!(phone("1234567890"));
        assert!(phone("123456789012345"));
        assert!(!phone("1234567890123456"));
        assert!(!phone("12345abcde"));
    }

    #[test]
    fn test_rule_carries_message() {
        let error = email_rule("nope").unwrap_err();
        assert_eq!(error.code, "email");
        assert_eq!(error.message.as_deref(), Some("Invalid email address."));
    }
}
