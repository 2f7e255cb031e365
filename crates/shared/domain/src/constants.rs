//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// User Roles
// =============================================================================

/// Default role assigned to new users
pub const ROLE_USER: &str = "user";

/// Administrator role with elevated privileges
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Symbols a password must draw at least one character from
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Message reported when a raw password fails the password rule
pub const PASSWORD_RULE_MESSAGE: &str =
    "Password must be at least 8 characters long, with at least 1 letter, 1 number, and 1 special character.";

/// Username length bounds (inclusive)
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 16;

/// Phone number digit-count bounds (inclusive)
pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_PHONE_DIGITS: usize = 15;

// =============================================================================
// Status codes
// =============================================================================

/// HTTP-style status codes carried by envelopes and errors.
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const NOT_FOUND: u16 = 404;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}
