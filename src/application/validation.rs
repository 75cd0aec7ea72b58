//! Input validation rules shared by registration and profile updates

use validator::ValidateEmail;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Syntactic email check
pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
}

/// Permissive name charset: letters (including accented), spaces,
/// hyphens and apostrophes.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\''))
}

// ── Tests ──────────────────────────────────────────────────────
