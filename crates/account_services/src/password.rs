use std::collections::HashSet;

use bcrypt::{hash, verify};
use validator::ValidateEmail;

use crate::config::PasswordPolicy;
use crate::types::IdentityError;

/// Checks `password` against `policy`, returning every violated rule.
pub fn validate_password(password: &str, policy: &PasswordPolicy) -> Vec<IdentityError> {
    let mut errors = Vec::new();

    if password.chars().count() < policy.required_length {
        errors.push(IdentityError::password_too_short(policy.required_length));
    }
    if policy.require_non_alphanumeric && password.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push(IdentityError::password_requires_non_alphanumeric());
    }
    if policy.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(IdentityError::password_requires_digit());
    }
    if policy.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(IdentityError::password_requires_lower());
    }
    if policy.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(IdentityError::password_requires_upper());
    }
    if policy.required_unique_chars >= 1
        && password.chars().collect::<HashSet<_>>().len() < policy.required_unique_chars
    {
        errors.push(IdentityError::password_requires_unique_chars(
            policy.required_unique_chars,
        ));
    }

    errors
}

/// Checks that `email` is a syntactically valid address.
pub fn validate_email(email: &str) -> Option<IdentityError> {
    if email.trim().validate_email() {
        None
    } else {
        Some(IdentityError::invalid_email(email))
    }
}

/// Hashes a password with bcrypt at the policy's cost.
pub fn hash_password(password: &str, policy: &PasswordPolicy) -> Result<String, bcrypt::BcryptError> {
    hash(password, policy.hash_cost)
}

/// Verifies a password against a stored bcrypt hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, password_hash)
}
