use chrono::Duration;

use crate::types::AccountError;

/// Environment variable holding the token signing key.
pub const JWT_KEY_VAR: &str = "JWT_KEY";

/// Settings for session token signing. Read once at startup and never mutated.
#[derive(Clone)]
pub struct TokenConfig {
    signing_key: String,
}

impl TokenConfig {
    /// Creates a token configuration, rejecting an empty key.
    pub fn new(signing_key: impl Into<String>) -> Result<Self, AccountError> {
        let signing_key = signing_key.into();
        if signing_key.trim().is_empty() {
            return Err(AccountError::Configuration(format!(
                "{} must not be empty",
                JWT_KEY_VAR
            )));
        }

        Ok(Self { signing_key })
    }

    /// The shared HMAC key.
    pub fn signing_key(&self) -> &[u8] {
        self.signing_key.as_bytes()
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

/// Lowest bcrypt work factor bcrypt accepts.
pub const MIN_HASH_COST: u32 = 4;

/// Highest bcrypt work factor bcrypt accepts.
pub const MAX_HASH_COST: u32 = 31;

/// Rules a new password has to satisfy, plus the bcrypt cost used to hash it.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Minimum number of characters (default: 6)
    pub required_length: usize,
    /// Minimum number of distinct characters (default: 1)
    pub required_unique_chars: usize,
    /// Require a character that is neither a letter nor a digit
    pub require_non_alphanumeric: bool,
    /// Require an ASCII lowercase letter
    pub require_lowercase: bool,
    /// Require an ASCII uppercase letter
    pub require_uppercase: bool,
    /// Require an ASCII digit
    pub require_digit: bool,
    /// Bcrypt work factor
    pub hash_cost: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            required_length: 6,
            required_unique_chars: 1,
            require_non_alphanumeric: true,
            require_lowercase: true,
            require_uppercase: true,
            require_digit: true,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Account lockout after repeated failed sign-ins.
///
/// Disabled by default: failed sign-ins are never counted.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    /// Whether failed sign-ins are counted towards a lockout
    pub enabled: bool,
    /// Failures before the identity is locked (default: 5)
    pub max_failed_access_attempts: i32,
    /// How long a lockout lasts (default: 5 minutes)
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_failed_access_attempts: 5,
            lockout_duration: Duration::minutes(5),
        }
    }
}

impl LockoutPolicy {
    /// The default thresholds with counting switched on.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_signing_key_is_rejected() {
        assert!(matches!(
            TokenConfig::new("   "),
            Err(AccountError::Configuration(_))
        ));
        assert!(TokenConfig::new("a-long-enough-secret").is_ok());
    }

    #[test]
    fn test_debug_output_hides_key() {
        let config = TokenConfig::new("super-secret").unwrap();
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn test_lockout_disabled_by_default() {
        let policy = LockoutPolicy::default();
        assert!(!policy.enabled);
        assert!(LockoutPolicy::enabled().enabled);
    }
}
