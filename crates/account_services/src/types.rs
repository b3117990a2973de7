use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Email and password pair supplied at registration or login.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserCredentials {
    /// Email address of the account
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Plaintext password, never persisted
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl UserCredentials {
    /// Builds a credentials pair.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Profile details collected when a user fills in their personal record.
///
/// Signature and profile picture uploads are handled outside this crate.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateDto {
    /// First name of the user
    #[validate(length(min = 1, max = 255, message = "First name is required"))]
    pub first_name: String,

    /// Surname of the user
    #[validate(length(min = 1, max = 255, message = "Surname is required"))]
    pub surname: String,

    /// Additional names, in order
    #[serde(default)]
    pub other_names: Vec<String>,
}

/// Request structure for adding an account to a role
#[derive(Debug, Deserialize, Validate)]
pub struct AssignRoleRequest {
    /// Name of the role, matched case-insensitively
    #[validate(length(min = 1, max = 256, message = "Role name is required"))]
    pub role: String,
}

/// Stored identity record.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Opaque identifier (UUID v4 text)
    pub id: String,
    /// User name, always equal to the email given at registration
    pub user_name: String,
    /// Email address as entered
    pub email: String,
    /// Lowercased, trimmed email used for lookups and uniqueness
    pub normalized_email: String,
    /// Bcrypt hash of the password
    pub password_hash: String,
    /// Consecutive failed sign-ins since the last success or lockout
    pub access_failed_count: i32,
    /// End of the current lockout, if any
    pub lockout_end: Option<DateTime<Utc>>,
    /// Whether sign-in requires a second factor
    pub two_factor_enabled: bool,
    /// Timestamp when the identity was created
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Creates a fresh identity whose user name and email are both `email`.
    pub fn new(email: &str, password_hash: String) -> Self {
        let email = email.trim().to_string();
        Self {
            id: Uuid::new_v4().to_string(),
            user_name: email.clone(),
            normalized_email: normalize_email(&email),
            email,
            password_hash,
            access_failed_count: 0,
            lockout_end: None,
            two_factor_enabled: false,
            created_at: Utc::now(),
        }
    }

    /// Whether the identity is locked out at `now`.
    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.lockout_end.is_some_and(|end| end > now)
    }
}

/// Role allowed to manage other accounts' roles.
pub const ADMIN_ROLE: &str = "Admin";

/// Normalizes an email for case-insensitive comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalizes a role name for case-insensitive comparison.
pub fn normalize_role_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// A single reason the identity layer rejected an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityError {
    /// Stable machine-readable code
    pub code: String,
    /// Human-readable description
    pub description: String,
}

impl IdentityError {
    fn new(code: &str, description: String) -> Self {
        Self {
            code: code.to_string(),
            description,
        }
    }

    /// The email is not a valid address.
    pub fn invalid_email(email: &str) -> Self {
        Self::new("InvalidEmail", format!("Email '{}' is invalid.", email))
    }

    /// Another identity already uses the email.
    pub fn duplicate_email(email: &str) -> Self {
        Self::new(
            "DuplicateEmail",
            format!("Email '{}' is already taken.", email),
        )
    }

    /// The password is shorter than the policy allows.
    pub fn password_too_short(length: usize) -> Self {
        Self::new(
            "PasswordTooShort",
            format!("Passwords must be at least {} characters.", length),
        )
    }

    /// The password has no non-alphanumeric character.
    pub fn password_requires_non_alphanumeric() -> Self {
        Self::new(
            "PasswordRequiresNonAlphanumeric",
            "Passwords must have at least one non alphanumeric character.".to_string(),
        )
    }

    /// The password has no digit.
    pub fn password_requires_digit() -> Self {
        Self::new(
            "PasswordRequiresDigit",
            "Passwords must have at least one digit ('0'-'9').".to_string(),
        )
    }

    /// The password has no lowercase letter.
    pub fn password_requires_lower() -> Self {
        Self::new(
            "PasswordRequiresLower",
            "Passwords must have at least one lowercase ('a'-'z').".to_string(),
        )
    }

    /// The password has no uppercase letter.
    pub fn password_requires_upper() -> Self {
        Self::new(
            "PasswordRequiresUpper",
            "Passwords must have at least one uppercase ('A'-'Z').".to_string(),
        )
    }

    /// The password has too few distinct characters.
    pub fn password_requires_unique_chars(count: usize) -> Self {
        Self::new(
            "PasswordRequiresUniqueChars",
            format!("Passwords must use at least {} different characters.", count),
        )
    }

    /// No identity has the given id.
    pub fn identity_not_found(id: &str) -> Self {
        Self::new("IdentityNotFound", format!("Identity {} does not exist.", id))
    }

    /// The named role does not exist.
    pub fn role_not_found(role: &str) -> Self {
        Self::new("RoleNotFound", format!("Role {} does not exist.", role))
    }
}

/// Outcome of an identity-layer mutation.
#[derive(Debug, Clone)]
pub enum IdentityResult<T = ()> {
    /// The operation succeeded
    Succeeded(T),
    /// The operation was rejected for the listed reasons
    Failed(Vec<IdentityError>),
}

impl<T> IdentityResult<T> {
    /// Whether the operation succeeded.
    pub fn succeeded(&self) -> bool {
        matches!(self, IdentityResult::Succeeded(_))
    }

    /// Rejection reasons, empty on success.
    pub fn errors(&self) -> &[IdentityError] {
        match self {
            IdentityResult::Succeeded(_) => &[],
            IdentityResult::Failed(errors) => errors,
        }
    }
}

/// Result of a password sign-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInOutcome {
    /// Password verified
    Succeeded,
    /// Unknown email or wrong password
    Failed,
    /// The identity is locked out
    LockedOut,
    /// Password verified but a second factor is required
    RequiresTwoFactor,
}

/// Token returned to the caller after a successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    /// Identifier of the authenticated identity
    pub account_id: String,
    /// Encoded bearer token
    pub token: String,
    /// Instant the token stops being valid
    pub expiration: DateTime<Utc>,
}

/// Result of a combined sign-in and token issuance.
#[derive(Debug, Clone)]
pub enum AuthenticationOutcome {
    /// Credentials verified and a token was issued
    Authenticated(AuthenticationResponse),
    /// Credentials were not accepted; never `SignInOutcome::Succeeded`
    Rejected(SignInOutcome),
}

/// Account details returned by the API
#[derive(Debug, Serialize)]
pub struct AccountInfo {
    /// Identifier of the account
    pub id: String,
    /// Email address of the account
    pub email: String,
    /// Names of the roles the account belongs to
    pub roles: Vec<String>,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Email address of the authenticated identity
    pub email: String,
    /// Expiration timestamp (seconds since the epoch)
    pub exp: i64,
}

/// Custom error type for account-related errors
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// No account matches the request
    #[error("Account not found")]
    AccountNotFound,

    /// A token was requested for an email that does not resolve to an identity
    #[error("No identity is registered for {0}")]
    UnknownIdentity(String),

    /// The caller lacks the role the operation requires
    #[error("Requires the {0} role")]
    Forbidden(String),

    /// The token expiration falls outside the representable date range
    #[error("Cannot compute token expiration for {0}")]
    TokenExpiration(DateTime<Utc>),

    /// Required configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An error occurred while validating input data
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An error occurred while hashing the password
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// An error occurred while encoding or decoding a token
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl actix_web::ResponseError for AccountError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            AccountError::AccountNotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "account_not_found",
                "message": "Account not found"
            })),
            AccountError::Forbidden(role) => HttpResponse::Forbidden().json(serde_json::json!({
                "error": "forbidden",
                "message": format!("This action requires the {} role", role)
            })),
            AccountError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "validation_error",
                "message": msg
            })),
            _ => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "internal_error",
                "message": "An internal error occurred"
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_create_dto_reads_camel_case() {
        let dto: UserCreateDto = serde_json::from_value(serde_json::json!({
            "firstName": "Jane",
            "surname": "Doe",
            "otherNames": ["Ada"]
        }))
        .unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.other_names, vec!["Ada"]);

        let dto: UserCreateDto = serde_json::from_value(serde_json::json!({
            "firstName": "",
            "surname": "Doe"
        }))
        .unwrap();
        assert!(dto.other_names.is_empty());
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_new_identity_normalizes_email() {
        let identity = Identity::new("  Jane@Example.COM ", "hash".to_string());
        assert_eq!(identity.email, "Jane@Example.COM");
        assert_eq!(identity.user_name, identity.email);
        assert_eq!(identity.normalized_email, "jane@example.com");
        assert!(!identity.is_locked_out(Utc::now()));
    }

    #[test]
    fn test_sign_in_outcome_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(SignInOutcome::RequiresTwoFactor).unwrap(),
            "requires_two_factor"
        );
    }
}
