use chrono::{DateTime, Months, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::config::TokenConfig;
use crate::types::{AccountError, AuthenticationResponse, Claims, Identity};

/// Lifetime of an issued session token, in calendar months.
pub const TOKEN_LIFETIME_MONTHS: u32 = 1;

/// Issues and verifies HS256 session tokens with a single shared key.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    /// Creates an issuer from the startup configuration.
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.signing_key()),
            decoding_key: DecodingKey::from_secret(config.signing_key()),
        }
    }

    /// Issues a token for `identity`, expiring one calendar month from now.
    pub fn issue(&self, identity: &Identity) -> Result<AuthenticationResponse, AccountError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issues a token as if the current instant were `issued_at`.
    pub fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<AuthenticationResponse, AccountError> {
        let expiration = expiration_for(issued_at)?;

        let claims = Claims {
            email: identity.email.clone(),
            exp: expiration.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(AuthenticationResponse {
            account_id: identity.id.clone(),
            token,
            expiration,
        })
    }

    /// Verifies the signature and expiry of `token` and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AccountError> {
        let token_data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }
}

/// Expiration for a token issued at `issued_at`, truncated to whole seconds.
pub fn expiration_for(issued_at: DateTime<Utc>) -> Result<DateTime<Utc>, AccountError> {
    DateTime::from_timestamp(issued_at.timestamp(), 0)
        .and_then(|t| t.checked_add_months(Months::new(TOKEN_LIFETIME_MONTHS)))
        .ok_or(AccountError::TokenExpiration(issued_at))
}
