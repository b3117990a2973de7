use account_services::{
    AccountError, LockoutPolicy, PasswordPolicy, TokenConfig,
    config::{JWT_KEY_VAR, MAX_HASH_COST, MIN_HASH_COST},
};
use postgres::database::DEFAULT_DATABASE_URL;

/// Address the server binds to when `BIND_ADDRESS` is not set.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Settings read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PostgreSQL connection string (`DATABASE_URL`)
    pub database_url: String,
    /// Socket address to listen on (`BIND_ADDRESS`)
    pub bind_address: String,
    /// Session token signing settings (`JWT_KEY`)
    pub token: TokenConfig,
    /// Password rules; the bcrypt cost comes from `PASSWORD_HASH_COST`
    pub password_policy: PasswordPolicy,
    /// Lockout rules, switched on by `LOCKOUT_ON_FAILURE=true`
    pub lockout_policy: LockoutPolicy,
    /// Existing account promoted to `Admin` at startup (`BOOTSTRAP_ADMIN_EMAIL`)
    pub bootstrap_admin_email: Option<String>,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, AccountError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AccountError> {
        let token = lookup(JWT_KEY_VAR)
            .ok_or_else(|| AccountError::Configuration(format!("{} is not set", JWT_KEY_VAR)))
            .and_then(TokenConfig::new)?;

        let lockout_policy = match lookup("LOCKOUT_ON_FAILURE") {
            Some(value) if parse_flag(&value)? => LockoutPolicy::enabled(),
            _ => LockoutPolicy::default(),
        };

        let mut password_policy = PasswordPolicy::default();
        if let Some(cost) = lookup("PASSWORD_HASH_COST") {
            password_policy.hash_cost = parse_hash_cost(&cost)?;
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_address: lookup("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            token,
            password_policy,
            lockout_policy,
            bootstrap_admin_email: lookup("BOOTSTRAP_ADMIN_EMAIL")
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty()),
        })
    }
}

fn parse_flag(value: &str) -> Result<bool, AccountError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AccountError::Configuration(format!(
            "LOCKOUT_ON_FAILURE must be true or false, got '{}'",
            other
        ))),
    }
}

fn parse_hash_cost(value: &str) -> Result<u32, AccountError> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|cost| (MIN_HASH_COST..=MAX_HASH_COST).contains(cost))
        .ok_or_else(|| {
            AccountError::Configuration(format!(
                "PASSWORD_HASH_COST must be between {} and {}, got '{}'",
                MIN_HASH_COST,
                MAX_HASH_COST,
                value
            ))
        })
}
