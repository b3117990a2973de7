use std::sync::Arc;

use chrono::Utc;

use crate::config::{LockoutPolicy, PasswordPolicy};
use crate::jwt::TokenIssuer;
use crate::password::{hash_password, validate_email, validate_password, verify_password};
use crate::store::CredentialStore;
use crate::types::{
    AccountError, AuthenticationOutcome, AuthenticationResponse, Identity, IdentityResult,
    SignInOutcome, UserCredentials, normalize_role_name,
};

/// A service for account operations: registration, sign-in, role membership
/// and session token issuance.
pub struct AccountService {
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
    password_policy: PasswordPolicy,
    lockout_policy: LockoutPolicy,
}

impl AccountService {
    /// Creates a new instance of `AccountService` over the given store and token issuer.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        issuer: TokenIssuer,
        password_policy: PasswordPolicy,
        lockout_policy: LockoutPolicy,
    ) -> Self {
        Self {
            store,
            issuer,
            password_policy,
            lockout_policy,
        }
    }

    /// The issuer used to sign and verify session tokens.
    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Finds an account by email.
    pub async fn find_one_by_email(&self, email: &str) -> Result<Option<Identity>, AccountError> {
        log::info!("Finding account with email {}", email);
        self.store.find_by_email(email).await
    }

    /// Finds an account by id.
    pub async fn find_one_by_id(&self, account_id: &str) -> Result<Option<Identity>, AccountError> {
        log::info!("Finding account with id {}", account_id);
        self.store.find_by_id(account_id).await
    }

    /// Adds the account to the named role.
    pub async fn assign_role(
        &self,
        identity: &Identity,
        role_name: &str,
    ) -> Result<IdentityResult, AccountError> {
        log::info!(
            "Attempt to add account with id {} to {} role",
            identity.id,
            role_name
        );
        self.store.add_to_role(&identity.id, role_name).await
    }

    /// Names of the roles the account belongs to.
    pub async fn roles(&self, identity: &Identity) -> Result<Vec<String>, AccountError> {
        self.store.roles(&identity.id).await
    }

    /// Whether the account belongs to the named role, ignoring case.
    pub async fn is_in_role(&self, identity: &Identity, role_name: &str) -> Result<bool, AccountError> {
        let wanted = normalize_role_name(role_name);
        Ok(self
            .roles(identity)
            .await?
            .iter()
            .any(|role| normalize_role_name(role) == wanted))
    }

    /// Registers a new account whose user name and email are both `credentials.email`.
    ///
    /// Returns every policy violation at once; the email is checked for
    /// uniqueness only once the password is acceptable.
    pub async fn register(
        &self,
        credentials: &UserCredentials,
    ) -> Result<IdentityResult<Identity>, AccountError> {
        log::info!("Attempt to register {}", credentials.email);

        let mut errors: Vec<_> = validate_email(&credentials.email).into_iter().collect();
        errors.extend(validate_password(
            &credentials.password,
            &self.password_policy,
        ));
        if !errors.is_empty() {
            return Ok(IdentityResult::Failed(errors));
        }

        let password_hash = hash_password(&credentials.password, &self.password_policy)?;
        let identity = Identity::new(&credentials.email, password_hash);

        Ok(match self.store.insert(&identity).await? {
            IdentityResult::Succeeded(()) => IdentityResult::Succeeded(identity),
            IdentityResult::Failed(errors) => IdentityResult::Failed(errors),
        })
    }

    /// Verifies a password sign-in.
    ///
    /// Failed attempts only count towards a lockout when the lockout policy is enabled.
    pub async fn login(&self, credentials: &UserCredentials) -> Result<SignInOutcome, AccountError> {
        log::info!("Attempt to log into {}", credentials.email);

        let Some(identity) = self.store.find_by_email(&credentials.email).await? else {
            return Ok(SignInOutcome::Failed);
        };

        self.check_password_sign_in(&identity, &credentials.password)
            .await
    }

    /// Issues a session token for an email that has already passed `login`.
    ///
    /// Returns `AccountError::UnknownIdentity` when the email does not resolve.
    pub async fn build_token(
        &self,
        credentials: &UserCredentials,
    ) -> Result<AuthenticationResponse, AccountError> {
        let identity = self
            .find_one_by_email(&credentials.email)
            .await?
            .ok_or_else(|| AccountError::UnknownIdentity(credentials.email.clone()))?;

        self.issuer.issue(&identity)
    }

    /// Verifies the credentials and, on success, issues a session token in one step.
    pub async fn authenticate(
        &self,
        credentials: &UserCredentials,
    ) -> Result<AuthenticationOutcome, AccountError> {
        log::info!("Attempt to log into {}", credentials.email);

        let Some(identity) = self.store.find_by_email(&credentials.email).await? else {
            return Ok(AuthenticationOutcome::Rejected(SignInOutcome::Failed));
        };

        match self
            .check_password_sign_in(&identity, &credentials.password)
            .await?
        {
            SignInOutcome::Succeeded => Ok(AuthenticationOutcome::Authenticated(
                self.issuer.issue(&identity)?,
            )),
            rejected => Ok(AuthenticationOutcome::Rejected(rejected)),
        }
    }

    async fn check_password_sign_in(
        &self,
        identity: &Identity,
        password: &str,
    ) -> Result<SignInOutcome, AccountError> {
        if identity.is_locked_out(Utc::now()) {
            log::warn!("Account {} is locked out", identity.id);
            return Ok(SignInOutcome::LockedOut);
        }

        if verify_password(password, &identity.password_hash)? {
            if identity.access_failed_count > 0 {
                self.store.reset_access_failures(&identity.id).await?;
            }
            if identity.two_factor_enabled {
                return Ok(SignInOutcome::RequiresTwoFactor);
            }
            return Ok(SignInOutcome::Succeeded);
        }

        log::warn!("Invalid password for account {}", identity.id);

        if self.lockout_policy.enabled {
            let updated = self
                .store
                .record_access_failure(&identity.id, &self.lockout_policy)
                .await?;
            if updated.is_some_and(|identity| identity.is_locked_out(Utc::now())) {
                log::warn!("Account {} locked out after repeated failures", identity.id);
                return Ok(SignInOutcome::LockedOut);
            }
        }

        Ok(SignInOutcome::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_HASH_COST;
    use crate::config::TokenConfig;
    use crate::memory::MemoryCredentialStore;
    use chrono::{DateTime, Months};

    const KEY: &str = "account-service-test-key-0123456789";

    fn fast_password_policy() -> PasswordPolicy {
        PasswordPolicy {
            hash_cost: MIN_HASH_COST,
            ..PasswordPolicy::default()
        }
    }

    fn service_with(store: Arc<MemoryCredentialStore>, lockout: LockoutPolicy) -> AccountService {
        AccountService::new(
            store,
            TokenIssuer::new(&TokenConfig::new(KEY).unwrap()),
            fast_password_policy(),
            lockout,
        )
    }

    fn service() -> AccountService {
        service_with(
            Arc::new(MemoryCredentialStore::new()),
            LockoutPolicy::default(),
        )
    }

    fn credentials() -> UserCredentials {
        UserCredentials::new("jane@example.com", "Passw0rd!")
    }

    #[tokio::test]
    async fn test_register_then_login_succeeds() {
        let service = service();

        let result = service.register(&credentials()).await.unwrap();
        let IdentityResult::Succeeded(identity) = result else {
            panic!("registration failed: {:?}", result.errors());
        };
        assert_eq!(identity.user_name, "jane@example.com");
        assert_eq!(identity.email, "jane@example.com");
        assert_ne!(identity.password_hash, "Passw0rd!");

        let outcome = service.login(&credentials()).await.unwrap();
        assert_eq!(outcome, SignInOutcome::Succeeded);

        let found = service.find_one_by_id(&identity.id).await.unwrap().unwrap();
        assert_eq!(found.email, "jane@example.com");
        let found = service
            .find_one_by_email("JANE@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, identity.id);
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password_and_bad_email() {
        let service = service();

        let result = service
            .register(&UserCredentials::new("not-an-email", "short"))
            .await
            .unwrap();
        let codes: Vec<_> = result.errors().iter().map(|e| e.code.as_str()).collect();
        assert!(codes.contains(&"InvalidEmail"));
        assert!(codes.contains(&"PasswordTooShort"));
        assert!(codes.contains(&"PasswordRequiresDigit"));
        assert!(!result.succeeded());
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let service = service();
        service.register(&credentials()).await.unwrap();

        let result = service
            .register(&UserCredentials::new("Jane@Example.com", "An0ther!pw"))
            .await
            .unwrap();
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].code, "DuplicateEmail");
    }

    #[tokio::test]
    async fn test_unknown_email_fails_login() {
        let outcome = service().login(&credentials()).await.unwrap();
        assert_eq!(outcome, SignInOutcome::Failed);
    }

    #[tokio::test]
    async fn test_wrong_password_never_locks_out_by_default() {
        let service = service();
        service.register(&credentials()).await.unwrap();

        let wrong = UserCredentials::new("jane@example.com", "wrong-password");
        for _ in 0..10 {
            assert_eq!(service.login(&wrong).await.unwrap(), SignInOutcome::Failed);
        }

        assert_eq!(
            service.login(&credentials()).await.unwrap(),
            SignInOutcome::Succeeded
        );
    }

    #[tokio::test]
    async fn test_wrong_password_locks_out_when_enabled() {
        let service = service_with(
            Arc::new(MemoryCredentialStore::new()),
            LockoutPolicy {
                max_failed_access_attempts: 3,
                ..LockoutPolicy::enabled()
            },
        );
        service.register(&credentials()).await.unwrap();

        let wrong = UserCredentials::new("jane@example.com", "wrong-password");
        assert_eq!(service.login(&wrong).await.unwrap(), SignInOutcome::Failed);
        assert_eq!(service.login(&wrong).await.unwrap(), SignInOutcome::Failed);
        assert_eq!(service.login(&wrong).await.unwrap(), SignInOutcome::LockedOut);

        // Correct password is refused while the lockout lasts
        assert_eq!(
            service.login(&credentials()).await.unwrap(),
            SignInOutcome::LockedOut
        );
    }

    #[tokio::test]
    async fn test_successful_login_resets_failure_count() {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = service_with(
            store.clone(),
            LockoutPolicy {
                max_failed_access_attempts: 2,
                ..LockoutPolicy::enabled()
            },
        );
        service.register(&credentials()).await.unwrap();

        let wrong = UserCredentials::new("jane@example.com", "wrong-password");
        assert_eq!(service.login(&wrong).await.unwrap(), SignInOutcome::Failed);
        assert_eq!(
            service.login(&credentials()).await.unwrap(),
            SignInOutcome::Succeeded
        );
        assert_eq!(service.login(&wrong).await.unwrap(), SignInOutcome::Failed);

        let identity = store.find_by_email("jane@example.com").await.unwrap().unwrap();
        assert_eq!(identity.access_failed_count, 1);
    }

    #[tokio::test]
    async fn test_two_factor_accounts_are_not_signed_in() {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = service_with(store.clone(), LockoutPolicy::default());
        let IdentityResult::Succeeded(mut identity) =
            service.register(&credentials()).await.unwrap()
        else {
            panic!("registration failed");
        };
        identity.two_factor_enabled = true;
        store.update(identity).await;

        assert_eq!(
            service.login(&credentials()).await.unwrap(),
            SignInOutcome::RequiresTwoFactor
        );
        assert!(matches!(
            service.authenticate(&credentials()).await.unwrap(),
            AuthenticationOutcome::Rejected(SignInOutcome::RequiresTwoFactor)
        ));
    }

    #[tokio::test]
    async fn test_build_token_after_login() {
        let service = service();
        let IdentityResult::Succeeded(identity) = service.register(&credentials()).await.unwrap()
        else {
            panic!("registration failed");
        };
        assert_eq!(
            service.login(&credentials()).await.unwrap(),
            SignInOutcome::Succeeded
        );

        let before = Utc::now();
        let response = service.build_token(&credentials()).await.unwrap();
        let after = Utc::now();

        assert_eq!(response.account_id, identity.id);
        let claims = service.token_issuer().verify(&response.token).unwrap();
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.exp, response.expiration.timestamp());

        let earliest = DateTime::from_timestamp(before.timestamp(), 0)
            .unwrap()
            .checked_add_months(Months::new(1))
            .unwrap();
        let latest = after.checked_add_months(Months::new(1)).unwrap();
        assert!(response.expiration >= earliest && response.expiration <= latest);
    }

    #[tokio::test]
    async fn test_build_token_for_unknown_email_is_an_error() {
        let result = service().build_token(&credentials()).await;
        assert!(matches!(result, Err(AccountError::UnknownIdentity(email)) if email == "jane@example.com"));
    }

    #[tokio::test]
    async fn test_authenticate_issues_token_or_rejects() {
        let service = service();
        service.register(&credentials()).await.unwrap();

        match service.authenticate(&credentials()).await.unwrap() {
            AuthenticationOutcome::Authenticated(response) => {
                let claims = service.token_issuer().verify(&response.token).unwrap();
                assert_eq!(claims.email, "jane@example.com");
            }
            other => panic!("expected a token, got {:?}", other),
        }

        let wrong = UserCredentials::new("jane@example.com", "wrong-password");
        assert!(matches!(
            service.authenticate(&wrong).await.unwrap(),
            AuthenticationOutcome::Rejected(SignInOutcome::Failed)
        ));
    }

    #[tokio::test]
    async fn test_assign_role_then_check_membership() {
        let service = service();
        let IdentityResult::Succeeded(identity) = service.register(&credentials()).await.unwrap()
        else {
            panic!("registration failed");
        };

        assert!(!service.is_in_role(&identity, "Admin").await.unwrap());
        assert!(service.assign_role(&identity, "Admin").await.unwrap().succeeded());
        assert!(service.is_in_role(&identity, "admin").await.unwrap());
        assert_eq!(service.roles(&identity).await.unwrap(), vec!["Admin"]);

        let result = service.assign_role(&identity, "Superuser").await.unwrap();
        assert_eq!(result.errors()[0].code, "RoleNotFound");
    }
}
