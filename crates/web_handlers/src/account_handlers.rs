use actix_web::{HttpResponse, Result, web};
use validator::Validate;

use account_services::middleware::AuthenticatedUser;
use account_services::service::AccountService;
use account_services::types::*;

/// Handles account registration.
///
/// Policy violations and duplicate emails are reported together as a
/// 400 response listing every `IdentityError`.
pub async fn register(
    accounts: web::Data<AccountService>,
    request: web::Json<UserCredentials>,
) -> Result<HttpResponse, AccountError> {
    match accounts.register(&request).await? {
        IdentityResult::Succeeded(identity) => {
            log::info!("✅ Registered account {}", identity.id);
            Ok(HttpResponse::Created().json(serde_json::json!({
                "id": identity.id,
                "email": identity.email
            })))
        }
        IdentityResult::Failed(errors) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "registration_failed",
            "errors": errors
        }))),
    }
}

/// Handles login by verifying the credentials and issuing a session token.
/// Rejected sign-ins return 401 with the reason in `error`.
pub async fn login(
    accounts: web::Data<AccountService>,
    request: web::Json<UserCredentials>,
) -> Result<HttpResponse, AccountError> {
    // Emails are stored trimmed
    let credentials = UserCredentials::new(request.email.trim(), request.password.as_str());
    credentials
        .validate()
        .map_err(|e| AccountError::Validation(format!("Validation error: {}", e)))?;

    match accounts.authenticate(&credentials).await? {
        AuthenticationOutcome::Authenticated(response) => Ok(HttpResponse::Ok().json(response)),
        AuthenticationOutcome::Rejected(outcome) => {
            let (error, message) = match outcome {
                SignInOutcome::LockedOut => ("locked_out", "Account is temporarily locked out"),
                SignInOutcome::RequiresTwoFactor => {
                    ("requires_two_factor", "A second factor is required")
                }
                _ => ("invalid_credentials", "Invalid email or password"),
            };
            Ok(HttpResponse::Unauthorized().json(serde_json::json!({
                "error": error,
                "message": message
            })))
        }
    }
}

/// Returns the account behind the bearer token, with its roles.
pub async fn me(
    accounts: web::Data<AccountService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AccountError> {
    let identity = accounts
        .find_one_by_email(user.email())
        .await?
        .ok_or(AccountError::AccountNotFound)?;

    Ok(HttpResponse::Ok().json(account_info(&accounts, identity).await?))
}

/// Returns an account by id.
pub async fn get_account(
    accounts: web::Data<AccountService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AccountError> {
    let identity = accounts
        .find_one_by_id(&path.into_inner())
        .await?
        .ok_or(AccountError::AccountNotFound)?;

    Ok(HttpResponse::Ok().json(account_info(&accounts, identity).await?))
}

/// Adds an account to a role. The caller must be an administrator.
pub async fn assign_role(
    accounts: web::Data<AccountService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    request: web::Json<AssignRoleRequest>,
) -> Result<HttpResponse, AccountError> {
    request
        .validate()
        .map_err(|e| AccountError::Validation(format!("Validation error: {}", e)))?;

    let caller = accounts
        .find_one_by_email(user.email())
        .await?
        .ok_or(AccountError::AccountNotFound)?;
    if !accounts.is_in_role(&caller, ADMIN_ROLE).await? {
        log::warn!("🚫 {} tried to assign a role without being an admin", caller.id);
        return Err(AccountError::Forbidden(ADMIN_ROLE.to_string()));
    }

    let target = accounts
        .find_one_by_id(&path.into_inner())
        .await?
        .ok_or(AccountError::AccountNotFound)?;

    match accounts.assign_role(&target, &request.role).await? {
        IdentityResult::Succeeded(()) => Ok(HttpResponse::NoContent().finish()),
        IdentityResult::Failed(errors) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "role_assignment_failed",
            "errors": errors
        }))),
    }
}

async fn account_info(
    accounts: &AccountService,
    identity: Identity,
) -> Result<AccountInfo, AccountError> {
    let roles = accounts.roles(&identity).await?;
    Ok(AccountInfo {
        id: identity.id,
        email: identity.email,
        roles,
    })
}
