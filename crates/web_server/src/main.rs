//! Main entry point for the eBonder backend server.
//! This crate wires the account and notification services to the REST API.

use std::sync::Arc;

use account_services::{
    ADMIN_ROLE, AccountService, IdentityResult, PgCredentialStore, TokenIssuer,
};
use actix_web::{App, HttpServer, middleware::Logger, web};
use notification_services::{NotificationService, PgNotificationStore};
use postgres::database::*;
use web_handlers::configure_routes;

mod config;

use config::ServerConfig;

/// Adds the configured account to the `Admin` role, if it exists.
async fn bootstrap_admin(accounts: &AccountService, email: &str) {
    let identity = match accounts.find_one_by_email(email).await {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            log::warn!("⚠️ Bootstrap admin {} is not registered yet", email);
            return;
        }
        Err(e) => {
            log::error!("❌ Failed to look up bootstrap admin {}: {}", email, e);
            return;
        }
    };

    match accounts.assign_role(&identity, ADMIN_ROLE).await {
        Ok(IdentityResult::Succeeded(())) => {
            log::info!("👑 {} is an administrator", email);
        }
        Ok(IdentityResult::Failed(errors)) => {
            log::error!("❌ Could not promote {}: {:?}", email, errors);
        }
        Err(e) => log::error!("❌ Could not promote {}: {}", email, e),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting eBonder server...");

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Create database connection pool
    let pool = match create_connection_pool(&config.database_url).await {
        Ok(pool) => {
            log::info!("🗃️ Database pool created successfully");

            if let Err(e) = test_connection(&pool).await {
                log::error!("❌ Database connection test failed: {}", e);
            }
            pool
        }
        Err(e) => {
            log::error!("❌ Failed to create database pool: {}", e);
            log::error!("💡 Make sure PostgreSQL is running and DATABASE_URL is correct");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        log::error!("❌ Failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    let issuer = TokenIssuer::new(&config.token);
    let accounts = AccountService::new(
        Arc::new(PgCredentialStore::new(pool.clone())),
        issuer.clone(),
        config.password_policy.clone(),
        config.lockout_policy.clone(),
    );
    let notifications = NotificationService::new(Arc::new(PgNotificationStore::new(pool)));

    if config.lockout_policy.enabled {
        log::info!("🔒 Account lockout on failed sign-in is enabled");
    }

    if let Some(email) = &config.bootstrap_admin_email {
        bootstrap_admin(&accounts, email).await;
    }

    let accounts = web::Data::new(accounts);
    let issuer = web::Data::new(issuer);
    let notifications = web::Data::new(notifications);

    log::info!("🌐 Server will be available at: http://{}", config.bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(accounts.clone())
            .app_data(issuer.clone())
            .app_data(notifications.clone())
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
