use actix_web::{HttpResponse, web};

use account_services::middleware::AuthMiddleware;

use crate::{
    account_health, assign_role, create_notification, delete_notification, get_account,
    get_notification, list_notifications, login, me, register,
};

/// Registers every route of the API.
///
/// Expects `web::Data<AccountService>`, `web::Data<TokenIssuer>` and
/// `web::Data<NotificationService>` to be registered on the application.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/accounts")
                    // Public routes
                    .route("/health", web::get().to(account_health))
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    // Protected routes; `/me` must be registered before `/{id}`
                    .service(
                        web::resource("/me")
                            .wrap(AuthMiddleware)
                            .route(web::get().to(me)),
                    )
                    .service(
                        web::resource("/{id}")
                            .wrap(AuthMiddleware)
                            .route(web::get().to(get_account)),
                    )
                    .service(
                        web::resource("/{id}/roles")
                            .wrap(AuthMiddleware)
                            .route(web::post().to(assign_role)),
                    ),
            )
            .service(
                web::scope("/notifications")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(list_notifications))
                    .route("", web::post().to(create_notification))
                    .route("/{id}", web::get().to(get_notification))
                    .route("/{id}", web::delete().to(delete_notification)),
            ),
    )
    .route(
        "/health",
        web::get().to(|| async { HttpResponse::Ok().body("OK") }),
    );
}
