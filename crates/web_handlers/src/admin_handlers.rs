use actix_web::{HttpResponse, Result};

/// Health check endpoint for the account service
pub async fn account_health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "service": "accounts",
        "status": "healthy",
        "timestamp": chrono::Utc::now()
    })))
}

