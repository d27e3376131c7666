use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::collections::HashMap;

use crate::routes::MessageResponse;
use crate::state::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

impl ServiceStatus {
    fn ok(details: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            details: Some(details.into()),
        }
    }

    fn unconfigured(details: impl Into<String>) -> Self {
        Self {
            status: "unconfigured".to_string(),
            details: Some(details.into()),
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/health", web::get().to(health_check))
        .route("/favicon.ico", web::get().to(favicon));
}

pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(MessageResponse::new("TravelMate API is running!"))
}

pub async fn favicon() -> impl Responder {
    HttpResponse::NoContent().finish()
}

pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let store = match state.trips.ping().await {
        Ok(()) => ServiceStatus::ok("Document store reachable"),
        Err(e) => {
            log::error!("Store health check failed: {}", e);
            health.status = "degraded".to_string();
            ServiceStatus {
                status: "error".to_string(),
                details: Some("Document store unreachable".to_string()),
            }
        }
    };
    health.services.insert("database".to_string(), store);

    let settings = &state.settings;
    let optional = [
        ("google_oauth", settings.google.is_some(), "GOOGLE_CLIENT_ID"),
        ("apple_oauth", settings.apple.is_some(), "APPLE_CLIENT_ID"),
        ("email", settings.sendgrid_api_key.is_some(), "SENDGRID_API_KEY"),
        ("weather", settings.openweather_api_key.is_some(), "OPENWEATHER_API_KEY"),
    ];
    for (name, configured, variable) in optional {
        let status = if configured {
            ServiceStatus::ok("Configured")
        } else {
            ServiceStatus::unconfigured(format!("{} not set", variable))
        };
        health.services.insert(name.to_string(), status);
    }

    if health.status == "ok" {
        HttpResponse::Ok().json(health)
    } else {
        HttpResponse::ServiceUnavailable().json(health)
    }
}
