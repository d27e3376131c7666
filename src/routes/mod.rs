pub mod activities;
pub mod auth;
pub mod expenses;
pub mod health;
pub mod oauth;
pub mod packing;
pub mod trips;
pub mod weather;
pub mod ws;

use actix_web::web;
use serde::Serialize;

use crate::error::AppError;

/// `{"message": ...}` body used by endpoints with nothing else to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Registers every route plus extractor configs that report malformed
/// bodies, paths and query strings as `400 {"detail": ...}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into()),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into()),
    )
    .configure(health::config)
    .configure(oauth::config)
    .configure(auth::config)
    .configure(trips::config)
    .configure(activities::config)
    .configure(expenses::config)
    .configure(packing::config)
    .configure(weather::config)
    .configure(ws::config);
}
