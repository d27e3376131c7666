pub mod activity;
pub mod expense;
pub mod oauth;
pub mod packing;
pub mod trip;
pub mod user;
pub mod weather;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::error::{AppError, AppResult};

/// Fresh 24-hex-character identifier for any stored record.
pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

/// Validates a path identifier and returns it in canonical (lowercase) form.
pub fn parse_id(raw: &str, what: &str) -> AppResult<String> {
    ObjectId::parse_str(raw)
        .map(|oid| oid.to_hex())
        .map_err(|_| AppError::invalid_id(what))
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}
