use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use serde::Serialize;

use crate::db::StoreError;

/// Errors surfaced to API callers. Each variant maps to one status code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    AccessDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl AppError {
    pub fn invalid_id(what: &str) -> Self {
        AppError::InvalidInput(format!("Invalid {} ID", what))
    }

    pub fn access_denied() -> Self {
        AppError::AccessDenied("Access denied".to_string())
    }

    pub fn trip_not_found() -> Self {
        AppError::NotFound("Trip not found".to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Upstream(msg) => {
                log::warn!("Upstream failure: {}", msg);
                msg.clone()
            }
            other => other.to_string(),
        };

        let mut builder = HttpResponse::build(self.status_code());
        if matches!(self, AppError::Unauthenticated(_)) {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(ErrorBody { detail })
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => AppError::Conflict(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}
