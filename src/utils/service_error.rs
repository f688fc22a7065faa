// Service error type shared by every handler and service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::{StoreError, UniqueField};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    InternalError,
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_)
            | ServiceError::DatabaseError(_)
            | ServiceError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side failures are logged here, never echoed to the client
        let error_message = match self {
            ServiceError::ValidationError(msg) => {
                tracing::debug!("Validation failed: {}", msg);
                msg
            },
            ServiceError::AuthenticationRequired => "Authentication required.".to_string(),
            ServiceError::Forbidden => "Forbidden".to_string(),
            ServiceError::NotFound => "Resource not found".to_string(),
            ServiceError::Conflict(msg) => {
                tracing::error!("Conflict: {}", msg);
                "Internal server error".to_string()
            },
            ServiceError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "Internal server error".to_string()
            },
            ServiceError::InternalError => "Internal server error".to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation(UniqueField::UserEmail) => {
                ServiceError::ValidationError("identity already exists".to_string())
            },
            StoreError::UniqueViolation(field) => {
                ServiceError::DatabaseError(format!("unexpected unique violation on {:?}", field))
            },
            StoreError::Pool(msg) => ServiceError::DatabaseError(format!("pool: {}", msg)),
            StoreError::Database(msg) => ServiceError::DatabaseError(msg),
        }
    }
}

impl From<crate::utils::url_validator::UrlValidationError> for ServiceError {
    fn from(error: crate::utils::url_validator::UrlValidationError) -> Self {
        ServiceError::ValidationError(error.to_string())
    }
}
