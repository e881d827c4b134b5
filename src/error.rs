use rocket::http::{ContentType, Status};
use rocket::response::Responder;
use std::io::Cursor;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    /// Storage failure. Safe to retry; surfaced as 503.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Expired: {0}")]
    Expired(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable kind string carried in the JSON error body.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "transient",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::Conflict(_) => "conflict",
            AppError::Expired(_) => "expired",
            AppError::ExternalService(_) => "external_service",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn log_and_record(&self, ctx: &str) {
        let message = self.to_string();
        match self {
            AppError::Database(err) => {
                error!(error = %message, context = %ctx, db_error = %err, "Database error")
            }
            AppError::Unauthorized(msg) => {
                warn!(message = %msg, context = %ctx, "Unauthorized")
            }
            AppError::NotFound(msg) => {
                warn!(message = %msg, context = %ctx, "Not found")
            }
            AppError::Validation(msg) => {
                warn!(message = %msg, context = %ctx, "Validation error")
            }
            AppError::Conflict(msg) => {
                warn!(message = %msg, context = %ctx, "Conflict")
            }
            AppError::Expired(msg) => {
                warn!(message = %msg, context = %ctx, "Expired")
            }
            AppError::ExternalService(msg) => {
                error!(message = %msg, context = %ctx, "External service error")
            }
            AppError::Internal(msg) => {
                error!(message = %msg, context = %ctx, "Internal server error")
            }
        }
    }

    pub fn status_code(&self) -> Status {
        match self {
            AppError::Database(_) => Status::ServiceUnavailable,
            AppError::Unauthorized(_) => Status::Unauthorized,
            AppError::NotFound(_) => Status::NotFound,
            // Expired keeps the original 400 wire status; the body kind
            // still distinguishes it.
            AppError::Validation(_) | AppError::Expired(_) => Status::BadRequest,
            AppError::Conflict(_) => Status::Conflict,
            AppError::ExternalService(_) => Status::ServiceUnavailable,
            AppError::Internal(_) => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        self.log_and_record(&format!("Request to {} {}", req.method(), req.uri()));

        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        })
        .to_string();

        rocket::Response::build()
            .status(self.status_code())
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Cryptography error: {}", error))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut parts: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .clone()
                            .unwrap_or_else(|| "invalid value".into())
                            .to_string()
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect();
        parts.sort();
        AppError::Validation(parts.join("; "))
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        err.log_and_record("Error conversion into Status");
        err.status_code()
    }
}
