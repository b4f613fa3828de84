use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("User with username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    Inactive,

    #[error("Unknown role: {0}")]
    InvalidRole(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Admin role required")]
    AdminOnly { role: String },

    #[error("You cannot change your own role")]
    CannotChangeOwnRole,

    #[error("{0}")]
    CannotTargetSelf(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

/// Convert UserError to AppError for standardized error responses
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => AppError::NotFound(format!("User {} not found", id)),
            UserError::DuplicateEmail(email) => {
                AppError::Conflict(format!("User with email '{}' already exists", email))
            }
            UserError::DuplicateUsername(username) => {
                AppError::Conflict(format!("User with username '{}' already exists", username))
            }
            // Unknown email and wrong password produce this same response
            UserError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".to_string())
            }
            UserError::Inactive => AppError::Unauthorized("Account is inactive".to_string()),
            UserError::InvalidRole(role) => AppError::BadRequest(format!("Unknown role: {}", role)),
            UserError::Validation(msg) => AppError::BadRequest(msg),
            UserError::AdminOnly { role } => AppError::ForbiddenWithDetails(
                "Access denied. Required role: admin".to_string(),
                json!({ "yourRole": role }),
            ),
            UserError::CannotChangeOwnRole => {
                AppError::Forbidden("You cannot change your own role".to_string())
            }
            UserError::CannotTargetSelf(msg) => AppError::BadRequest(msg),
            UserError::PasswordHash(msg) => {
                tracing::error!("Password hash error: {}", msg);
                AppError::InternalServerError("An internal error occurred".to_string())
            }
            UserError::Database(e) => AppError::Database(e),
            UserError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
