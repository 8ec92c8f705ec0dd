use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dailink_assistant::AssistantError;
use dailink_auth::AuthError;
use dailink_database::{DatabaseError, HscRunError};
use dailink_unipile::UnipileError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        if let AuthError::Store(inner) = error {
            return inner.into();
        }
        error!(error = ?error, "auth error");
        let status = match error {
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
            AuthError::UserExists => StatusCode::CONFLICT,
            AuthError::RegistrationDisabled => StatusCode::FORBIDDEN,
            AuthError::InvalidEmail | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
            AuthError::Database(_) | AuthError::PasswordHash(_) | AuthError::Store(_) => {
                return Self::internal_server_error("authentication backend failed");
            }
        };
        Self::new(status, error.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(error: DatabaseError) -> Self {
        error!(error = ?error, "database error");
        match error {
            DatabaseError::NotFound(_) => Self::not_found(error.to_string()),
            DatabaseError::Duplicate(_) => Self::conflict(error.to_string()),
            DatabaseError::Validation(message) => Self::bad_request(message),
            DatabaseError::Corrupt(_) | DatabaseError::Query(_) | DatabaseError::Migration(_) => {
                Self::internal_server_error("database operation failed")
            }
        }
    }
}

impl From<HscRunError> for ApiError {
    fn from(error: HscRunError) -> Self {
        match error {
            HscRunError::Database(inner) => inner.into(),
            other => {
                error!(error = ?other, "hsc run error");
                Self::conflict(other.to_string())
            }
        }
    }
}

impl From<UnipileError> for ApiError {
    fn from(error: UnipileError) -> Self {
        error!(error = ?error, "unipile error");
        match error {
            UnipileError::MissingApiKey => {
                Self::service_unavailable("LinkedIn integration is not configured")
            }
            UnipileError::InvalidRequest(message) => Self::bad_request(message),
            other => Self::new(StatusCode::BAD_GATEWAY, other.to_string()),
        }
    }
}

impl From<AssistantError> for ApiError {
    fn from(error: AssistantError) -> Self {
        error!(error = ?error, "assistant error");
        match error {
            AssistantError::InvalidRequest(message) => Self::bad_request(message),
            other => Self::new(StatusCode::BAD_GATEWAY, other.to_string()),
        }
    }
}
