use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::analysis::AnalysisError;
use domain::core::ServiceError;
use domain::user::AuthError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    Unauthorized(String),
    Internal(String),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Service(e) => write!(f, "{e}"),
            ApiError::Unauthorized(msg) | ApiError::Internal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        ApiError::Service(error)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Service(e) => match e {
                ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                ServiceError::Analysis(AnalysisError::InvalidInput(_)) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
                }
                ServiceError::Auth(AuthError::UserNotFound | AuthError::InvalidPassword) => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid email or password".to_string(),
                ),
                ServiceError::Auth(AuthError::UserAlreadyExists) => {
                    (StatusCode::CONFLICT, e.to_string())
                }
                ServiceError::Auth(AuthError::WeakPassword | AuthError::InvalidEmail) => {
                    (StatusCode::BAD_REQUEST, e.to_string())
                }
                ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                ServiceError::Forbidden => (StatusCode::FORBIDDEN, e.to_string()),
                ServiceError::Auth(AuthError::Hashing(_) | AuthError::Storage(_))
                | ServiceError::Db(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            },
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!(%status, "Request rejected: {error}");
        }
        (status, Json(ErrorBody { error })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
