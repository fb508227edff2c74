use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid rate limit config: {0}")]
    InvalidConfig(String),

    #[error("Invalid permission slug: {0}")]
    InvalidSlug(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Missing permission: {0}")]
    Forbidden(String),

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidConfig(_) | AppError::InvalidSlug(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Directory(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("{self}");
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (AppError::InvalidConfig("x".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidSlug("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("user.create".into()), StatusCode::FORBIDDEN),
            (
                AppError::RateLimited { retry_after_secs: 3 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                AppError::Directory("down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
