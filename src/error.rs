use std::io;

use axum::{Json, http::StatusCode, response::IntoResponse};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not Found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Feed(#[from] atom_syndication::Error),

    #[error(transparent)]
    ApiError(#[from] ApiError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn not_found() -> Self {
        Error::ApiError(ApiError::NotFound)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ApiError(ApiError::NotFound))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            Error::ApiError(api_error) => match api_error {
                ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT FOUND".to_string()),
                ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
                ApiError::Conflict(s) => (StatusCode::CONFLICT, s),
                ApiError::Invalid(s) => (StatusCode::BAD_REQUEST, s),
            },
            Error::Sqlx(e) => {
                tracing::error!(%e, "sqlx error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            Error::Reqwest(_) => (StatusCode::BAD_GATEWAY, "Bad Gateway".to_string()),
            Error::Config(e) => (StatusCode::BAD_REQUEST, e.message().to_string()),
            Error::Feed(e) => {
                tracing::error!(%e, "feed error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            Error::Io(e) => {
                tracing::error!(%e, "file io error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
