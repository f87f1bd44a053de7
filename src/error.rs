use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    /// Message is returned to the client verbatim.
    #[error("{0}")]
    NotFound(String),

    #[error("unsupported argument: {0}")]
    UnsupportedArgument(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(kind: impl std::fmt::Display, id: &str) -> Self {
        Error::NotFound(format!("No {} found for id: {}", kind, id))
    }

    fn error_type(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "InvalidRange",
            Error::NotFound(_) => "NotFound",
            Error::UnsupportedArgument(_) => "InvalidInput",
            Error::UnsupportedFormat(_) => "UnsupportedFormat",
            Error::Config(_) | Error::Catalog(_) | Error::Io(_) | Error::Internal(_) => {
                "InternalError"
            }
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::UnsupportedArgument(_) => StatusCode::BAD_REQUEST,
            Error::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            Error::Config(_) | Error::Catalog(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Problem body returned for rejected ranges.
#[derive(Debug, Serialize)]
pub struct ProblemDetail {
    pub detail: String,
    pub status: u16,
    pub title: &'static str,
    pub r#type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HtsgetError {
    pub htsget: HtsgetErrorBody,
}

#[derive(Debug, Serialize)]
pub struct HtsgetErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Error::BadRequest(detail) => {
                let body = ProblemDetail {
                    detail,
                    status: status.as_u16(),
                    title: "Bad Request",
                    r#type: "about:blank",
                };
                (status, axum::Json(body)).into_response()
            }
            Error::NotFound(message) => (status, message).into_response(),
            other => {
                if status.is_server_error() {
                    tracing::error!("request failed: {}", other);
                }
                let body = HtsgetError {
                    htsget: HtsgetErrorBody {
                        error: other.error_type(),
                        message: other.to_string(),
                    },
                };
                (status, axum::Json(body)).into_response()
            }
        }
    }
}
