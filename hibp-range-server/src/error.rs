use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::http::PREFIX_ERROR;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] hibp_rangedb::Error),

    #[error("Failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Request-scoped failures of the range API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{}", PREFIX_ERROR)]
    BadRequest,

    #[error("lookup failed: {0}")]
    Lookup(#[from] hibp_rangedb::Error),

    #[error("lookup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest => (StatusCode::BAD_REQUEST, PREFIX_ERROR).into_response(),
            e => {
                error!("{e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
