use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Failure taxonomy for the message store and its handlers.
///
/// `NotFound` covers both genuinely absent entities and entities outside the
/// caller's workspace, so tenant boundaries never leak existence.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    /// Authenticated but not permitted: wrong workspace, wrong author.
    #[error("forbidden")]
    Forbidden,

    /// Structurally invalid relationship, e.g. a reply to a reply.
    #[error("bad request")]
    BadRequest,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub(crate) fn blocking_join(e: tokio::task::JoinError) -> Self {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("blocking task failed: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::BadRequest => (StatusCode::BAD_REQUEST, "bad request"),
            ApiError::Internal(e) => {
                error!("internal error: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
