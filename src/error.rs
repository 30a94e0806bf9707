use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum TimeOffError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] SqlxError),

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl TimeOffError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        TimeOffError::InvalidInput(msg.into())
    }

    pub fn manager_not_found(id: i64) -> Self {
        TimeOffError::NotFound {
            resource: "manager",
            id,
        }
    }

    pub fn request_not_found(id: i64) -> Self {
        TimeOffError::NotFound {
            resource: "time-off request",
            id,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            TimeOffError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TimeOffError::NotFound { .. } => StatusCode::NOT_FOUND,
            TimeOffError::InvalidState(_) | TimeOffError::Conflict(_) => StatusCode::CONFLICT,
            TimeOffError::StoreUnavailable(_)
            | TimeOffError::Hashing(_)
            | TimeOffError::Join(_)
            | TimeOffError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TimeOffError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = match &self {
            TimeOffError::InvalidInput(msg) => ApiErrorBody::new("INVALID_INPUT", msg.clone()),
            TimeOffError::NotFound { .. } => ApiErrorBody::new("NOT_FOUND", self.to_string()),
            TimeOffError::InvalidState(msg) => ApiErrorBody::new("INVALID_STATE", msg.clone()),
            TimeOffError::Conflict(msg) => ApiErrorBody::new("CONFLICT", msg.clone()),
            TimeOffError::StoreUnavailable(_)
            | TimeOffError::Hashing(_)
            | TimeOffError::Join(_)
            | TimeOffError::Config(_) => {
                error!(error = %self, "request failed with internal error");
                ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred.")
            }
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiErrorBody {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: TimeOffError) -> (StatusCode, Value) {
        let resp = err.into_response();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn client_errors_carry_their_message() {
        let (status, body) = render(TimeOffError::invalid_input("end_date precedes start_date")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert_eq!(body["error"]["message"], "end_date precedes start_date");

        let (status, body) = render(TimeOffError::manager_not_found(999)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "manager 999 not found");

        let (status, body) = render(TimeOffError::InvalidState("already approved".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn store_errors_do_not_leak_detail() {
        let (status, body) = render(TimeOffError::StoreUnavailable(SqlxError::PoolClosed)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An internal server error occurred.");
    }
}
