use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::store::StoreError;

/// A signal source could not produce its value. Only the fields it feeds degrade.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("probe timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("malformed source data: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("mail transport failed: {0}")]
    Transport(String),

    #[error("mail relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("outbox write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error("Invalid email address: {0}")]
    InvalidRecipient(String),

    #[error("Email address already exists: {0}")]
    DuplicateRecipient(String),

    #[error("Email address not found: {0}")]
    RecipientNotFound(String),

    #[error("Failed to send email: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<JsonRejection> for MonitorError {
    fn from(rejection: JsonRejection) -> Self {
        MonitorError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = match &self {
            MonitorError::BadRequest(_) => StatusCode::BAD_REQUEST,
            MonitorError::InvalidRecipient(_) => StatusCode::BAD_REQUEST,
            MonitorError::DuplicateRecipient(_) => StatusCode::CONFLICT,
            MonitorError::RecipientNotFound(_) => StatusCode::NOT_FOUND,
            MonitorError::Delivery(_) => StatusCode::BAD_GATEWAY,
            MonitorError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MonitorError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MonitorError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "success": false,
            "data": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (MonitorError::BadRequest("missing field".into()), StatusCode::BAD_REQUEST),
            (MonitorError::InvalidRecipient("x".into()), StatusCode::BAD_REQUEST),
            (MonitorError::DuplicateRecipient("a@b.co".into()), StatusCode::CONFLICT),
            (MonitorError::RecipientNotFound("a@b.co".into()), StatusCode::NOT_FOUND),
            (
                MonitorError::Delivery(DeliveryError::Transport("down".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (MonitorError::Other("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_messages_are_human_readable() {
        let err = MonitorError::DuplicateRecipient("ops@example.com".into());
        assert_eq!(err.to_string(), "Email address already exists: ops@example.com");
        let err = MonitorError::Delivery(DeliveryError::Rejected {
            status: 503,
            body: "busy".into(),
        });
        assert!(err.to_string().contains("503"));
    }
}
