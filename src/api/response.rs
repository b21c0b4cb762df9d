//! Response envelopes and error mapping
//!
//! Success: `{ "message": ..., "data": ... }`
//! Error:   `{ "message": ..., "details": ... }`

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::database::StoreError;
use crate::reputation::RatingError;
use crate::verification::VerificationError;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// `(status, envelope)` pair for handlers
pub fn respond<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
) -> (StatusCode, Json<Envelope<T>>) {
    (
        status,
        Json(Envelope {
            message: message.into(),
            data: Some(data),
        }),
    )
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").with_details(details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("Invalid request body").with_details(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => ApiError::not_found(e.to_string()),
            StoreError::Duplicate { .. } | StoreError::Conflict { .. } => {
                ApiError::new(StatusCode::CONFLICT, e.to_string())
            }
            StoreError::Database(ref inner) => {
                error!(error = %inner, "Store operation failed");
                ApiError::internal(e.to_string())
            }
            StoreError::OutOfRange { .. } => {
                error!(error = %e, "Store value out of range");
                ApiError::internal(e.to_string())
            }
        }
    }
}

impl From<RatingError> for ApiError {
    fn from(e: RatingError) -> Self {
        match e {
            RatingError::InvalidScore { .. } | RatingError::MissingField { .. } => {
                ApiError::bad_request("Validation failed").with_details(e.to_string())
            }
            RatingError::SelfRating => ApiError::bad_request(e.to_string()),
            RatingError::TargetNotFound { .. } => ApiError::not_found(e.to_string()),
            RatingError::Conflict { .. } => ApiError::new(StatusCode::CONFLICT, e.to_string()),
            RatingError::VoteCountOverflow { .. } => {
                error!(error = %e, "Rating counter exhausted");
                ApiError::internal(e.to_string())
            }
            RatingError::Store(inner) => inner.into(),
        }
    }
}

impl From<VerificationError> for ApiError {
    fn from(e: VerificationError) -> Self {
        ApiError::bad_request("Verification failed").with_details(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_error_statuses() {
        let cases = [
            (RatingError::InvalidScore { score: 9.0 }, StatusCode::BAD_REQUEST),
            (RatingError::SelfRating, StatusCode::BAD_REQUEST),
            (
                RatingError::TargetNotFound {
                    identity: "x".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                RatingError::Conflict {
                    identity: "x".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                RatingError::VoteCountOverflow {
                    identity: "x".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RatingError::Store(StoreError::OutOfRange {
                    field: "points",
                    value: u32::MAX,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RatingError::Store(StoreError::Database(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_validation_errors_carry_details() {
        let err = ApiError::from(RatingError::InvalidScore { score: 7.0 });
        assert_eq!(err.message, "Validation failed");
        assert!(err.details.unwrap().contains("between 0 and 5"));
    }
}
