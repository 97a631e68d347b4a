use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ballot_core::{BallotError, ErrorCode};
use serde_json::json;
use thiserror::Error;

/// Failures surfaced to HTTP clients as `{"error": <text>}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unsupported Media Type: Expected JSON")]
    UnsupportedMediaType,

    #[error("Image ID is required")]
    MissingItemId,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Ballot(#[from] BallotError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::MissingItemId | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Ballot(err) => match err.code() {
                ErrorCode::UnknownItem | ErrorCode::MalformedRequest => StatusCode::BAD_REQUEST,
                ErrorCode::EmptyCatalog => StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::StorageUnavailable | ErrorCode::SchemaTooNew => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `error` field.
    fn public_message(&self) -> String {
        match self {
            Self::Ballot(BallotError::UnknownItem(_)) => ErrorCode::UnknownItem.message().to_string(),
            Self::Ballot(BallotError::MalformedRequest(reason)) => reason.clone(),
            Self::Ballot(err) => err.code().message().to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use ballot_core::{BallotError, ItemId};

    #[test]
    fn contract_status_codes() {
        let cases = [
            (ApiError::UnsupportedMediaType, StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (ApiError::MissingItemId, StatusCode::BAD_REQUEST),
            (
                ApiError::Ballot(BallotError::UnknownItem(ItemId::new(3))),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Ballot(BallotError::malformed("nope")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Ballot(BallotError::EmptyCatalog),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Ballot(BallotError::StorageUnavailable(
                    rusqlite::Error::QueryReturnedNoRows,
                )),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Ballot(BallotError::SchemaTooNew {
                    found: 9,
                    supported: 2,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Internal("worker panicked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }

    #[test]
    fn unknown_item_uses_the_public_message() {
        let err = ApiError::Ballot(BallotError::UnknownItem(ItemId::new(9)));
        assert_eq!(err.public_message(), "Invalid image ID");
    }

    #[test]
    fn server_side_details_are_not_exposed() {
        let err = ApiError::Ballot(BallotError::SchemaTooNew {
            found: 9,
            supported: 2,
        });
        assert_eq!(
            err.public_message(),
            "Database schema is newer than this binary"
        );
    }
}
