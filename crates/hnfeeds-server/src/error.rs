use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hnfeeds_core::error::AppError;

/// Wrapper so we can implement `IntoResponse` for `AppError`.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            // No feed: empty 404, whatever the reason.
            AppError::FeedParseError(_)
            | AppError::FetchTimeout(_)
            | AppError::FetchHttpError(_)
            | AppError::FetchNetworkError(_) => StatusCode::NOT_FOUND.into_response(),
            e => {
                tracing::error!(error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}
