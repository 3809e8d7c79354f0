use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tally_infra::{CounterError, RejectReason};

/// Storage failures become a 500; the server keeps serving.
pub fn counter_error_to_response(operation: &'static str, err: CounterError) -> axum::response::Response {
    tracing::error!(operation, error = %err, "counter operation failed");
    match err {
        CounterError::Storage(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            "storage failure",
        ),
    }
}

pub fn rejected_to_response(reason: RejectReason) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "bad_request", reason.to_string())
}

pub fn rate_limited() -> axum::response::Response {
    json_error(
        StatusCode::TOO_MANY_REQUESTS,
        "too_many_requests",
        "too many requests",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
