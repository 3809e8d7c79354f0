use axum::http::{Method, StatusCode, Uri};

use crate::app::errors;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn unsupported_method(method: Method, uri: Uri) -> axum::response::Response {
    tracing::warn!(%method, %uri, "bad request: unsupported method");
    errors::json_error(StatusCode::BAD_REQUEST, "bad_request", "bad request")
}
