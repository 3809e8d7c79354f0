use std::sync::Arc;

use axum::{
    extract::{Extension, Form, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use tally_infra::IncrementOutcome;

use crate::app::dto::{LastResponse, TotalsResponse, UserResponse};
use crate::app::errors;
use crate::app::services::AppServices;

/// Name of the form field carrying the user id.
const USER_FIELD: &str = "user";

type FormPairs = Vec<(String, String)>;

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    info!("request for user list");

    match services.counter().user_summary().await {
        Ok(users) => {
            let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::counter_error_to_response("list_users", e),
    }
}

pub async fn totals(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    info!("request for total counters");

    match services.counter().totals().await {
        Ok(totals) => (StatusCode::OK, Json(TotalsResponse::from(totals))).into_response(),
        Err(e) => errors::counter_error_to_response("totals", e),
    }
}

pub async fn last(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    info!("request for last increment");

    match services.counter().elapsed_minutes().await {
        Ok(elapsed) => (StatusCode::OK, Json(LastResponse { elapsed })).into_response(),
        Err(e) => errors::counter_error_to_response("last", e),
    }
}

/// `user` is collected from the urlencoded body and the query string
/// together; the web page sends it in the query string. A body that is not
/// urlencoded is ignored rather than rejected.
pub async fn increment(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<FormPairs>,
    body: Option<Form<FormPairs>>,
) -> axum::response::Response {
    let body = body.map(|Form(pairs)| pairs).unwrap_or_default();
    let user_values: Vec<String> = body
        .into_iter()
        .chain(query)
        .filter(|(key, _)| key == USER_FIELD)
        .map(|(_, value)| value)
        .collect();

    match services.counter().increment(&user_values).await {
        Ok(IncrementOutcome::Accepted(_)) => StatusCode::NO_CONTENT.into_response(),
        Ok(IncrementOutcome::RateLimited { .. }) => errors::rate_limited(),
        Ok(IncrementOutcome::Rejected(reason)) => errors::rejected_to_response(reason),
        Err(e) => errors::counter_error_to_response("increment", e),
    }
}
