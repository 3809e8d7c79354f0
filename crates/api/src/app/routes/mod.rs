use axum::{
    routing::{get, post},
    Router,
};

pub mod counter;
pub mod system;

/// Router for the counter API.
///
/// Any method other than the one a route serves is answered with 400. HEAD
/// has to be claimed explicitly, otherwise axum answers it with the GET
/// handler.
pub fn router() -> Router {
    Router::new()
        .route(
            "/api/users",
            get(counter::list_users)
                .head(system::unsupported_method)
                .fallback(system::unsupported_method),
        )
        .route(
            "/api/total",
            get(counter::totals)
                .head(system::unsupported_method)
                .fallback(system::unsupported_method),
        )
        .route(
            "/api/last",
            get(counter::last)
                .head(system::unsupported_method)
                .fallback(system::unsupported_method),
        )
        .route(
            "/api/increment",
            post(counter::increment).fallback(system::unsupported_method),
        )
}
