//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/clock wiring behind the counter service
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: response bodies
//! - `errors.rs`: consistent error responses

use std::path::Path;
use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use crate::config::AppConfig;
use services::AppServices;

/// Build the full HTTP router from configuration (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(router(services, &config.static_dir))
}

/// Router over already wired services. Paths outside the API are served from
/// `static_dir`.
pub fn router(services: Arc<AppServices>, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .fallback_service(ServeDir::new(static_dir))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
