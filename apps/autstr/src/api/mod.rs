//! # autstr HTTP API Module
//!
//! This module implements the HTTP query API using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /relations` - Relation names, arities and checksums
//! - `POST /check` - Decide a closed formula
//! - `POST /evaluate` - Evaluate a formula and enumerate its tuples
//! - `POST /define` - Bind a relation name to a formula
//!
//! ## Configuration (Environment Variables)
//!
//! - `AUTSTR_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `autstr::api::*`)
pub use handlers::{
    check_handler, define_handler, evaluate_handler, health_handler, relations_handler,
};
pub use types::{
    CheckRequest, CheckResponse, DefineRequest, DefineResponse, Element, EvaluateRequest,
    EvaluateResponse, HealthResponse, RelationInfo, RelationsResponse,
};

use crate::config::DEFAULT_MAX_RESULTS;
use autstr_core::{AutomaticPresentation, AutstrError, Limits, RedbCatalog};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// The published presentation sits behind a lock only long enough to clone
/// its `Arc`; queries then run against that immutable version.
#[derive(Clone)]
pub struct AppState {
    /// The published presentation, with its stored limits.
    pub presentation: Arc<RwLock<Arc<AutomaticPresentation>>>,
    /// Limits for queries, overriding the stored ones.
    pub limits: Option<Limits>,
    /// Catalog that receives every definition, if any.
    pub catalog: Option<Arc<RedbCatalog>>,
    /// Upper bound on tuples per evaluation.
    pub max_results: usize,
}

impl AppState {
    /// Create new app state serving a presentation.
    #[must_use]
    pub fn new(presentation: AutomaticPresentation) -> Self {
        Self {
            presentation: Arc::new(RwLock::new(Arc::new(presentation))),
            limits: None,
            catalog: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Persist definitions to a catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: RedbCatalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    /// Run queries under these limits instead of the stored ones.
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Cap the number of tuples per evaluation.
    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// The published presentation as queries see it.
    pub async fn current(&self) -> Arc<AutomaticPresentation> {
        let published = Arc::clone(&*self.presentation.read().await);
        self.query_view(published)
    }

    /// Apply the query limits to a published presentation.
    fn query_view(&self, published: Arc<AutomaticPresentation>) -> Arc<AutomaticPresentation> {
        match self.limits {
            Some(limits) => Arc::new(published.with_limits(limits)),
            None => published,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `AUTSTR_CORS_ORIGINS`:
/// - If "*": allows all origins
/// - If not set: localhost only
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("AUTSTR_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (AUTSTR_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in AUTSTR_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => build_localhost_cors(),
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/relations", get(handlers::relations_handler))
        .route("/check", post(handlers::check_handler))
        .route("/evaluate", post(handlers::evaluate_handler))
        .route("/define", post(handlers::define_handler))
        .layer(axum::extract::DefaultBodyLimit::max(256 * 1024))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server; returns after Ctrl+C.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), AutstrError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AutstrError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("autstr HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Cannot listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
        .map_err(|e| AutstrError::IoError(format!("Server error: {}", e)))
}
