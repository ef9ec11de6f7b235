//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Every query runs on a blocking worker: compiling a formula can take as
//! long as the configured limits allow, and must not stall the runtime.

use super::{
    AppState,
    types::{
        CheckRequest, CheckResponse, DefineRequest, DefineResponse, EvaluateRequest,
        EvaluateResponse, HealthResponse, RelationsResponse,
    },
};
use autstr_core::{AutstrError, Binding, ErrorKind};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// HTTP status for an engine error.
fn status_of(e: &AutstrError) -> StatusCode {
    match e.kind() {
        ErrorKind::Construction
        | ErrorKind::PresentationConsistency
        | ErrorKind::FormulaSyntax
        | ErrorKind::UndecidableQuery => StatusCode::BAD_REQUEST,
        ErrorKind::ResourceExceeded => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run engine work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, AutstrError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AutstrError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AutstrError::IoError(format!("Worker failed: {}", e)))?
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// RELATIONS HANDLER
// =============================================================================

/// List the relations of the current presentation.
pub async fn relations_handler(State(state): State<AppState>) -> impl IntoResponse {
    let presentation = state.current().await;
    match blocking(move || RelationsResponse::describe(&presentation)).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => (status_of(&e), Json(RelationsResponse::error(e.to_string()))),
    }
}

// =============================================================================
// CHECK HANDLER
// =============================================================================

/// Decide a closed formula.
pub async fn check_handler(
    State(state): State<AppState>,
    Json(request): Json<CheckRequest>,
) -> impl IntoResponse {
    let presentation = state.current().await;
    match blocking(move || presentation.check(&request.formula)).await {
        Ok(result) => (StatusCode::OK, Json(CheckResponse::success(result))),
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), "check failed: {}", e);
            (status_of(&e), Json(CheckResponse::error(&e)))
        }
    }
}

// =============================================================================
// EVALUATE HANDLER
// =============================================================================

/// Evaluate a formula and enumerate its tuples.
pub async fn evaluate_handler(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> impl IntoResponse {
    let presentation = state.current().await;
    let limit = request
        .limit
        .unwrap_or(state.max_results)
        .min(state.max_results);
    let work = move || {
        let evaluation = presentation.evaluate(&request.formula, None)?;
        EvaluateResponse::from_evaluation(&presentation, evaluation, limit)
    };
    match blocking(work).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), "evaluate failed: {}", e);
            (status_of(&e), Json(EvaluateResponse::error(&e)))
        }
    }
}

// =============================================================================
// DEFINE HANDLER
// =============================================================================

/// Bind a relation name and publish the new presentation.
///
/// The write lock is held for the whole update so concurrent definitions
/// apply one after the other. Readers keep using the previous version.
/// The stored limits survive the update; query limits are not persisted.
pub async fn define_handler(
    State(state): State<AppState>,
    Json(request): Json<DefineRequest>,
) -> impl IntoResponse {
    let mut published = state.presentation.write().await;
    let stored_limits = published.limits();
    let base = state.query_view(Arc::clone(&published));
    let catalog = state.catalog.clone();
    let binding = match request.variables {
        Some(variables) => Binding::FormulaWithVariables {
            variables,
            formula: request.formula,
        },
        None => Binding::Formula(request.formula),
    };
    let name = request.name;
    let work = move || {
        let next = base.update([(name, binding)])?.with_limits(stored_limits);
        if let Some(catalog) = catalog {
            catalog.save(&next)?;
        }
        Ok(next)
    };
    match blocking(work).await {
        Ok(next) => {
            let version = next.version();
            *published = Arc::new(next);
            tracing::info!(version, "presentation updated");
            (StatusCode::OK, Json(DefineResponse::success(version)))
        }
        Err(e) => (status_of(&e), Json(DefineResponse::error(&e))),
    }
}
