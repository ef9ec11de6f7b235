//! Integration tests for the autstr HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use autstr::api::{
    AppState, CheckRequest, CheckResponse, DefineRequest, DefineResponse, Element,
    EvaluateRequest, EvaluateResponse, HealthResponse, RelationsResponse, create_router,
};
use autstr_core::{AutomaticPresentation, ErrorKind, Limits, RedbCatalog, integer_arithmetic};
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use std::sync::OnceLock;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Integer arithmetic, built once for the whole test binary.
fn integers() -> AutomaticPresentation {
    static PRESENTATION: OnceLock<AutomaticPresentation> = OnceLock::new();
    PRESENTATION
        .get_or_init(|| integer_arithmetic(Limits::default()).unwrap())
        .clone()
}

fn create_test_server() -> TestServer {
    server_with(AppState::new(integers()))
}

fn server_with(state: AppState) -> TestServer {
    TestServer::new(create_router(state)).unwrap()
}

fn ints(values: &[i64]) -> Vec<Vec<Element>> {
    values.iter().map(|&v| vec![Element::Integer(v)]).collect()
}

async fn check(server: &TestServer, formula: &str) -> CheckResponse {
    let request = CheckRequest {
        formula: formula.to_string(),
    };
    let response = server.post("/check").json(&request).await;
    response.json()
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// RELATIONS ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_relations_lists_integer_arithmetic() {
    let server = create_test_server();

    let response = server.get("/relations").await;

    response.assert_status_ok();
    let relations: RelationsResponse = response.json();
    assert!(relations.success);
    assert_eq!(relations.universe, "U");
    let names: Vec<&str> = relations.relations.iter().map(|r| r.name.as_str()).collect();
    for expected in ["A", "B", "Eq", "Lt", "N0", "Neg", "Pt", "U", "Z"] {
        assert!(names.contains(&expected), "missing relation {}", expected);
    }
    assert!(!names.contains(&"A0"));
    let lt = relations.relations.iter().find(|r| r.name == "Lt").unwrap();
    assert_eq!(lt.arity, 2);
}

// =============================================================================
// CHECK ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_check_closed_formulas() {
    let server = create_test_server();

    let unbounded = check(&server, "forall x. exists y. Lt(x, y)").await;
    assert!(unbounded.success);
    assert_eq!(unbounded.result, Some(true));

    let reflexive = check(&server, "exists x. Lt(x, x)").await;
    assert_eq!(reflexive.result, Some(false));

    let negation = check(&server, "Neg(3, -3) and A(-5, 2, -3)").await;
    assert_eq!(negation.result, Some(true));
}

#[tokio::test]
async fn test_check_free_variable_rejected() {
    let server = create_test_server();

    let response = server
        .post("/check")
        .json(&json!({ "formula": "Lt(x, 3)" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let result: CheckResponse = response.json();
    assert!(!result.success);
    assert_eq!(result.kind, Some(ErrorKind::FormulaSyntax));
}

#[tokio::test]
async fn test_check_syntax_error() {
    let server = create_test_server();

    let response = server
        .post("/check")
        .json(&json!({ "formula": "exists x. (Lt(x, 3)" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let result: CheckResponse = response.json();
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_check_unknown_relation() {
    let server = create_test_server();

    let response = server
        .post("/check")
        .json(&json!({ "formula": "exists x. Prime(x)" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// EVALUATE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_evaluate_finite_relation() {
    let server = create_test_server();

    let request = EvaluateRequest {
        formula: "Lt(0, x) and Lt(x, 4)".to_string(),
        limit: None,
    };
    let response = server.post("/evaluate").json(&request).await;

    response.assert_status_ok();
    let result: EvaluateResponse = response.json();
    assert!(result.success);
    assert_eq!(result.variables, vec!["x".to_string()]);
    assert_eq!(result.tuples, ints(&[1, 2, 3]));
    assert_eq!(result.finite, Some(true));
    assert!(!result.truncated);
}

#[tokio::test]
async fn test_evaluate_infinite_relation_is_truncated() {
    let server = create_test_server();

    let response = server
        .post("/evaluate")
        .json(&json!({ "formula": "Lt(0, x)", "limit": 5 }))
        .await;

    response.assert_status_ok();
    let result: EvaluateResponse = response.json();
    assert_eq!(result.tuples, ints(&[1, 2, 3, 4, 5]));
    assert_eq!(result.finite, Some(false));
    assert!(result.truncated);
}

#[tokio::test]
async fn test_evaluate_limit_capped_by_server() {
    let server = server_with(AppState::new(integers()).with_max_results(3));

    let response = server
        .post("/evaluate")
        .json(&json!({ "formula": "Lt(0, x)", "limit": 100 }))
        .await;

    let result: EvaluateResponse = response.json();
    assert_eq!(result.tuples.len(), 3);
    assert!(result.truncated);
}

#[tokio::test]
async fn test_evaluate_pairs_in_variable_order() {
    let server = create_test_server();

    let response = server
        .post("/evaluate")
        .json(&json!({ "formula": "A(x, y, 2) and Lt(0, x) and Lt(0, y)" }))
        .await;

    let result: EvaluateResponse = response.json();
    assert_eq!(result.variables, vec!["x".to_string(), "y".to_string()]);
    assert_eq!(
        result.tuples,
        vec![vec![Element::Integer(1), Element::Integer(1)]]
    );
}

#[tokio::test]
async fn test_evaluate_resource_exceeded() {
    let limits = Limits::default().with_max_states(2);
    let server = server_with(AppState::new(integers()).with_limits(limits));

    let response = server
        .post("/evaluate")
        .json(&json!({ "formula": "exists y. A(x, y, y)" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let result: EvaluateResponse = response.json();
    assert_eq!(result.kind, Some(ErrorKind::ResourceExceeded));
}

// =============================================================================
// DEFINE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_define_then_query() {
    let server = create_test_server();
    let before: RelationsResponse = server.get("/relations").await.json();

    let request = DefineRequest {
        name: "Even".to_string(),
        formula: "exists y. A(y, y, x)".to_string(),
        variables: None,
    };
    let response = server.post("/define").json(&request).await;

    response.assert_status_ok();
    let defined: DefineResponse = response.json();
    assert!(defined.success);
    assert_eq!(defined.version, Some(before.version + 1));

    let even = check(&server, "Even(-4) and not Even(7)").await;
    assert_eq!(even.result, Some(true));
}

#[tokio::test]
async fn test_define_with_variable_order() {
    let server = create_test_server();

    let response = server
        .post("/define")
        .json(&json!({
            "name": "Gt",
            "formula": "Lt(b, a)",
            "variables": ["a", "b"]
        }))
        .await;
    response.assert_status_ok();

    // Tape 0 holds a, so Gt(a, b) holds when b < a.
    let gt = check(&server, "Gt(5, 2) and not Gt(2, 5)").await;
    assert_eq!(gt.result, Some(true));
}

#[tokio::test]
async fn test_define_universe_rejected() {
    let server = create_test_server();

    let response = server
        .post("/define")
        .json(&json!({ "name": "U", "formula": "Lt(0, x)" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let result: DefineResponse = response.json();
    assert_eq!(result.kind, Some(ErrorKind::Construction));
}

#[tokio::test]
async fn test_define_invalid_name_rejected() {
    let server = create_test_server();

    let response = server
        .post("/define")
        .json(&json!({ "name": "2x", "formula": "Lt(0, x)" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_define_persists_to_catalog() {
    let dir = TempDir::new().unwrap();
    let presentation = integers();
    let catalog = RedbCatalog::open(dir.path().join("catalog.redb")).unwrap();
    catalog.save(&presentation).unwrap();
    let state = AppState::new(presentation.clone()).with_catalog(catalog);
    let server = server_with(state.clone());

    server
        .post("/define")
        .json(&json!({ "name": "Odd", "formula": "exists y. A(y, y, x - 1)" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/define")
        .json(&json!({ "name": "Odd", "formula": "exists y z. A(y, y, z) and A(z, 1, x)" }))
        .await
        .assert_status_ok();

    let catalog = state.catalog.as_ref().unwrap();
    let stored = catalog.load().unwrap().unwrap();
    assert_eq!(stored.version(), presentation.version() + 1);
    assert!(stored.check("Odd(3) and not Odd(4)").unwrap());
}

#[tokio::test]
async fn test_query_limits_not_persisted() {
    let dir = TempDir::new().unwrap();
    let presentation = integers();
    let catalog = RedbCatalog::open(dir.path().join("catalog.redb")).unwrap();
    catalog.save(&presentation).unwrap();
    let state = AppState::new(presentation.clone())
        .with_catalog(catalog)
        .with_limits(Limits::unlimited().with_timeout_ms(60_000));

    server_with(state.clone())
        .post("/define")
        .json(&json!({ "name": "Pos", "formula": "Lt(0, x)" }))
        .await
        .assert_status_ok();

    let stored = state.catalog.as_ref().unwrap().load().unwrap().unwrap();
    assert_eq!(stored.limits(), presentation.limits());
    assert_eq!(state.current().await.limits().timeout_ms, Some(60_000));
}
