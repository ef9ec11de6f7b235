//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use autstr_core::{
    Automaton, AutomaticPresentation, AutstrError, BigInt, ElementCodec, Enumeration, ErrorKind,
    Evaluation, RawCodec, checksum, min_element,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// RELATIONS RESPONSE
// =============================================================================

/// One stored relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationInfo {
    pub name: String,
    pub arity: usize,
    pub states: usize,
    pub checksum: u64,
}

/// Presentation overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationsResponse {
    pub success: bool,
    pub universe: String,
    pub version: u64,
    pub relations: Vec<RelationInfo>,
    pub error: Option<String>,
}

impl RelationsResponse {
    /// Describe every relation of a presentation, sorted by name.
    pub fn describe(presentation: &AutomaticPresentation) -> Result<Self, AutstrError> {
        let budget = presentation.limits().start();
        let relations = presentation
            .relations()
            .map(|(name, automaton)| {
                Ok(RelationInfo {
                    name: name.to_string(),
                    arity: automaton.arity(),
                    states: automaton.state_count(),
                    checksum: checksum(automaton, &budget)?,
                })
            })
            .collect::<Result<Vec<_>, AutstrError>>()?;
        Ok(Self {
            success: true,
            universe: presentation.universe_name().to_string(),
            version: presentation.version(),
            relations,
            error: None,
        })
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            universe: String::new(),
            version: 0,
            relations: vec![],
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// CHECK REQUEST/RESPONSE
// =============================================================================

/// Decide a closed formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub formula: String,
}

/// Truth value of a closed formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub success: bool,
    pub result: Option<bool>,
    pub error: Option<String>,
    pub kind: Option<ErrorKind>,
}

impl CheckResponse {
    pub fn success(result: bool) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            kind: None,
        }
    }

    pub fn error(e: &AutstrError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(e.to_string()),
            kind: Some(e.kind()),
        }
    }
}

// =============================================================================
// EVALUATE REQUEST/RESPONSE
// =============================================================================

/// Evaluate a formula and list its satisfying tuples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub formula: String,
    /// Maximum number of tuples; capped by the server.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// A decoded domain element: a number under a numeric encoding, else the
/// raw tape word. Numbers outside the 64-bit range travel as decimal
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Element {
    Integer(i64),
    Word(String),
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Word(w) => write!(f, "\"{}\"", w),
        }
    }
}

impl Element {
    /// A decoded number.
    pub fn integer(value: BigInt) -> Self {
        match i64::try_from(&value) {
            Ok(n) => Self::Integer(n),
            Err(_) => Self::Word(value.to_string()),
        }
    }

    /// Smallest element in the first variable of an evaluation.
    pub fn minimum(
        presentation: &AutomaticPresentation,
        evaluation: &Evaluation,
    ) -> Result<Option<Self>, AutstrError> {
        let budget = presentation.limits().start();
        let automaton = &evaluation.automaton;
        match presentation.encoding() {
            Some(encoding) => {
                Ok(min_element(automaton, encoding, &budget)?.map(Self::integer))
            }
            None => {
                let codec = RawCodec::new(automaton.alphabet().clone());
                Ok(min_element(automaton, codec, &budget)?.map(Self::Word))
            }
        }
    }
}

/// Satisfying tuples of a formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub success: bool,
    pub variables: Vec<String>,
    pub tuples: Vec<Vec<Element>>,
    /// Whether the relation has finitely many tuples.
    pub finite: Option<bool>,
    /// True when more tuples exist than were returned.
    pub truncated: bool,
    pub error: Option<String>,
    pub kind: Option<ErrorKind>,
}

impl EvaluateResponse {
    /// Enumerate up to `limit` tuples of an evaluation.
    pub fn from_evaluation(
        presentation: &AutomaticPresentation,
        evaluation: Evaluation,
        limit: usize,
    ) -> Result<Self, AutstrError> {
        let automaton = &evaluation.automaton;
        let (tuples, finite, truncated) = match presentation.encoding() {
            Some(encoding) => collect(automaton, encoding, limit, Element::integer)?,
            None => {
                let codec = RawCodec::new(automaton.alphabet().clone());
                collect(automaton, codec, limit, Element::Word)?
            }
        };
        Ok(Self {
            success: true,
            variables: evaluation.variables,
            tuples,
            finite: Some(finite),
            truncated,
            error: None,
            kind: None,
        })
    }

    pub fn error(e: &AutstrError) -> Self {
        Self {
            success: false,
            variables: vec![],
            tuples: vec![],
            finite: None,
            truncated: false,
            error: Some(e.to_string()),
            kind: Some(e.kind()),
        }
    }
}

/// At most `limit` tuples, plus finiteness and truncation flags.
fn collect<C: ElementCodec>(
    automaton: &Automaton,
    codec: C,
    limit: usize,
    wrap: impl Fn(C::Element) -> Element,
) -> Result<(Vec<Vec<Element>>, bool, bool), AutstrError> {
    let enumeration = Enumeration::new(automaton, codec)?;
    let mut tuples: Vec<Vec<Element>> = enumeration
        .iter()
        .take(limit.saturating_add(1))
        .map(|tuple| tuple.into_iter().map(&wrap).collect())
        .collect();
    let truncated = tuples.len() > limit;
    tuples.truncate(limit);
    Ok((tuples, enumeration.is_finite(), truncated))
}

// =============================================================================
// DEFINE REQUEST/RESPONSE
// =============================================================================

/// Bind a relation name to a formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefineRequest {
    pub name: String,
    pub formula: String,
    /// Explicit tape order; defaults to the sorted free variables.
    #[serde(default)]
    pub variables: Option<Vec<String>>,
}

/// Result of a definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefineResponse {
    pub success: bool,
    pub version: Option<u64>,
    pub error: Option<String>,
    pub kind: Option<ErrorKind>,
}

impl DefineResponse {
    pub fn success(version: u64) -> Self {
        Self {
            success: true,
            version: Some(version),
            error: None,
            kind: None,
        }
    }

    pub fn error(e: &AutstrError) -> Self {
        Self {
            success: false,
            version: None,
            error: Some(e.to_string()),
            kind: Some(e.kind()),
        }
    }
}
