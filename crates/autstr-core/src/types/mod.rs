//! # Core Type Definitions
//!
//! This module contains the small shared types of the engine:
//! - Automaton identifiers (`StateId`, `Symbol`, `Letter`)
//! - Error types (`AutstrError`, `ErrorKind`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types:
//! - Use integer representations only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// AUTOMATON IDENTIFIERS
// =============================================================================

/// Opaque identifier of an automaton state.
///
/// States are numbered densely from zero; canonical (minimized) automata
/// number them in breadth-first order from the initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateId(pub u32);

impl StateId {
    /// Index of the state in dense per-state tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A packed product symbol: one letter per tape.
///
/// For `k` tapes over letters `0..w` the symbol `(l_0, ..., l_{k-1})` is
/// packed as `l_0 + l_1 * w + ... + l_{k-1} * w^(k-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub u32);

impl Symbol {
    /// Index of the symbol in dense per-symbol tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single-tape letter. The padding letter is always the last one.
pub type Letter = u8;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Coarse error categories.
///
/// Callers branch on the category: construction and syntax errors are
/// programming mistakes, `ResourceExceeded` is recoverable by retrying with a
/// larger budget, and none of them may be read as an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed terms, automata, encodings or arities.
    Construction,
    /// A relation does not fit the declared universe.
    PresentationConsistency,
    /// Unparseable formula, unknown relation, unbound variable.
    FormulaSyntax,
    /// A state-count or wall-clock budget ran out.
    ResourceExceeded,
    /// An internal invariant of the automatic fragment was violated.
    UndecidableQuery,
    /// Serialization or storage failure.
    Storage,
}

/// Errors that can occur in the autstr engine.
///
/// - No silent failures
/// - Use `Result<T, AutstrError>` for fallible operations
/// - The engine never panics; all errors are reported at the boundary call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutstrError {
    /// A term multiplied two non-constant sub-terms.
    #[error("non-linear expression: {0}")]
    NonLinear(String),

    /// A relation was applied to the wrong number of arguments.
    #[error("arity mismatch for {relation}: expected {expected}, found {found}")]
    ArityMismatch {
        relation: String,
        expected: usize,
        found: usize,
    },

    /// A word is not a valid encoding of a domain element.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    /// Two automata over different tape alphabets or tape counts were combined.
    #[error("alphabet mismatch: {0}")]
    AlphabetMismatch(String),

    /// The transition table or state sets of an automaton are inconsistent.
    #[error("invalid automaton: {0}")]
    InvalidAutomaton(String),

    /// A variable or relation name is not a valid identifier.
    #[error("invalid identifier: {0:?}")]
    InvalidVariable(String),

    /// The universe relation cannot be replaced by an update.
    #[error("the universe relation {0:?} cannot be rebound")]
    UniverseRebind(String),

    /// The presentation has no universe automaton.
    #[error("missing universe relation {0:?}")]
    MissingUniverse(String),

    /// A relation accepts tuples outside the universe.
    #[error("relation {relation} is inconsistent with the universe: {detail}")]
    Inconsistent { relation: String, detail: String },

    /// The formula text could not be parsed.
    #[error("syntax error at {line}:{col}: {message}")]
    Syntax {
        message: String,
        line: usize,
        col: usize,
    },

    /// A formula refers to a relation that is not defined.
    #[error("unknown relation: {0}")]
    UnknownRelation(String),

    /// A closed formula was required but a variable is free.
    #[error("unbound variable: {0}")]
    UnboundVariable(String),

    /// A budget ran out before the operation finished.
    #[error("resource exceeded during {operation}: {limit}")]
    ResourceExceeded {
        operation: &'static str,
        limit: String,
    },

    /// An operation left the automatic fragment.
    #[error("undecidable query: {0}")]
    Undecidable(String),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl AutstrError {
    /// The taxonomy category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NonLinear(_)
            | Self::ArityMismatch { .. }
            | Self::MalformedEncoding(_)
            | Self::AlphabetMismatch(_)
            | Self::InvalidAutomaton(_)
            | Self::InvalidVariable(_)
            | Self::UniverseRebind(_) => ErrorKind::Construction,
            Self::MissingUniverse(_) | Self::Inconsistent { .. } => {
                ErrorKind::PresentationConsistency
            }
            Self::Syntax { .. } | Self::UnknownRelation(_) | Self::UnboundVariable(_) => {
                ErrorKind::FormulaSyntax
            }
            Self::ResourceExceeded { .. } => ErrorKind::ResourceExceeded,
            Self::Undecidable(_) => ErrorKind::UndecidableQuery,
            Self::SerializationError(_) | Self::IoError(_) => ErrorKind::Storage,
        }
    }

    /// True if retrying with a larger budget may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::ResourceExceeded
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_and_symbol_index() {
        assert_eq!(StateId(7).index(), 7);
        assert_eq!(Symbol(26).index(), 26);
    }

    #[test]
    fn error_kinds_follow_taxonomy() {
        assert_eq!(
            AutstrError::NonLinear("x * y".to_string()).kind(),
            ErrorKind::Construction
        );
        assert_eq!(
            AutstrError::UnknownRelation("R".to_string()).kind(),
            ErrorKind::FormulaSyntax
        );
        assert_eq!(
            AutstrError::MissingUniverse("U".to_string()).kind(),
            ErrorKind::PresentationConsistency
        );
        let exceeded = AutstrError::ResourceExceeded {
            operation: "project",
            limit: "10 states".to_string(),
        };
        assert!(exceeded.is_recoverable());
        assert!(!AutstrError::Undecidable("x".to_string()).is_recoverable());
    }

    #[test]
    fn state_ids_order_deterministically() {
        let mut ids = vec![StateId(3), StateId(1), StateId(2)];
        ids.sort();
        assert_eq!(ids, vec![StateId(1), StateId(2), StateId(3)]);
    }
}
