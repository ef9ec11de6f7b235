//! # autstr-core
//!
//! The automatic-structures engine for autstr.
//!
//! Relations over infinite domains (naturals, integers, or any domain with a
//! regular word encoding) are represented exactly as synchronous multi-tape
//! automata. First-order formulas over such relations compile into
//! automaton transformations, so membership, emptiness and finiteness of any
//! definable relation are decidable.
//!
//! ## Layers
//!
//! - `tape`, `automaton`, `convolution`: letters, words and automata
//! - `algebra`: named-variable relational operators
//! - `formula`, `compiler`: the query language
//! - `presentation`: immutable, versioned sets of named relations
//! - `arithmetic`, `builtin`: linear arithmetic over ℕ and ℤ
//! - `enumerate`: ordered enumeration and minimal elements
//! - `formats`, `storage`, `fingerprint`: persistence and identity
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async, no network dependencies
//! - Deterministic: identical inputs give identical automata and orderings
//! - Immutable values: every operation returns a new automaton or presentation
//! - Bounded: expensive operators honor a `Budget`

// =============================================================================
// MODULES
// =============================================================================

pub mod algebra;
pub mod arithmetic;
pub mod automaton;
pub mod budget;
pub mod builtin;
pub mod compiler;
pub mod convolution;
pub mod enumerate;
pub mod fingerprint;
pub mod formats;
pub mod formula;
pub mod presentation;
pub mod primitives;
pub mod storage;
pub mod tape;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{AutstrError, ErrorKind, Letter, StateId, Symbol};

pub use budget::{Budget, Limits, Ticker};
pub use num_bigint::BigInt;
pub use tape::{ElementCodec, Encoding, RawCodec, TapeAlphabet};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use algebra::{Algebra, Bound, Domains};
pub use automaton::{Automaton, Combine};
pub use compiler::{Compiler, Scope};
pub use formula::{Argument, Formula, Literal, parse};
pub use presentation::{
    AutomaticPresentation, Binding, ConsistencyPolicy, Evaluation, PresentationBuilder,
    PresentationSnapshot,
};

// =============================================================================
// RE-EXPORTS: Arithmetic Front End
// =============================================================================

pub use arithmetic::{Arithmetic, Relation, Term};
pub use builtin::{Structure, integer_arithmetic, natural_arithmetic};
pub use enumerate::{Enumeration, Tuples, min_element};

// =============================================================================
// RE-EXPORTS: Persistence
// =============================================================================

pub use fingerprint::checksum;
#[cfg(feature = "crypto-hash")]
pub use fingerprint::language_hash;
pub use formats::{
    PersistenceHeader, automaton_from_bytes, automaton_to_bytes, presentation_from_bytes,
    presentation_to_bytes,
};
pub use storage::RedbCatalog;
