//! # Formats
//!
//! Serialization of automata and presentations. Pure transformations to and
//! from bytes; no file I/O.

pub mod persistence;

pub use persistence::{
    MAX_PERSISTENCE_PAYLOAD_SIZE, PersistenceHeader, automaton_from_bytes, automaton_to_bytes,
    presentation_from_bytes, presentation_to_bytes,
};
