//! # Language Fingerprints
//!
//! Short identifiers for the language of an automaton.
//!
//! Fingerprints are computed over the canonical minimal automaton, so two
//! automata accepting the same language always get the same fingerprint,
//! whatever their state count or numbering.

use crate::automaton::Automaton;
use crate::budget::Budget;
use crate::types::{AutstrError, StateId, Symbol};

/// Fast 64-bit checksum of the language accepted by `automaton`.
///
/// Not collision resistant. Use `language_hash` when that matters.
pub fn checksum(automaton: &Automaton, budget: &Budget) -> Result<u64, AutstrError> {
    let minimal = automaton.minimize(budget)?;
    let mut hash: u64 = 0;
    let mut mix = |value: u64| {
        hash = hash.rotate_left(5) ^ value;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    };

    mix((minimal.arity() as u64).rotate_left(13));
    mix((minimal.alphabet().width() as u64).rotate_left(7));
    mix(minimal.state_count() as u64);
    mix(u64::from(minimal.initial().0).rotate_left(17));

    for state in 0..minimal.state_count() {
        let id = StateId(state as u32);
        mix(u64::from(minimal.is_accepting(id)).rotate_left(3));
        for symbol in 0..minimal.symbol_count() {
            let target = minimal.successor(id, Symbol(symbol as u32));
            // Missing transitions hash as all ones.
            mix(target.map_or(u64::MAX, |t| u64::from(t.0).rotate_left(11)));
        }
    }
    Ok(hash)
}

// =============================================================================
// CRYPTOGRAPHIC HASH SUPPORT
// =============================================================================

/// BLAKE3 hash of the canonical minimal automaton, as a hex string.
///
/// # Requires
///
/// This function is only available with the `crypto-hash` feature enabled.
#[cfg(feature = "crypto-hash")]
pub fn language_hash(automaton: &Automaton, budget: &Budget) -> Result<String, AutstrError> {
    let minimal = automaton.minimize(budget)?;
    let bytes = postcard::to_stdvec(&minimal)
        .map_err(|e| AutstrError::SerializationError(e.to_string()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================
