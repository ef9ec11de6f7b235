//! # Persistence Format
//!
//! Binary serialization for automata and presentations.
//!
//! Format: Header (5 bytes) + postcard-serialized document.
//! - 4 bytes: Magic ("AUTS")
//! - 1 byte: Version
//!
//! The document is tagged, so an automaton file cannot be read back as a
//! presentation or the other way round. File I/O lives in the app layer.
//!
//! ## Validation
//!
//! - Size limits and the header are checked before the payload is parsed
//! - Decoded automata are revalidated (table shape, state ids)
//! - Decoded presentations are rebuilt, which re-prepares every relation

use crate::automaton::Automaton;
use crate::presentation::{AutomaticPresentation, PresentationSnapshot};
use crate::primitives;
use crate::types::AutstrError;
use serde::{Deserialize, Serialize};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted size of serialized data.
///
/// Checked before deserialization so corrupted input cannot force a large
/// allocation.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 256 * 1024 * 1024; // 256 MB

const HEADER_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Check magic bytes and version.
    pub fn validate(&self) -> Result<(), AutstrError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(AutstrError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(AutstrError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Header bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Parse a header without validating it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AutstrError> {
        match bytes {
            [m0, m1, m2, m3, version, ..] => Ok(Self {
                magic: [*m0, *m1, *m2, *m3],
                version: *version,
            }),
            _ => Err(AutstrError::SerializationError(
                "Header too short".to_string(),
            )),
        }
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// DOCUMENTS
// =============================================================================

#[derive(Serialize, Deserialize)]
enum Document {
    Automaton(Automaton),
    Presentation(PresentationSnapshot),
}

fn to_bytes(document: &Document) -> Result<Vec<u8>, AutstrError> {
    let payload = postcard::to_stdvec(document)
        .map_err(|e| AutstrError::SerializationError(e.to_string()))?;
    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&PersistenceHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

fn from_bytes(bytes: &[u8]) -> Result<Document, AutstrError> {
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(AutstrError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }
    PersistenceHeader::from_bytes(bytes)?.validate()?;
    let payload = bytes.get(HEADER_SIZE..).unwrap_or_default();
    postcard::from_bytes(payload).map_err(|e| {
        AutstrError::SerializationError(format!("Failed to deserialize document: {}", e))
    })
}

/// Serialize an automaton.
pub fn automaton_to_bytes(automaton: &Automaton) -> Result<Vec<u8>, AutstrError> {
    to_bytes(&Document::Automaton(automaton.clone()))
}

/// Deserialize and validate an automaton.
pub fn automaton_from_bytes(bytes: &[u8]) -> Result<Automaton, AutstrError> {
    match from_bytes(bytes)? {
        Document::Automaton(automaton) => {
            automaton.validate()?;
            Ok(automaton)
        }
        Document::Presentation(_) => Err(AutstrError::SerializationError(
            "expected an automaton, found a presentation".to_string(),
        )),
    }
}

/// Serialize a presentation with all of its relations.
pub fn presentation_to_bytes(presentation: &AutomaticPresentation) -> Result<Vec<u8>, AutstrError> {
    to_bytes(&Document::Presentation(presentation.snapshot()))
}

/// Deserialize and rebuild a presentation.
pub fn presentation_from_bytes(bytes: &[u8]) -> Result<AutomaticPresentation, AutstrError> {
    match from_bytes(bytes)? {
        Document::Presentation(snapshot) => AutomaticPresentation::from_snapshot(snapshot),
        Document::Automaton(_) => Err(AutstrError::SerializationError(
            "expected a presentation, found an automaton".to_string(),
        )),
    }
}

// =============================================================================
// TESTS
// =============================================================================
