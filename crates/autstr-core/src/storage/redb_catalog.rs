//! # redb-backed Presentation Catalog
//!
//! Stores one automatic presentation in a redb embedded database:
//! - ACID transactions (a save replaces the whole presentation atomically)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Each relation automaton is stored under its name in the persistence
//! format of `formats::persistence`; the universe name, policy, limits,
//! encoding and version counter are stored as one metadata record.

use crate::automaton::Automaton;
use crate::budget::Limits;
use crate::formats::{automaton_from_bytes, automaton_to_bytes};
use crate::presentation::{AutomaticPresentation, ConsistencyPolicy, PresentationSnapshot};
use crate::tape::Encoding;
use crate::types::AutstrError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Table for relations: name -> serialized automaton
const RELATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("relations");

/// Table for metadata: key -> postcard bytes
const METADATA: TableDefinition<&str, &[u8]> = TableDefinition::new("metadata");

const PRESENTATION_KEY: &str = "presentation";

/// Everything about a presentation except its automata.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogRecord {
    universe: String,
    policy: ConsistencyPolicy,
    limits: Limits,
    encoding: Option<Encoding>,
    version: u64,
}

fn io(e: impl std::fmt::Display) -> AutstrError {
    AutstrError::IoError(e.to_string())
}

/// A disk-backed presentation catalog.
pub struct RedbCatalog {
    db: Database,
}

impl std::fmt::Debug for RedbCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbCatalog").finish_non_exhaustive()
    }
}

impl RedbCatalog {
    /// Open or create a catalog at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AutstrError> {
        let db = Database::create(path.as_ref()).map_err(io)?;
        {
            let write_txn = db.begin_write().map_err(io)?;
            let _ = write_txn.open_table(RELATIONS).map_err(io)?;
            let _ = write_txn.open_table(METADATA).map_err(io)?;
            write_txn.commit().map_err(io)?;
        }
        Ok(Self { db })
    }

    /// True once a presentation has been saved.
    pub fn is_initialized(&self) -> Result<bool, AutstrError> {
        Ok(self.record()?.is_some())
    }

    /// Version of the stored presentation.
    pub fn version(&self) -> Result<Option<u64>, AutstrError> {
        Ok(self.record()?.map(|r| r.version))
    }

    /// Stored relation names, sorted.
    pub fn relation_names(&self) -> Result<Vec<String>, AutstrError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(RELATIONS).map_err(io)?;
        let mut names = Vec::new();
        for entry in table.iter().map_err(io)? {
            let (key, _) = entry.map_err(io)?;
            names.push(key.value().to_string());
        }
        Ok(names)
    }

    /// One stored relation automaton.
    pub fn relation(&self, name: &str) -> Result<Option<Automaton>, AutstrError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(RELATIONS).map_err(io)?;
        table
            .get(name)
            .map_err(io)?
            .map(|bytes| automaton_from_bytes(bytes.value()))
            .transpose()
    }

    /// Replace the stored presentation in one transaction.
    pub fn save(&self, presentation: &AutomaticPresentation) -> Result<(), AutstrError> {
        let snapshot = presentation.snapshot();
        let record = CatalogRecord {
            universe: snapshot.universe,
            policy: snapshot.policy,
            limits: snapshot.limits,
            encoding: snapshot.encoding,
            version: snapshot.version,
        };
        let record_bytes = postcard::to_stdvec(&record)
            .map_err(|e| AutstrError::SerializationError(e.to_string()))?;
        let encoded = snapshot
            .relations
            .iter()
            .map(|(name, a)| Ok((name.as_str(), automaton_to_bytes(a)?)))
            .collect::<Result<Vec<_>, AutstrError>>()?;

        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let mut relations = write_txn.open_table(RELATIONS).map_err(io)?;
            let mut stale = Vec::new();
            for entry in relations.iter().map_err(io)? {
                let (key, _) = entry.map_err(io)?;
                let name = key.value().to_string();
                if !snapshot.relations.contains_key(&name) {
                    stale.push(name);
                }
            }
            for name in &stale {
                relations.remove(name.as_str()).map_err(io)?;
            }
            for (name, bytes) in &encoded {
                relations.insert(*name, bytes.as_slice()).map_err(io)?;
            }
            let mut metadata = write_txn.open_table(METADATA).map_err(io)?;
            metadata
                .insert(PRESENTATION_KEY, record_bytes.as_slice())
                .map_err(io)?;
        }
        write_txn.commit().map_err(io)?;
        info!(
            relations = encoded.len(),
            version = record.version,
            "presentation saved"
        );
        Ok(())
    }

    /// Load and rebuild the stored presentation, if any.
    pub fn load(&self) -> Result<Option<AutomaticPresentation>, AutstrError> {
        let Some(record) = self.record()? else {
            return Ok(None);
        };
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(RELATIONS).map_err(io)?;
        let mut relations = BTreeMap::new();
        for entry in table.iter().map_err(io)? {
            let (key, value) = entry.map_err(io)?;
            relations.insert(key.value().to_string(), automaton_from_bytes(value.value())?);
        }
        debug!(relations = relations.len(), "presentation loaded");
        AutomaticPresentation::from_snapshot(PresentationSnapshot {
            universe: record.universe,
            relations,
            policy: record.policy,
            limits: record.limits,
            encoding: record.encoding,
            version: record.version,
        })
        .map(Some)
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), AutstrError> {
        self.db.compact().map_err(io)?;
        Ok(())
    }

    fn record(&self) -> Result<Option<CatalogRecord>, AutstrError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(METADATA).map_err(io)?;
        table
            .get(PRESENTATION_KEY)
            .map_err(io)?
            .map(|bytes| {
                postcard::from_bytes(bytes.value())
                    .map_err(|e| AutstrError::SerializationError(e.to_string()))
            })
            .transpose()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::natural_arithmetic;
    use crate::presentation::Binding;
    use tempfile::TempDir;

    fn catalog(dir: &TempDir) -> RedbCatalog {
        RedbCatalog::open(dir.path().join("catalog.redb")).expect("open")
    }

    #[test]
    fn empty_catalog_has_no_presentation() {
        let dir = TempDir::new().expect("tempdir");
        let c = catalog(&dir);
        assert!(!c.is_initialized().expect("initialized"));
        assert!(c.load().expect("load").is_none());
        assert!(c.relation_names().expect("names").is_empty());
    }

    #[test]
    fn save_and_reload_after_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let p = natural_arithmetic(Limits::default()).expect("naturals");
        {
            let c = catalog(&dir);
            c.save(&p).expect("save");
        }
        let c = catalog(&dir);
        assert_eq!(c.version().expect("version"), Some(p.version()));
        let names = c.relation_names().expect("names");
        assert!(names.contains(&"Lt".to_string()));
        let loaded = c.load().expect("load").expect("present");
        assert!(loaded.check("Lt(3, 4)").expect("check"));
        assert_eq!(c.relation("Lt").expect("relation").as_ref(), loaded.relation("Lt").map(|a| a.as_ref()));
    }

    #[test]
    fn save_replaces_removed_relations() {
        let dir = TempDir::new().expect("tempdir");
        let c = catalog(&dir);
        let p = natural_arithmetic(Limits::default()).expect("naturals");
        let q = p
            .update([("Two", Binding::from("x = 2"))])
            .expect("update");
        c.save(&q).expect("save");
        assert!(c.relation("Two").expect("relation").is_some());
        let r = q.without(["Two"]).expect("without");
        c.save(&r).expect("save");
        assert!(c.relation("Two").expect("relation").is_none());
        assert_eq!(c.version().expect("version"), Some(r.version()));
    }
}
