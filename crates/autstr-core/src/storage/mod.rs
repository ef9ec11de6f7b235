//! # Storage
//!
//! Durable storage of presentations.

pub mod redb_catalog;

pub use redb_catalog::RedbCatalog;
