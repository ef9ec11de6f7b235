//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command opens the catalog, works on an immutable presentation and,
//! for commands that change it, saves the new version in one transaction.

use crate::api::{
    self, AppState, CheckResponse, DefineResponse, Element, EvaluateResponse, RelationsResponse,
};
use crate::config::{LimitsSection, ServerSection};
use autstr_core::{
    AutomaticPresentation, AutstrError, Binding, ConsistencyPolicy, Limits, RedbCatalog,
    Structure, formats::MAX_PERSISTENCE_PAYLOAD_SIZE, language_hash, presentation_from_bytes,
    presentation_to_bytes,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AutstrError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AutstrError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(AutstrError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and check that it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, AutstrError> {
    let canonical = path.canonicalize().map_err(|e| {
        AutstrError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AutstrError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path; its parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, AutstrError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        AutstrError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(AutstrError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| AutstrError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// CATALOG ACCESS
// =============================================================================

/// Load the stored presentation.
fn load_stored(catalog: &RedbCatalog, db_path: &Path) -> Result<AutomaticPresentation, AutstrError> {
    catalog.load()?.ok_or_else(|| {
        AutstrError::IoError(format!(
            "No presentation in '{}'; run `autstr init` first",
            db_path.display()
        ))
    })
}

/// Load the stored presentation with the configured limit overrides.
fn load_for_query(
    db_path: &Path,
    overrides: LimitsSection,
) -> Result<AutomaticPresentation, AutstrError> {
    let catalog = RedbCatalog::open(db_path)?;
    let stored = load_stored(&catalog, db_path)?;
    let limits = overrides.apply(stored.limits());
    tracing::debug!(?limits, version = stored.version(), "presentation loaded");
    Ok(stored.with_limits(limits))
}

fn render_json<T: serde::Serialize>(value: &T) -> Result<String, AutstrError> {
    serde_json::to_string_pretty(value).map_err(|e| AutstrError::SerializationError(e.to_string()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AutstrError> {
    println!("{}", render_json(value)?);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    overrides: LimitsSection,
    server: &ServerSection,
) -> Result<(), AutstrError> {
    let catalog = RedbCatalog::open(db_path)?;
    let stored = load_stored(&catalog, db_path)?;
    let limits = overrides.apply(stored.limits());

    println!("Configuration:");
    println!("  Host:        {}", server.host);
    println!("  Port:        {}", server.port);
    println!("  Database:    {}", db_path.display());
    println!("  Max results: {}", server.max_results);
    println!();
    println!("Endpoints:");
    println!("  GET  /health    - Health check");
    println!("  GET  /relations - List relations");
    println!("  POST /check     - Decide a closed formula");
    println!("  POST /evaluate  - Enumerate a formula's tuples");
    println!("  POST /define    - Bind a relation name");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(stored)
        .with_catalog(catalog)
        .with_limits(limits)
        .with_max_results(server.max_results);
    let addr = format!("{}:{}", server.host, server.port);
    api::run_server(&addr, state).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create the catalog from a built-in structure.
pub fn cmd_init(
    db_path: &Path,
    overrides: LimitsSection,
    structure: Structure,
    reject_inconsistent: bool,
    force: bool,
    json_mode: bool,
) -> Result<(), AutstrError> {
    let catalog = RedbCatalog::open(db_path)?;
    if catalog.is_initialized()? && !force {
        return Err(AutstrError::IoError(format!(
            "'{}' already holds a presentation; use --force to overwrite",
            db_path.display()
        )));
    }

    let limits = overrides.apply(Limits::default());
    let built = structure.presentation(limits)?;
    let presentation = if reject_inconsistent {
        let mut snapshot = built.snapshot();
        snapshot.policy = ConsistencyPolicy::Reject;
        AutomaticPresentation::from_snapshot(snapshot)?
    } else {
        built
    };
    catalog.save(&presentation)?;
    tracing::info!(%structure, "catalog initialized");

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "structure": structure.to_string(),
            "version": presentation.version(),
            "relations": presentation.relation_names().collect::<Vec<_>>(),
        }))?;
    } else {
        println!(
            "Initialized {} with {} ({} relations)",
            db_path.display(),
            structure,
            presentation.relation_names().count()
        );
    }
    Ok(())
}

// =============================================================================
// INFO COMMAND
// =============================================================================

/// Show the stored presentation.
pub fn cmd_info(db_path: &Path, overrides: LimitsSection, json_mode: bool) -> Result<(), AutstrError> {
    let presentation = load_for_query(db_path, overrides)?;
    let overview = RelationsResponse::describe(&presentation)?;
    let budget = presentation.limits().start();

    if json_mode {
        let hashes = presentation
            .relations()
            .map(|(name, automaton)| {
                let hash = language_hash(automaton, &budget)?;
                Ok((name.to_string(), serde_json::Value::String(hash)))
            })
            .collect::<Result<serde_json::Map<String, serde_json::Value>, AutstrError>>()?;
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "universe": overview.universe,
            "version": overview.version,
            "policy": format!("{:?}", presentation.policy()),
            "encoding": presentation.encoding().map(|e| format!("{:?}", e)),
            "limits": presentation.limits(),
            "relations": overview.relations,
            "blake3": hashes,
        }))?;
        return Ok(());
    }

    println!("autstr Presentation");
    println!("===================");
    println!("Database: {}", db_path.display());
    println!("Universe: {}", overview.universe);
    println!("Version:  {}", overview.version);
    println!("Policy:   {:?}", presentation.policy());
    match presentation.encoding() {
        Some(encoding) => println!("Encoding: {:?}", encoding),
        None => println!("Encoding: raw words"),
    }
    let limits = presentation.limits();
    println!(
        "Limits:   max_states={}, timeout_ms={}",
        limits.max_states.map_or("none".to_string(), |n| n.to_string()),
        limits.timeout_ms.map_or("none".to_string(), |n| n.to_string())
    );
    println!();
    println!("{:<12} {:>5} {:>8}  {:<16}", "Relation", "Arity", "States", "Checksum");
    for relation in &overview.relations {
        println!(
            "{:<12} {:>5} {:>8}  {:016x}",
            relation.name, relation.arity, relation.states, relation.checksum
        );
    }
    Ok(())
}

// =============================================================================
// DEFINE COMMAND
// =============================================================================

/// Bind a relation name to a formula and save the new version.
pub fn cmd_define(
    db_path: &Path,
    overrides: LimitsSection,
    name: &str,
    formula: &str,
    variables: Option<Vec<String>>,
    json_mode: bool,
) -> Result<(), AutstrError> {
    let catalog = RedbCatalog::open(db_path)?;
    let stored = load_stored(&catalog, db_path)?;
    let stored_limits = stored.limits();
    let presentation = stored.with_limits(overrides.apply(stored_limits));

    let binding = match variables {
        Some(variables) => Binding::FormulaWithVariables {
            variables,
            formula: formula.to_string(),
        },
        None => Binding::Formula(formula.to_string()),
    };
    // Overrides apply to this run only; the stored limits are kept.
    let next = presentation
        .update([(name, binding)])?
        .with_limits(stored_limits);
    catalog.save(&next)?;

    if json_mode {
        print_json(&DefineResponse::success(next.version()))?;
    } else if let Some(automaton) = next.relation(name) {
        println!(
            "Defined {} (arity {}, {} states), version {}",
            name,
            automaton.arity(),
            automaton.state_count(),
            next.version()
        );
    }
    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Decide a closed formula.
pub fn cmd_check(
    db_path: &Path,
    overrides: LimitsSection,
    formula: &str,
    json_mode: bool,
) -> Result<(), AutstrError> {
    let presentation = load_for_query(db_path, overrides)?;
    let result = presentation.check(formula)?;

    if json_mode {
        print_json(&CheckResponse::success(result))?;
    } else {
        println!("{}", result);
    }
    Ok(())
}

// =============================================================================
// EVAL COMMAND
// =============================================================================

/// Enumerate up to `limit` tuples of a formula.
pub fn cmd_eval(
    db_path: &Path,
    overrides: LimitsSection,
    formula: &str,
    limit: usize,
    json_mode: bool,
) -> Result<(), AutstrError> {
    let presentation = load_for_query(db_path, overrides)?;
    let evaluation = presentation.evaluate(formula, None)?;
    let response = EvaluateResponse::from_evaluation(&presentation, evaluation, limit)?;

    if json_mode {
        print_json(&response)?;
        return Ok(());
    }

    println!("({})", response.variables.join(", "));
    for tuple in &response.tuples {
        let rendered: Vec<String> = tuple.iter().map(ToString::to_string).collect();
        println!("({})", rendered.join(", "));
    }
    let finiteness = match response.finite {
        Some(true) => "finite",
        _ => "infinite",
    };
    if response.truncated {
        println!("... {} relation, first {} tuples shown", finiteness, response.tuples.len());
    } else {
        println!("{} relation, {} tuples", finiteness, response.tuples.len());
    }
    Ok(())
}

// =============================================================================
// MIN COMMAND
// =============================================================================

/// Smallest value of the first free variable.
pub fn cmd_min(
    db_path: &Path,
    overrides: LimitsSection,
    formula: &str,
    json_mode: bool,
) -> Result<(), AutstrError> {
    let presentation = load_for_query(db_path, overrides)?;
    let evaluation = presentation.evaluate(formula, None)?;
    let minimum = Element::minimum(&presentation, &evaluation)?;

    if json_mode {
        print_json(&serde_json::json!({
            "variable": evaluation.variables.first(),
            "min": minimum,
        }))?;
    } else {
        match minimum {
            Some(value) => println!("{}", value),
            None => println!("empty"),
        }
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Write the stored presentation to a file.
pub fn cmd_export(db_path: &Path, output: &Path) -> Result<(), AutstrError> {
    let catalog = RedbCatalog::open(db_path)?;
    let presentation = load_stored(&catalog, db_path)?;
    let validated_output = validate_output_path(output)?;

    let data = presentation_to_bytes(&presentation)?;
    std::fs::write(&validated_output, &data)
        .map_err(|e| AutstrError::IoError(format!("Write file: {}", e)))?;

    tracing::info!(bytes = data.len(), path = %validated_output.display(), "presentation exported");
    println!(
        "Exported version {} ({} bytes) to {}",
        presentation.version(),
        data.len(),
        validated_output.display()
    );
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Replace the stored presentation from a file.
pub fn cmd_import(db_path: &Path, input: &Path, force: bool) -> Result<(), AutstrError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_PERSISTENCE_PAYLOAD_SIZE as u64)?;

    let catalog = RedbCatalog::open(db_path)?;
    if catalog.is_initialized()? && !force {
        return Err(AutstrError::IoError(format!(
            "'{}' already holds a presentation; use --force to overwrite",
            db_path.display()
        )));
    }

    let data = std::fs::read(&validated_path)
        .map_err(|e| AutstrError::IoError(format!("Read file: {}", e)))?;
    let presentation = presentation_from_bytes(&data)?;
    catalog.save(&presentation)?;

    println!(
        "Imported version {} ({} relations) from {}",
        presentation.version(),
        presentation.relation_names().count(),
        validated_path.display()
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_naturals(dir: &TempDir) -> PathBuf {
        let db = dir.path().join("catalog.redb");
        cmd_init(
            &db,
            LimitsSection::default(),
            Structure::Naturals,
            false,
            false,
            true,
        )
        .expect("init");
        db
    }

    #[test]
    fn json_output_reports_serialization_failures() {
        let rendered = render_json(&serde_json::json!({ "version": 3 })).expect("render");
        assert!(rendered.contains("\"version\": 3"));
        // JSON object keys must be strings.
        let keyed: std::collections::BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        assert!(matches!(
            render_json(&keyed),
            Err(AutstrError::SerializationError(_))
        ));
        assert!(print_json(&keyed).is_err());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = TempDir::new().expect("tempdir");
        let db = init_naturals(&dir);
        let again = cmd_init(
            &db,
            LimitsSection::default(),
            Structure::Integers,
            false,
            false,
            true,
        );
        assert!(again.is_err());
    }

    #[test]
    fn define_persists_and_keeps_stored_limits() {
        let dir = TempDir::new().expect("tempdir");
        let db = init_naturals(&dir);
        let overrides = LimitsSection {
            max_states: None,
            timeout_ms: Some(60_000),
        };
        cmd_define(&db, overrides, "Even", "exists y. A(y, y, x)", None, true).expect("define");

        let catalog = RedbCatalog::open(&db).expect("open");
        let stored = load_stored(&catalog, &db).expect("load");
        assert!(stored.relation("Even").is_some());
        assert_eq!(stored.limits(), Limits::default());
        assert!(stored.check("Even(4) and not Even(5)").expect("check"));
    }

    #[test]
    fn query_without_init_fails() {
        let dir = TempDir::new().expect("tempdir");
        let db = dir.path().join("empty.redb");
        assert!(cmd_check(&db, LimitsSection::default(), "true", true).is_err());
    }

    #[test]
    fn export_then_import_into_fresh_catalog() {
        let dir = TempDir::new().expect("tempdir");
        let db = init_naturals(&dir);
        let file = dir.path().join("naturals.auts");
        cmd_export(&db, &file).expect("export");

        let other = dir.path().join("other.redb");
        cmd_import(&other, &file, false).expect("import");
        let catalog = RedbCatalog::open(&other).expect("open");
        let restored = load_stored(&catalog, &other).expect("load");
        assert!(restored.check("Lt(2, 3)").expect("check"));
        assert!(cmd_import(&other, &file, false).is_err());
    }
}
