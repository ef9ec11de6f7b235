//! # Automatic Presentation
//!
//! A named collection of relation automata over one universe automaton.
//!
//! ## Consistency
//!
//! Every stored relation is pad-closed and contained in the domain product
//! of its arity. Supplied automata that accept tuples outside the universe
//! are either restricted (`ConsistencyPolicy::Correct`, logged at `warn`)
//! or refused (`ConsistencyPolicy::Reject`).
//!
//! ## Versioning
//!
//! Presentations are immutable values. `update` and `without` return a new
//! presentation with a higher version; automata are shared by `Arc`, so a
//! reader holding an older presentation keeps seeing its own bindings.

use crate::algebra::{Algebra, Bound, Domains};
use crate::automaton::Automaton;
use crate::budget::{Budget, Limits};
use crate::compiler::{Compiler, Scope};
use crate::formula::{Formula, is_identifier};
use crate::primitives::UNIVERSE;
use crate::tape::Encoding;
use crate::types::AutstrError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

// =============================================================================
// CONFIGURATION TYPES
// =============================================================================

/// What to do with a supplied relation that leaves the universe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyPolicy {
    /// Intersect with the universe on every tape.
    #[default]
    Correct,
    /// Fail with `AutstrError::Inconsistent`.
    Reject,
}

/// A new definition for a relation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A literal automaton.
    Automaton(Automaton),
    /// A formula; tapes follow its sorted free variables.
    Formula(String),
    /// A formula with an explicit tape order.
    FormulaWithVariables {
        /// Tape order of the defined relation.
        variables: Vec<String>,
        /// Defining formula.
        formula: String,
    },
}

impl From<Automaton> for Binding {
    fn from(automaton: Automaton) -> Self {
        Self::Automaton(automaton)
    }
}

impl From<&str> for Binding {
    fn from(formula: &str) -> Self {
        Self::Formula(formula.to_string())
    }
}

/// The result of evaluating a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Tape names in tape order.
    pub variables: Vec<String>,
    /// Pad-closed automaton over those tapes.
    pub automaton: Automaton,
}

impl Evaluation {
    /// Number of tapes.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.variables.len()
    }
}

impl From<Bound> for Evaluation {
    fn from(bound: Bound) -> Self {
        Self {
            variables: bound.variables,
            automaton: bound.automaton,
        }
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builder for an `AutomaticPresentation`.
#[derive(Debug, Clone)]
pub struct PresentationBuilder {
    universe: String,
    automata: BTreeMap<String, Automaton>,
    policy: ConsistencyPolicy,
    limits: Limits,
    encoding: Option<Encoding>,
}

impl Default for PresentationBuilder {
    fn default() -> Self {
        Self {
            universe: UNIVERSE.to_string(),
            automata: BTreeMap::new(),
            policy: ConsistencyPolicy::default(),
            limits: Limits::default(),
            encoding: None,
        }
    }
}

impl PresentationBuilder {
    /// Empty builder with the default universe name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another name for the universe relation.
    #[must_use]
    pub fn universe_name(mut self, name: impl Into<String>) -> Self {
        self.universe = name.into();
        self
    }

    /// Add (or replace) a named automaton; the universe is added by name.
    #[must_use]
    pub fn relation(mut self, name: impl Into<String>, automaton: Automaton) -> Self {
        self.automata.insert(name.into(), automaton);
        self
    }

    /// Consistency policy for supplied relations.
    #[must_use]
    pub fn policy(mut self, policy: ConsistencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resource limits for every boundary call.
    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Numeric encoding of integer literals.
    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Validate and prepare every automaton.
    pub fn build(self) -> Result<AutomaticPresentation, AutstrError> {
        let budget = self.limits.start();
        let universe = self
            .automata
            .get(&self.universe)
            .ok_or_else(|| AutstrError::MissingUniverse(self.universe.clone()))?;
        let domains = Arc::new(Domains::new(universe, &budget)?);
        let mut presentation = AutomaticPresentation {
            relations: BTreeMap::new(),
            universe: self.universe.clone(),
            domains: Arc::clone(&domains),
            policy: self.policy,
            limits: self.limits,
            encoding: self.encoding,
            version: 0,
        };
        presentation
            .relations
            .insert(self.universe.clone(), Arc::clone(domains.universe()));
        for (name, automaton) in &self.automata {
            if *name == self.universe {
                continue;
            }
            let prepared = presentation.admit(name, automaton, &budget)?;
            presentation.relations.insert(name.clone(), Arc::new(prepared));
        }
        debug!(
            relations = presentation.relations.len(),
            universe_states = domains.universe().state_count(),
            "presentation built"
        );
        Ok(presentation)
    }
}

// =============================================================================
// PRESENTATION
// =============================================================================

/// An automatic presentation of a structure.
#[derive(Debug, Clone)]
pub struct AutomaticPresentation {
    universe: String,
    relations: BTreeMap<String, Arc<Automaton>>,
    domains: Arc<Domains>,
    policy: ConsistencyPolicy,
    limits: Limits,
    encoding: Option<Encoding>,
    version: u64,
}

impl AutomaticPresentation {
    /// Build a presentation from a name-to-automaton mapping that contains
    /// the universe under `"U"`.
    pub fn new(automata: BTreeMap<String, Automaton>) -> Result<Self, AutstrError> {
        automata
            .into_iter()
            .fold(PresentationBuilder::new(), |b, (name, a)| b.relation(name, a))
            .build()
    }

    /// Start a builder.
    #[must_use]
    pub fn builder() -> PresentationBuilder {
        PresentationBuilder::new()
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Name of the universe relation.
    #[must_use]
    pub fn universe_name(&self) -> &str {
        &self.universe
    }

    /// The prepared universe automaton.
    #[must_use]
    pub fn universe(&self) -> &Arc<Automaton> {
        self.domains.universe()
    }

    /// The universe and its cached domain products.
    #[must_use]
    pub fn domains(&self) -> &Arc<Domains> {
        &self.domains
    }

    /// A relation automaton by name.
    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&Arc<Automaton>> {
        self.relations.get(name)
    }

    /// All relation names, sorted.
    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }

    /// All relations, sorted by name.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &Arc<Automaton>)> {
        self.relations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Logical version; incremented by every update.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The consistency policy.
    #[must_use]
    pub fn policy(&self) -> ConsistencyPolicy {
        self.policy
    }

    /// Resource limits of boundary calls.
    #[must_use]
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Numeric encoding of integer literals, if any.
    #[must_use]
    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    /// The same presentation with other limits.
    #[must_use]
    pub fn with_limits(&self, limits: Limits) -> Self {
        Self {
            limits,
            ..self.clone()
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Evaluate formula text; `updates` are visible to this evaluation only.
    pub fn evaluate(
        &self,
        formula: &str,
        updates: Option<&BTreeMap<String, Binding>>,
    ) -> Result<Evaluation, AutstrError> {
        self.evaluate_formula(&Formula::parse(formula)?, updates)
    }

    /// Evaluate a parsed formula.
    pub fn evaluate_formula(
        &self,
        formula: &Formula,
        updates: Option<&BTreeMap<String, Binding>>,
    ) -> Result<Evaluation, AutstrError> {
        let budget = self.limits.start();
        let overrides = match updates {
            Some(updates) => self.resolve_bindings(updates, &budget)?,
            None => BTreeMap::new(),
        };
        let algebra = Algebra::new(&self.domains, &budget);
        let scope = Scope::new(&self.relations).with_overrides(&overrides);
        let bound = Compiler::new(scope, algebra, self.encoding).compile(formula)?;
        Ok(bound.into())
    }

    /// Decide a closed formula.
    pub fn check(&self, formula: &str) -> Result<bool, AutstrError> {
        self.check_formula(&Formula::parse(formula)?)
    }

    /// Decide a parsed closed formula.
    pub fn check_formula(&self, formula: &Formula) -> Result<bool, AutstrError> {
        let budget = self.limits.start();
        let algebra = Algebra::new(&self.domains, &budget);
        Compiler::new(Scope::new(&self.relations), algebra, self.encoding).decide(formula)
    }

    // =========================================================================
    // UPDATES
    // =========================================================================

    /// Rebind names, in order; later bindings see earlier ones.
    pub fn update<I, K>(&self, bindings: I) -> Result<Self, AutstrError>
    where
        I: IntoIterator<Item = (K, Binding)>,
        K: Into<String>,
    {
        let budget = self.limits.start();
        let mut next = self.clone();
        for (name, binding) in bindings {
            let name = name.into();
            let automaton = next.bind(&name, &binding, &budget)?;
            debug!(
                relation = %name,
                arity = automaton.arity(),
                states = automaton.state_count(),
                "relation bound"
            );
            next.relations.insert(name, Arc::new(automaton));
        }
        next.version = self.version + 1;
        Ok(next)
    }

    /// Remove relations by name.
    pub fn without<I, K>(&self, names: I) -> Result<Self, AutstrError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut next = self.clone();
        for name in names {
            let name = name.as_ref();
            if name == self.universe {
                return Err(AutstrError::UniverseRebind(name.to_string()));
            }
            if next.relations.remove(name).is_none() {
                return Err(AutstrError::UnknownRelation(name.to_string()));
            }
        }
        next.version = self.version + 1;
        Ok(next)
    }

    fn bind(&self, name: &str, binding: &Binding, budget: &Budget) -> Result<Automaton, AutstrError> {
        if name == self.universe {
            return Err(AutstrError::UniverseRebind(name.to_string()));
        }
        if !is_identifier(name) {
            return Err(AutstrError::InvalidVariable(name.to_string()));
        }
        let algebra = Algebra::new(&self.domains, budget);
        let compile = |text: &str| -> Result<Bound, AutstrError> {
            let formula = Formula::parse(text)?;
            Compiler::new(Scope::new(&self.relations), algebra, self.encoding).compile(&formula)
        };
        match binding {
            Binding::Automaton(automaton) => self.admit(name, automaton, budget),
            Binding::Formula(text) => Ok(compile(text)?.automaton),
            Binding::FormulaWithVariables { variables, formula } => {
                let bound = compile(formula)?;
                algebra.arrange(&bound, variables)
            }
        }
    }

    fn resolve_bindings(
        &self,
        updates: &BTreeMap<String, Binding>,
        budget: &Budget,
    ) -> Result<BTreeMap<String, Arc<Automaton>>, AutstrError> {
        updates
            .iter()
            .map(|(name, binding)| Ok((name.clone(), Arc::new(self.bind(name, binding, budget)?))))
            .collect()
    }

    /// Apply the consistency policy to a supplied automaton.
    fn admit(&self, name: &str, automaton: &Automaton, budget: &Budget) -> Result<Automaton, AutstrError> {
        let algebra = Algebra::new(&self.domains, budget);
        if algebra.escapes_domain(automaton)? {
            match self.policy {
                ConsistencyPolicy::Reject => {
                    return Err(AutstrError::Inconsistent {
                        relation: name.to_string(),
                        detail: "accepts tuples outside the universe".to_string(),
                    });
                }
                ConsistencyPolicy::Correct => {
                    warn!(relation = %name, "relation restricted to the universe");
                }
            }
        }
        algebra.prepare(automaton)
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Capture the presentation as plain data.
    #[must_use]
    pub fn snapshot(&self) -> PresentationSnapshot {
        PresentationSnapshot {
            universe: self.universe.clone(),
            relations: self
                .relations
                .iter()
                .map(|(name, a)| (name.clone(), a.as_ref().clone()))
                .collect(),
            policy: self.policy,
            limits: self.limits,
            encoding: self.encoding,
            version: self.version,
        }
    }

    /// Rebuild a presentation from a snapshot, revalidating every automaton.
    pub fn from_snapshot(snapshot: PresentationSnapshot) -> Result<Self, AutstrError> {
        for automaton in snapshot.relations.values() {
            automaton.validate()?;
        }
        let mut builder = PresentationBuilder::new()
            .universe_name(snapshot.universe)
            .policy(snapshot.policy)
            .limits(snapshot.limits);
        if let Some(encoding) = snapshot.encoding {
            builder = builder.encoding(encoding);
        }
        for (name, automaton) in snapshot.relations {
            builder = builder.relation(name, automaton);
        }
        let mut presentation = builder.build()?;
        presentation.version = snapshot.version;
        Ok(presentation)
    }
}

/// Plain-data form of a presentation, used by persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationSnapshot {
    /// Universe relation name.
    pub universe: String,
    /// Prepared relation automata, universe included.
    pub relations: BTreeMap<String, Automaton>,
    /// Consistency policy.
    pub policy: ConsistencyPolicy,
    /// Resource limits.
    pub limits: Limits,
    /// Integer literal encoding.
    pub encoding: Option<Encoding>,
    /// Logical version.
    pub version: u64,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::TapeAlphabet;

    /// Naturals in LSBF binary without trailing zeros.
    fn naturals() -> Automaton {
        Automaton::from_fn(TapeAlphabet::binary(), 1, 4, 0, &[1, 2], |state, l| {
            match (state, l[0]) {
                (0, 0) => Some(1),
                (_, 1) => Some(2),
                (1..=3, 0) => Some(3),
                _ => None,
            }
        })
        .expect("valid automaton")
    }

    /// Words that start with 1 (odd numbers), padding ignored.
    fn odd() -> Automaton {
        Automaton::from_fn(TapeAlphabet::binary(), 1, 2, 0, &[1], |state, l| {
            match (state, l[0]) {
                (0, 1) | (1, _) => Some(1),
                _ => None,
            }
        })
        .expect("valid automaton")
    }

    fn presentation() -> AutomaticPresentation {
        AutomaticPresentation::builder()
            .relation("U", naturals())
            .relation("Odd", odd())
            .encoding(Encoding::Natural)
            .build()
            .expect("presentation")
    }

    #[test]
    fn missing_universe_is_reported() {
        let mut automata = BTreeMap::new();
        automata.insert("Odd".to_string(), odd());
        assert_eq!(
            AutomaticPresentation::new(automata).expect_err("no universe"),
            AutstrError::MissingUniverse("U".to_string())
        );
    }

    #[test]
    fn reject_policy_surfaces_inconsistency() {
        let everything = Automaton::universal(TapeAlphabet::binary(), 1).expect("universal");
        let err = AutomaticPresentation::builder()
            .relation("U", naturals())
            .relation("All", everything)
            .policy(ConsistencyPolicy::Reject)
            .build()
            .expect_err("inconsistent");
        assert!(matches!(err, AutstrError::Inconsistent { .. }));
    }

    #[test]
    fn correct_policy_restricts_to_universe() {
        let p = presentation();
        assert!(p.check("Odd(5)").expect("check"));
        assert!(!p.check("Odd(4)").expect("check"));
        // "1*1" is not a universe word, the stored relation never sees it.
        let odd = p.relation("Odd").expect("Odd");
        let alphabet = TapeAlphabet::binary();
        let word = vec![alphabet.pack(&[1]), alphabet.pack(&[2]), alphabet.pack(&[1])];
        assert!(!odd.accepts(&word));
    }

    #[test]
    fn update_is_copy_on_write() {
        let p = presentation();
        let q = p
            .update([("Even", Binding::from("not Odd(x)"))])
            .expect("update");
        assert_eq!(q.version(), p.version() + 1);
        assert!(p.relation("Even").is_none());
        assert!(q.check("Even(4)").expect("check"));
        assert!(matches!(
            p.check("Even(4)"),
            Err(AutstrError::UnknownRelation(_))
        ));
    }

    #[test]
    fn update_applies_bindings_in_order() {
        let p = presentation();
        let q = p
            .update([
                ("Even", Binding::from("not Odd(x)")),
                ("Both", Binding::from("Even(x) or Odd(x)")),
            ])
            .expect("update");
        assert!(q.check("forall x. Both(x)").expect("check"));
    }

    #[test]
    fn universe_cannot_be_rebound_or_removed() {
        let p = presentation();
        assert!(matches!(
            p.update([("U", Binding::from("Odd(x)"))]),
            Err(AutstrError::UniverseRebind(_))
        ));
        assert!(matches!(p.without(["U"]), Err(AutstrError::UniverseRebind(_))));
        let q = p.without(["Odd"]).expect("without");
        assert!(q.relation("Odd").is_none());
    }

    #[test]
    fn explicit_variable_order() {
        let p = presentation();
        let q = p
            .update([(
                "Gt",
                Binding::FormulaWithVariables {
                    variables: vec!["y".to_string(), "x".to_string()],
                    formula: "Odd(x) and not Odd(y)".to_string(),
                },
            )])
            .expect("update");
        assert!(q.check("Gt(2, 3)").expect("check"));
        assert!(!q.check("Gt(3, 2)").expect("check"));
    }

    #[test]
    fn temporary_updates_do_not_leak() {
        let p = presentation();
        let mut updates = BTreeMap::new();
        updates.insert("Odd".to_string(), Binding::from("x = 2"));
        let e = p.evaluate("Odd(x)", Some(&updates)).expect("evaluate");
        let two = Encoding::Natural.encode(2).expect("encode");
        assert!(e.automaton.accepts_tuple(&[two]).expect("run"));
        assert!(p.check("Odd(3)").expect("check"));
    }

    #[test]
    fn check_rejects_open_formulas() {
        let p = presentation();
        assert!(matches!(
            p.check("Odd(x)"),
            Err(AutstrError::UnboundVariable(_))
        ));
    }

    #[test]
    fn snapshot_round_trip() {
        let p = presentation()
            .update([("Even", Binding::from("not Odd(x)"))])
            .expect("update");
        let restored = AutomaticPresentation::from_snapshot(p.snapshot()).expect("restore");
        assert_eq!(restored.version(), p.version());
        assert_eq!(restored.snapshot(), p.snapshot());
    }
}
