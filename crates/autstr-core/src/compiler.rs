//! # Query Compiler
//!
//! Compiles a `Formula` bottom-up into one automaton via the relational
//! operators.
//!
//! Relation names are resolved against an explicit `Scope` before any
//! automaton is built, so unknown names and arity mismatches are reported
//! immediately. Free variables are threaded upward as sorted tape names:
//! the tape order of the result is the sorted order of the formula's free
//! variables.
//!
//! Literal arguments become hidden tapes that are pinned to the literal's
//! encoding and projected away again.

use crate::algebra::{Algebra, Bound};
use crate::automaton::Automaton;
use crate::convolution::literal;
use crate::formula::{Argument, Formula, Literal};
use crate::primitives::INTERNAL_PREFIX;
use crate::tape::Encoding;
use crate::types::AutstrError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// SCOPE
// =============================================================================

/// Name-to-automaton table a formula is resolved against.
///
/// Overrides shadow the base table for one evaluation only.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    base: &'a BTreeMap<String, Arc<Automaton>>,
    overrides: Option<&'a BTreeMap<String, Arc<Automaton>>>,
}

impl<'a> Scope<'a> {
    /// A scope over one table.
    #[must_use]
    pub fn new(base: &'a BTreeMap<String, Arc<Automaton>>) -> Self {
        Self {
            base,
            overrides: None,
        }
    }

    /// Shadow the table with temporary bindings.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &'a BTreeMap<String, Arc<Automaton>>) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Look a relation up, overrides first.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&'a Arc<Automaton>> {
        self.overrides
            .and_then(|o| o.get(name))
            .or_else(|| self.base.get(name))
    }
}

// =============================================================================
// COMPILER
// =============================================================================

/// Compiles formulas over one scope and universe.
pub struct Compiler<'a> {
    scope: Scope<'a>,
    algebra: Algebra<'a>,
    encoding: Option<Encoding>,
    equality: Option<Automaton>,
    hidden: usize,
}

impl<'a> Compiler<'a> {
    /// A compiler resolving names in `scope`; integer literals use `encoding`.
    #[must_use]
    pub fn new(scope: Scope<'a>, algebra: Algebra<'a>, encoding: Option<Encoding>) -> Self {
        Self {
            scope,
            algebra,
            encoding,
            equality: None,
            hidden: 0,
        }
    }

    /// Check every relation name and arity of a formula.
    pub fn resolve(&self, formula: &Formula) -> Result<(), AutstrError> {
        match formula {
            Formula::Truth(_) | Formula::Equal(..) => Ok(()),
            Formula::Atom {
                relation,
                arguments,
            } => {
                let automaton = self
                    .scope
                    .lookup(relation)
                    .ok_or_else(|| AutstrError::UnknownRelation(relation.clone()))?;
                if automaton.arity() != arguments.len() {
                    return Err(AutstrError::ArityMismatch {
                        relation: relation.clone(),
                        expected: automaton.arity(),
                        found: arguments.len(),
                    });
                }
                Ok(())
            }
            Formula::Not(inner)
            | Formula::Exists(_, inner)
            | Formula::ForAll(_, inner)
            | Formula::ExInf(_, inner) => self.resolve(inner),
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Implies(l, r) | Formula::Iff(l, r) => {
                self.resolve(l)?;
                self.resolve(r)
            }
        }
    }

    /// Compile a formula; the result's tapes are its sorted free variables.
    pub fn compile(&mut self, formula: &Formula) -> Result<Bound, AutstrError> {
        self.resolve(formula)?;
        let bound = self.build(formula)?;
        debug!(
            variables = bound.variables.len(),
            states = bound.automaton.state_count(),
            "formula compiled"
        );
        Ok(bound)
    }

    /// Compile a closed formula and read off its truth value.
    pub fn decide(&mut self, formula: &Formula) -> Result<bool, AutstrError> {
        if let Some(free) = formula.free_variables().into_iter().next() {
            return Err(AutstrError::UnboundVariable(free));
        }
        let bound = self.compile(formula)?;
        Ok(bound.automaton.is_accepting(bound.automaton.initial()))
    }

    fn build(&mut self, formula: &Formula) -> Result<Bound, AutstrError> {
        let algebra = self.algebra;
        self.algebra.budget().check_deadline("compile")?;
        match formula {
            Formula::Truth(value) => algebra.truth(*value),
            Formula::Atom {
                relation,
                arguments,
            } => {
                let automaton = self
                    .scope
                    .lookup(relation)
                    .ok_or_else(|| AutstrError::UnknownRelation(relation.clone()))?;
                self.application(automaton.as_ref(), arguments)
            }
            Formula::Equal(left, right) => {
                let equality = match &self.equality {
                    Some(eq) => eq.clone(),
                    None => {
                        let eq = algebra.equality()?;
                        self.equality = Some(eq.clone());
                        eq
                    }
                };
                self.application(&equality, &[left.clone(), right.clone()])
            }
            Formula::Not(inner) => algebra.not(&self.build(inner)?),
            Formula::And(l, r) => {
                let (l, r) = (self.build(l)?, self.build(r)?);
                algebra.and(&l, &r)
            }
            Formula::Or(l, r) => {
                let (l, r) = (self.build(l)?, self.build(r)?);
                algebra.or(&l, &r)
            }
            Formula::Implies(l, r) => {
                let (l, r) = (self.build(l)?, self.build(r)?);
                algebra.implies(&l, &r)
            }
            Formula::Iff(l, r) => {
                let (l, r) = (self.build(l)?, self.build(r)?);
                algebra.iff(&l, &r)
            }
            Formula::Exists(v, body) => algebra.exists(&self.build(body)?, v),
            Formula::ForAll(v, body) => algebra.forall(&self.build(body)?, v),
            Formula::ExInf(v, body) => algebra.exinf(&self.build(body)?, v),
        }
    }

    /// Apply a relation to arguments, pinning literal arguments.
    fn application(
        &mut self,
        automaton: &Automaton,
        arguments: &[Argument],
    ) -> Result<Bound, AutstrError> {
        let mut names = Vec::with_capacity(arguments.len());
        let mut pinned = Vec::new();
        for argument in arguments {
            match argument {
                Argument::Variable(v) => names.push(v.clone()),
                Argument::Literal(value) => {
                    let name = format!("{}l{}", INTERNAL_PREFIX, self.hidden);
                    self.hidden += 1;
                    pinned.push((name.clone(), self.literal(value)?));
                    names.push(name);
                }
            }
        }
        let mut bound = self.algebra.apply(automaton, &names)?;
        let mut hidden = Vec::with_capacity(pinned.len());
        for (name, value) in pinned {
            bound = self.algebra.and(&bound, &value.named(name.clone()))?;
            hidden.push(name);
        }
        self.algebra.drop(&bound, &hidden)
    }

    fn literal(&self, value: &Literal) -> Result<Pinned, AutstrError> {
        let alphabet = self.algebra.domains().alphabet();
        let word = match value {
            Literal::Integer(n) => self
                .encoding
                .ok_or_else(|| {
                    AutstrError::MalformedEncoding(format!(
                        "integer literal {} needs a numeric encoding",
                        n
                    ))
                })?
                .encode(*n)?,
            Literal::Word(text) => alphabet.parse_word(text)?,
        };
        Ok(Pinned(self.algebra.prepare(&literal(alphabet, &word)?)?))
    }
}

/// A prepared single-tape literal automaton.
struct Pinned(Automaton);

impl Pinned {
    fn named(self, name: String) -> Bound {
        Bound {
            variables: vec![name],
            automaton: self.0,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Domains;
    use crate::budget::Budget;
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

    /// `x < 4` over naturals, encoded directly: at most two bits.
    fn small(domains: &Domains, budget: &Budget) -> Automaton {
        let short = Automaton::from_fn(TapeAlphabet::binary(), 1, 3, 0, &[1, 2], |state, l| {
            match (state, l[0]) {
                (0, 0 | 1) => Some(1),
                (1, 0 | 1) => Some(2),
                _ => None,
            }
        })
        .expect("valid automaton");
        Algebra::new(domains, budget).prepare(&short).expect("prepare")
    }

    fn table(domains: &Domains, budget: &Budget) -> BTreeMap<String, Arc<Automaton>> {
        let mut table = BTreeMap::new();
        table.insert("S".to_string(), Arc::new(small(domains, budget)));
        table.insert("U".to_string(), Arc::clone(domains.universe()));
        table
    }

    fn values(bound: &Bound, tuple: &[i64]) -> bool {
        let words: Vec<Vec<u8>> = tuple
            .iter()
            .map(|&v| Encoding::Natural.encode(v).expect("encode"))
            .collect();
        bound.automaton.accepts_tuple(&words).expect("run")
    }

    #[test]
    fn unknown_relation_reported_before_compilation() {
        let budget = Budget::unlimited();
        let domains = Domains::new(&naturals(), &budget).expect("domains");
        let table = table(&domains, &budget);
        let mut compiler = Compiler::new(
            Scope::new(&table),
            Algebra::new(&domains, &budget),
            Some(Encoding::Natural),
        );
        let f = Formula::parse("S(x) and Missing(x)").expect("parse");
        assert_eq!(
            compiler.compile(&f).expect_err("unknown"),
            AutstrError::UnknownRelation("Missing".to_string())
        );
        let f = Formula::parse("S(x, y)").expect("parse");
        assert!(matches!(
            compiler.compile(&f),
            Err(AutstrError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn compiles_connectives_and_literals() {
        let budget = Budget::unlimited();
        let domains = Domains::new(&naturals(), &budget).expect("domains");
        let table = table(&domains, &budget);
        let mut compiler = Compiler::new(
            Scope::new(&table),
            Algebra::new(&domains, &budget),
            Some(Encoding::Natural),
        );
        let f = Formula::parse("S(x) and not x = 2").expect("parse");
        let bound = compiler.compile(&f).expect("compile");
        assert_eq!(bound.variables, vec!["x".to_string()]);
        assert!(values(&bound, &[3]));
        assert!(!values(&bound, &[2]));
        assert!(!values(&bound, &[4]));

        assert!(compiler.decide(&Formula::parse("S(3)").expect("parse")).expect("decide"));
        assert!(!compiler.decide(&Formula::parse("S(4)").expect("parse")).expect("decide"));
        assert!(compiler.decide(&Formula::parse("S(\"11\")").expect("parse")).expect("decide"));
    }

    #[test]
    fn quantifiers_and_closed_formulas() {
        let budget = Budget::unlimited();
        let domains = Domains::new(&naturals(), &budget).expect("domains");
        let table = table(&domains, &budget);
        let mut compiler = Compiler::new(
            Scope::new(&table),
            Algebra::new(&domains, &budget),
            Some(Encoding::Natural),
        );
        fn decide(c: &mut Compiler<'_>, text: &str) -> bool {
            c.decide(&Formula::parse(text).expect("parse")).expect("decide")
        }
        assert!(decide(&mut compiler, "exists x. S(x)"));
        assert!(!decide(&mut compiler, "forall x. S(x)"));
        assert!(decide(&mut compiler, "forall x. S(x) -> U(x)"));
        assert!(!decide(&mut compiler, "exinf x. S(x)"));
        assert!(decide(&mut compiler, "exinf x. not S(x)"));
        assert!(decide(&mut compiler, "exists x. (S(x) <-> S(x))"));
        assert!(matches!(
            compiler.decide(&Formula::parse("S(x)").expect("parse")),
            Err(AutstrError::UnboundVariable(_))
        ));
    }

    #[test]
    fn overrides_shadow_base_table() {
        let budget = Budget::unlimited();
        let domains = Domains::new(&naturals(), &budget).expect("domains");
        let table = table(&domains, &budget);
        let mut overrides = BTreeMap::new();
        overrides.insert("S".to_string(), Arc::clone(domains.universe()));
        let mut compiler = Compiler::new(
            Scope::new(&table).with_overrides(&overrides),
            Algebra::new(&domains, &budget),
            Some(Encoding::Natural),
        );
        assert!(compiler.decide(&Formula::parse("S(100)").expect("parse")).expect("decide"));
    }

    #[test]
    fn integer_literals_need_an_encoding() {
        let budget = Budget::unlimited();
        let domains = Domains::new(&naturals(), &budget).expect("domains");
        let table = table(&domains, &budget);
        let mut compiler =
            Compiler::new(Scope::new(&table), Algebra::new(&domains, &budget), None);
        assert!(matches!(
            compiler.decide(&Formula::parse("S(1)").expect("parse")),
            Err(AutstrError::MalformedEncoding(_))
        ));
    }
}
