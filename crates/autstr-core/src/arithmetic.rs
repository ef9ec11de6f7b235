//! # Linear Arithmetic Front End
//!
//! Terms over variables, integer constants, addition and scalar
//! multiplication, closed into relations by comparisons.
//!
//! Terms are plain values. A comparison lowers both sides into a formula
//! over the arithmetic presentation's `A` relation and compiles it; the
//! resulting `Relation` owns that automaton and keeps no reference to the
//! term tree.
//!
//! Every intermediate value gets a fresh internal variable whose existential
//! sits directly around the conjunct that defines it. Compiled bottom-up,
//! each step is projected away as soon as the next one has consumed it, so
//! no intermediate automaton carries more than three tapes beyond the
//! term's own variables.
//!
//! Multiplying two non-constant terms fails with `AutstrError::NonLinear`
//! when the product is formed, before anything is compiled.

use crate::algebra::{Algebra, Bound};
use crate::automaton::Automaton;
use crate::budget::Limits;
use crate::builtin::{Structure, integer_arithmetic, natural_arithmetic};
use crate::enumerate::{Enumeration, min_element};
use crate::formula::{Argument, Formula, is_identifier};
use crate::presentation::AutomaticPresentation;
use crate::primitives::INTERNAL_PREFIX;
use crate::tape::Encoding;
use crate::types::AutstrError;
use num_bigint::BigInt;
use std::collections::BTreeSet;
use std::fmt;
use std::ops;
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// TERMS
// =============================================================================

/// A linear term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A named variable.
    Variable(String),
    /// An integer constant.
    Constant(i64),
    /// Sum of two terms.
    Add(Box<Term>, Box<Term>),
    /// Constant multiple of a term.
    Scale(i64, Box<Term>),
}

impl Term {
    /// A variable.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// A constant.
    #[must_use]
    pub fn constant(value: i64) -> Self {
        Self::Constant(value)
    }

    /// Product of two terms; one side must be constant.
    pub fn try_mul(self, other: Self) -> Result<Self, AutstrError> {
        match (self, other) {
            (Self::Constant(k), t) | (t, Self::Constant(k)) => Ok(t * k),
            (a, b) => Err(AutstrError::NonLinear(format!("{} * {}", a, b))),
        }
    }

    /// Free variables, sorted.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect(&mut names);
        names
    }

    fn collect(&self, names: &mut BTreeSet<String>) {
        match self {
            Self::Variable(v) => {
                names.insert(v.clone());
            }
            Self::Constant(_) => {}
            Self::Add(a, b) => {
                a.collect(names);
                b.collect(names);
            }
            Self::Scale(_, t) => t.collect(names),
        }
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Self::Constant(value)
    }
}

impl From<&str> for Term {
    fn from(name: &str) -> Self {
        Self::var(name)
    }
}

impl ops::Add for Term {
    type Output = Term;

    fn add(self, rhs: Term) -> Term {
        Term::Add(Box::new(self), Box::new(rhs))
    }
}

impl ops::Add<i64> for Term {
    type Output = Term;

    fn add(self, rhs: i64) -> Term {
        self + Term::Constant(rhs)
    }
}

impl ops::Neg for Term {
    type Output = Term;

    fn neg(self) -> Term {
        self * -1
    }
}

impl ops::Sub for Term {
    type Output = Term;

    fn sub(self, rhs: Term) -> Term {
        self + -rhs
    }
}

impl ops::Sub<i64> for Term {
    type Output = Term;

    fn sub(self, rhs: i64) -> Term {
        self - Term::Constant(rhs)
    }
}

impl ops::Mul<i64> for Term {
    type Output = Term;

    fn mul(self, k: i64) -> Term {
        match self {
            Term::Constant(c) => match c.checked_mul(k) {
                Some(product) => Term::Constant(product),
                None => Term::Scale(k, Box::new(Term::Constant(c))),
            },
            Term::Scale(j, t) => match j.checked_mul(k) {
                Some(product) => Term::Scale(product, t),
                None => Term::Scale(k, Box::new(Term::Scale(j, t))),
            },
            t => Term::Scale(k, Box::new(t)),
        }
    }
}

impl ops::Mul<Term> for i64 {
    type Output = Term;

    fn mul(self, t: Term) -> Term {
        t * self
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(v) => f.write_str(v),
            Self::Constant(c) => write!(f, "{}", c),
            Self::Add(a, b) => write!(f, "({} + {})", a, b),
            Self::Scale(k, t) => write!(f, "{}*{}", k, t),
        }
    }
}

// =============================================================================
// LOWERING
// =============================================================================

/// A lowered term: the argument standing for its value and, when that
/// argument is an internal variable, the formula defining it.
struct Lowered {
    argument: Argument,
    definition: Option<(String, Formula)>,
}

impl Lowered {
    fn atomic(argument: Argument) -> Self {
        Self {
            argument,
            definition: None,
        }
    }

    fn defined(variable: String, definition: Formula) -> Self {
        Self {
            argument: Argument::Variable(variable.clone()),
            definition: Some((variable, definition)),
        }
    }
}

/// `∃v.(definition ∧ body)`, or `body` when nothing needs defining.
fn close(definition: Option<(String, Formula)>, body: Formula) -> Formula {
    match definition {
        Some((variable, definition)) => Formula::exists(variable, Formula::and(definition, body)),
        None => body,
    }
}

fn sum(a: Argument, b: Argument, r: Argument) -> Formula {
    Formula::atom("A", vec![a, b, r])
}

/// Lowers terms to nested `A` atoms over fresh internal variables.
#[derive(Default)]
struct Lowering {
    fresh: usize,
}

impl Lowering {
    fn fresh(&mut self) -> String {
        let name = format!("{}t{}", INTERNAL_PREFIX, self.fresh);
        self.fresh += 1;
        name
    }

    fn term(&mut self, term: &Term) -> Lowered {
        match term {
            Term::Variable(v) => Lowered::atomic(Argument::variable(v.clone())),
            Term::Constant(c) => Lowered::atomic(Argument::integer(*c)),
            Term::Add(a, b) => {
                let (a, b) = (self.term(a), self.term(b));
                let r = self.fresh();
                let step = sum(a.argument, b.argument, Argument::variable(r.clone()));
                Lowered::defined(r, close(a.definition, close(b.definition, step)))
            }
            Term::Scale(k, t) => self.scale(*k, t),
        }
    }

    fn scale(&mut self, k: i64, t: &Term) -> Lowered {
        let folded = match t {
            Term::Constant(c) => c.checked_mul(k),
            _ => None,
        };
        if let Some(product) = folded {
            return Lowered::atomic(Argument::integer(product));
        }
        match k {
            0 => return Lowered::atomic(Argument::integer(0)),
            1 => return self.term(t),
            _ => {}
        }
        let inner = self.term(t);
        let r = self.fresh();
        let target = Argument::variable(r.clone());
        let magnitude = k.unsigned_abs();
        let body = match (k > 0, magnitude) {
            (true, _) => self.multiple(magnitude, inner.argument, target),
            (false, 1) => Formula::atom("Neg", vec![inner.argument, target]),
            (false, _) => {
                let m = self.fresh();
                let positive = self.multiple(magnitude, inner.argument, Argument::variable(m.clone()));
                let negated = Formula::atom("Neg", vec![Argument::variable(m.clone()), target]);
                Formula::exists(m, Formula::and(positive, negated))
            }
        };
        Lowered::defined(r, close(inner.definition, body))
    }

    /// `b = k·a` for `k >= 2` by binary doubling: O(log k) additions, each
    /// a three-tape conjunct whose intermediate is bound immediately.
    fn multiple(&mut self, k: u64, a: Argument, b: Argument) -> Formula {
        if k <= 2 {
            return sum(a.clone(), a, b);
        }
        let c = self.fresh();
        let partial = Argument::variable(c.clone());
        let (factor, step) = if k % 2 == 0 {
            (k / 2, sum(partial.clone(), partial.clone(), b))
        } else {
            (k - 1, sum(partial.clone(), a.clone(), b))
        };
        let inner = self.multiple(factor, a, partial);
        Formula::exists(c, Formula::and(inner, step))
    }
}

// =============================================================================
// ARITHMETIC
// =============================================================================

/// Handle on an arithmetic presentation; terms compile against it.
///
/// The presentation is built once per handle and shared by every relation
/// derived from it. Clones share it too.
#[derive(Debug, Clone)]
pub struct Arithmetic {
    presentation: Arc<AutomaticPresentation>,
    encoding: Encoding,
}

impl Arithmetic {
    /// Büchi arithmetic over ℤ.
    pub fn integers(limits: Limits) -> Result<Self, AutstrError> {
        Self::from_presentation(integer_arithmetic(limits)?)
    }

    /// Büchi arithmetic over ℕ. Negation and negative scales are unavailable.
    pub fn naturals(limits: Limits) -> Result<Self, AutstrError> {
        Self::from_presentation(natural_arithmetic(limits)?)
    }

    /// Arithmetic over one of the built-in structures.
    pub fn structure(structure: Structure, limits: Limits) -> Result<Self, AutstrError> {
        Self::from_presentation(structure.presentation(limits)?)
    }

    /// Use a presentation with a numeric encoding and an `A` relation.
    pub fn from_presentation(presentation: AutomaticPresentation) -> Result<Self, AutstrError> {
        let encoding = presentation.encoding().ok_or_else(|| {
            AutstrError::MalformedEncoding("arithmetic needs a numeric encoding".to_string())
        })?;
        if presentation.relation("A").is_none() {
            return Err(AutstrError::UnknownRelation("A".to_string()));
        }
        Ok(Self {
            presentation: Arc::new(presentation),
            encoding,
        })
    }

    /// The underlying presentation.
    #[must_use]
    pub fn presentation(&self) -> &Arc<AutomaticPresentation> {
        &self.presentation
    }

    /// The element encoding.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// `a < b`.
    pub fn lt(&self, a: &Term, b: &Term) -> Result<Relation, AutstrError> {
        self.compare(a, b, |x, y| Formula::atom("Lt", vec![x, y]))
    }

    /// `a > b`.
    pub fn gt(&self, a: &Term, b: &Term) -> Result<Relation, AutstrError> {
        self.lt(b, a)
    }

    /// `a <= b`.
    pub fn le(&self, a: &Term, b: &Term) -> Result<Relation, AutstrError> {
        self.compare(a, b, |x, y| {
            Formula::or(
                Formula::atom("Lt", vec![x.clone(), y.clone()]),
                Formula::Equal(x, y),
            )
        })
    }

    /// `a >= b`.
    pub fn ge(&self, a: &Term, b: &Term) -> Result<Relation, AutstrError> {
        self.le(b, a)
    }

    /// `a = b`.
    pub fn eq(&self, a: &Term, b: &Term) -> Result<Relation, AutstrError> {
        self.compare(a, b, Formula::Equal)
    }

    /// `a | b`: `b` is a power of 2 dividing `a`.
    pub fn weakly_divides(&self, a: &Term, b: &Term) -> Result<Relation, AutstrError> {
        self.compare(a, b, |x, y| Formula::atom("B", vec![x, y]))
    }

    /// A relation from formula text over the presentation.
    pub fn relation(&self, formula: &str) -> Result<Relation, AutstrError> {
        let evaluation = self.presentation.evaluate(formula, None)?;
        Ok(self.wrap(evaluation.variables, evaluation.automaton))
    }

    fn compare(
        &self,
        a: &Term,
        b: &Term,
        comparison: impl FnOnce(Argument, Argument) -> Formula,
    ) -> Result<Relation, AutstrError> {
        for name in a.variables().iter().chain(b.variables().iter()) {
            if !is_identifier(name) {
                return Err(AutstrError::InvalidVariable(name.clone()));
            }
        }
        let mut lowering = Lowering::default();
        let (x, y) = (lowering.term(a), lowering.term(b));
        let body = comparison(x.argument, y.argument);
        let formula = close(x.definition, close(y.definition, body));
        debug!(formula = %formula, "term comparison lowered");
        let evaluation = self.presentation.evaluate_formula(&formula, None)?;
        Ok(self.wrap(evaluation.variables, evaluation.automaton))
    }

    fn wrap(&self, variables: Vec<String>, automaton: Automaton) -> Relation {
        Relation {
            arithmetic: self.clone(),
            variables,
            automaton: Arc::new(automaton),
        }
    }
}

// =============================================================================
// RELATIONS
// =============================================================================

/// An immutable relation over named variables.
///
/// Tape `i` holds `variables()[i]`; variables are sorted.
#[derive(Debug, Clone)]
pub struct Relation {
    arithmetic: Arithmetic,
    variables: Vec<String>,
    automaton: Arc<Automaton>,
}

impl Relation {
    /// Variable names in tape order.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Number of variables.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.variables.len()
    }

    /// The relation's automaton.
    #[must_use]
    pub fn automaton(&self) -> &Arc<Automaton> {
        &self.automaton
    }

    /// True if no tuple satisfies the relation.
    pub fn is_empty(&self) -> Result<bool, AutstrError> {
        Ok(self.automaton.is_empty())
    }

    /// True if finitely many tuples satisfy the relation.
    pub fn is_finite(&self) -> Result<bool, AutstrError> {
        self.with_algebra(|algebra| algebra.is_finite(&self.bound()))
    }

    /// Membership of one tuple, given in variable order.
    pub fn contains(&self, tuple: &[i64]) -> Result<bool, AutstrError> {
        if tuple.len() != self.arity() {
            return Err(AutstrError::ArityMismatch {
                relation: format!("({})", self.variables.join(", ")),
                expected: self.arity(),
                found: tuple.len(),
            });
        }
        let encoding = self.arithmetic.encoding;
        let words = tuple
            .iter()
            .map(|&v| encoding.encode(v))
            .collect::<Result<Vec<_>, _>>()?;
        self.automaton.accepts_tuple(&words)
    }

    /// Restartable enumeration of the tuples in ascending order.
    pub fn tuples(&self) -> Result<Enumeration<Encoding>, AutstrError> {
        Enumeration::new(&self.automaton, self.arithmetic.encoding)
    }

    /// Smallest value of the first variable.
    pub fn min_element(&self) -> Result<Option<BigInt>, AutstrError> {
        let budget = self.arithmetic.presentation.limits().start();
        min_element(&self.automaton, self.arithmetic.encoding, &budget)
    }

    /// Existentially quantify the named variables.
    pub fn drop<S: AsRef<str>>(&self, names: &[S]) -> Result<Relation, AutstrError> {
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        self.with_algebra(|algebra| algebra.drop(&self.bound(), &names))
            .map(|bound| self.derived(bound))
    }

    /// "For infinitely many `name`".
    pub fn exinf(&self, name: &str) -> Result<Relation, AutstrError> {
        self.with_algebra(|algebra| algebra.exinf(&self.bound(), name))
            .map(|bound| self.derived(bound))
    }

    /// Tuples in both relations, joined on shared variable names.
    pub fn intersection(&self, other: &Relation) -> Result<Relation, AutstrError> {
        self.check_same(other)?;
        self.with_algebra(|algebra| algebra.and(&self.bound(), &other.bound()))
            .map(|bound| self.derived(bound))
    }

    /// Tuples in either relation.
    pub fn union(&self, other: &Relation) -> Result<Relation, AutstrError> {
        self.check_same(other)?;
        self.with_algebra(|algebra| algebra.or(&self.bound(), &other.bound()))
            .map(|bound| self.derived(bound))
    }

    /// Tuples in this relation and not in `other`.
    pub fn difference(&self, other: &Relation) -> Result<Relation, AutstrError> {
        self.check_same(other)?;
        self.with_algebra(|algebra| algebra.difference(&self.bound(), &other.bound()))
            .map(|bound| self.derived(bound))
    }

    /// Tuples of the universe not in this relation.
    pub fn complement(&self) -> Result<Relation, AutstrError> {
        self.with_algebra(|algebra| algebra.not(&self.bound()))
            .map(|bound| self.derived(bound))
    }

    /// Minimize the automaton now.
    pub fn minify(&self) -> Result<Relation, AutstrError> {
        let budget = self.arithmetic.presentation.limits().start();
        Ok(Relation {
            arithmetic: self.arithmetic.clone(),
            variables: self.variables.clone(),
            automaton: Arc::new(self.automaton.minimize(&budget)?),
        })
    }

    fn bound(&self) -> Bound {
        Bound {
            variables: self.variables.clone(),
            automaton: self.automaton.as_ref().clone(),
        }
    }

    fn derived(&self, bound: Bound) -> Relation {
        self.arithmetic.wrap(bound.variables, bound.automaton)
    }

    fn with_algebra<T>(
        &self,
        f: impl FnOnce(Algebra<'_>) -> Result<T, AutstrError>,
    ) -> Result<T, AutstrError> {
        let presentation = &self.arithmetic.presentation;
        let budget = presentation.limits().start();
        f(Algebra::new(presentation.domains(), &budget))
    }

    fn check_same(&self, other: &Relation) -> Result<(), AutstrError> {
        if Arc::ptr_eq(
            self.arithmetic.presentation.domains(),
            other.arithmetic.presentation.domains(),
        ) {
            Ok(())
        } else {
            Err(AutstrError::AlphabetMismatch(
                "relations come from different presentations".to_string(),
            ))
        }
    }
}

impl ops::BitAnd for &Relation {
    type Output = Result<Relation, AutstrError>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}

impl ops::BitOr for &Relation {
    type Output = Result<Relation, AutstrError>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl ops::Sub for &Relation {
    type Output = Result<Relation, AutstrError>;

    fn sub(self, rhs: Self) -> Self::Output {
        self.difference(rhs)
    }
}

impl ops::Not for &Relation {
    type Output = Result<Relation, AutstrError>;

    fn not(self) -> Self::Output {
        self.complement()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn z() -> Arithmetic {
        Arithmetic::integers(Limits::default()).expect("integers")
    }

    fn x() -> Term {
        Term::var("x")
    }

    fn y() -> Term {
        Term::var("y")
    }

    /// First components of a finite relation.
    fn firsts(relation: &Relation) -> Vec<i64> {
        relation
            .tuples()
            .expect("tuples")
            .iter()
            .map(|t| i64::try_from(&t[0]).expect("small"))
            .collect()
    }

    #[test]
    fn non_linear_products_fail_at_construction() {
        let err = x().try_mul(y()).expect_err("non-linear");
        assert!(matches!(err, AutstrError::NonLinear(_)));
        assert_eq!(x().try_mul(Term::constant(3)).expect("linear"), x() * 3);
        assert_eq!(Term::constant(2).try_mul(y()).expect("linear"), y() * 2);
    }

    #[test]
    fn scale_folds_constants() {
        assert_eq!(Term::constant(4) * 3, Term::constant(12));
        assert_eq!((x() * 2) * 3, Term::Scale(6, Box::new(x())));
        assert_eq!(-x(), Term::Scale(-1, Box::new(x())));
    }

    fn atoms(formula: &Formula) -> usize {
        match formula {
            Formula::Atom { .. } => 1,
            Formula::And(l, r) => atoms(l) + atoms(r),
            Formula::Exists(_, body) => atoms(body),
            _ => 0,
        }
    }

    /// Largest number of free variables of any subformula.
    fn width(formula: &Formula) -> usize {
        let inner = match formula {
            Formula::And(l, r) => width(l).max(width(r)),
            Formula::Exists(_, body) => width(body),
            _ => 0,
        };
        inner.max(formula.free_variables().len())
    }

    fn lowered(term: &Term) -> Formula {
        let lowered = Lowering::default().term(term);
        close(lowered.definition, Formula::Truth(true))
    }

    #[test]
    fn lowering_uses_log_many_additions() {
        assert_eq!(atoms(&lowered(&(x() * 8))), 3);
        assert_eq!(atoms(&lowered(&(x() * 7))), 4);
        assert_eq!(atoms(&lowered(&(x() * 1024))), 10);
    }

    #[test]
    fn lowering_keeps_intermediates_narrow() {
        // x, the result and one partial product.
        assert_eq!(width(&lowered(&(x() * 255))), 3);
        assert_eq!(width(&lowered(&(x() * -1000))), 3);
        // A sum adds its two operands' results to the variables in scope.
        let linear = x() * 255 + y() * 100 + 7;
        assert!(width(&lowered(&linear)) <= 5);
        assert_eq!(lowered(&linear).free_variables().len(), 2);
    }

    #[test]
    fn large_coefficients_compile() {
        let z = z();
        let r = z.lt(&(x() * 255), &Term::constant(1)).expect("lt");
        assert!(r.contains(&[0]).expect("contains"));
        assert!(!r.contains(&[1]).expect("contains"));
        assert!(r.contains(&[-4]).expect("contains"));

        let r = z.eq(&(x() * 1000), &(y() - 3)).expect("eq");
        assert!(r.contains(&[2, 2003]).expect("contains"));
        assert!(r.contains(&[-1, -997]).expect("contains"));
        assert!(!r.contains(&[2, 2000]).expect("contains"));
    }

    #[test]
    fn comparisons_over_integers() {
        let z = z();
        let lt = z.lt(&x(), &(y() + 1)).expect("lt");
        assert_eq!(lt.variables(), ["x".to_string(), "y".to_string()]);
        assert!(lt.contains(&[3, 3]).expect("contains"));
        assert!(!lt.contains(&[4, 3]).expect("contains"));
        assert!(lt.contains(&[-10, -10]).expect("contains"));

        let ge = z.ge(&x(), &Term::constant(-2)).expect("ge");
        assert!(ge.contains(&[-2]).expect("contains"));
        assert!(!ge.contains(&[-3]).expect("contains"));
    }

    #[test]
    fn negative_scale_and_subtraction() {
        let z = z();
        let r = z.eq(&(x() * -3), &(y() - 2)).expect("eq");
        assert!(r.contains(&[1, -1]).expect("contains"));
        assert!(r.contains(&[-2, 8]).expect("contains"));
        assert!(!r.contains(&[1, 1]).expect("contains"));
    }

    #[test]
    fn relation_algebra() {
        let z = z();
        let small = z.lt(&x(), &Term::constant(3)).expect("lt");
        let big = z.gt(&x(), &Term::constant(0)).expect("gt");
        let between = (&small & &big).expect("and");
        assert!(between.is_finite().expect("finite"));
        assert_eq!(firsts(&between), vec![1, 2]);

        let outside = (!&between).expect("not");
        assert!(outside.contains(&[0]).expect("contains"));
        assert!(!outside.contains(&[1]).expect("contains"));

        let either = (&small | &big).expect("or");
        assert!(!either.is_empty().expect("empty"));
        let only_small = (&small - &big).expect("difference");
        // -1 and 0 share the shortest encoding length; -1 sorts first.
        assert_eq!(only_small.min_element().expect("min"), Some(BigInt::from(-1)));
        assert!(!only_small.contains(&[1]).expect("contains"));
    }

    #[test]
    fn drop_and_exinf() {
        let z = z();
        let lt = z.lt(&x(), &y()).expect("lt");
        let has_larger = lt.drop(&["y"]).expect("drop");
        assert_eq!(has_larger.variables(), ["x".to_string()]);
        assert!(has_larger.contains(&[100]).expect("contains"));
        let infinitely = lt.exinf("y").expect("exinf");
        assert!(infinitely.contains(&[-7]).expect("contains"));
    }

    #[test]
    fn naturals_reject_negative_constants() {
        let n = Arithmetic::naturals(Limits::default()).expect("naturals");
        assert!(matches!(
            n.lt(&x(), &Term::constant(-1)),
            Err(AutstrError::MalformedEncoding(_))
        ));
        let r = n.lt(&(x() * 2), &Term::constant(7)).expect("lt");
        assert_eq!(firsts(&r), vec![0, 1, 2, 3]);
    }

    #[test]
    fn invalid_variable_names() {
        let z = z();
        assert!(matches!(
            z.eq(&Term::var("%t0"), &Term::constant(1)),
            Err(AutstrError::InvalidVariable(_))
        ));
    }
}
