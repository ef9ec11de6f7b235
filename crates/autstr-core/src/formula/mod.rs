//! # Formula Module
//!
//! Typed first-order formulas over named relations.
//!
//! Text is parsed once into a `Formula` tree (see `parser`); relation names
//! are resolved later against an explicit name-to-automaton table by the
//! compiler, never through a global registry.
//!
//! ## Grammar
//!
//! - Quantifiers: `exists x.`, `∃x.`, `forall x.`, `all x.`, `∀x.`, `exinf x.`
//!   with one or more variables (`exists a, b.` or `exists a b.`)
//! - Connectives: `not`/`¬`/`~`/`!`, `and`/`∧`/`&`, `or`/`∨`/`|`, `->`, `<->`
//! - Atoms: `R(x, y, 5, "0101")`, equality `x = y`, `true`, `false`

mod parser;

use crate::primitives::INTERNAL_PREFIX;
use crate::types::AutstrError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub use parser::parse;

/// Reserved words that are not identifiers.
pub const KEYWORDS: [&str; 9] = [
    "exists", "forall", "all", "exinf", "not", "and", "or", "true", "false",
];

/// True if `name` is a user identifier: an ASCII letter or underscore
/// followed by ASCII alphanumerics or underscores, and not a keyword.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let head = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !KEYWORDS.contains(&name)
}

/// True if `name` was generated by the engine.
#[must_use]
pub fn is_internal(name: &str) -> bool {
    name.starts_with(INTERNAL_PREFIX)
}

// =============================================================================
// AST
// =============================================================================

/// A constant argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    /// An integer in the presentation's numeric encoding.
    Integer(i64),
    /// A raw tape word, written in the alphabet's characters.
    Word(String),
}

/// An argument of an atom or equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argument {
    /// A variable.
    Variable(String),
    /// A constant.
    Literal(Literal),
}

impl Argument {
    /// A variable argument.
    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// An integer literal argument.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }
}

/// A first-order formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formula {
    /// `true` or `false`.
    Truth(bool),
    /// `R(a_1, ..., a_k)`.
    Atom {
        relation: String,
        arguments: Vec<Argument>,
    },
    /// `a = b`.
    Equal(Argument, Argument),
    /// Negation.
    Not(Box<Formula>),
    /// Conjunction.
    And(Box<Formula>, Box<Formula>),
    /// Disjunction.
    Or(Box<Formula>, Box<Formula>),
    /// Implication.
    Implies(Box<Formula>, Box<Formula>),
    /// Equivalence.
    Iff(Box<Formula>, Box<Formula>),
    /// Existential quantification.
    Exists(String, Box<Formula>),
    /// Universal quantification.
    ForAll(String, Box<Formula>),
    /// "For infinitely many".
    ExInf(String, Box<Formula>),
}

impl Formula {
    /// Parse formula text.
    pub fn parse(text: &str) -> Result<Self, AutstrError> {
        parse(text)
    }

    /// An atom.
    #[must_use]
    pub fn atom(relation: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self::Atom {
            relation: relation.into(),
            arguments,
        }
    }

    /// Negation.
    #[must_use]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Conjunction.
    #[must_use]
    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// Disjunction.
    #[must_use]
    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// Implication.
    #[must_use]
    pub fn implies(left: Self, right: Self) -> Self {
        Self::Implies(Box::new(left), Box::new(right))
    }

    /// Equivalence.
    #[must_use]
    pub fn iff(left: Self, right: Self) -> Self {
        Self::Iff(Box::new(left), Box::new(right))
    }

    /// Existential quantification.
    #[must_use]
    pub fn exists(variable: impl Into<String>, body: Self) -> Self {
        Self::Exists(variable.into(), Box::new(body))
    }

    /// Universal quantification.
    #[must_use]
    pub fn forall(variable: impl Into<String>, body: Self) -> Self {
        Self::ForAll(variable.into(), Box::new(body))
    }

    /// Infinite quantification.
    #[must_use]
    pub fn exinf(variable: impl Into<String>, body: Self) -> Self {
        Self::ExInf(variable.into(), Box::new(body))
    }

    /// Free variables, sorted.
    #[must_use]
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut free = BTreeSet::new();
        self.collect_free(&mut Vec::new(), &mut free);
        free
    }

    fn collect_free<'a>(&'a self, bound: &mut Vec<&'a str>, free: &mut BTreeSet<String>) {
        fn argument(a: &Argument, bound: &[&str], free: &mut BTreeSet<String>) {
            match a {
                Argument::Variable(v) if !bound.contains(&v.as_str()) => {
                    free.insert(v.clone());
                }
                _ => {}
            }
        }
        match self {
            Self::Truth(_) => {}
            Self::Atom { arguments, .. } => {
                for a in arguments {
                    argument(a, bound, free);
                }
            }
            Self::Equal(a, b) => {
                argument(a, bound, free);
                argument(b, bound, free);
            }
            Self::Not(inner) => inner.collect_free(bound, free),
            Self::And(l, r) | Self::Or(l, r) | Self::Implies(l, r) | Self::Iff(l, r) => {
                l.collect_free(bound, free);
                r.collect_free(bound, free);
            }
            Self::Exists(v, body) | Self::ForAll(v, body) | Self::ExInf(v, body) => {
                bound.push(v);
                body.collect_free(bound, free);
                bound.pop();
            }
        }
    }

    /// Names of all relations the formula applies.
    #[must_use]
    pub fn relations(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.visit(&mut |f| {
            if let Self::Atom { relation, .. } = f {
                names.insert(relation.clone());
            }
        });
        names
    }

    fn visit(&self, f: &mut impl FnMut(&Self)) {
        f(self);
        match self {
            Self::Truth(_) | Self::Atom { .. } | Self::Equal(..) => {}
            Self::Not(inner)
            | Self::Exists(_, inner)
            | Self::ForAll(_, inner)
            | Self::ExInf(_, inner) => inner.visit(f),
            Self::And(l, r) | Self::Or(l, r) | Self::Implies(l, r) | Self::Iff(l, r) => {
                l.visit(f);
                r.visit(f);
            }
        }
    }
}

// =============================================================================
// DISPLAY
// =============================================================================

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Word(w) => write!(f, "\"{}\"", w),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(v) => f.write_str(v),
            Self::Literal(l) => l.fmt(f),
        }
    }
}

/// Prints fully parenthesized text that parses back to the same tree
/// (for formulas over user identifiers).
impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truth(true) => f.write_str("true"),
            Self::Truth(false) => f.write_str("false"),
            Self::Atom {
                relation,
                arguments,
            } => {
                write!(f, "{}(", relation)?;
                for (i, a) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                f.write_str(")")
            }
            Self::Equal(a, b) => write!(f, "{} = {}", a, b),
            Self::Not(inner) => write!(f, "not {}", Grouped(inner)),
            Self::And(l, r) => write!(f, "({} and {})", l, r),
            Self::Or(l, r) => write!(f, "({} or {})", l, r),
            Self::Implies(l, r) => write!(f, "({} -> {})", l, r),
            Self::Iff(l, r) => write!(f, "({} <-> {})", l, r),
            Self::Exists(v, body) => write!(f, "(exists {}.{})", v, body),
            Self::ForAll(v, body) => write!(f, "(forall {}.{})", v, body),
            Self::ExInf(v, body) => write!(f, "(exinf {}.{})", v, body),
        }
    }
}

struct Grouped<'a>(&'a Formula);

impl fmt::Display for Grouped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Formula::Equal(..) => write!(f, "({})", self.0),
            other => write!(f, "{}", other),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
