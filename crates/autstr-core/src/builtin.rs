//! # Built-in Presentations
//!
//! Büchi arithmetic over ℕ and ℤ in base 2.
//!
//! The base automata (universe, addition, weak divisibility) are supplied
//! directly; every other relation is derived by `update` formulas, so each
//! presentation owns its own copies and two presentations in one process
//! never share mutable state.
//!
//! | Relation | ℕ | ℤ |
//! |---|---|---|
//! | `U(x)` | naturals | integers |
//! | `A(x, y, z)` | `x + y = z` | `x + y = z` |
//! | `B(x, y)` | `y` is a power of 2 dividing `x` | same, `y > 0` |
//! | `Z(x)` | `x = 0` | `x = 0` |
//! | `Eq(x, y)` | `x = y` | `x = y` |
//! | `Pt(x)` | `x` is a power of 2 | same |
//! | `Lt(x, y)` | `x < y` | `x < y` |
//! | `N0(x)` | | `x >= 0` |
//! | `Neg(x, y)` | | `y = -x` |

use crate::automaton::Automaton;
use crate::budget::Limits;
use crate::presentation::{AutomaticPresentation, Binding};
use crate::tape::{Encoding, TapeAlphabet};
use crate::types::{AutstrError, Letter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const DIGIT_0: Letter = 0;
const DIGIT_1: Letter = 1;
const PAD: Letter = 2;

/// The built-in structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Structure {
    /// Büchi arithmetic over the natural numbers.
    Naturals,
    /// Büchi arithmetic over the integers.
    Integers,
}

impl Structure {
    /// Build the presentation with the given limits.
    pub fn presentation(self, limits: Limits) -> Result<AutomaticPresentation, AutstrError> {
        match self {
            Self::Naturals => natural_arithmetic(limits),
            Self::Integers => integer_arithmetic(limits),
        }
    }

    /// Encoding of the structure's elements.
    #[must_use]
    pub fn encoding(self) -> Encoding {
        match self {
            Self::Naturals => Encoding::Natural,
            Self::Integers => Encoding::Integer,
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Naturals => f.write_str("naturals"),
            Self::Integers => f.write_str("integers"),
        }
    }
}

impl FromStr for Structure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "naturals" | "nat" | "N" => Ok(Self::Naturals),
            "integers" | "int" | "Z" => Ok(Self::Integers),
            other => Err(format!(
                "unknown structure {:?} (expected naturals or integers)",
                other
            )),
        }
    }
}

// =============================================================================
// BASE AUTOMATA
// =============================================================================

/// Canonical LSBF naturals: `0`, or a word ending in `1`.
fn natural_universe() -> Result<Automaton, AutstrError> {
    // 0 start, 1 read "0", 2 last digit 1, 3 last digit 0 after a prefix
    Automaton::from_fn(TapeAlphabet::binary(), 1, 4, 0, &[1, 2], |state, l| {
        match (state, l[0]) {
            (0, DIGIT_0) => Some(1),
            (_, DIGIT_1) => Some(2),
            (1..=3, DIGIT_0) => Some(3),
            _ => None,
        }
    })
}

/// A sign letter followed by a canonical magnitude; `-0` is excluded.
fn integer_universe() -> Result<Automaton, AutstrError> {
    // 0 start, 1 sign +, 2 sign -, 3 "+0", 4 last digit 1, 5 last digit 0
    Automaton::from_fn(TapeAlphabet::binary(), 1, 6, 0, &[3, 4], |state, l| {
        match (state, l[0]) {
            (0, DIGIT_0) => Some(1),
            (0, DIGIT_1) => Some(2),
            (1, DIGIT_0) => Some(3),
            (1..=5, DIGIT_1) => Some(4),
            (2..=5, DIGIT_0) => Some(5),
            _ => None,
        }
    })
}

/// Ripple-carry step of LSBF addition; padding on an addend reads as 0.
///
/// State = carry. The sum tape may only be padding where the convolution is
/// all padding, which the pad closure supplies.
fn add_step(carry: usize, letters: &[Letter]) -> Option<usize> {
    let bit = |l: Letter| match l {
        PAD => Some(0),
        d => Some(usize::from(d)),
    };
    let (x, y) = (bit(letters[0])?, bit(letters[1])?);
    if letters[2] == PAD {
        return None;
    }
    let total = x + y + carry;
    (total % 2 == usize::from(letters[2])).then_some(total / 2)
}

/// `x + y = z` over LSBF naturals.
fn natural_addition() -> Result<Automaton, AutstrError> {
    Automaton::from_fn(TapeAlphabet::binary(), 3, 2, 0, &[0], add_step)
}

/// `|x| + |y| = |z|` over sign-prefixed words; signs are ignored.
fn magnitude_addition() -> Result<Automaton, AutstrError> {
    // 0 start (reads the signs), 1 carry 0, 2 carry 1
    Automaton::from_fn(TapeAlphabet::binary(), 3, 3, 0, &[1], |state, l| {
        match state {
            0 => l.iter().all(|&x| x != PAD).then_some(1),
            carry => add_step(carry - 1, l).map(|c| c + 1),
        }
    })
}

/// Weak divisibility step: `0^n` on `y` while `x` reads `0`, then one `1`.
fn divisibility_step(state: usize, l: &[Letter]) -> Option<usize> {
    // state 0 = before the single 1 of y, 1 = after it
    match (state, l[0], l[1]) {
        (0, DIGIT_0, DIGIT_0) => Some(0),
        (0, DIGIT_0 | DIGIT_1, DIGIT_1) => Some(1),
        (1, _, PAD) => Some(1),
        _ => None,
    }
}

/// `B(x, y)`: `y = 2^n` and `2^n` divides `x`, over naturals.
fn natural_divisibility() -> Result<Automaton, AutstrError> {
    Automaton::from_fn(TapeAlphabet::binary(), 2, 2, 0, &[1], divisibility_step)
}

/// `B(x, y)` over integers: `y` must be non-negative, the sign of `x` is free.
fn integer_divisibility() -> Result<Automaton, AutstrError> {
    Automaton::from_fn(TapeAlphabet::binary(), 2, 3, 0, &[2], |state, l| {
        match state {
            0 => (l[0] != PAD && l[1] == DIGIT_0).then_some(1),
            s => divisibility_step(s - 1, l).map(|t| t + 1),
        }
    })
}

/// Non-negative integers: the sign letter is `0`.
fn non_negative() -> Result<Automaton, AutstrError> {
    Automaton::from_fn(TapeAlphabet::binary(), 1, 2, 0, &[1], |state, l| {
        match (state, l[0]) {
            (0, DIGIT_0) | (1, _) => Some(1),
            _ => None,
        }
    })
}

// =============================================================================
// PRESENTATIONS
// =============================================================================

/// Büchi arithmetic over ℕ.
pub fn natural_arithmetic(limits: Limits) -> Result<AutomaticPresentation, AutstrError> {
    let base = AutomaticPresentation::builder()
        .relation("U", natural_universe()?)
        .relation("A", natural_addition()?)
        .relation("B", natural_divisibility()?)
        .encoding(Encoding::Natural)
        .limits(limits)
        .build()?;
    let presentation = base.update([
        ("Z", Binding::from("A(x,x,x)")),
        ("Eq", Binding::from("exists z.(Z(z) and A(x,z,y))")),
        ("Pt", Binding::from("B(x,x)")),
        ("Lt", Binding::from("exists z.(not Z(z) and A(x,z,y))")),
    ])?;
    debug!(
        relations = presentation.relation_names().count(),
        "natural arithmetic ready"
    );
    Ok(presentation)
}

/// Sign cases of `x + y = z` over ℤ in terms of the magnitude adder `A0`.
const INTEGER_ADDITION: [&str; 8] = [
    "(N0(x) and N0(y) and N0(z) and A0(x,y,z))",
    "(N0(x) and N0(y) and not N0(z) and exists a z0.(Z(z0) and A0(x,y,a) and A0(a,z,z0)))",
    "(N0(x) and not N0(y) and N0(z) and A0(z,y,x))",
    "(N0(x) and not N0(y) and not N0(z) and A0(z,x,y))",
    "(not N0(x) and N0(y) and N0(z) and A0(x,z,y))",
    "(not N0(x) and N0(y) and not N0(z) and A0(z,y,x))",
    "(not N0(x) and not N0(y) and N0(z) and exists a z0.(Z(z0) and A0(x,y,a) and A0(a,z,z0)))",
    "(not N0(x) and not N0(y) and not N0(z) and A0(x,y,z))",
];

/// Büchi arithmetic over ℤ.
///
/// Addition is derived from the magnitude adder `A0` by a case split on
/// signs; `A0` is removed afterwards.
pub fn integer_arithmetic(limits: Limits) -> Result<AutomaticPresentation, AutstrError> {
    let base = AutomaticPresentation::builder()
        .relation("U", integer_universe()?)
        .relation("A0", magnitude_addition()?)
        .relation("B", integer_divisibility()?)
        .relation("N0", non_negative()?)
        .encoding(Encoding::Integer)
        .limits(limits)
        .build()?;
    let addition = INTEGER_ADDITION.join(" or ");
    let presentation = base
        .update([
            ("Z", Binding::from("A0(x,x,x)")),
            ("A", Binding::Formula(addition)),
            ("Eq", Binding::from("exists z.(Z(z) and A(x,z,y))")),
            ("Pt", Binding::from("B(x,x) and N0(x)")),
            ("Lt", Binding::from("exists z.(N0(z) and not Z(z) and A(x,z,y))")),
            ("Neg", Binding::from("exists z.(Z(z) and A(x,y,z))")),
        ])?
        .without(["A0"])?;
    debug!(
        relations = presentation.relation_names().count(),
        "integer arithmetic ready"
    );
    Ok(presentation)
}

// =============================================================================
// TESTS
// =============================================================================
