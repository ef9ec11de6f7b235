//! # Convolution Operators
//!
//! Tape-level transformations of multi-tape automata.
//!
//! - `pad` / `unpad_closure` / `strip_padding` manage trailing all-padding symbols
//! - `expand` reindexes tapes (cylindrification, repeated positions)
//! - `project` erases one tape (subset construction)
//! - `product_power` runs one single-tape automaton independently on `k` tapes
//! - `literal` / `well_formed` build small single-tape automata
//!
//! ## Pad Closure
//!
//! A relation automaton recognizes a *pad-closed* language: appending the
//! all-padding symbol to a word never changes membership. Tuples whose tapes
//! have different natural lengths then synchronize no matter how far the
//! longest tape of a surrounding product extends.

use crate::automaton::Automaton;
use crate::budget::Budget;
use crate::tape::TapeAlphabet;
use crate::types::{AutstrError, Letter, StateId, Symbol};
use std::collections::HashMap;
use tracing::debug;

// =============================================================================
// PADDING
// =============================================================================

/// Mark every state accepting that reaches an accepting state by reading
/// only all-padding symbols.
///
/// The result accepts `w` whenever the input accepts `w` followed by any
/// number of all-padding symbols.
pub fn unpad_closure(a: &Automaton) -> Result<Automaton, AutstrError> {
    let pad = a.alphabet().all_padding(a.arity());
    let mut accepting = a.accepting().to_vec();
    let mut changed = true;
    while changed {
        changed = false;
        for state in 0..a.state_count() {
            if accepting[state] {
                continue;
            }
            if a
                .successor(StateId(state as u32), pad)
                .is_some_and(|target| accepting[target.index()])
            {
                accepting[state] = true;
                changed = true;
            }
        }
    }
    a.with_accepting(accepting)
}

/// Extend the language with any number of trailing all-padding symbols.
///
/// Every accepting state moves to a fresh accepting tail state on the
/// all-padding symbol. Assumes well-formed convolutions, after which only
/// all-padding symbols can follow an all-padding symbol.
pub fn pad(a: &Automaton) -> Result<Automaton, AutstrError> {
    let symbols = a.symbol_count();
    let pad = a.alphabet().all_padding(a.arity()).index();
    let tail = StateId(a.state_count() as u32);
    let mut accepting = a.accepting().to_vec();
    let mut transitions = Vec::with_capacity((a.state_count() + 1) * symbols);
    for state in 0..a.state_count() {
        let id = StateId(state as u32);
        for s in 0..symbols {
            let target = if s == pad && accepting[state] {
                Some(tail)
            } else {
                a.successor(id, Symbol(s as u32))
            };
            transitions.push(target);
        }
    }
    transitions.extend((0..symbols).map(|s| (s == pad).then_some(tail)));
    accepting.push(true);
    Automaton::new(
        a.alphabet().clone(),
        a.arity(),
        a.initial(),
        accepting,
        transitions,
    )
}

/// Restrict a pad-closed language to its words without trailing padding.
///
/// Each tuple is then represented by exactly one word, the convolution whose
/// length is the length of its longest tape encoding.
pub fn strip_padding(a: &Automaton) -> Result<Automaton, AutstrError> {
    let closed = unpad_closure(a)?;
    let symbols = closed.symbol_count();
    let pad = closed.alphabet().all_padding(closed.arity());
    let mut transitions = Vec::with_capacity(closed.state_count() * symbols);
    for state in 0..closed.state_count() {
        let id = StateId(state as u32);
        for s in 0..symbols {
            let symbol = Symbol(s as u32);
            transitions.push(if symbol == pad {
                None
            } else {
                closed.successor(id, symbol)
            });
        }
    }
    Ok(Automaton::new(
        closed.alphabet().clone(),
        closed.arity(),
        closed.initial(),
        closed.accepting().to_vec(),
        transitions,
    )?
    .trim())
}

// =============================================================================
// REINDEXING
// =============================================================================

/// Reindex an automaton onto `arity` tapes.
///
/// Tape `i` of `a` reads tape `positions[i]` of the result. Positions may
/// repeat (the same tape feeds several inputs) and result tapes not named in
/// `positions` are unconstrained.
pub fn expand(a: &Automaton, arity: usize, positions: &[usize]) -> Result<Automaton, AutstrError> {
    if positions.len() != a.arity() {
        return Err(AutstrError::ArityMismatch {
            relation: "expand".to_string(),
            expected: a.arity(),
            found: positions.len(),
        });
    }
    if let Some(&bad) = positions.iter().find(|&&p| p >= arity) {
        return Err(AutstrError::ArityMismatch {
            relation: "expand".to_string(),
            expected: arity,
            found: bad + 1,
        });
    }
    let alphabet = a.alphabet();
    let symbols = alphabet.symbol_count(arity)?;
    let source: Vec<Symbol> = (0..symbols)
        .map(|s| {
            let letters = alphabet.unpack(Symbol(s as u32), arity);
            let picked: Vec<Letter> = positions.iter().map(|&p| letters[p]).collect();
            alphabet.pack(&picked)
        })
        .collect();
    let mut transitions = Vec::with_capacity(a.state_count() * symbols);
    for state in 0..a.state_count() {
        let id = StateId(state as u32);
        transitions.extend(source.iter().map(|&symbol| a.successor(id, symbol)));
    }
    Automaton::new(
        alphabet.clone(),
        arity,
        a.initial(),
        a.accepting().to_vec(),
        transitions,
    )
}

// =============================================================================
// PROJECTION
// =============================================================================

/// Existentially quantify tape `tape` by subset construction.
///
/// The result is closed under trailing padding of the remaining tapes but is
/// not minimized.
pub fn project(a: &Automaton, tape: usize, budget: &Budget) -> Result<Automaton, AutstrError> {
    if tape >= a.arity() {
        return Err(AutstrError::ArityMismatch {
            relation: "project".to_string(),
            expected: a.arity(),
            found: tape + 1,
        });
    }
    let alphabet = a.alphabet();
    let arity = a.arity() - 1;
    let symbols = alphabet.symbol_count(arity)?;
    let lifted: Vec<Vec<Symbol>> = (0..symbols)
        .map(|s| {
            let rest = alphabet.unpack(Symbol(s as u32), arity);
            (0..alphabet.width())
                .map(|l| {
                    let mut letters = rest.clone();
                    letters.insert(tape, l as Letter);
                    alphabet.pack(&letters)
                })
                .collect()
        })
        .collect();

    let start = vec![a.initial()];
    let mut index: HashMap<Vec<StateId>, StateId> = HashMap::new();
    index.insert(start.clone(), StateId(0));
    let mut subsets = vec![start];
    let mut accepting = Vec::new();
    let mut transitions = Vec::new();
    let mut ticker = budget.ticker("project");
    let mut next = 0;
    while next < subsets.len() {
        let members = subsets[next].clone();
        next += 1;
        accepting.push(members.iter().any(|&s| a.is_accepting(s)));
        for old_symbols in &lifted {
            ticker.tick()?;
            let mut targets: Vec<StateId> = members
                .iter()
                .flat_map(|&s| old_symbols.iter().filter_map(move |&o| a.successor(s, o)))
                .collect();
            if targets.is_empty() {
                transitions.push(None);
                continue;
            }
            targets.sort_unstable();
            targets.dedup();
            let id = match index.get(&targets) {
                Some(&id) => id,
                None => {
                    let id = StateId(subsets.len() as u32);
                    index.insert(targets.clone(), id);
                    subsets.push(targets);
                    budget.check_states("project", subsets.len())?;
                    id
                }
            };
            transitions.push(Some(id));
        }
    }
    debug!(
        operation = "project",
        tape,
        before = a.state_count(),
        states = accepting.len(),
        "tape projected"
    );
    let projected = Automaton::new(alphabet.clone(), arity, StateId(0), accepting, transitions)?;
    unpad_closure(&projected)
}

// =============================================================================
// PRODUCT POWER
// =============================================================================

/// Run a single-tape automaton independently on each of `arity` tapes.
///
/// Accepts a word iff every tape's letter sequence is accepted by `a`.
pub fn product_power(a: &Automaton, arity: usize, budget: &Budget) -> Result<Automaton, AutstrError> {
    if a.arity() != 1 {
        return Err(AutstrError::ArityMismatch {
            relation: "product_power".to_string(),
            expected: 1,
            found: a.arity(),
        });
    }
    let alphabet = a.alphabet();
    let symbols = alphabet.symbol_count(arity)?;
    let letters: Vec<Vec<Letter>> = (0..symbols)
        .map(|s| alphabet.unpack(Symbol(s as u32), arity))
        .collect();
    let start = vec![a.initial(); arity];
    let mut index: HashMap<Vec<StateId>, StateId> = HashMap::new();
    index.insert(start.clone(), StateId(0));
    let mut tuples = vec![start];
    let mut accepting = Vec::new();
    let mut transitions = Vec::new();
    let mut ticker = budget.ticker("product_power");
    let mut next = 0;
    while next < tuples.len() {
        let current = tuples[next].clone();
        next += 1;
        accepting.push(current.iter().all(|&s| a.is_accepting(s)));
        for tuple in &letters {
            ticker.tick()?;
            let target: Option<Vec<StateId>> = current
                .iter()
                .zip(tuple)
                .map(|(&s, &l)| a.successor(s, Symbol(u32::from(l))))
                .collect();
            let Some(target) = target else {
                transitions.push(None);
                continue;
            };
            let id = match index.get(&target) {
                Some(&id) => id,
                None => {
                    let id = StateId(tuples.len() as u32);
                    index.insert(target.clone(), id);
                    tuples.push(target);
                    budget.check_states("product_power", tuples.len())?;
                    id
                }
            };
            transitions.push(Some(id));
        }
    }
    Automaton::new(alphabet.clone(), arity, StateId(0), accepting, transitions)
}

// =============================================================================
// SMALL AUTOMATA
// =============================================================================

/// Single-tape words of digits followed only by padding.
pub fn well_formed(alphabet: &TapeAlphabet) -> Result<Automaton, AutstrError> {
    let padding = alphabet.padding();
    Automaton::from_fn(alphabet.clone(), 1, 2, 0, &[0, 1], |state, letters| {
        match (state, letters[0] == padding) {
            (0, false) => Some(0),
            (_, true) => Some(1),
            (_, false) => None,
        }
    })
}

/// The pad-closed singleton language of one tape word.
pub fn literal(alphabet: &TapeAlphabet, word: &[Letter]) -> Result<Automaton, AutstrError> {
    if word.iter().any(|&l| usize::from(l) >= alphabet.width() || alphabet.is_padding(l)) {
        return Err(AutstrError::MalformedEncoding(format!(
            "literal {:?} contains padding",
            alphabet.render_word(word)
        )));
    }
    let end = word.len();
    let padding = alphabet.padding();
    Automaton::from_fn(alphabet.clone(), 1, end + 1, 0, &[end], |state, letters| {
        if state == end {
            (letters[0] == padding).then_some(end)
        } else {
            (letters[0] == word[state]).then_some(state + 1)
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================
