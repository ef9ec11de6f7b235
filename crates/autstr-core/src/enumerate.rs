//! # Enumeration
//!
//! Lazy, restartable traversal of a relation's tuples.
//!
//! ## Order
//!
//! Tuples come in ascending order of convolution length (the length of the
//! longest tape encoding), and within one length in ascending tuple order of
//! the decoded elements, first component major. For natural numbers in LSBF
//! binary this is plain numeric order.
//!
//! ## Exactly once
//!
//! The automaton is first restricted to words without trailing all-padding
//! symbols, so every tuple has exactly one accepted word. Words are produced
//! one length layer at a time by a depth-first search that only follows
//! edges from which acceptance is reachable in exactly the remaining number
//! of steps; determinism makes every path a distinct word.

use crate::automaton::Automaton;
use crate::budget::Budget;
use crate::convolution::{project, strip_padding};
use crate::tape::ElementCodec;
use crate::types::{AutstrError, StateId, Symbol};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// A restartable enumeration of a relation's tuples.
#[derive(Debug, Clone)]
pub struct Enumeration<C: ElementCodec> {
    automaton: Automaton,
    codec: C,
    /// Exclusive bound on word lengths for finite languages.
    bound: Option<usize>,
}

impl<C: ElementCodec> Enumeration<C> {
    /// Prepare an enumeration of a pad-closed relation automaton.
    pub fn new(automaton: &Automaton, codec: C) -> Result<Self, AutstrError> {
        let stripped = strip_padding(automaton)?;
        let bound = stripped.is_finite().then(|| stripped.state_count());
        debug!(
            arity = stripped.arity(),
            states = stripped.state_count(),
            finite = bound.is_some(),
            "enumeration prepared"
        );
        Ok(Self {
            automaton: stripped,
            codec,
            bound,
        })
    }

    /// Number of tapes of each tuple.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.automaton.arity()
    }

    /// True if the enumeration terminates.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.bound.is_some()
    }

    /// A fresh cursor at the first tuple.
    #[must_use]
    pub fn iter(&self) -> Tuples<'_, C> {
        Tuples {
            enumeration: self,
            length: 0,
            layers: vec![self.automaton.accepting().to_vec()],
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Decode and sort one length layer. Words the codec rejects are skipped.
    fn decode_layer(&self, words: Vec<Vec<Symbol>>) -> Vec<Vec<C::Element>> {
        let alphabet = self.automaton.alphabet();
        let arity = self.arity();
        let mut tuples = Vec::with_capacity(words.len());
        for word in words {
            let decoded = alphabet.deconvolve(&word, arity).and_then(|tapes| {
                tapes
                    .iter()
                    .map(|tape| self.codec.decode(tape))
                    .collect::<Result<Vec<_>, _>>()
            });
            match decoded {
                Ok(tuple) => tuples.push(tuple),
                Err(e) => warn!(length = word.len(), error = %e, "undecodable word skipped"),
            }
        }
        tuples.sort();
        tuples
    }
}

impl<'a, C: ElementCodec> IntoIterator for &'a Enumeration<C> {
    type Item = Vec<C::Element>;
    type IntoIter = Tuples<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Cursor over an `Enumeration`; dropping it cancels the traversal.
#[derive(Debug)]
pub struct Tuples<'a, C: ElementCodec> {
    enumeration: &'a Enumeration<C>,
    length: usize,
    /// `layers[d][s]`: an accepting state is reachable from `s` in exactly `d` steps.
    layers: Vec<Vec<bool>>,
    pending: VecDeque<Vec<C::Element>>,
    done: bool,
}

impl<C: ElementCodec> Tuples<'_, C> {
    fn extend_layers(&mut self, depth: usize) {
        let automaton = &self.enumeration.automaton;
        while self.layers.len() <= depth {
            let Some(previous) = self.layers.last() else {
                return;
            };
            let next: Vec<bool> = (0..automaton.state_count())
                .map(|s| {
                    automaton
                        .edges(StateId(s as u32))
                        .any(|(_, t)| previous[t.index()])
                })
                .collect();
            self.layers.push(next);
        }
    }

    /// All accepted words of exactly `length` symbols, in symbol order.
    fn words(&mut self, length: usize) -> Vec<Vec<Symbol>> {
        self.extend_layers(length);
        let automaton = &self.enumeration.automaton;
        let mut words = Vec::new();
        if !self.layers[length][automaton.initial().index()] {
            return words;
        }
        let mut word = Vec::with_capacity(length);
        let mut stack = vec![(automaton.initial(), 0usize)];
        while let Some((state, cursor)) = stack.pop() {
            let remaining = length - word.len();
            if remaining == 0 {
                words.push(word.clone());
                word.pop();
                continue;
            }
            let next = automaton
                .edges(state)
                .skip(cursor)
                .enumerate()
                .find(|(_, (_, t))| self.layers[remaining - 1][t.index()]);
            match next {
                Some((offset, (symbol, target))) => {
                    stack.push((state, cursor + offset + 1));
                    stack.push((target, 0));
                    word.push(symbol);
                }
                None => {
                    word.pop();
                }
            }
        }
        words
    }
}

impl<C: ElementCodec> Iterator for Tuples<'_, C> {
    type Item = Vec<C::Element>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tuple) = self.pending.pop_front() {
                return Some(tuple);
            }
            if self.done {
                return None;
            }
            if self
                .enumeration
                .bound
                .is_some_and(|bound| self.length >= bound)
            {
                self.done = true;
                return None;
            }
            let length = self.length;
            self.length += 1;
            let words = self.words(length);
            self.pending.extend(self.enumeration.decode_layer(words));
        }
    }
}

// =============================================================================
// EXTREMAL QUERIES
// =============================================================================

/// The first element of the enumeration order on the relation's first tape.
///
/// Returns `None` for an empty relation. The other tapes are projected away
/// first, so the search is one shortest-path layer walk on a unary automaton.
pub fn min_element<C: ElementCodec>(
    automaton: &Automaton,
    codec: C,
    budget: &Budget,
) -> Result<Option<C::Element>, AutstrError> {
    if automaton.arity() == 0 {
        return Err(AutstrError::ArityMismatch {
            relation: "min_element".to_string(),
            expected: 1,
            found: 0,
        });
    }
    let mut first = automaton.clone();
    for tape in (1..automaton.arity()).rev() {
        first = project(&first, tape, budget)?.minimize(budget)?;
    }
    let enumeration = Enumeration::new(&first, codec)?;
    Ok(enumeration.iter().next().and_then(|mut t| t.pop()))
}

// =============================================================================
// TESTS
// =============================================================================
