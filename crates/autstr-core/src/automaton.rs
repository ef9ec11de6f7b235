//! # Automaton
//!
//! Deterministic finite automata over packed multi-tape product symbols.
//!
//! An `Automaton` is an immutable value: every operation returns a new
//! automaton. The transition function is stored as a dense table of
//! `states * symbols` optional targets; a missing entry rejects.
//!
//! ## Canonical Form
//!
//! `minimize` produces the unique minimal automaton without dead or
//! unreachable states, with states numbered breadth-first from the initial
//! state in ascending symbol order. Two canonical automata accept the same
//! language iff they are structurally equal.

use crate::budget::Budget;
use crate::tape::TapeAlphabet;
use crate::types::{AutstrError, Letter, StateId, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

// =============================================================================
// COMBINE
// =============================================================================

/// Acceptance rule of a product construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combine {
    /// Intersection.
    And,
    /// Union.
    Or,
    /// Left minus right.
    Difference,
    /// Symmetric difference.
    Xor,
}

impl Combine {
    /// Acceptance of a pair given the acceptance of each side.
    #[must_use]
    pub const fn apply(self, left: bool, right: bool) -> bool {
        match self {
            Self::And => left && right,
            Self::Or => left || right,
            Self::Difference => left && !right,
            Self::Xor => left != right,
        }
    }
}

// =============================================================================
// AUTOMATON
// =============================================================================

/// A deterministic automaton reading one product symbol per step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Automaton {
    alphabet: TapeAlphabet,
    arity: usize,
    symbols: usize,
    initial: StateId,
    accepting: Vec<bool>,
    transitions: Vec<Option<StateId>>,
}

impl Automaton {
    /// Create an automaton from its parts.
    ///
    /// `transitions` holds `accepting.len() * symbols` entries, state-major.
    pub fn new(
        alphabet: TapeAlphabet,
        arity: usize,
        initial: StateId,
        accepting: Vec<bool>,
        transitions: Vec<Option<StateId>>,
    ) -> Result<Self, AutstrError> {
        let symbols = alphabet.symbol_count(arity)?;
        let automaton = Self {
            alphabet,
            arity,
            symbols,
            initial,
            accepting,
            transitions,
        };
        automaton.validate()?;
        Ok(automaton)
    }

    /// Build an automaton from a transition function over unpacked letters.
    ///
    /// States are `0..state_count`; `delta` returns `None` to reject.
    pub fn from_fn<F>(
        alphabet: TapeAlphabet,
        arity: usize,
        state_count: usize,
        initial: usize,
        accepting: &[usize],
        delta: F,
    ) -> Result<Self, AutstrError>
    where
        F: Fn(usize, &[Letter]) -> Option<usize>,
    {
        let symbols = alphabet.symbol_count(arity)?;
        let letters: Vec<Vec<Letter>> = (0..symbols)
            .map(|s| alphabet.unpack(Symbol(s as u32), arity))
            .collect();
        let mut transitions = Vec::with_capacity(state_count.saturating_mul(symbols));
        for state in 0..state_count {
            for tuple in &letters {
                transitions.push(delta(state, tuple).map(|t| StateId(t as u32)));
            }
        }
        let mut flags = vec![false; state_count];
        for &state in accepting {
            let flag = flags.get_mut(state).ok_or_else(|| {
                AutstrError::InvalidAutomaton(format!("accepting state {} out of range", state))
            })?;
            *flag = true;
        }
        Self::new(alphabet, arity, StateId(initial as u32), flags, transitions)
    }

    /// The automaton accepting nothing.
    pub fn empty(alphabet: TapeAlphabet, arity: usize) -> Result<Self, AutstrError> {
        let symbols = alphabet.symbol_count(arity)?;
        Self::new(alphabet, arity, StateId(0), vec![false], vec![None; symbols])
    }

    /// The automaton accepting every word over the product alphabet.
    pub fn universal(alphabet: TapeAlphabet, arity: usize) -> Result<Self, AutstrError> {
        let symbols = alphabet.symbol_count(arity)?;
        Self::new(
            alphabet,
            arity,
            StateId(0),
            vec![true],
            vec![Some(StateId(0)); symbols],
        )
    }

    /// Check the internal consistency of the tables.
    pub fn validate(&self) -> Result<(), AutstrError> {
        let states = self.accepting.len();
        if states == 0 {
            return Err(AutstrError::InvalidAutomaton("no states".to_string()));
        }
        if u32::try_from(states).is_err() {
            return Err(AutstrError::InvalidAutomaton(format!("{} states", states)));
        }
        if self.symbols != self.alphabet.symbol_count(self.arity)? {
            return Err(AutstrError::InvalidAutomaton(format!(
                "symbol count {} does not match {} tapes",
                self.symbols, self.arity
            )));
        }
        if Some(self.transitions.len()) != states.checked_mul(self.symbols) {
            return Err(AutstrError::InvalidAutomaton(format!(
                "transition table has {} entries, expected {} x {}",
                self.transitions.len(),
                states,
                self.symbols
            )));
        }
        if self.initial.index() >= states {
            return Err(AutstrError::InvalidAutomaton(format!(
                "initial state {} out of range",
                self.initial.0
            )));
        }
        if let Some(target) = self.transitions.iter().flatten().find(|t| t.index() >= states) {
            return Err(AutstrError::InvalidAutomaton(format!(
                "transition target {} out of range",
                target.0
            )));
        }
        Ok(())
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The per-tape alphabet.
    #[must_use]
    pub fn alphabet(&self) -> &TapeAlphabet {
        &self.alphabet
    }

    /// Number of tapes.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Number of product symbols.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols
    }

    /// Number of states.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.accepting.len()
    }

    /// The initial state.
    #[must_use]
    pub fn initial(&self) -> StateId {
        self.initial
    }

    /// True if `state` accepts.
    #[must_use]
    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.get(state.index()).copied().unwrap_or(false)
    }

    /// Acceptance flags indexed by state.
    #[must_use]
    pub fn accepting(&self) -> &[bool] {
        &self.accepting
    }

    /// Target of the transition from `state` on `symbol`.
    #[must_use]
    pub fn successor(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        self.transitions
            .get(state.index() * self.symbols + symbol.index())
            .copied()
            .flatten()
    }

    /// Outgoing transitions of `state` in ascending symbol order.
    pub fn edges(&self, state: StateId) -> impl Iterator<Item = (Symbol, StateId)> + '_ {
        let start = state.index() * self.symbols;
        self.transitions
            .get(start..start + self.symbols)
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .filter_map(|(s, t)| t.map(|t| (Symbol(s as u32), t)))
    }

    /// Incoming transitions of every state.
    #[must_use]
    pub fn predecessors(&self) -> Vec<Vec<(Symbol, StateId)>> {
        let mut preds = vec![Vec::new(); self.state_count()];
        for state in 0..self.state_count() {
            let source = StateId(state as u32);
            for (symbol, target) in self.edges(source) {
                preds[target.index()].push((symbol, source));
            }
        }
        preds
    }

    /// Copy of this automaton with new acceptance flags.
    pub fn with_accepting(&self, accepting: Vec<bool>) -> Result<Self, AutstrError> {
        if accepting.len() != self.state_count() {
            return Err(AutstrError::InvalidAutomaton(format!(
                "{} acceptance flags for {} states",
                accepting.len(),
                self.state_count()
            )));
        }
        Ok(Self {
            accepting,
            ..self.clone()
        })
    }

    /// Reject combining automata over different alphabets or tape counts.
    pub fn check_compatible(&self, other: &Self) -> Result<(), AutstrError> {
        if self.alphabet != other.alphabet {
            return Err(AutstrError::AlphabetMismatch(format!(
                "{} vs {}",
                self.alphabet, other.alphabet
            )));
        }
        if self.arity != other.arity {
            return Err(AutstrError::AlphabetMismatch(format!(
                "{} tapes vs {} tapes",
                self.arity, other.arity
            )));
        }
        Ok(())
    }

    // =========================================================================
    // RUNS
    // =========================================================================

    /// Run the automaton on a word of packed symbols.
    #[must_use]
    pub fn accepts(&self, word: &[Symbol]) -> bool {
        word.iter()
            .try_fold(self.initial, |state, &symbol| self.successor(state, symbol))
            .is_some_and(|state| self.is_accepting(state))
    }

    /// Run the automaton on the convolution of one word per tape.
    pub fn accepts_tuple(&self, words: &[Vec<Letter>]) -> Result<bool, AutstrError> {
        if words.len() != self.arity {
            return Err(AutstrError::ArityMismatch {
                relation: "tuple".to_string(),
                expected: self.arity,
                found: words.len(),
            });
        }
        Ok(self.accepts(&self.alphabet.convolve(words)?))
    }

    // =========================================================================
    // REACHABILITY
    // =========================================================================

    /// States reachable from the initial state.
    #[must_use]
    pub fn reachable(&self) -> Vec<bool> {
        let mut seen = vec![false; self.state_count()];
        seen[self.initial.index()] = true;
        let mut stack = vec![self.initial];
        while let Some(state) = stack.pop() {
            for (_, target) in self.edges(state) {
                if !seen[target.index()] {
                    seen[target.index()] = true;
                    stack.push(target);
                }
            }
        }
        seen
    }

    /// States from which an accepting state is reachable.
    #[must_use]
    pub fn coreachable(&self) -> Vec<bool> {
        let preds = self.predecessors();
        let mut live = self.accepting.clone();
        let mut stack: Vec<usize> = (0..self.state_count()).filter(|&s| live[s]).collect();
        while let Some(state) = stack.pop() {
            for &(_, source) in &preds[state] {
                if !live[source.index()] {
                    live[source.index()] = true;
                    stack.push(source.index());
                }
            }
        }
        live
    }

    /// True iff no accepting state is reachable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self
            .reachable()
            .iter()
            .zip(&self.accepting)
            .any(|(&reach, &accept)| reach && accept)
    }

    /// True iff the language is finite.
    ///
    /// After trimming every state is useful, so the language is infinite
    /// exactly when the trimmed graph has a cycle.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        !self.trim().has_cycle()
    }

    fn has_cycle(&self) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Open,
            Done,
        }
        let mut marks = vec![Mark::New; self.state_count()];
        for root in 0..self.state_count() {
            if marks[root] != Mark::New {
                continue;
            }
            marks[root] = Mark::Open;
            let mut stack = vec![(StateId(root as u32), 0usize)];
            while let Some((state, cursor)) = stack.pop() {
                match self.edges(state).nth(cursor) {
                    Some((_, target)) => {
                        stack.push((state, cursor + 1));
                        match marks[target.index()] {
                            Mark::Open => return true,
                            Mark::New => {
                                marks[target.index()] = Mark::Open;
                                stack.push((target, 0));
                            }
                            Mark::Done => {}
                        }
                    }
                    None => marks[state.index()] = Mark::Done,
                }
            }
        }
        false
    }

    // =========================================================================
    // STRUCTURAL OPERATIONS
    // =========================================================================

    /// Remove unreachable and dead states, numbering the rest breadth-first.
    #[must_use]
    pub fn trim(&self) -> Self {
        let live = self.coreachable();
        if !live[self.initial.index()] {
            return self.empty_like();
        }
        self.rebuild(&live)
    }

    /// Add an explicit rejecting sink for every missing transition.
    #[must_use]
    pub fn complete(&self) -> Self {
        if self.transitions.iter().all(Option::is_some) {
            return self.clone();
        }
        let sink = StateId(self.state_count() as u32);
        let mut transitions: Vec<Option<StateId>> = self
            .transitions
            .iter()
            .map(|t| Some(t.unwrap_or(sink)))
            .collect();
        transitions.extend(std::iter::repeat_n(Some(sink), self.symbols));
        let mut accepting = self.accepting.clone();
        accepting.push(false);
        Self {
            accepting,
            transitions,
            ..self.clone()
        }
    }

    /// The automaton accepting every word this one rejects.
    ///
    /// The automaton is completed first; flipping the acceptance of an
    /// incomplete automaton would lose the words that fall off the table.
    #[must_use]
    pub fn complement(&self) -> Self {
        let mut completed = self.complete();
        for flag in &mut completed.accepting {
            *flag = !*flag;
        }
        completed
    }

    /// Synchronous product of two automata over the same product alphabet.
    ///
    /// A missing transition on either side is read as the rejecting sink; the
    /// pair of sinks is only materialized when `combine` accepts it.
    pub fn product(
        &self,
        other: &Self,
        combine: Combine,
        budget: &Budget,
    ) -> Result<Self, AutstrError> {
        self.check_compatible(other)?;
        type Pair = (Option<StateId>, Option<StateId>);
        let keep_sinks = combine.apply(false, false);
        let start: Pair = (Some(self.initial), Some(other.initial));
        let mut index: HashMap<Pair, StateId> = HashMap::new();
        index.insert(start, StateId(0));
        let mut pairs = vec![start];
        let mut accepting = Vec::new();
        let mut transitions = Vec::new();
        let mut ticker = budget.ticker("product");
        let mut next = 0;
        while let Some(&(left, right)) = pairs.get(next) {
            next += 1;
            accepting.push(combine.apply(
                left.is_some_and(|s| self.is_accepting(s)),
                right.is_some_and(|s| other.is_accepting(s)),
            ));
            for s in 0..self.symbols {
                ticker.tick()?;
                let symbol = Symbol(s as u32);
                let target: Pair = (
                    left.and_then(|p| self.successor(p, symbol)),
                    right.and_then(|q| other.successor(q, symbol)),
                );
                if target == (None, None) && !keep_sinks {
                    transitions.push(None);
                    continue;
                }
                let id = match index.get(&target) {
                    Some(&id) => id,
                    None => {
                        let id = StateId(pairs.len() as u32);
                        index.insert(target, id);
                        pairs.push(target);
                        budget.check_states("product", pairs.len())?;
                        id
                    }
                };
                transitions.push(Some(id));
            }
        }
        debug!(
            operation = "product",
            ?combine,
            left = self.state_count(),
            right = other.state_count(),
            states = accepting.len(),
            "automaton product"
        );
        Self::new(
            self.alphabet.clone(),
            self.arity,
            StateId(0),
            accepting,
            transitions,
        )
    }

    /// The unique minimal automaton of the language, in canonical numbering.
    ///
    /// Moore partition refinement over the completed, trimmed automaton,
    /// followed by removal of the sink class.
    pub fn minimize(&self, budget: &Budget) -> Result<Self, AutstrError> {
        let trimmed = self.trim();
        let complete = trimmed.complete();
        let n = complete.state_count();
        let symbols = complete.symbols;
        budget.check_states("minimize", n)?;

        let mut classes: Vec<u32> = complete.accepting.iter().map(|&a| u32::from(a)).collect();
        let mut class_count = if complete.accepting.iter().any(|&a| a)
            && complete.accepting.iter().any(|&a| !a)
        {
            2
        } else {
            1
        };
        let mut ticker = budget.ticker("minimize");
        loop {
            budget.check_deadline("minimize")?;
            let mut ids: HashMap<Vec<u32>, u32> = HashMap::new();
            let mut refined = Vec::with_capacity(n);
            for state in 0..n {
                let mut signature = Vec::with_capacity(symbols + 1);
                signature.push(classes[state]);
                for target in &complete.transitions[state * symbols..(state + 1) * symbols] {
                    ticker.tick()?;
                    signature.push(target.map_or(u32::MAX, |t| classes[t.index()]));
                }
                let fresh = ids.len() as u32;
                refined.push(*ids.entry(signature).or_insert(fresh));
            }
            classes = refined;
            let refined_count = ids.len();
            if refined_count == class_count {
                break;
            }
            class_count = refined_count;
        }

        let mut representative = vec![usize::MAX; class_count];
        for (state, &class) in classes.iter().enumerate() {
            if representative[class as usize] == usize::MAX {
                representative[class as usize] = state;
            }
        }
        let mut accepting = Vec::with_capacity(class_count);
        let mut transitions = Vec::with_capacity(class_count * symbols);
        for &rep in &representative {
            accepting.push(complete.accepting[rep]);
            for target in &complete.transitions[rep * symbols..(rep + 1) * symbols] {
                transitions.push(target.map(|t| StateId(classes[t.index()])));
            }
        }
        let quotient = Self {
            alphabet: self.alphabet.clone(),
            arity: self.arity,
            symbols,
            initial: StateId(classes[complete.initial.index()]),
            accepting,
            transitions,
        };
        let minimal = quotient.trim();
        debug!(
            operation = "minimize",
            before = self.state_count(),
            after = minimal.state_count(),
            "automaton minimized"
        );
        Ok(minimal)
    }

    /// True iff both automata accept the same language.
    pub fn equivalent(&self, other: &Self, budget: &Budget) -> Result<bool, AutstrError> {
        Ok(self.product(other, Combine::Xor, budget)?.is_empty())
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    fn empty_like(&self) -> Self {
        Self {
            alphabet: self.alphabet.clone(),
            arity: self.arity,
            symbols: self.symbols,
            initial: StateId(0),
            accepting: vec![false],
            transitions: vec![None; self.symbols],
        }
    }

    /// Keep the states flagged in `keep` that are reachable through kept
    /// states, numbered breadth-first in symbol order.
    fn rebuild(&self, keep: &[bool]) -> Self {
        let mut ids: Vec<Option<StateId>> = vec![None; self.state_count()];
        ids[self.initial.index()] = Some(StateId(0));
        let mut order = vec![self.initial];
        let mut next = 0;
        while let Some(&state) = order.get(next) {
            next += 1;
            for (_, target) in self.edges(state) {
                if keep[target.index()] && ids[target.index()].is_none() {
                    ids[target.index()] = Some(StateId(order.len() as u32));
                    order.push(target);
                }
            }
        }
        let mut accepting = Vec::with_capacity(order.len());
        let mut transitions = Vec::with_capacity(order.len() * self.symbols);
        for &state in &order {
            accepting.push(self.is_accepting(state));
            for s in 0..self.symbols {
                transitions.push(
                    self.successor(state, Symbol(s as u32))
                        .and_then(|t| ids[t.index()]),
                );
            }
        }
        Self {
            alphabet: self.alphabet.clone(),
            arity: self.arity,
            symbols: self.symbols,
            initial: StateId(0),
            accepting,
            transitions,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn binary() -> TapeAlphabet {
        TapeAlphabet::binary()
    }

    /// Words over {0,1} ending in 1.
    fn ends_in_one() -> Automaton {
        Automaton::from_fn(binary(), 1, 2, 0, &[1], |_, letters| match letters[0] {
            0 => Some(0),
            1 => Some(1),
            _ => None,
        })
        .expect("valid automaton")
    }

    /// Words with an even number of 1s, padding rejected.
    fn even_ones() -> Automaton {
        Automaton::from_fn(binary(), 1, 2, 0, &[0], |state, letters| match letters[0] {
            0 => Some(state),
            1 => Some(1 - state),
            _ => None,
        })
        .expect("valid automaton")
    }

    fn word(letters: &[Letter]) -> Vec<Symbol> {
        letters.iter().map(|&l| Symbol(u32::from(l))).collect()
    }

    #[test]
    fn accepts_follows_transitions() {
        let a = ends_in_one();
        assert!(a.accepts(&word(&[0, 0, 1])));
        assert!(!a.accepts(&word(&[1, 0])));
        assert!(!a.accepts(&word(&[])));
        assert!(!a.accepts(&word(&[1, 2])));
    }

    #[test]
    fn invalid_tables_rejected() {
        let result = Automaton::new(binary(), 1, StateId(0), vec![true], vec![Some(StateId(3)); 3]);
        assert!(matches!(result, Err(AutstrError::InvalidAutomaton(_))));
        let result = Automaton::new(binary(), 1, StateId(0), vec![true], vec![None; 2]);
        assert!(result.is_err());
        let result = Automaton::new(binary(), 1, StateId(1), vec![true], vec![None; 3]);
        assert!(result.is_err());
    }

    #[test]
    fn complement_requires_completion() {
        let a = ends_in_one();
        let c = a.complement();
        assert!(c.accepts(&word(&[1, 2])));
        assert!(c.accepts(&word(&[])));
        assert!(!c.accepts(&word(&[0, 1])));
    }

    #[test]
    fn product_combines_acceptance() {
        let budget = Budget::unlimited();
        let both = ends_in_one()
            .product(&even_ones(), Combine::And, &budget)
            .expect("product");
        assert!(both.accepts(&word(&[1, 0, 1])));
        assert!(!both.accepts(&word(&[0, 1])));

        let either = ends_in_one()
            .product(&even_ones(), Combine::Or, &budget)
            .expect("product");
        assert!(either.accepts(&word(&[0, 1])));
        assert!(either.accepts(&word(&[])));

        let diff = ends_in_one()
            .product(&even_ones(), Combine::Difference, &budget)
            .expect("product");
        assert!(diff.accepts(&word(&[0, 1])));
        assert!(!diff.accepts(&word(&[1, 1])));
    }

    #[test]
    fn product_rejects_arity_mismatch() {
        let two = Automaton::universal(binary(), 2).expect("universal");
        let err = ends_in_one()
            .product(&two, Combine::And, &Budget::unlimited())
            .expect_err("mismatch");
        assert!(matches!(err, AutstrError::AlphabetMismatch(_)));
    }

    #[test]
    fn minimize_merges_equivalent_states() {
        // Three states where 1 and 2 are interchangeable.
        let a = Automaton::from_fn(binary(), 1, 3, 0, &[1, 2], |state, letters| {
            match (state, letters[0]) {
                (0, 0) => Some(1),
                (0, 1) => Some(2),
                (_, 0 | 1) => Some(state),
                _ => None,
            }
        })
        .expect("valid automaton");
        let m = a.minimize(&Budget::unlimited()).expect("minimize");
        assert_eq!(m.state_count(), 2);
        assert!(m.equivalent(&a, &Budget::unlimited()).expect("equivalent"));
    }

    #[test]
    fn minimize_is_canonical() {
        let budget = Budget::unlimited();
        let a = ends_in_one();
        let b = ends_in_one()
            .product(&Automaton::universal(binary(), 1).expect("universal"), Combine::And, &budget)
            .expect("product");
        assert_eq!(
            a.minimize(&budget).expect("minimize"),
            b.minimize(&budget).expect("minimize")
        );
        let m = a.minimize(&budget).expect("minimize");
        assert_eq!(m.minimize(&budget).expect("minimize"), m);
    }

    #[test]
    fn empty_language_minimizes_to_one_state() {
        let budget = Budget::unlimited();
        let none = ends_in_one()
            .product(&ends_in_one().complement(), Combine::And, &budget)
            .expect("product");
        assert!(none.is_empty());
        let m = none.minimize(&budget).expect("minimize");
        assert_eq!(m, Automaton::empty(binary(), 1).expect("empty"));
    }

    #[test]
    fn finiteness_uses_cycles_through_useful_states() {
        assert!(!ends_in_one().is_finite());
        let single = Automaton::from_fn(binary(), 1, 2, 0, &[1], |state, letters| {
            (state == 0 && letters[0] == 1).then_some(1)
        })
        .expect("valid automaton");
        assert!(single.is_finite());
        // A cycle on a dead branch does not make the language infinite.
        let dead_loop = Automaton::from_fn(binary(), 1, 3, 0, &[1], |state, letters| {
            match (state, letters[0]) {
                (0, 1) => Some(1),
                (0, 0) | (2, _) => Some(2),
                _ => None,
            }
        })
        .expect("valid automaton");
        assert!(dead_loop.is_finite());
        assert!(!dead_loop.is_empty());
    }

    #[test]
    fn state_cap_surfaces_as_resource_exceeded() {
        let budget = crate::budget::Limits::unlimited().with_max_states(1).start();
        let err = ends_in_one()
            .product(&even_ones(), Combine::And, &budget)
            .expect_err("cap");
        assert!(err.is_recoverable());
    }

    #[test]
    fn accepts_tuple_checks_arity() {
        let a = Automaton::universal(binary(), 2).expect("universal");
        assert!(a.accepts_tuple(&[vec![1], vec![0, 1]]).expect("run"));
        assert!(a.accepts_tuple(&[vec![1]]).is_err());
    }
}
