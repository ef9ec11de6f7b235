//! # Relational Operators
//!
//! Relational algebra over named-tape automata.
//!
//! A `Bound` pairs an automaton with the variable name of each tape. The
//! variable list is kept sorted; that order is the tape order. All operators
//! take and return pad-closed automata contained in the domain product `D_k`
//! and minimize their result.
//!
//! ## Domains
//!
//! `Domains` owns the padded universe `D_1` and caches its `k`-fold products.
//! It is explicitly owned by a presentation (shared between its versions), so
//! independent presentations never share base automata.

use crate::automaton::{Automaton, Combine};
use crate::budget::{Budget, Ticker};
use crate::convolution::{expand, pad, product_power, project, strip_padding, unpad_closure, well_formed};
use crate::tape::TapeAlphabet;
use crate::types::{AutstrError, StateId, Symbol};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

// =============================================================================
// DOMAINS
// =============================================================================

/// The padded universe and its cached tape products.
#[derive(Debug)]
pub struct Domains {
    alphabet: TapeAlphabet,
    universe: Arc<Automaton>,
    empty: bool,
    infinite: bool,
    powers: Mutex<BTreeMap<usize, Arc<Automaton>>>,
}

impl Domains {
    /// Build the padded universe from a single-tape universe automaton.
    pub fn new(universe: &Automaton, budget: &Budget) -> Result<Self, AutstrError> {
        if universe.arity() != 1 {
            return Err(AutstrError::ArityMismatch {
                relation: crate::primitives::UNIVERSE.to_string(),
                expected: 1,
                found: universe.arity(),
            });
        }
        let alphabet = universe.alphabet().clone();
        let padded = pad(&unpad_closure(universe)?)?;
        let padded = padded
            .product(&well_formed(&alphabet)?, Combine::And, budget)?
            .minimize(budget)?;
        let empty = padded.is_empty();
        let infinite = !strip_padding(&padded)?.is_finite();
        debug!(states = padded.state_count(), empty, infinite, "universe prepared");
        Ok(Self {
            alphabet,
            universe: Arc::new(padded),
            empty,
            infinite,
            powers: Mutex::new(BTreeMap::new()),
        })
    }

    /// The tape alphabet of the universe.
    #[must_use]
    pub fn alphabet(&self) -> &TapeAlphabet {
        &self.alphabet
    }

    /// The padded universe `D_1`.
    #[must_use]
    pub fn universe(&self) -> &Arc<Automaton> {
        &self.universe
    }

    /// True if the universe has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// True if the universe has infinitely many elements.
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    /// The domain product `D_k`; `D_0` accepts every word of the unit alphabet.
    pub fn power(&self, arity: usize, budget: &Budget) -> Result<Arc<Automaton>, AutstrError> {
        match arity {
            0 => return Ok(Arc::new(Automaton::universal(self.alphabet.clone(), 0)?)),
            1 => return Ok(Arc::clone(&self.universe)),
            _ => {}
        }
        if let Some(cached) = self.lock()?.get(&arity) {
            return Ok(Arc::clone(cached));
        }
        let power = product_power(&self.universe, arity, budget)?.minimize(budget)?;
        debug!(arity, states = power.state_count(), "domain product built");
        let mut powers = self.lock()?;
        Ok(Arc::clone(powers.entry(arity).or_insert_with(|| Arc::new(power))))
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<usize, Arc<Automaton>>>, AutstrError> {
        self.powers
            .lock()
            .map_err(|_| AutstrError::Undecidable("domain cache lock poisoned".to_string()))
    }
}

// =============================================================================
// BOUND
// =============================================================================

/// An automaton whose tapes are named by sorted, distinct variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    /// Tape names in tape order.
    pub variables: Vec<String>,
    /// The relation over those tapes.
    pub automaton: Automaton,
}

impl Bound {
    /// Tape index of a variable.
    #[must_use]
    pub fn position(&self, variable: &str) -> Option<usize> {
        self.variables
            .binary_search_by(|v| v.as_str().cmp(variable))
            .ok()
    }
}

fn merged(left: &[String], right: &[String]) -> Vec<String> {
    let mut all: Vec<String> = left.iter().chain(right).cloned().collect();
    all.sort();
    all.dedup();
    all
}

// =============================================================================
// ALGEBRA
// =============================================================================

/// Operators over one universe, sharing one budget.
#[derive(Debug, Clone, Copy)]
pub struct Algebra<'a> {
    domains: &'a Domains,
    budget: &'a Budget,
}

impl<'a> Algebra<'a> {
    /// Operators over `domains`, bounded by `budget`.
    #[must_use]
    pub fn new(domains: &'a Domains, budget: &'a Budget) -> Self {
        Self { domains, budget }
    }

    /// The universe these operators range over.
    #[must_use]
    pub fn domains(&self) -> &'a Domains {
        self.domains
    }

    /// The running budget.
    #[must_use]
    pub fn budget(&self) -> &'a Budget {
        self.budget
    }

    /// Close a supplied automaton under trailing padding and restrict it to
    /// the domain product of its arity.
    pub fn prepare(&self, automaton: &Automaton) -> Result<Automaton, AutstrError> {
        let closed = pad(&unpad_closure(automaton)?)?;
        let domain = self.domains.power(automaton.arity(), self.budget)?;
        closed
            .product(&domain, Combine::And, self.budget)?
            .minimize(self.budget)
    }

    /// True if a supplied automaton accepts a padded word outside the domain.
    pub fn escapes_domain(&self, automaton: &Automaton) -> Result<bool, AutstrError> {
        let closed = pad(&unpad_closure(automaton)?)?;
        let domain = self.domains.power(automaton.arity(), self.budget)?;
        Ok(!closed
            .product(&domain, Combine::Difference, self.budget)?
            .is_empty())
    }

    /// The closed formula `true` or `false`.
    pub fn truth(&self, value: bool) -> Result<Bound, AutstrError> {
        let alphabet = self.domains.alphabet().clone();
        let automaton = if value {
            Automaton::universal(alphabet, 0)?
        } else {
            Automaton::empty(alphabet, 0)?
        };
        Ok(Bound {
            variables: Vec::new(),
            automaton,
        })
    }

    /// Equality of two tapes.
    pub fn equality(&self) -> Result<Automaton, AutstrError> {
        let alphabet = self.domains.alphabet().clone();
        let diagonal = Automaton::from_fn(alphabet, 2, 1, 0, &[0], |_, letters| {
            (letters[0] == letters[1]).then_some(0)
        })?;
        let domain = self.domains.power(2, self.budget)?;
        diagonal
            .product(&domain, Combine::And, self.budget)?
            .minimize(self.budget)
    }

    /// Bind the tapes of a prepared automaton to argument variables.
    ///
    /// Arguments may repeat; the result's tapes are the distinct arguments in
    /// sorted order.
    pub fn apply(&self, automaton: &Automaton, arguments: &[String]) -> Result<Bound, AutstrError> {
        if arguments.len() != automaton.arity() {
            return Err(AutstrError::ArityMismatch {
                relation: "relation".to_string(),
                expected: automaton.arity(),
                found: arguments.len(),
            });
        }
        let variables = merged(arguments, &[]);
        let positions: Vec<usize> = arguments
            .iter()
            .filter_map(|a| variables.binary_search(a).ok())
            .collect();
        let identity = positions.iter().enumerate().all(|(i, &p)| i == p)
            && variables.len() == automaton.arity();
        let automaton = if identity {
            automaton.clone()
        } else {
            expand(automaton, variables.len(), &positions)?.minimize(self.budget)?
        };
        Ok(Bound {
            variables,
            automaton,
        })
    }

    /// Reindex a bound relation onto a sorted superset of its variables.
    pub fn align(&self, bound: &Bound, variables: &[String]) -> Result<Automaton, AutstrError> {
        if bound.variables == variables {
            return Ok(bound.automaton.clone());
        }
        let positions = bound
            .variables
            .iter()
            .map(|v| {
                variables
                    .binary_search(v)
                    .map_err(|_| AutstrError::UnboundVariable(v.clone()))
            })
            .collect::<Result<Vec<usize>, _>>()?;
        let expanded = expand(&bound.automaton, variables.len(), &positions)?;
        let domain = self.domains.power(variables.len(), self.budget)?;
        expanded.product(&domain, Combine::And, self.budget)
    }

    /// Reindex a bound relation onto an explicit tape order.
    ///
    /// `order` lists distinct names in any order; names that are not tapes
    /// of `bound` range over the universe.
    pub fn arrange(&self, bound: &Bound, order: &[String]) -> Result<Automaton, AutstrError> {
        for (i, name) in order.iter().enumerate() {
            if order[..i].contains(name) {
                return Err(AutstrError::InvalidVariable(name.clone()));
            }
        }
        let positions = bound
            .variables
            .iter()
            .map(|v| {
                order
                    .iter()
                    .position(|o| o == v)
                    .ok_or_else(|| AutstrError::UnboundVariable(v.clone()))
            })
            .collect::<Result<Vec<usize>, _>>()?;
        if order.len() == positions.len() && positions.iter().enumerate().all(|(i, &p)| i == p) {
            return Ok(bound.automaton.clone());
        }
        let expanded = expand(&bound.automaton, order.len(), &positions)?;
        let arranged = if order.len() > positions.len() {
            let domain = self.domains.power(order.len(), self.budget)?;
            expanded.product(&domain, Combine::And, self.budget)?
        } else {
            expanded
        };
        arranged.minimize(self.budget)
    }

    fn combine(&self, left: &Bound, right: &Bound, combine: Combine) -> Result<Bound, AutstrError> {
        let variables = merged(&left.variables, &right.variables);
        let a = self.align(left, &variables)?;
        let b = self.align(right, &variables)?;
        let automaton = a.product(&b, combine, self.budget)?.minimize(self.budget)?;
        debug!(
            operation = ?combine,
            arity = variables.len(),
            states = automaton.state_count(),
            "relations combined"
        );
        Ok(Bound {
            variables,
            automaton,
        })
    }

    /// Conjunction.
    pub fn and(&self, left: &Bound, right: &Bound) -> Result<Bound, AutstrError> {
        self.combine(left, right, Combine::And)
    }

    /// Disjunction.
    pub fn or(&self, left: &Bound, right: &Bound) -> Result<Bound, AutstrError> {
        self.combine(left, right, Combine::Or)
    }

    /// Tuples of `left` not in `right`.
    pub fn difference(&self, left: &Bound, right: &Bound) -> Result<Bound, AutstrError> {
        self.combine(left, right, Combine::Difference)
    }

    /// Complement within the domain product.
    pub fn not(&self, bound: &Bound) -> Result<Bound, AutstrError> {
        let domain = self.domains.power(bound.variables.len(), self.budget)?;
        let automaton = domain
            .product(&bound.automaton, Combine::Difference, self.budget)?
            .minimize(self.budget)?;
        Ok(Bound {
            variables: bound.variables.clone(),
            automaton,
        })
    }

    /// Material implication.
    pub fn implies(&self, left: &Bound, right: &Bound) -> Result<Bound, AutstrError> {
        self.or(&self.not(left)?, right)
    }

    /// Equivalence: the complement of the symmetric difference.
    pub fn iff(&self, left: &Bound, right: &Bound) -> Result<Bound, AutstrError> {
        self.not(&self.combine(left, right, Combine::Xor)?)
    }

    /// Make `variable` a tape of `bound`; a new tape ranges over the universe.
    fn with_variable(&self, bound: &Bound, variable: &str) -> Result<(Bound, usize), AutstrError> {
        if let Some(tape) = bound.position(variable) {
            return Ok((bound.clone(), tape));
        }
        let variables = merged(&bound.variables, &[variable.to_string()]);
        let automaton = self.align(bound, &variables)?;
        let widened = Bound {
            variables,
            automaton,
        };
        let tape = widened.position(variable).unwrap_or(0);
        Ok((widened, tape))
    }

    /// Existential quantification: erase the variable's tape.
    pub fn exists(&self, bound: &Bound, variable: &str) -> Result<Bound, AutstrError> {
        let (bound, tape) = self.with_variable(bound, variable)?;
        let automaton = project(&bound.automaton, tape, self.budget)?.minimize(self.budget)?;
        let mut variables = bound.variables;
        variables.remove(tape);
        Ok(Bound {
            variables,
            automaton,
        })
    }

    /// Universal quantification as `not exists not`.
    pub fn forall(&self, bound: &Bound, variable: &str) -> Result<Bound, AutstrError> {
        self.not(&self.exists(&self.not(bound)?, variable)?)
    }

    /// Existentially quantify several variables, highest tape first.
    pub fn drop(&self, bound: &Bound, variables: &[String]) -> Result<Bound, AutstrError> {
        let mut ordered: Vec<&String> = variables.iter().collect();
        ordered.sort();
        ordered.dedup();
        ordered
            .into_iter()
            .rev()
            .try_fold(bound.clone(), |acc, v| self.exists(&acc, v))
    }

    /// Infinite quantification: the tuples of the other tapes for which the
    /// slice over `variable` is infinite.
    ///
    /// A state is marked live when, reading only symbols where `variable`
    /// carries a digit and every other tape is padding, it can reach a cycle
    /// of states that still reach acceptance that way. The marked automaton
    /// is then projected on the remaining tapes.
    pub fn exinf(&self, bound: &Bound, variable: &str) -> Result<Bound, AutstrError> {
        let (bound, tape) = self.with_variable(bound, variable)?;
        let a = &bound.automaton;
        self.budget.check_deadline("exinf")?;
        let mut ticker = self.budget.ticker("exinf");
        let alphabet = a.alphabet();
        let arity = a.arity();
        let slice_symbols: Vec<Symbol> = (0..alphabet.digit_count())
            .map(|digit| {
                let mut letters = vec![alphabet.padding(); arity];
                letters[tape] = digit as u8;
                alphabet.pack(&letters)
            })
            .collect();
        let n = a.state_count();
        let mut forward: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut backward: Vec<Vec<usize>> = vec![Vec::new(); n];
        for state in 0..n {
            for &symbol in &slice_symbols {
                ticker.tick()?;
                if let Some(target) = a.successor(StateId(state as u32), symbol) {
                    forward[state].push(target.index());
                    backward[target.index()].push(state);
                }
            }
        }
        let finals: Vec<usize> = (0..n).filter(|&s| a.accepting()[s]).collect();
        let accepting_slice = backward_closure(&backward, finals, &mut ticker)?;
        let restricted: Vec<Vec<usize>> = forward
            .iter()
            .enumerate()
            .map(|(s, targets)| {
                if accepting_slice[s] {
                    targets.iter().copied().filter(|&t| accepting_slice[t]).collect()
                } else {
                    Vec::new()
                }
            })
            .collect();
        let cyclic = cyclic_states(&restricted, &mut ticker)?;
        let seeds: Vec<usize> = (0..n).filter(|&s| cyclic[s]).collect();
        let live = backward_closure(&backward, seeds, &mut ticker)?;
        let marked = a.with_accepting(live)?;

        let projected = project(&marked, tape, self.budget)?;
        let domain = self.domains.power(arity - 1, self.budget)?;
        let automaton = projected
            .product(&domain, Combine::And, self.budget)?
            .minimize(self.budget)?;
        debug!(
            operation = "exinf",
            variable,
            before = n,
            states = automaton.state_count(),
            "infinite quantifier applied"
        );
        let mut variables = bound.variables.clone();
        variables.remove(tape);
        Ok(Bound {
            variables,
            automaton,
        })
    }

    /// True if a bound relation has finitely many tuples.
    pub fn is_finite(&self, bound: &Bound) -> Result<bool, AutstrError> {
        Ok(strip_padding(&bound.automaton)?.is_finite())
    }
}

/// States that reach one of `seeds` along `backward` edges reversed.
fn backward_closure(
    backward: &[Vec<usize>],
    seeds: Vec<usize>,
    ticker: &mut Ticker<'_>,
) -> Result<Vec<bool>, AutstrError> {
    let mut marked = vec![false; backward.len()];
    for &s in &seeds {
        marked[s] = true;
    }
    let mut stack = seeds;
    while let Some(state) = stack.pop() {
        for &source in &backward[state] {
            ticker.tick()?;
            if !marked[source] {
                marked[source] = true;
                stack.push(source);
            }
        }
    }
    Ok(marked)
}

/// States lying on a cycle (Tarjan's strongly connected components).
fn cyclic_states(
    successors: &[Vec<usize>],
    ticker: &mut Ticker<'_>,
) -> Result<Vec<bool>, AutstrError> {
    const UNSEEN: usize = usize::MAX;
    let n = successors.len();
    let mut index = vec![UNSEEN; n];
    let mut low = vec![0; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut cyclic = vec![false; n];
    let mut counter = 0;
    for root in 0..n {
        if index[root] != UNSEEN {
            continue;
        }
        index[root] = counter;
        low[root] = counter;
        counter += 1;
        stack.push(root);
        on_stack[root] = true;
        let mut work = vec![(root, 0usize)];
        while let Some((v, i)) = work.pop() {
            ticker.tick()?;
            if let Some(&w) = successors[v].get(i) {
                work.push((v, i + 1));
                if index[w] == UNSEEN {
                    index[w] = counter;
                    low[w] = counter;
                    counter += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    work.push((w, 0));
                } else if on_stack[w] {
                    low[v] = low[v].min(index[w]);
                }
                continue;
            }
            if let Some(&(parent, _)) = work.last() {
                low[parent] = low[parent].min(low[v]);
            }
            if low[v] == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                if component.len() > 1 || successors[v].contains(&v) {
                    for w in component {
                        cyclic[w] = true;
                    }
                }
            }
        }
    }
    Ok(cyclic)
}

// =============================================================================
// TESTS
// =============================================================================
