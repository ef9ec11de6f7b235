//! # Arithmetic Scenarios
//!
//! End-to-end queries over Büchi arithmetic on the integers: linear
//! constraints, powers of two, equation systems, a prime sieve and
//! queries that run into their time budget.

use autstr_core::{Arithmetic, AutstrError, BigInt, Limits, Relation, Term};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

fn integers() -> &'static Arithmetic {
    static ARITHMETIC: OnceLock<Arithmetic> = OnceLock::new();
    ARITHMETIC.get_or_init(|| Arithmetic::integers(Limits::default()).expect("integers"))
}

fn x() -> Term {
    Term::var("x")
}

fn y() -> Term {
    Term::var("y")
}

fn z() -> Term {
    Term::var("z")
}

fn small(value: &BigInt) -> i64 {
    i64::try_from(value).expect("fits in 64 bits")
}

fn equation(lhs: Term, rhs: i64) -> Relation {
    integers().eq(&lhs, &Term::from(rhs)).expect("equation")
}

// =============================================================================
// LINEAR INEQUALITIES
// =============================================================================

mod inequalities {
    use super::*;

    #[test]
    fn sum_below_double() {
        let r = integers().lt(&(x() + y() + 3), &(2 * x())).expect("relation");
        assert_eq!(r.variables(), ["x".to_string(), "y".to_string()]);
        assert!(!r.is_empty().expect("emptiness"));
        assert!(!r.contains(&[0, 4]).expect("membership"));
        assert!(!r.contains(&[5, 4]).expect("membership"));
        assert!(r.contains(&[0, -4]).expect("membership"));
        assert!(!r.is_finite().expect("finiteness"));
    }

    #[test]
    fn membership_needs_one_value_per_variable() {
        let r = integers().lt(&x(), &y()).expect("relation");
        assert!(matches!(
            r.contains(&[1]),
            Err(AutstrError::ArityMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn product_of_variables_is_rejected() {
        assert!(matches!(x().try_mul(y()), Err(AutstrError::NonLinear(_))));
    }
}

// =============================================================================
// POWERS OF TWO
// =============================================================================

mod powers_of_two {
    use super::*;

    #[test]
    fn weak_self_division_holds_for_powers_of_two() {
        let pt = integers().weakly_divides(&x(), &x()).expect("relation");
        assert!(pt.contains(&[1 << 10]).expect("membership"));
        assert!(!pt.contains(&[3]).expect("membership"));
        assert!(pt.contains(&[1]).expect("membership"));
        assert!(!pt.contains(&[0]).expect("membership"));
    }

    #[test]
    fn powers_of_two_enumerate_in_order() {
        let pt = integers().weakly_divides(&x(), &x()).expect("relation");
        let first: Vec<i64> = pt
            .tuples()
            .expect("enumeration")
            .iter()
            .take(6)
            .map(|t| small(&t[0]))
            .collect();
        assert_eq!(first, vec![1, 2, 4, 8, 16, 32]);
    }

    #[test]
    fn powers_of_two_continue_past_machine_integers() {
        let pt = integers().weakly_divides(&x(), &x()).expect("relation");
        let powers: Vec<BigInt> = pt
            .tuples()
            .expect("enumeration")
            .iter()
            .take(100)
            .map(|mut t| t.remove(0))
            .collect();
        assert_eq!(powers.len(), 100);
        assert_eq!(powers[64], BigInt::from(1u64 << 63) * 2);
        assert_eq!(powers[99], BigInt::from(1) << 99);
        assert!(powers.windows(2).all(|w| w[1] == &w[0] * 2));
    }
}

// =============================================================================
// EQUATION SYSTEMS
// =============================================================================

mod systems {
    use super::*;

    #[test]
    fn solvable_system_has_one_solution() {
        let system = [
            equation(x() + y(), 6),
            equation(y() + z(), 12),
            equation(x() + z(), 10),
        ];
        let solution = system
            .iter()
            .skip(1)
            .try_fold(system[0].clone(), |acc, r| &acc & r)
            .expect("conjunction");
        assert!(solution.is_finite().expect("finiteness"));
        let tuples: Vec<Vec<i64>> = solution
            .tuples()
            .expect("enumeration")
            .iter()
            .map(|t| t.iter().map(small).collect())
            .collect();
        assert_eq!(tuples, vec![vec![2, 4, 8]]);
    }

    #[test]
    fn unsolvable_system_is_empty() {
        let first = equation(3 * y() + 5 * z(), 1);
        let second = equation(x() + y(), 5);
        let third = equation(2 * z() + x(), 17);
        let r = (&first & &second)
            .and_then(|r| &r & &third)
            .expect("conjunction");
        assert!(r.is_empty().expect("emptiness"));
        assert!(r.tuples().expect("enumeration").iter().next().is_none());
    }
}

// =============================================================================
// SIEVE
// =============================================================================

mod sieve {
    use super::*;

    #[test]
    fn first_five_primes() {
        let arithmetic = integers();
        let mut candidates = arithmetic.gt(&x(), &Term::from(1)).expect("candidates");
        let mut primes = Vec::new();
        for _ in 0..5 {
            let p = small(
                &candidates
                    .min_element()
                    .expect("min element")
                    .expect("candidates are never exhausted"),
            );
            primes.push(p);
            let multiples = arithmetic
                .eq(&x(), &(Term::var("k") * p))
                .expect("multiples")
                .drop(&["k"])
                .expect("drop");
            candidates = (&candidates - &multiples).expect("difference");
        }
        assert_eq!(primes, vec![2, 3, 5, 7, 11]);
    }
}

// =============================================================================
// TIME BUDGET
// =============================================================================

mod time_budget {
    use super::*;

    const TIMEOUT_MS: u64 = 40;

    fn limited() -> Arithmetic {
        let presentation = integers()
            .presentation()
            .with_limits(Limits::default().with_timeout_ms(TIMEOUT_MS));
        Arithmetic::from_presentation(presentation).expect("arithmetic")
    }

    #[test]
    fn wide_query_stops_near_its_deadline() {
        let arithmetic = limited();
        let w = Term::var("w");
        let started = Instant::now();
        let result = arithmetic.eq(&(x() * 1021 + y() * 1019), &(z() * 1013 + w * 1009));
        let elapsed = started.elapsed();
        if let Err(e) = &result {
            assert!(e.is_recoverable(), "unexpected error: {e}");
            assert!(matches!(e, AutstrError::ResourceExceeded { .. }));
        }
        // Finishing early is fine; running far past the deadline is not.
        assert!(
            elapsed < Duration::from_millis(TIMEOUT_MS) + Duration::from_secs(2),
            "took {elapsed:?}"
        );
    }

    #[test]
    fn infinite_quantifier_honors_the_deadline() {
        let arithmetic = limited();
        let started = Instant::now();
        let result = arithmetic.relation(
            "exinf y.exists z.(A(x, y, z) and B(z, y) and not Lt(z, 1000))",
        );
        let elapsed = started.elapsed();
        if let Err(e) = &result {
            assert!(matches!(e, AutstrError::ResourceExceeded { .. }), "{e}");
        }
        assert!(elapsed < Duration::from_millis(TIMEOUT_MS) + Duration::from_secs(2));
    }
}
