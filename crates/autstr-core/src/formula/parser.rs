//! Formula text to `Formula` trees, using the pest grammar in `grammar.pest`.

use super::{Argument, Formula, Literal};
use crate::types::AutstrError;
use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "formula/grammar.pest"]
struct FormulaParser;

/// Parse formula text.
pub fn parse(text: &str) -> Result<Formula, AutstrError> {
    let mut pairs = FormulaParser::parse(Rule::formula, text).map_err(|e| {
        let (line, col) = match e.line_col {
            LineColLocation::Pos(pos) | LineColLocation::Span(pos, _) => pos,
        };
        AutstrError::Syntax {
            message: e.variant.message().into_owned(),
            line,
            col,
        }
    })?;
    let root = pairs
        .next()
        .and_then(|formula| formula.into_inner().next())
        .ok_or_else(|| AutstrError::Syntax {
            message: "empty formula".to_string(),
            line: 1,
            col: 1,
        })?;
    build(root)
}

fn error(pair: &Pair<'_, Rule>, message: impl Into<String>) -> AutstrError {
    let (line, col) = pair.line_col();
    AutstrError::Syntax {
        message: message.into(),
        line,
        col,
    }
}

fn is_operator(rule: Rule) -> bool {
    matches!(rule, Rule::and_op | Rule::or_op | Rule::not_op)
}

fn build(pair: Pair<'_, Rule>) -> Result<Formula, AutstrError> {
    match pair.as_rule() {
        Rule::iff => fold(pair, Formula::iff),
        Rule::disjunction => fold(pair, Formula::or),
        Rule::conjunction => fold(pair, Formula::and),
        Rule::implication => {
            let mut inner = pair.into_inner();
            let left = build(next(&mut inner)?)?;
            match inner.next() {
                Some(right) => Ok(Formula::implies(left, build(right)?)),
                None => Ok(left),
            }
        }
        Rule::unary | Rule::primary => {
            let context = pair.clone();
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| error(&context, "empty expression"))?;
            build(inner)
        }
        Rule::negation => {
            let context = pair.clone();
            let operand = pair
                .into_inner()
                .find(|p| !is_operator(p.as_rule()))
                .ok_or_else(|| error(&context, "negation without operand"))?;
            Ok(Formula::not(build(operand)?))
        }
        Rule::quantified => quantified(pair),
        Rule::truth => {
            let is_true = pair
                .into_inner()
                .next()
                .is_some_and(|p| p.as_rule() == Rule::true_kw);
            Ok(Formula::Truth(is_true))
        }
        Rule::equality => {
            let mut inner = pair.into_inner();
            let left = argument(next(&mut inner)?)?;
            let right = argument(next(&mut inner)?)?;
            Ok(Formula::Equal(left, right))
        }
        Rule::atom => {
            let mut inner = pair.into_inner();
            let relation = next(&mut inner)?.as_str().to_string();
            let arguments = inner.map(argument).collect::<Result<Vec<_>, _>>()?;
            Ok(Formula::atom(relation, arguments))
        }
        _ => Err(error(&pair, format!("unexpected {:?}", pair.as_rule()))),
    }
}

fn next<'i>(inner: &mut pest::iterators::Pairs<'i, Rule>) -> Result<Pair<'i, Rule>, AutstrError> {
    inner.next().ok_or_else(|| AutstrError::Syntax {
        message: "incomplete expression".to_string(),
        line: 1,
        col: 1,
    })
}

/// Left-associative chain of one binary operator.
fn fold(pair: Pair<'_, Rule>, join: fn(Formula, Formula) -> Formula) -> Result<Formula, AutstrError> {
    let mut operands = pair.into_inner().filter(|p| !is_operator(p.as_rule()));
    let first = build(next_operand(&mut operands)?)?;
    operands.try_fold(first, |acc, p| Ok(join(acc, build(p)?)))
}

fn next_operand<'i>(
    operands: &mut impl Iterator<Item = Pair<'i, Rule>>,
) -> Result<Pair<'i, Rule>, AutstrError> {
    operands.next().ok_or_else(|| AutstrError::Syntax {
        message: "missing operand".to_string(),
        line: 1,
        col: 1,
    })
}

fn quantified(pair: Pair<'_, Rule>) -> Result<Formula, AutstrError> {
    let mut inner = pair.into_inner();
    let kind = next(&mut inner)?
        .into_inner()
        .next()
        .map(|p| p.as_rule())
        .unwrap_or(Rule::exists);
    let binders: Vec<String> = next(&mut inner)?
        .into_inner()
        .map(|p| p.as_str().to_string())
        .collect();
    let body = build(next(&mut inner)?)?;
    Ok(binders.into_iter().rev().fold(body, |acc, v| match kind {
        Rule::forall => Formula::forall(v, acc),
        Rule::exinf => Formula::exinf(v, acc),
        _ => Formula::exists(v, acc),
    }))
}

fn argument(pair: Pair<'_, Rule>) -> Result<Argument, AutstrError> {
    let context = pair.clone();
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| error(&context, "empty argument"))?;
    match inner.as_rule() {
        Rule::identifier => Ok(Argument::Variable(inner.as_str().to_string())),
        Rule::integer => inner
            .as_str()
            .parse::<i64>()
            .map(|n| Argument::Literal(Literal::Integer(n)))
            .map_err(|_| error(&inner, format!("integer {} out of range", inner.as_str()))),
        Rule::word => {
            let text = inner.as_str();
            let raw = text
                .get(1..text.len() - 1)
                .ok_or_else(|| error(&inner, "unterminated word"))?;
            Ok(Argument::Literal(Literal::Word(raw.to_string())))
        }
        other => Err(error(&inner, format!("unexpected {:?}", other))),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn atom(name: &str, vars: &[&str]) -> Formula {
        Formula::atom(name, vars.iter().map(|v| Argument::variable(*v)).collect())
    }

    #[test]
    fn parses_atoms_and_connectives() {
        let f = parse("A(x, y, z) and not B(x)").expect("parse");
        assert_eq!(
            f,
            Formula::and(atom("A", &["x", "y", "z"]), Formula::not(atom("B", &["x"])))
        );
    }

    #[test]
    fn precedence_not_and_or_implies() {
        let f = parse("P(x) | Q(x) & ~R(x) -> S(x)").expect("parse");
        let expected = Formula::implies(
            Formula::or(
                atom("P", &["x"]),
                Formula::and(atom("Q", &["x"]), Formula::not(atom("R", &["x"]))),
            ),
            atom("S", &["x"]),
        );
        assert_eq!(f, expected);
    }

    #[test]
    fn quantifier_body_extends_right() {
        let f = parse("exists x. P(x) and Q(x)").expect("parse");
        assert_eq!(
            f,
            Formula::exists("x", Formula::and(atom("P", &["x"]), atom("Q", &["x"])))
        );
    }

    #[test]
    fn multiple_binders_nest() {
        let spaced = parse("exists a z0.(Z(z0) and A(x,y,a))").expect("parse");
        let commas = parse("∃a, z0.(Z(z0) ∧ A(x,y,a))").expect("parse");
        assert_eq!(spaced, commas);
        match spaced {
            Formula::Exists(a, body) => {
                assert_eq!(a, "a");
                assert!(matches!(*body, Formula::Exists(ref z, _) if z == "z0"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unicode_and_ascii_quantifiers_agree() {
        assert_eq!(
            parse("∀x.¬P(x) ∨ ∃y.Q(y)").expect("parse"),
            parse("forall x. not P(x) or exists y. Q(y)").expect("parse")
        );
        assert_eq!(
            parse("all x.P(x)").expect("parse"),
            parse("forall x.P(x)").expect("parse")
        );
    }

    #[test]
    fn literals_and_equality() {
        let f = parse("R(x, -5, \"011\") and x = 3").expect("parse");
        let expected = Formula::and(
            Formula::atom(
                "R",
                vec![
                    Argument::variable("x"),
                    Argument::integer(-5),
                    Argument::Literal(Literal::Word("011".to_string())),
                ],
            ),
            Formula::Equal(Argument::variable("x"), Argument::integer(3)),
        );
        assert_eq!(f, expected);
    }

    #[test]
    fn truth_constants_and_iff() {
        assert_eq!(
            parse("true <-> false").expect("parse"),
            Formula::iff(Formula::Truth(true), Formula::Truth(false))
        );
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert!(parse("exists exists.P(exists)").is_err());
        // Keyword prefixes still form identifiers.
        assert!(parse("P(notx) and P(orange)").is_ok());
    }

    #[test]
    fn exinf_quantifier() {
        assert_eq!(
            parse("exinf y. x = y").expect("parse"),
            Formula::exinf(
                "y",
                Formula::Equal(Argument::variable("x"), Argument::variable("y"))
            )
        );
    }

    #[test]
    fn syntax_errors_carry_position() {
        match parse("A(x,").expect_err("incomplete") {
            AutstrError::Syntax { line, col, .. } => {
                assert_eq!(line, 1);
                assert!(col >= 4);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse("").is_err());
        assert!(parse("A(x) B(y)").is_err());
    }

    #[test]
    fn integer_overflow_is_syntax_error() {
        assert!(matches!(
            parse("x = 99999999999999999999"),
            Err(AutstrError::Syntax { .. })
        ));
    }
}
