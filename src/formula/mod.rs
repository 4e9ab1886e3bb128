//! Restricted formula evaluation over a row's field bindings
//!
//! Formulas may originate from remote configuration, so they are never
//! compiled into executable code: a pest grammar parses them into a small
//! AST which is walked against the current bindings. Identifiers absent
//! from the bindings evaluate to `0` (with a logged warning) rather than
//! failing, matching the form's defaulting policy.

use std::collections::BTreeMap;

use pest::Parser;
use pest_derive::*;
use thiserror::Error;

/// Wrapper around Pest's `Pair`
type Pair<'i> = pest::iterators::Pair<'i, Rule>;

/// Pest-generated parser for the formula grammar
#[derive(Parser)]
#[grammar = "formula/grammar.pest"]
struct FormulaParser;

/// Current variable bindings of one row, field id to value
pub type Bindings = BTreeMap<String, f64>;

/// A formula that could not be parsed
///
/// Covers malformed syntax as well as operators outside the grammar:
/// anything that is not arithmetic over identifiers is rejected here.
#[derive(Debug, Error)]
#[error("invalid formula:\n{0}")]
pub struct EvalError(Box<pest::error::Error<Rule>>);

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Negate(Box<Expr>),
    Binary(Op, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

/// Parse `formula` into an AST
pub fn parse(formula: &str) -> Result<Expr, EvalError> {
    let mut pairs = FormulaParser::parse(Rule::formula, formula)
        .map_err(|e| EvalError(Box::new(e)))?;
    let expr = pairs.next().unwrap_or_else(|| panic!("no expression"));
    Ok(build_expr(expr))
}

/// Parse and evaluate in one step
pub fn evaluate(formula: &str, bindings: &Bindings) -> Result<f64, EvalError> {
    Ok(parse(formula)?.eval(bindings))
}

impl Expr {
    /// Evaluate against `bindings`
    ///
    /// Plain IEEE-754 semantics: no rounding, no clamping, division by
    /// zero yields an infinity or `NaN` that the caller displays as-is.
    pub fn eval(&self, bindings: &Bindings) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::Variable(name) => match bindings.get(name) {
                Some(v) => *v,
                None => {
                    tracing::warn!("variable '{}' is unbound, defaulting to 0", name);
                    0.0
                }
            },
            Expr::Negate(e) => -e.eval(bindings),
            Expr::Binary(op, lhs, rhs) => {
                let (lhs, rhs) = (lhs.eval(bindings), rhs.eval(bindings));
                match op {
                    Op::Add => lhs + rhs,
                    Op::Sub => lhs - rhs,
                    Op::Mul => lhs * rhs,
                    Op::Div => lhs / rhs,
                }
            }
        }
    }
}

// left-associative fold of `lhs ~ (op ~ rhs)*`
macro_rules! fold_binops {
    ( $pair:expr, $build:ident, $( $sym:literal => $op:expr ),* ) => {{
        let mut inner = $pair.into_inner();
        let mut lhs = $build(inner.next().unwrap_or_else(|| panic!("no operand")));
        while let Some(op) = inner.next() {
            let op = match op.as_str() {
                $( $sym => $op, )*
                other => unreachable!("operator {:?}", other),
            };
            let rhs = $build(inner.next().unwrap_or_else(|| panic!("no rhs")));
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        lhs
    }};
}

fn build_expr(pair: Pair) -> Expr {
    fold_binops!(pair, build_term, "+" => Op::Add, "-" => Op::Sub)
}

fn build_term(pair: Pair) -> Expr {
    fold_binops!(pair, build_atom, "*" => Op::Mul, "/" => Op::Div)
}

fn build_atom(pair: Pair) -> Expr {
    match pair.as_rule() {
        Rule::number => Expr::Number(pair.as_str().parse().unwrap_or_else(|e| panic!("{}", e))),
        Rule::identifier => Expr::Variable(pair.as_str().to_string()),
        Rule::neg => {
            let inner = pair.into_inner().next().unwrap_or_else(|| panic!("no negand"));
            Expr::Negate(Box::new(build_atom(inner)))
        }
        Rule::expr => build_expr(pair),
        _ => unreachable!("{:?}", pair),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! bd {
        ( $( $k:ident : $v:expr ),* ) => {{
            #[allow(unused_mut)]
            let mut b = Bindings::new();
            $( b.insert(stringify!($k).to_string(), $v); )*
            b
        }};
    }

    macro_rules! ev {
        ( $f:expr, $b:expr => $res:expr ) => {{
            assert_eq!(evaluate($f, &$b).unwrap(), $res);
        }};
    }

    #[test]
    fn arithmetic() {
        ev!("1 + 2 * 3", bd!() => 7.0);
        ev!("(1 + 2) * 3", bd!() => 9.0);
        ev!("10 - 4 - 3", bd!() => 3.0);
        ev!("12 / 4 / 3", bd!() => 1.0);
        ev!("-2 * 3", bd!() => -6.0);
        ev!("1.5 * 2", bd!() => 3.0);
        ev!("-(1 + 2)", bd!() => -3.0);
    }

    #[test]
    fn variable_substitution() {
        ev!("a + b", bd!(a: 2.0, b: 3.0) => 5.0);
        ev!("custom_field1 * custom_field2",
            bd!(custom_field1: 4.0, custom_field2: 5.0) => 20.0);
    }

    #[test]
    fn unbound_defaults_to_zero() {
        ev!("a + b", bd!(a: 2.0) => 2.0);
        ev!("a * b", bd!(a: 2.0) => 0.0);
    }

    #[test]
    fn division_by_zero_propagates() {
        assert_eq!(evaluate("a / b", &bd!(a: 1.0, b: 0.0)).unwrap(), f64::INFINITY);
        assert!(evaluate("a / b", &bd!(a: 0.0, b: 0.0)).unwrap().is_nan());
    }

    #[test]
    fn rejected_formulas() {
        assert!(evaluate("a *", &bd!(a: 1.0)).is_err());
        assert!(evaluate("a % b", &bd!(a: 1.0, b: 2.0)).is_err());
        assert!(evaluate("a ** b", &bd!(a: 1.0, b: 1.0)).is_err());
        assert!(evaluate("", &bd!()).is_err());
        assert!(evaluate("(a + b", &bd!(a: 1.0, b: 1.0)).is_err());
    }
}
