//! Expression trees over configuration values
//!
//! Expressions are built explicitly and evaluated by [`Expr::evaluate`]:
//!
//! ```
//! use stratum_core::expr::{BinaryOp, Expr};
//! use stratum_core::Value;
//!
//! let total = Expr::binary(
//!     BinaryOp::Mul,
//!     Expr::reference("job.tasks"),
//!     Expr::literal(2_i64),
//! );
//! assert_eq!(total.variables(), vec!["job.tasks"]);
//!
//! let value = total
//!     .evaluate(&mut |key: &str| {
//!         assert_eq!(key, "job.tasks");
//!         Ok(Value::Int(8))
//!     })
//!     .unwrap();
//! assert_eq!(value, Value::Int(16));
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// Binary operators understood by the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        f.write_str(symbol)
    }
}

/// Unary operators understood by the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnaryOp {
    Neg,
    Not,
    Abs,
}

/// A node of an expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "node")]
pub enum Expr {
    Literal {
        value: Value,
    },
    /// The value of another slot, by dotted key
    Reference {
        key: String,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal {
            value: value.into(),
        }
    }

    pub fn reference(key: impl Into<String>) -> Self {
        Expr::Reference { key: key.into() }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Every key this expression references, in traversal order
    ///
    /// Keys are reported as many times as they occur.
    pub fn variables(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_variables(&mut keys);
        keys
    }

    fn collect_variables<'a>(&'a self, keys: &mut Vec<&'a str>) {
        match self {
            Expr::Literal { .. } => {}
            Expr::Reference { key } => keys.push(key),
            Expr::Unary { operand, .. } => operand.collect_variables(keys),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(keys);
                rhs.collect_variables(keys);
            }
        }
    }

    /// Replace references that appear in `replacements`
    pub fn substitute(&self, replacements: &HashMap<String, Expr>) -> Expr {
        match self {
            Expr::Literal { .. } => self.clone(),
            Expr::Reference { key } => replacements
                .get(key)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Expr::Unary { op, operand } => Expr::unary(*op, operand.substitute(replacements)),
            Expr::Binary { op, lhs, rhs } => Expr::binary(
                *op,
                lhs.substitute(replacements),
                rhs.substitute(replacements),
            ),
        }
    }

    /// Evaluate the tree, asking `resolve` for the value of every reference
    ///
    /// `and`/`or` short-circuit, so the right operand is only resolved when
    /// it can change the outcome.
    pub fn evaluate<F>(&self, resolve: &mut F) -> Result<Value>
    where
        F: FnMut(&str) -> Result<Value>,
    {
        match self {
            Expr::Literal { value } => Ok(value.clone()),
            Expr::Reference { key } => resolve(key),
            Expr::Unary { op, operand } => {
                let value = operand.evaluate(resolve)?;
                unary(*op, value).map_err(|reason| self.failure(reason))
            }
            Expr::Binary { op, lhs, rhs } => {
                let left = lhs.evaluate(resolve)?;
                if let (BinaryOp::And | BinaryOp::Or, Value::Bool(b)) = (op, &left) {
                    let decided = matches!((op, b), (BinaryOp::And, false) | (BinaryOp::Or, true));
                    if decided {
                        return Ok(Value::Bool(*b));
                    }
                }
                let right = rhs.evaluate(resolve)?;
                binary(*op, left, right).map_err(|reason| self.failure(reason))
            }
        }
    }

    fn failure(&self, reason: String) -> Error {
        Error::Evaluation {
            expression: self.to_string(),
            reason,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal { value: Value::Str(s) } => write!(f, "{s:?}"),
            Expr::Literal { value } => write!(f, "{value}"),
            Expr::Reference { key } => write!(f, "{{{key}}}"),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "-{operand}"),
                UnaryOp::Not => write!(f, "not {operand}"),
                UnaryOp::Abs => write!(f, "abs({operand})"),
            },
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
        }
    }
}

fn unary(op: UnaryOp, value: Value) -> std::result::Result<Value, String> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| "integer overflow".to_string()),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Abs, Value::Int(i)) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| "integer overflow".to_string()),
        (UnaryOp::Abs, Value::Float(x)) => Ok(Value::Float(x.abs())),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, value) => Err(format!("{op:?} is not defined for {}", value.kind())),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> std::result::Result<Value, String> {
    use BinaryOp::*;

    let mismatch = |left: &Value, right: &Value| {
        format!(
            "'{op}' is not defined for {} and {}",
            left.kind(),
            right.kind()
        )
    };

    match op {
        Add | Sub | Mul | Div | Mod => arithmetic(op, &left, &right)
            .unwrap_or_else(|| Err(mismatch(&left, &right))),
        Eq => Ok(Value::Bool(equal(&left, &right))),
        Ne => Ok(Value::Bool(!equal(&left, &right))),
        Lt | Le | Gt | Ge => {
            let ordering = order(&left, &right).ok_or_else(|| mismatch(&left, &right))?;
            let holds = match op {
                Lt => ordering.is_lt(),
                Le => ordering.is_le(),
                Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(holds))
        }
        And | Or => match (&left, &right) {
            (Value::Bool(a), Value::Bool(b)) => {
                Ok(Value::Bool(if op == And { *a && *b } else { *a || *b }))
            }
            _ => Err(mismatch(&left, &right)),
        },
    }
}

/// `None` when the operand types do not support the operator
fn arithmetic(
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> Option<std::result::Result<Value, String>> {
    use BinaryOp::*;

    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                Add => a.checked_add(b),
                Sub => a.checked_sub(b),
                Mul => a.checked_mul(b),
                Div if b == 0 => return Some(Err("division by zero".into())),
                Div => return Some(Ok(Value::Float(a as f64 / b as f64))),
                Mod if b == 0 => return Some(Err("division by zero".into())),
                Mod => a.checked_rem_euclid(b),
                _ => return None,
            };
            Some(result.map(Value::Int).ok_or_else(|| "integer overflow".into()))
        }
        (Value::Str(a), Value::Str(b)) if op == Add => Some(Ok(Value::Str(format!("{a}{b}")))),
        (Value::List(a), Value::List(b)) if op == Add => {
            Some(Ok(Value::List(a.iter().chain(b).cloned().collect())))
        }
        _ => {
            let (a, b) = (left.as_float()?, right.as_float()?);
            let result = match op {
                Add => a + b,
                Sub => a - b,
                Mul => a * b,
                Div | Mod if b == 0.0 => return Some(Err("division by zero".into())),
                Div => a / b,
                Mod => a.rem_euclid(b),
                _ => return None,
            };
            Some(Ok(Value::Float(result)))
        }
    }
}

fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            left.as_float() == right.as_float()
        }
        _ => left == right,
    }
}

fn order(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Path(a), Value::Path(b)) => Some(a.cmp(b)),
        _ => left.as_float()?.partial_cmp(&right.as_float()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_references(key: &str) -> Result<Value> {
        Err(Error::Unresolved { key: key.into() })
    }

    #[test]
    fn integer_arithmetic_stays_integral_except_division() {
        let sum = Expr::binary(BinaryOp::Add, Expr::literal(2_i64), Expr::literal(3_i64));
        assert_eq!(sum.evaluate(&mut no_references).unwrap(), Value::Int(5));

        let ratio = Expr::binary(BinaryOp::Div, Expr::literal(7_i64), Expr::literal(2_i64));
        assert_eq!(ratio.evaluate(&mut no_references).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn division_by_zero_is_an_evaluation_error() {
        let ratio = Expr::binary(BinaryOp::Div, Expr::literal(1_i64), Expr::literal(0_i64));
        let err = ratio.evaluate(&mut no_references).unwrap_err();
        assert!(matches!(err, Error::Evaluation { .. }), "got {err:?}");
    }

    #[test]
    fn and_short_circuits_before_resolving_rhs() {
        let expr = Expr::binary(
            BinaryOp::And,
            Expr::literal(false),
            Expr::reference("never.read"),
        );
        assert_eq!(expr.evaluate(&mut no_references).unwrap(), Value::Bool(false));
    }

    #[test]
    fn mixed_numeric_comparison() {
        let expr = Expr::binary(BinaryOp::Lt, Expr::literal(1_i64), Expr::literal(1.5));
        assert_eq!(expr.evaluate(&mut no_references).unwrap(), Value::Bool(true));
    }

    #[test]
    fn substitute_replaces_references() {
        let expr = Expr::binary(BinaryOp::Add, Expr::reference("a"), Expr::reference("b"));
        let mut replacements = HashMap::new();
        replacements.insert("a".to_string(), Expr::literal(1_i64));
        let substituted = expr.substitute(&replacements);
        assert_eq!(substituted.variables(), vec!["b"]);
    }

    #[test]
    fn display_uses_marker_syntax_for_references() {
        let expr = Expr::unary(
            UnaryOp::Neg,
            Expr::binary(BinaryOp::Sub, Expr::reference("a.b"), Expr::literal("x")),
        );
        assert_eq!(expr.to_string(), "-({a.b} - \"x\")");
    }
}
