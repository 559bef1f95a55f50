//! Validators attached to traits
//!
//! Constraints run after coercion. A value that fails one is reported as a
//! [`Error::ConstraintViolation`] naming the trait, the value and the
//! description of the constraint, and the assignment that produced it is
//! rolled back.
//!
//! `Null` (an unset optional value) satisfies every constraint except
//! [`Constraint::NotEmpty`].

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{Error, Result};
use crate::value::Value;

/// A caller-supplied predicate
#[derive(Clone)]
pub struct Check(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Check(..)")
    }
}

#[derive(Debug, Clone)]
pub enum Constraint {
    AtLeast(f64),
    GreaterThan(f64),
    AtMost(f64),
    LessThan(f64),
    /// Inclusive on both ends
    Between(f64, f64),
    OneOf(Vec<Value>),
    /// Matches at the start of the string form of the value
    Like(Regex),
    NotEmpty,
    All(Vec<Constraint>),
    Any(Vec<Constraint>),
    Not(Box<Constraint>),
    /// A predicate with a description for diagnostics
    Custom { description: String, check: Check },
}

impl Constraint {
    pub fn at_least(bound: impl Into<f64>) -> Self {
        Constraint::AtLeast(bound.into())
    }

    pub fn greater_than(bound: impl Into<f64>) -> Self {
        Constraint::GreaterThan(bound.into())
    }

    pub fn at_most(bound: impl Into<f64>) -> Self {
        Constraint::AtMost(bound.into())
    }

    pub fn less_than(bound: impl Into<f64>) -> Self {
        Constraint::LessThan(bound.into())
    }

    pub fn between(low: impl Into<f64>, high: impl Into<f64>) -> Self {
        Constraint::Between(low.into(), high.into())
    }

    pub fn one_of<V: Into<Value>>(choices: impl IntoIterator<Item = V>) -> Self {
        Constraint::OneOf(choices.into_iter().map(Into::into).collect())
    }

    pub fn like(pattern: &str) -> Result<Self> {
        Regex::new(&format!("^(?:{pattern})"))
            .map(Constraint::Like)
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn custom(
        description: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Constraint::Custom {
            description: description.into(),
            check: Check(Arc::new(check)),
        }
    }

    pub fn negate(self) -> Self {
        Constraint::Not(Box::new(self))
    }

    /// Whether `value` satisfies this constraint
    pub fn holds(&self, value: &Value) -> bool {
        if value.is_null() {
            return !matches!(self, Constraint::NotEmpty);
        }
        match self {
            Constraint::AtLeast(bound) => numeric(value).is_some_and(|x| x >= *bound),
            Constraint::GreaterThan(bound) => numeric(value).is_some_and(|x| x > *bound),
            Constraint::AtMost(bound) => numeric(value).is_some_and(|x| x <= *bound),
            Constraint::LessThan(bound) => numeric(value).is_some_and(|x| x < *bound),
            Constraint::Between(low, high) => {
                numeric(value).is_some_and(|x| *low <= x && x <= *high)
            }
            Constraint::OneOf(choices) => choices.contains(value),
            Constraint::Like(regex) => regex.is_match(&value.to_string()),
            Constraint::NotEmpty => match value {
                Value::Str(s) => !s.is_empty(),
                Value::List(items) => !items.is_empty(),
                Value::Path(p) => !p.as_os_str().is_empty(),
                _ => true,
            },
            Constraint::All(all) => all.iter().all(|c| c.holds(value)),
            Constraint::Any(any) => any.iter().any(|c| c.holds(value)),
            Constraint::Not(inner) => !inner.holds(value),
            Constraint::Custom { check, .. } => (check.0)(value),
        }
    }

    /// Check `value`, reporting a violation against `name`
    pub fn validate(&self, name: &str, value: &Value) -> Result<()> {
        if self.holds(value) {
            Ok(())
        } else {
            Err(Error::ConstraintViolation {
                name: name.to_string(),
                value: value.to_string(),
                constraint: self.to_string(),
            })
        }
    }
}

fn numeric(value: &Value) -> Option<f64> {
    value.as_float()
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::AtLeast(bound) => write!(f, "greater than or equal to {bound}"),
            Constraint::GreaterThan(bound) => write!(f, "greater than {bound}"),
            Constraint::AtMost(bound) => write!(f, "less than or equal to {bound}"),
            Constraint::LessThan(bound) => write!(f, "less than {bound}"),
            Constraint::Between(low, high) => write!(f, "between {low} and {high}"),
            Constraint::OneOf(choices) => write!(f, "one of [{}]", Value::List(choices.clone())),
            Constraint::Like(regex) => {
                let pattern = regex.as_str();
                let pattern = pattern
                    .strip_prefix("^(?:")
                    .and_then(|p| p.strip_suffix(')'))
                    .unwrap_or(pattern);
                write!(f, "like {pattern:?}")
            }
            Constraint::NotEmpty => f.write_str("not empty"),
            Constraint::All(parts) => write_joined(f, parts, "and"),
            Constraint::Any(parts) => write_joined(f, parts, "or"),
            Constraint::Not(inner) => write!(f, "not ({inner})"),
            Constraint::Custom { description, .. } => f.write_str(description),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Constraint], word: &str) -> fmt::Result {
    f.write_str("(")?;
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            write!(f, " {word} ")?;
        }
        write!(f, "{part}")?;
    }
    f.write_str(")")
}
