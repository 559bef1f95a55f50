//! Type coercion for slot values
//!
//! A slot hands the evaluated form of its raw value to its [`Schema`], which
//! either returns the typed value or explains why it cannot. The engine does
//! not interpret the explanation; it reports it as a casting error.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::key;
use crate::value::Value;

/// A caller-supplied coercion
pub trait Coerce: fmt::Debug + Send + Sync {
    /// Name of the target type, used in diagnostics
    fn type_name(&self) -> String;

    /// Convert `value`, or explain why it cannot be converted
    fn coerce(&self, value: Value) -> Result<Value, String>;
}

/// The declared type of a trait
#[derive(Debug, Clone, Default)]
pub enum Schema {
    /// Accept anything as is
    #[default]
    Any,
    Str,
    Int,
    Float,
    Bool,
    Path,
    /// A list whose items all coerce through the inner schema
    List(Box<Schema>),
    /// A list of paths whose default comes from an environment variable
    EnvPath { variable: String },
    /// The name of a component instance of the given family
    Component { family: String },
    Custom(Arc<dyn Coerce>),
}

impl Schema {
    pub fn list(inner: Schema) -> Self {
        Schema::List(Box::new(inner))
    }

    pub fn env_path(variable: impl Into<String>) -> Self {
        Schema::EnvPath {
            variable: variable.into(),
        }
    }

    pub fn component(family: impl Into<String>) -> Self {
        Schema::Component {
            family: family.into(),
        }
    }

    pub fn custom(coercer: impl Coerce + 'static) -> Self {
        Schema::Custom(Arc::new(coercer))
    }

    /// Whether coercion can never fail
    pub fn is_any(&self) -> bool {
        matches!(self, Schema::Any)
    }

    pub fn type_name(&self) -> String {
        match self {
            Schema::Any => "any".into(),
            Schema::Str => "str".into(),
            Schema::Int => "int".into(),
            Schema::Float => "float".into(),
            Schema::Bool => "bool".into(),
            Schema::Path => "path".into(),
            Schema::List(inner) => format!("list<{}>", inner.type_name()),
            Schema::EnvPath { variable } => format!("envpath<{variable}>"),
            Schema::Component { family } => format!("component<{family}>"),
            Schema::Custom(coercer) => coercer.type_name(),
        }
    }

    /// The default a trait of this type takes when it declares none
    ///
    /// Only `EnvPath` has one: the current contents of its variable, split on
    /// the platform path separator, or an empty list when it is not set.
    pub fn implicit_default(&self) -> Option<Value> {
        match self {
            Schema::EnvPath { variable } => {
                let paths = std::env::var_os(variable)
                    .map(|raw| {
                        std::env::split_paths(&raw)
                            .filter(|path| !path.as_os_str().is_empty())
                            .map(Value::Path)
                            .collect()
                    })
                    .unwrap_or_default();
                Some(Value::List(paths))
            }
            _ => None,
        }
    }

    /// Convert `value` into this type
    pub fn coerce(&self, value: Value) -> Result<Value, String> {
        match self {
            Schema::Any => Ok(value),
            Schema::Str => match value {
                Value::Null | Value::Str(_) => Ok(value),
                other => Ok(Value::Str(other.to_string())),
            },
            Schema::Int => coerce_int(value),
            Schema::Float => coerce_float(value),
            Schema::Bool => coerce_bool(value),
            Schema::Path => match value {
                Value::Null | Value::Path(_) => Ok(value),
                Value::Str(s) => Ok(Value::Path(PathBuf::from(s.trim()))),
                other => Err(format!("expected a path, found {}", other.kind())),
            },
            Schema::List(inner) => split_items(value, split_list)
                .into_iter()
                .map(|item| inner.coerce(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Schema::EnvPath { .. } => split_items(value, |text| {
                std::env::split_paths(text)
                    .filter(|path| !path.as_os_str().is_empty())
                    .map(Value::Path)
                    .collect()
            })
            .into_iter()
            .map(|item| Schema::Path.coerce(item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
            Schema::Component { family } => match value {
                Value::Null => Ok(value),
                Value::Str(s) if key::is_valid(s.trim()) => Ok(Value::Str(s.trim().to_string())),
                other => Err(format!(
                    "{:?} does not name a component of family {family}",
                    other.to_string()
                )),
            },
            Schema::Custom(coercer) => coercer.coerce(value),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

fn coerce_int(value: Value) -> Result<Value, String> {
    match value {
        Value::Null | Value::Int(_) => Ok(value),
        Value::Float(x) if x.fract() == 0.0 && x.abs() < i64::MAX as f64 => {
            Ok(Value::Int(x as i64))
        }
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| e.to_string()),
        other => Err(format!("expected an integer, found {}", other.kind())),
    }
}

fn coerce_float(value: Value) -> Result<Value, String> {
    match value {
        Value::Null | Value::Float(_) => Ok(value),
        Value::Int(i) => Ok(Value::Float(i as f64)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| e.to_string()),
        other => Err(format!("expected a number, found {}", other.kind())),
    }
}

fn coerce_bool(value: Value) -> Result<Value, String> {
    match value {
        // a bare flag
        Value::Null => Ok(Value::Bool(true)),
        Value::Bool(_) => Ok(value),
        Value::Int(0) => Ok(Value::Bool(false)),
        Value::Int(1) => Ok(Value::Bool(true)),
        Value::Str(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            other => Err(format!("{other:?} is not a boolean")),
        },
        other => Err(format!("expected a boolean, found {}", other.kind())),
    }
}

/// Split `"a, b"`, `"[a, b]"` or `"(a, b)"` into trimmed, non-empty items
fn split_list(text: &str) -> Vec<Value> {
    let text = text.trim();
    let text = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .or_else(|| text.strip_prefix('(').and_then(|t| t.strip_suffix(')')))
        .unwrap_or(text);
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(Value::from)
        .collect()
}

fn split_items(value: Value, split: impl Fn(&str) -> Vec<Value>) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::List(items) => items,
        Value::Str(s) => split(&s),
        scalar => vec![scalar],
    }
}
