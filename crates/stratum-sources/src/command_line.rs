//! Command-line decoder
//!
//! Recognised forms, each optionally introduced by one or two dashes:
//!
//! - `--key=value` binds `key` to `value`
//! - `--key` (or `--key=`) binds `key` to null, which a `Bool` schema reads as `true`
//! - `--a.b.c=value` addresses nested keys
//! - `--(a,b)=value` and `--a.(b,c).d=value` expand groups at any level, so the
//!   latter binds both `a.b.d` and `a.c.d`
//! - a bare `-` or `--` ends configuration; everything after it is positional
//!
//! Arguments that do not start with a dash are positional.

use std::sync::LazyLock;

use regex::Regex;
use stratum_core::{Category, Locator, RawValue, Value, key};
use tracing::debug;

use crate::event::{Event, Harvest, Source};
use crate::{Error, Result};

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-{1,2}(?P<key>[^=]*)(?:=(?P<value>.*))?$").expect("valid regex")
});

/// Decodes `argv`-style arguments into configuration events.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    args: Vec<String>,
    offset: usize,
}

impl CommandLine {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            offset: 0,
        }
    }

    /// Number the arguments starting at `offset`, for when the program name
    /// or a subcommand has already been stripped from `argv`.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn decode(&self) -> Result<Harvest> {
        let mut harvest = Harvest::new();
        let mut remaining = self.args.iter().enumerate();

        while let Some((position, arg)) = remaining.next() {
            let index = position + self.offset;
            let Some(captures) = ASSIGNMENT.captures(arg) else {
                harvest.positional.push(arg.clone());
                continue;
            };

            let name = captures.name("key").map_or("", |m| m.as_str());
            let value = captures.name("value").map(|m| m.as_str());
            if name.is_empty() {
                if value.is_some() {
                    return Err(malformed(index, arg, "assignment without a key"));
                }
                harvest
                    .positional
                    .extend(remaining.by_ref().map(|(_, rest)| rest.clone()));
                break;
            }

            let raw = match value {
                Some(text) if !text.is_empty() => RawValue::text(text),
                _ => RawValue::Literal(Value::Null),
            };
            for key in expand(name).map_err(|reason| malformed(index, arg, &reason))? {
                debug!(%key, index, "command line assignment");
                harvest.push(Event::new(
                    key,
                    raw.clone(),
                    Category::CommandLine,
                    Locator::command_line(index),
                ));
            }
        }

        Ok(harvest)
    }
}

impl Source for CommandLine {
    fn describe(&self) -> String {
        "command line".to_string()
    }

    fn harvest(&self) -> Result<Harvest> {
        self.decode()
    }
}

fn malformed(index: usize, argument: &str, reason: &str) -> Error {
    Error::MalformedArgument {
        index,
        argument: argument.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a key with `(a,b)` groups into every key it names, in order.
fn expand(name: &str) -> std::result::Result<Vec<String>, String> {
    let mut keys = vec![String::new()];

    for level in levels(name)? {
        let alternatives: Vec<&str> = match level.strip_prefix('(') {
            Some(inner) => inner
                .strip_suffix(')')
                .ok_or_else(|| format!("unterminated group in {name:?}"))?
                .split(',')
                .map(str::trim)
                .collect(),
            None => vec![level],
        };
        if alternatives.iter().any(|a| a.is_empty()) {
            return Err(format!("empty name in {name:?}"));
        }

        keys = keys
            .iter()
            .flat_map(|prefix| {
                alternatives.iter().map(move |alternative| {
                    if prefix.is_empty() {
                        alternative.to_string()
                    } else {
                        format!("{prefix}.{alternative}")
                    }
                })
            })
            .collect();
    }

    for key in &keys {
        if !key::is_valid(key) {
            return Err(format!("{key:?} is not a valid key"));
        }
    }
    Ok(keys)
}

/// Split on the dots that are not inside a group.
fn levels(name: &str) -> std::result::Result<Vec<&str>, String> {
    let mut levels = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;

    for (i, c) in name.char_indices() {
        match c {
            '(' if depth == 0 => depth = 1,
            '(' => return Err(format!("nested group in {name:?}")),
            ')' if depth == 1 => depth = 0,
            ')' => return Err(format!("unbalanced `)` in {name:?}")),
            '.' if depth == 0 => {
                levels.push(&name[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(format!("unterminated group in {name:?}"));
    }
    levels.push(&name[start..]);
    Ok(levels)
}
