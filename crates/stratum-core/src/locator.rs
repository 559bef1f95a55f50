//! Provenance of assignments
//!
//! Locators are informational only: they travel with every assignment so that
//! diagnostics and audit trails can say where a value came from.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where an assignment came from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "source")]
pub enum Locator {
    /// Made up by the engine, e.g. a trait default
    Synthetic { description: String },
    /// A configuration file, optionally with a 1-based line number
    File { path: PathBuf, line: Option<usize> },
    /// A command-line argument, by position in `argv`
    CommandLine { index: usize },
    /// An environment variable
    Environment { variable: String },
    /// A programmatic write through the public API
    #[default]
    Api,
    /// An assignment made on behalf of another one, e.g. an inherited default
    Chain {
        this: Box<Locator>,
        next: Box<Locator>,
    },
}

impl Locator {
    pub fn synthetic(description: impl Into<String>) -> Self {
        Locator::Synthetic {
            description: description.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>, line: Option<usize>) -> Self {
        Locator::File {
            path: path.into(),
            line,
        }
    }

    pub fn command_line(index: usize) -> Self {
        Locator::CommandLine { index }
    }

    pub fn environment(variable: impl Into<String>) -> Self {
        Locator::Environment {
            variable: variable.into(),
        }
    }

    pub fn chain(this: Locator, next: Locator) -> Self {
        Locator::Chain {
            this: Box::new(this),
            next: Box::new(next),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Synthetic { description } => write!(f, "<{description}>"),
            Locator::File {
                path,
                line: Some(line),
            } => write!(f, "{}:{line}", path.display()),
            Locator::File { path, line: None } => write!(f, "{}", path.display()),
            Locator::CommandLine { index } => write!(f, "command line argument {index}"),
            Locator::Environment { variable } => write!(f, "environment variable {variable}"),
            Locator::Api => f.write_str("<api>"),
            Locator::Chain { this, next } => write!(f, "{this}, via {next}"),
        }
    }
}
