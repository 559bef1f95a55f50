//! Assignment precedence
//!
//! Every accepted assignment is stamped with a [`PriorityToken`]: the
//! [`Category`] of its source plus a counter that only ever grows within that
//! category. Tokens compare by category rank first and counter second, so a
//! later write wins over an earlier one of the same category and never over
//! one of a higher category.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Source categories, lowest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Trait defaults registered at declaration time
    Default,
    /// Ancestor values offered underneath configuration an inventory adopts
    Inherited,
    File,
    Environment,
    CommandLine,
    /// Programmatic writes
    Explicit,
}

impl Category {
    /// All categories, lowest precedence first
    pub const ALL: [Category; 6] = [
        Category::Default,
        Category::Inherited,
        Category::File,
        Category::Environment,
        Category::CommandLine,
        Category::Explicit,
    ];

    pub fn rank(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Default => "default",
            Category::Inherited => "inherited",
            Category::File => "file",
            Category::Environment => "environment",
            Category::CommandLine => "command-line",
            Category::Explicit => "explicit",
        };
        f.write_str(name)
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.to_string() == s.to_lowercase())
            .ok_or_else(|| Error::UnknownCategory {
                name: s.to_string(),
            })
    }
}

/// The stamp of one assignment
///
/// Field order matters: the derived ordering is lexicographic on
/// `(category, counter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriorityToken {
    pub category: Category,
    pub counter: u64,
}

impl fmt::Display for PriorityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.category, self.counter)
    }
}

/// Hands out priority tokens
///
/// Each nameserver owns its own authority, so independent resolution passes
/// never share counters.
#[derive(Debug, Clone, Default)]
pub struct PriorityAuthority {
    counters: [u64; Category::ALL.len()],
}

impl PriorityAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a new assignment of the given category
    pub fn stamp(&mut self, category: Category) -> PriorityToken {
        let counter = &mut self.counters[category.rank()];
        *counter += 1;
        PriorityToken {
            category,
            counter: *counter,
        }
    }

    /// Total order over tokens
    pub fn compare(a: &PriorityToken, b: &PriorityToken) -> std::cmp::Ordering {
        a.cmp(b)
    }

    /// How many tokens of `category` have been handed out
    pub fn issued(&self, category: Category) -> u64 {
        self.counters[category.rank()]
    }
}
