//! Harvested configuration

use stratum_core::{Category, Locator, RawValue};

use crate::Result;

/// One key/value pair read from a configuration source.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub key: String,
    pub value: RawValue,
    pub category: Category,
    pub locator: Locator,
}

impl Event {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<RawValue>,
        category: Category,
        locator: Locator,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            category,
            locator,
        }
    }
}

/// Everything a source produced, in the order it was read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Harvest {
    pub events: Vec<Event>,
    /// Arguments that are not configuration, e.g. command names
    pub positional: Vec<String>,
}

impl Harvest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Append everything `other` harvested after what is already here.
    pub fn extend(&mut self, other: Harvest) {
        self.events.extend(other.events);
        self.positional.extend(other.positional);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.positional.is_empty()
    }
}

/// A configuration source.
pub trait Source {
    /// Short description for diagnostics, e.g. the file path.
    fn describe(&self) -> String;

    /// Read every event the source provides.
    fn harvest(&self) -> Result<Harvest>;
}
