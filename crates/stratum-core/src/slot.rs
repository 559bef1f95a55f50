//! Value cells
//!
//! A [`Slot`] holds the raw value of the highest-priority assignment it has
//! received, the provenance of that assignment, and a memoized evaluation of
//! it. Slots live in a [`Nameserver`](crate::Nameserver), which owns the
//! priority authority, evaluates them, and keeps the dependency edges between
//! them up to date.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::locator::Locator;
use crate::priority::PriorityToken;
use crate::schema::Schema;
use crate::value::{RawValue, Value};

/// Handle to a slot inside its nameserver
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(pub(crate) usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether an assignment was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Ignored because the slot holds a value of higher priority
    Shadowed { by: PriorityToken },
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// What became of an assignment, as recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// The current value of the slot
    Applied,
    /// Was the value of the slot until a higher-priority assignment arrived
    Superseded,
    /// Arrived with lower priority than the value already in place
    Shadowed,
    /// Applied, then rolled back because it failed coercion or a constraint
    Invalid,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Disposition::Applied => "applied",
            Disposition::Superseded => "superseded",
            Disposition::Shadowed => "shadowed",
            Disposition::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

/// One entry of the audit trail of a slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub value: RawValue,
    pub priority: PriorityToken,
    pub locator: Locator,
    pub disposition: Disposition,
}

/// The state an assignment replaced, kept so it can be rolled back
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    raw: Option<RawValue>,
    priority: Option<PriorityToken>,
    locator: Locator,
}

/// A named, lazily evaluated, memoized, priority-stamped value cell
#[derive(Debug, Clone, Default)]
pub struct Slot {
    key: Option<String>,
    raw: Option<RawValue>,
    priority: Option<PriorityToken>,
    locator: Locator,
    pub(crate) schema: Schema,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) cache: Option<Value>,
    pub(crate) dependencies: BTreeSet<SlotId>,
    pub(crate) dependents: BTreeSet<SlotId>,
    pub(crate) history: Vec<Assignment>,
    /// Set when the slot was merged into another one
    pub(crate) forward: Option<SlotId>,
}

impl Slot {
    /// An empty slot: a placeholder until it receives its first assignment
    pub fn new(key: Option<String>) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn raw(&self) -> Option<&RawValue> {
        self.raw.as_ref()
    }

    pub fn priority(&self) -> Option<PriorityToken> {
        self.priority
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The memoized value, if the slot has been evaluated since it last changed
    pub fn cached(&self) -> Option<&Value> {
        self.cache.as_ref()
    }

    /// Whether the slot has received a value
    pub fn is_resolved(&self) -> bool {
        self.raw.is_some()
    }

    /// Slots referenced by the raw value on its most recent evaluation
    pub fn dependencies(&self) -> &BTreeSet<SlotId> {
        &self.dependencies
    }

    /// Slots whose most recent evaluation referenced this one
    pub fn dependents(&self) -> &BTreeSet<SlotId> {
        &self.dependents
    }

    /// Every assignment this slot received, oldest first
    pub fn history(&self) -> &[Assignment] {
        &self.history
    }

    /// Whether reading the slot can fail for reasons other than its references
    pub fn is_checked(&self) -> bool {
        !self.schema.is_any() || !self.constraints.is_empty()
    }

    /// Offer a stamped value
    ///
    /// The value replaces the current one only if `priority` outranks the
    /// priority of the current value. Either way the offer is recorded.
    pub fn assign(&mut self, value: RawValue, priority: PriorityToken, locator: Locator) -> Outcome {
        if let Some(current) = self.priority
            && priority <= current
        {
            self.history.push(Assignment {
                value,
                priority,
                locator,
                disposition: Disposition::Shadowed,
            });
            return Outcome::Shadowed { by: current };
        }

        for entry in &mut self.history {
            if entry.disposition == Disposition::Applied {
                entry.disposition = Disposition::Superseded;
            }
        }
        self.history.push(Assignment {
            value: value.clone(),
            priority,
            locator: locator.clone(),
            disposition: Disposition::Applied,
        });
        self.raw = Some(value);
        self.priority = Some(priority);
        self.locator = locator;
        self.cache = None;
        Outcome::Applied
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            raw: self.raw.clone(),
            priority: self.priority,
            locator: self.locator.clone(),
        }
    }

    /// Undo the most recent applied assignment
    pub(crate) fn rollback(&mut self, snapshot: Snapshot) {
        if let Some(entry) = self
            .history
            .iter_mut()
            .rev()
            .find(|entry| entry.disposition == Disposition::Applied)
        {
            entry.disposition = Disposition::Invalid;
        }
        if let Some(previous) = snapshot.priority
            && let Some(entry) = self
                .history
                .iter_mut()
                .rev()
                .find(|entry| entry.priority == previous && entry.disposition == Disposition::Superseded)
        {
            entry.disposition = Disposition::Applied;
        }
        self.raw = snapshot.raw;
        self.priority = snapshot.priority;
        self.locator = snapshot.locator;
        self.cache = None;
    }

    /// Take over a value merged in from another slot
    pub(crate) fn adopt(&mut self, raw: Option<RawValue>, priority: Option<PriorityToken>, locator: Locator) {
        self.raw = raw;
        self.priority = priority;
        self.locator = locator;
        self.cache = None;
    }

    /// Re-derive dispositions after histories were merged
    pub(crate) fn settle_history(&mut self) {
        self.history.sort_by_key(|entry| entry.priority);
        let current = self.priority;
        for entry in &mut self.history {
            let applied = Some(entry.priority) == current;
            match entry.disposition {
                Disposition::Applied if !applied => entry.disposition = Disposition::Superseded,
                Disposition::Superseded if applied => entry.disposition = Disposition::Applied,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::{Category, PriorityAuthority};

    #[test]
    fn higher_category_wins_and_lower_is_shadowed() {
        let mut authority = PriorityAuthority::new();
        let mut slot = Slot::new(Some("x".into()));

        let first = slot.assign("1".into(), authority.stamp(Category::Default), Locator::Api);
        let second = slot.assign("2".into(), authority.stamp(Category::File), Locator::Api);
        let third = slot.assign("0".into(), authority.stamp(Category::Default), Locator::Api);

        assert!(first.is_applied());
        assert!(second.is_applied());
        assert!(matches!(third, Outcome::Shadowed { by } if by.category == Category::File));
        assert_eq!(slot.raw(), Some(&RawValue::from("2")));

        let dispositions: Vec<_> = slot.history().iter().map(|a| a.disposition).collect();
        assert_eq!(
            dispositions,
            vec![
                Disposition::Superseded,
                Disposition::Applied,
                Disposition::Shadowed
            ]
        );
    }

    #[test]
    fn later_assignment_of_same_category_wins() {
        let mut authority = PriorityAuthority::new();
        let mut slot = Slot::new(None);
        slot.assign("a".into(), authority.stamp(Category::File), Locator::Api);
        slot.assign("b".into(), authority.stamp(Category::File), Locator::Api);
        assert_eq!(slot.raw(), Some(&RawValue::from("b")));
    }

    #[test]
    fn assignment_clears_cache() {
        let mut authority = PriorityAuthority::new();
        let mut slot = Slot::new(None);
        slot.cache = Some(Value::Int(1));
        slot.assign(RawValue::from(2_i64), authority.stamp(Category::Explicit), Locator::Api);
        assert!(slot.cached().is_none());
    }

    #[test]
    fn rollback_restores_previous_value() {
        let mut authority = PriorityAuthority::new();
        let mut slot = Slot::new(Some("n".into()));
        slot.assign("5".into(), authority.stamp(Category::Default), Locator::Api);

        let snapshot = slot.snapshot();
        slot.assign("bad".into(), authority.stamp(Category::Explicit), Locator::Api);
        slot.rollback(snapshot);

        assert_eq!(slot.raw(), Some(&RawValue::from("5")));
        assert_eq!(slot.priority().map(|p| p.category), Some(Category::Default));
        let dispositions: Vec<_> = slot.history().iter().map(|a| a.disposition).collect();
        assert_eq!(dispositions, vec![Disposition::Applied, Disposition::Invalid]);
    }
}
