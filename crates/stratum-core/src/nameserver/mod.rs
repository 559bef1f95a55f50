//! The dotted-key registry
//!
//! A [`Nameserver`] owns every slot of one resolution context, maps dotted
//! keys onto them, and hands out the priority tokens that decide which
//! assignment a slot keeps. Reading a key evaluates its slot lazily; the
//! evaluation records which slots it consulted, and a later change to any of
//! them clears the memoized value of everything downstream.
//!
//! Keys come in two flavours. Owned keys are bound to a slot that belongs to
//! the nameserver namespace and accept direct writes. Shared keys are
//! read-through links to a slot owned by a component inventory; writing to one
//! has to go through the inventory so that the slot is forked first.

mod evaluate;
mod interpolate;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

pub use interpolate::{has_markers, markers};

use crate::constraint::Constraint;
use crate::error::{Error, Result};
use crate::key;
use crate::locator::Locator;
use crate::priority::{Category, PriorityAuthority};
use crate::schema::Schema;
use crate::slot::{Assignment, Outcome, Slot, SlotId};
use crate::value::{RawValue, Value};

use evaluate::Evaluation;

/// Termination bounds for evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum number of slots being evaluated at once by a single read
    pub max_depth: usize,
    /// Maximum number of interpolation passes over one text
    pub max_passes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_passes: 16,
        }
    }
}

/// What a key is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub slot: SlotId,
    /// Borrowed from a component inventory; not writable directly
    pub shared: bool,
}

#[derive(Debug, Default)]
pub struct Nameserver {
    slots: Vec<Slot>,
    /// Released slots, reused by the next allocation
    free: Vec<SlotId>,
    keys: BTreeMap<String, KeyBinding>,
    authority: PriorityAuthority,
    limits: Limits,
}

impl Nameserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn authority(&self) -> &PriorityAuthority {
        &self.authority
    }

    /// Follow merge redirections to the slot that currently stands for `id`
    pub fn canonical(&self, mut id: SlotId) -> SlotId {
        while let Some(next) = self.slots[id.0].forward {
            id = next;
        }
        id
    }

    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[self.canonical(id).0]
    }

    fn slot_mut(&mut self, id: SlotId) -> &mut Slot {
        let id = self.canonical(id);
        &mut self.slots[id.0]
    }

    /// The key of a slot, or its handle if it is anonymous
    pub fn label(&self, id: SlotId) -> String {
        let id = self.canonical(id);
        match self.slots[id.0].key() {
            Some(key) => key.to_string(),
            None => id.to_string(),
        }
    }

    /// Create a slot that no key is bound to yet
    pub(crate) fn allocate(&mut self, key: Option<String>) -> SlotId {
        if let Some(id) = self.free.pop() {
            self.slots[id.0] = Slot::new(key);
            return id;
        }
        let id = SlotId(self.slots.len());
        self.slots.push(Slot::new(key));
        id
    }

    /// Hand a slot that no key is bound to back to the arena
    ///
    /// The slot is cut out of the dependency graph and its handle is reused
    /// by a later allocation, together with the handles of any slots merged
    /// into it. A slot some key still resolves to is left alone.
    pub(crate) fn release(&mut self, id: SlotId) {
        let id = self.canonical(id);
        if self.keys.values().any(|binding| self.canonical(binding.slot) == id) {
            return;
        }
        self.invalidate(id);
        let slot = std::mem::take(&mut self.slots[id.0]);
        for dependency in &slot.dependencies {
            self.slots[dependency.0].dependents.remove(&id);
        }
        for dependent in &slot.dependents {
            self.slots[dependent.0].dependencies.remove(&id);
        }

        let merged: Vec<SlotId> = (0..self.slots.len())
            .map(SlotId)
            .filter(|&other| {
                other != id && self.slots[other.0].forward.is_some() && self.canonical(other) == id
            })
            .collect();
        for other in &merged {
            self.slots[other.0] = Slot::default();
        }
        self.free.push(id);
        self.free.extend(merged);
        trace!(slot = %id, "slot released");
    }

    /// Number of slots in use
    pub fn slot_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn binding(&self, key: &str) -> Option<KeyBinding> {
        self.keys.get(key).map(|binding| KeyBinding {
            slot: self.canonical(binding.slot),
            shared: binding.shared,
        })
    }

    /// The slot bound to `key`, if any
    pub fn find(&self, key: &str) -> Option<SlotId> {
        self.binding(key).map(|binding| binding.slot)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// The slot bound to `key`, created as an empty placeholder if necessary
    ///
    /// Never fails: a forward reference is legal, and only reading the
    /// placeholder before anything is assigned to it is an error.
    pub fn resolve(&mut self, key: &str) -> SlotId {
        if let Some(id) = self.find(key) {
            return id;
        }
        let id = self.allocate(Some(key.to_string()));
        self.keys.insert(
            key.to_string(),
            KeyBinding {
                slot: id,
                shared: false,
            },
        );
        trace!(key, slot = %id, "placeholder created");
        id
    }

    /// Offer a value for `key`
    pub fn assign(
        &mut self,
        key: &str,
        value: impl Into<RawValue>,
        category: Category,
        locator: Locator,
    ) -> Result<Outcome> {
        key::validate(key)?;
        if let Some(binding) = self.binding(key)
            && binding.shared
        {
            return Err(Error::SharedKey {
                key: key.to_string(),
            });
        }
        let id = self.resolve(key);
        self.assign_slot(id, value.into(), category, locator)
    }

    /// Offer a value to a slot
    ///
    /// A value that outranks the current one replaces it and clears the
    /// memoized values of every slot downstream. If the slot has a schema or
    /// constraints, the new value is checked right away; a value that cannot
    /// be coerced or violates a constraint is rolled back and reported. A value
    /// whose references cannot be evaluated yet is kept and checked on read.
    pub fn assign_slot(
        &mut self,
        id: SlotId,
        value: RawValue,
        category: Category,
        locator: Locator,
    ) -> Result<Outcome> {
        let id = self.canonical(id);
        let token = self.authority.stamp(category);
        let snapshot = self.slots[id.0].snapshot();
        let outcome = self.slots[id.0].assign(value, token, locator);

        if let Outcome::Shadowed { by } = outcome {
            debug!(slot = %self.label(id), priority = %token, %by, "assignment shadowed");
            return Ok(outcome);
        }
        debug!(slot = %self.label(id), priority = %token, "assignment applied");
        self.invalidate(id);

        if self.slots[id.0].is_checked()
            && let Err(error) = self.verify(id)
        {
            self.slots[id.0].rollback(snapshot);
            self.invalidate(id);
            return Err(error);
        }
        Ok(outcome)
    }

    /// Check a freshly assigned value against the schema and constraints of
    /// its slot
    ///
    /// Only failures of the value itself are errors. If the value cannot be
    /// computed yet because of the slots it references, the check is left to
    /// the first read.
    fn verify(&mut self, id: SlotId) -> Result<()> {
        let Some(raw) = self.slots[id.0].raw().cloned() else {
            return Ok(());
        };
        let mut evaluation = Evaluation::default();
        let mut dependencies = BTreeSet::new();
        let computed = self.compute(id, &raw, &mut evaluation, &mut dependencies);
        self.record_dependencies(id, dependencies);
        match computed {
            Ok(value) => {
                let value = self.check(id, value)?;
                self.slots[id.0].cache = Some(value);
            }
            Err(error) => warn!(slot = %self.label(id), %error, "validation deferred"),
        }
        Ok(())
    }

    /// Clear the memoized value of `id` and of everything downstream of it
    pub fn invalidate(&mut self, id: SlotId) {
        let id = self.canonical(id);
        let mut queue = VecDeque::from([id]);
        let mut seen = BTreeSet::new();
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            let slot = self.slot_mut(next);
            slot.cache = None;
            queue.extend(slot.dependents.iter().copied());
        }
        trace!(slot = %self.label(id), cleared = seen.len(), "invalidated");
    }

    /// The value of `key`
    pub fn get(&mut self, key: &str) -> Result<Value> {
        let id = self.find(key).ok_or_else(|| Error::Unresolved {
            key: key.to_string(),
        })?;
        self.value(id)
    }

    /// The value of a slot
    pub fn value(&mut self, id: SlotId) -> Result<Value> {
        let mut evaluation = Evaluation::default();
        self.evaluate(id, &mut evaluation)
    }

    /// Make `new` resolve to the slot of `existing`
    ///
    /// If `new` already owns a different slot the two are merged: the value
    /// with the higher priority survives, the histories are combined, and
    /// everything that depended on either slot now depends on the survivor.
    pub fn alias(&mut self, existing: &str, new: &str) -> Result<()> {
        key::validate(existing)?;
        key::validate(new)?;
        let survivor = self.resolve(existing);
        let shared = self.keys.get(existing).is_some_and(|binding| binding.shared);

        match self.binding(new) {
            Some(binding) if binding.slot == survivor => {}
            Some(binding) if !binding.shared => self.merge(survivor, binding.slot),
            Some(binding) => self.invalidate(binding.slot),
            None => {}
        }
        self.keys.insert(
            new.to_string(),
            KeyBinding {
                slot: survivor,
                shared,
            },
        );
        debug!(existing, new, "aliased");
        Ok(())
    }

    fn merge(&mut self, survivor: SlotId, loser: SlotId) {
        let survivor = self.canonical(survivor);
        let loser = self.canonical(loser);
        if survivor == loser {
            return;
        }
        let key = self.slots[loser.0].key().map(str::to_string);
        let taken = std::mem::replace(&mut self.slots[loser.0], Slot::new(key));
        self.slots[loser.0].forward = Some(survivor);

        let loser_wins = match (self.slots[survivor.0].priority(), taken.priority()) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(current), Some(incoming)) => incoming > current,
        };

        let slot = &mut self.slots[survivor.0];
        if loser_wins {
            slot.adopt(taken.raw().cloned(), taken.priority(), taken.locator().clone());
        }
        slot.history.extend(taken.history.iter().cloned());
        slot.settle_history();
        if slot.schema.is_any() {
            slot.schema = taken.schema.clone();
        }
        if slot.constraints.is_empty() {
            slot.constraints = taken.constraints.clone();
        }

        for dependent in &taken.dependents {
            let entry = &mut self.slots[dependent.0];
            if entry.dependencies.remove(&loser) && *dependent != survivor {
                entry.dependencies.insert(survivor);
            }
        }
        for dependency in &taken.dependencies {
            self.slots[dependency.0].dependents.remove(&loser);
        }
        self.slots[survivor.0]
            .dependents
            .extend(taken.dependents.iter().filter(|&&d| d != survivor));

        for binding in self.keys.values_mut() {
            if binding.slot == loser {
                binding.slot = survivor;
            }
        }
        debug!(survivor = %self.label(survivor), merged = %loser, "slots merged");
        self.invalidate(survivor);
    }

    /// Bind `key` to a slot owned by this namespace
    pub(crate) fn bind_owned(&mut self, key: &str, id: SlotId) {
        self.rebind(key, id, false);
    }

    /// Bind `key` read-through to a slot owned by a component inventory
    pub(crate) fn link(&mut self, key: &str, id: SlotId) {
        self.rebind(key, id, true);
    }

    fn rebind(&mut self, key: &str, id: SlotId, shared: bool) {
        let id = self.canonical(id);
        let previous = self.keys.insert(key.to_string(), KeyBinding { slot: id, shared });
        if let Some(previous) = previous
            && self.canonical(previous.slot) != id
        {
            self.invalidate(previous.slot);
        }
    }

    /// Remove the binding of `key`; the slot itself stays alive
    pub(crate) fn unbind(&mut self, key: &str) -> Option<KeyBinding> {
        let binding = self.keys.remove(key)?;
        self.invalidate(binding.slot);
        Some(binding)
    }

    /// Set the schema and constraints a slot checks its values against
    pub(crate) fn configure_slot(&mut self, id: SlotId, schema: Schema, constraints: Vec<Constraint>) {
        let slot = self.slot_mut(id);
        slot.schema = schema;
        slot.constraints = constraints;
        self.invalidate(id);
    }

    /// Give `target` the schema and constraints of `source`, and offer it the
    /// current value of `source` at [`Category::Inherited`]
    ///
    /// Anything the target receives from a real source outranks the inherited
    /// value.
    pub(crate) fn inherit(&mut self, target: SlotId, source: SlotId) {
        let source = self.canonical(source);
        let target = self.canonical(target);
        let origin = &self.slots[source.0];
        let schema = origin.schema.clone();
        let constraints = origin.constraints.clone();
        let inherited = origin.raw().cloned().map(|raw| {
            let locator = Locator::chain(
                Locator::synthetic(format!("inherited from {}", self.label(source))),
                origin.locator().clone(),
            );
            (raw, locator)
        });

        let slot = &mut self.slots[target.0];
        slot.schema = schema;
        slot.constraints = constraints;
        if let Some((raw, locator)) = inherited {
            let token = self.authority.stamp(Category::Inherited);
            self.slots[target.0].assign(raw, token, locator);
        }
        self.invalidate(target);
    }

    /// Copy a slot for a writer that must not disturb the original
    ///
    /// The copy keeps the priority of the value it was taken from, so a write
    /// to it competes exactly as it would have against the original.
    pub(crate) fn fork(&mut self, source: SlotId, key: Option<String>) -> SlotId {
        let source = self.canonical(source);
        let id = self.allocate(key);
        let origin = &self.slots[source.0];
        let schema = origin.schema.clone();
        let constraints = origin.constraints.clone();
        let history = origin.history.clone();
        let raw = origin.raw().cloned();
        let priority = origin.priority();
        let locator = origin.locator().clone();

        let slot = &mut self.slots[id.0];
        slot.schema = schema;
        slot.constraints = constraints;
        slot.history = history;
        slot.adopt(raw, priority, locator);
        // readers of the source may have reached it through a key that now
        // points at the copy
        self.invalidate(source);
        debug!(source = %self.label(source), fork = %self.label(id), "slot forked");
        id
    }

    /// Every assignment the slot bound to `key` has received, oldest first
    pub fn explain(&self, key: &str) -> Result<&[Assignment]> {
        let id = self.find(key).ok_or_else(|| Error::Unresolved {
            key: key.to_string(),
        })?;
        Ok(self.slot(id).history())
    }

    /// All bound keys, in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// All bound keys with what they are bound to, in key order
    pub fn bindings(&self) -> impl Iterator<Item = (&str, KeyBinding)> {
        self.keys.iter().map(|(key, binding)| {
            (
                key.as_str(),
                KeyBinding {
                    slot: self.canonical(binding.slot),
                    shared: binding.shared,
                },
            )
        })
    }

    /// Bound keys directly or indirectly below `prefix`
    pub fn children<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> {
        self.keys()
            .filter(move |key| key.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('.')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::Disposition;
    use pretty_assertions::assert_eq;

    fn set(ns: &mut Nameserver, key: &str, value: &str, category: Category) -> Outcome {
        ns.assign(key, value, category, Locator::Api).unwrap()
    }

    #[test]
    fn greeting_follows_its_reference() {
        let mut ns = Nameserver::new();
        set(&mut ns, "name.greeting", "Hello, {name.who}", Category::Default);
        set(&mut ns, "name.who", "world", Category::Default);
        assert_eq!(ns.get("name.greeting").unwrap(), Value::from("Hello, world"));

        set(&mut ns, "name.who", "Michael", Category::CommandLine);
        assert_eq!(ns.get("name.greeting").unwrap(), Value::from("Hello, Michael"));
    }

    #[test]
    fn file_outranks_later_default() {
        let mut ns = Nameserver::new();
        set(&mut ns, "x", "1", Category::Default);
        set(&mut ns, "x", "2", Category::File);
        let last = set(&mut ns, "x", "0", Category::Default);
        assert!(!last.is_applied());
        assert_eq!(ns.get("x").unwrap(), Value::from("2"));
    }

    #[test]
    fn cycles_are_reported_with_their_chain() {
        let mut ns = Nameserver::new();
        set(&mut ns, "a", "{b}", Category::Default);
        set(&mut ns, "b", "{a}", Category::Default);
        match ns.get("a").unwrap_err() {
            Error::CircularReference { key, chain } => {
                assert_eq!(key, "a");
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(ns.get("b"), Err(Error::CircularReference { .. })));
    }

    #[test]
    fn forward_reference_resolves_once_assigned() {
        let mut ns = Nameserver::new();
        set(&mut ns, "path", "{x.y}/bin", Category::Default);
        assert_eq!(ns.get("path").unwrap_err(), Error::Unresolved { key: "x.y".into() });
        assert!(ns.contains("x.y"));

        set(&mut ns, "x.y", "/opt", Category::File);
        assert_eq!(ns.get("path").unwrap(), Value::from("/opt/bin"));
    }

    #[test]
    fn reading_an_unknown_key_does_not_create_it() {
        let mut ns = Nameserver::new();
        assert!(matches!(ns.get("nope"), Err(Error::Unresolved { .. })));
        assert!(!ns.contains("nope"));
    }

    #[test]
    fn sole_marker_keeps_the_referenced_type() {
        let mut ns = Nameserver::new();
        ns.assign("n", 3_i64, Category::Default, Locator::Api).unwrap();
        set(&mut ns, "m", "{n}", Category::Default);
        set(&mut ns, "s", "n={n}", Category::Default);
        assert_eq!(ns.get("m").unwrap(), Value::Int(3));
        assert_eq!(ns.get("s").unwrap(), Value::from("n=3"));
    }

    #[test]
    fn values_are_memoized_until_a_dependency_changes() {
        let mut ns = Nameserver::new();
        set(&mut ns, "a", "{b}!", Category::Default);
        set(&mut ns, "b", "x", Category::Default);
        ns.get("a").unwrap();

        let a = ns.find("a").unwrap();
        let b = ns.find("b").unwrap();
        assert!(ns.slot(a).cached().is_some());
        assert!(ns.slot(b).dependents().contains(&a));

        set(&mut ns, "b", "y", Category::File);
        assert!(ns.slot(a).cached().is_none());
        assert_eq!(ns.get("a").unwrap(), Value::from("y!"));
    }

    #[test]
    fn invalid_values_are_rolled_back() {
        let mut ns = Nameserver::new();
        let id = ns.resolve("job.tasks");
        ns.configure_slot(id, Schema::Int, vec![Constraint::at_least(1)]);
        set(&mut ns, "job.tasks", "4", Category::Default);

        let cast = ns.assign("job.tasks", "four", Category::File, Locator::Api);
        assert!(matches!(cast, Err(Error::Casting { .. })));
        let violation = ns.assign("job.tasks", "0", Category::File, Locator::Api);
        assert!(matches!(violation, Err(Error::ConstraintViolation { .. })));

        assert_eq!(ns.get("job.tasks").unwrap(), Value::Int(4));
        let dispositions: Vec<_> = ns
            .explain("job.tasks")
            .unwrap()
            .iter()
            .map(|entry| entry.disposition)
            .collect();
        assert_eq!(
            dispositions,
            vec![Disposition::Applied, Disposition::Invalid, Disposition::Invalid]
        );
    }

    #[test]
    fn checks_are_deferred_while_references_are_missing() {
        let mut ns = Nameserver::new();
        let id = ns.resolve("count");
        ns.configure_slot(id, Schema::Int, vec![]);
        let outcome = ns
            .assign("count", "{later}", Category::Default, Locator::Api)
            .unwrap();
        assert!(outcome.is_applied());

        set(&mut ns, "later", "12", Category::Default);
        assert_eq!(ns.get("count").unwrap(), Value::Int(12));
    }

    #[test]
    fn alias_merges_and_keeps_the_higher_priority_value() {
        let mut ns = Nameserver::new();
        set(&mut ns, "old.name", "low", Category::Default);
        set(&mut ns, "new.name", "high", Category::File);
        set(&mut ns, "reader", "<{old.name}>", Category::Default);
        assert_eq!(ns.get("reader").unwrap(), Value::from("<low>"));

        ns.alias("old.name", "new.name").unwrap();
        assert_eq!(ns.find("old.name"), ns.find("new.name"));
        assert_eq!(ns.get("old.name").unwrap(), Value::from("high"));
        assert_eq!(ns.get("reader").unwrap(), Value::from("<high>"));
        assert_eq!(ns.explain("new.name").unwrap().len(), 2);
    }

    #[test]
    fn alias_preserves_dependents_of_the_replaced_key() {
        let mut ns = Nameserver::new();
        set(&mut ns, "user", "{who}", Category::Default);
        set(&mut ns, "who", "ann", Category::Default);
        assert_eq!(ns.get("user").unwrap(), Value::from("ann"));

        set(&mut ns, "person", "bob", Category::Explicit);
        ns.alias("person", "who").unwrap();
        assert_eq!(ns.get("user").unwrap(), Value::from("bob"));

        set(&mut ns, "person", "cy", Category::Explicit);
        assert_eq!(ns.get("user").unwrap(), Value::from("cy"));
    }

    #[test]
    fn alias_does_not_duplicate_constraints() {
        let mut ns = Nameserver::new();
        for key in ["jobs", "workers"] {
            let id = ns.resolve(key);
            ns.configure_slot(id, Schema::Int, vec![Constraint::at_least(1)]);
        }
        ns.alias("jobs", "workers").unwrap();
        let id = ns.find("workers").unwrap();
        assert_eq!(ns.slot(id).constraints().len(), 1);
    }

    #[test]
    fn forks_keep_the_priority_of_their_source() {
        let mut ns = Nameserver::new();
        set(&mut ns, "solver.steps", "10", Category::Default);
        let source = ns.find("solver.steps").unwrap();
        let fork = ns.fork(source, Some("a.steps".into()));

        assert_eq!(ns.slot(fork).priority(), ns.slot(source).priority());
        assert_eq!(ns.slot(fork).history(), ns.slot(source).history());
        assert_eq!(ns.authority().issued(Category::Inherited), 0);

        let outcome = ns
            .assign_slot(fork, "20".into(), Category::Default, Locator::Api)
            .unwrap();
        assert!(outcome.is_applied());
        assert_eq!(ns.value(fork).unwrap(), Value::from("20"));
        assert_eq!(ns.get("solver.steps").unwrap(), Value::from("10"));
    }

    #[test]
    fn released_slots_leave_the_graph_and_are_reused() {
        let mut ns = Nameserver::new();
        set(&mut ns, "base", "x", Category::Default);
        let base = ns.find("base").unwrap();
        let copy = ns.fork(base, None);
        ns.assign_slot(copy, "{base}!".into(), Category::Explicit, Locator::Api)
            .unwrap();
        assert_eq!(ns.value(copy).unwrap(), Value::from("x!"));
        assert!(ns.slot(base).dependents().contains(&copy));

        let count = ns.slot_count();
        ns.release(copy);
        assert_eq!(ns.slot_count(), count - 1);
        assert!(ns.slot(base).dependents().is_empty());
        assert_eq!(ns.allocate(None), copy);
    }

    #[test]
    fn bound_slots_are_not_released() {
        let mut ns = Nameserver::new();
        set(&mut ns, "kept", "v", Category::Default);
        let id = ns.find("kept").unwrap();
        ns.release(id);
        assert_eq!(ns.get("kept").unwrap(), Value::from("v"));
        assert_eq!(ns.slot_count(), 1);
    }

    #[test]
    fn runaway_expansion_hits_the_pass_budget() {
        let mut ns = Nameserver::with_limits(Limits {
            max_depth: 64,
            max_passes: 3,
        });
        ns.assign("a", RawValue::literal("{a}"), Category::Default, Locator::Api)
            .unwrap();
        let err = ns.interpolate("{{a}}").unwrap_err();
        assert!(matches!(err, Error::InterpolationBudget { .. }));
    }

    #[test]
    fn deep_chains_hit_the_depth_budget() {
        let mut ns = Nameserver::with_limits(Limits {
            max_depth: 4,
            max_passes: 16,
        });
        for i in 0..6 {
            set(&mut ns, &format!("k{i}"), &format!("{{k{}}}", i + 1), Category::Default);
        }
        set(&mut ns, "k6", "end", Category::Default);
        assert!(matches!(ns.get("k0"), Err(Error::InterpolationBudget { .. })));
        assert_eq!(ns.get("k5").unwrap(), Value::from("end"));
    }

    #[test]
    fn shared_keys_reject_direct_writes() {
        let mut ns = Nameserver::new();
        let class = ns.allocate(Some("solver.tolerance".into()));
        ns.link("run.tolerance", class);
        let err = ns
            .assign("run.tolerance", "1e-3", Category::File, Locator::Api)
            .unwrap_err();
        assert_eq!(err, Error::SharedKey { key: "run.tolerance".into() });
    }

    #[test]
    fn children_lists_keys_below_a_prefix() {
        let mut ns = Nameserver::new();
        for key in ["app.home", "app.user.name", "apple", "app"] {
            set(&mut ns, key, "v", Category::Default);
        }
        let children: Vec<_> = ns.children("app").collect();
        assert_eq!(children, vec!["app.home", "app.user.name"]);
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let mut ns = Nameserver::new();
        assert!(matches!(
            ns.assign("a..b", "v", Category::Default, Locator::Api),
            Err(Error::InvalidKey { .. })
        ));
    }
}
