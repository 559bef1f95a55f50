//! Lazy evaluation of slots
//!
//! Evaluating a slot computes its raw value (expanding markers or running its
//! expression), coerces the result through the schema of the slot, checks its
//! constraints and memoizes the outcome. Every slot consulted along the way is
//! recorded as a dependency so that a later change can clear the cache.

use std::collections::BTreeSet;

use super::Nameserver;
use super::interpolate::sole_marker;
use crate::error::{Error, Result};
use crate::key;
use crate::slot::SlotId;
use crate::value::{RawValue, Value};

/// The slots being evaluated by one top-level read, innermost last
#[derive(Debug, Default)]
pub(crate) struct Evaluation {
    stack: Vec<SlotId>,
}

impl Nameserver {
    pub(super) fn evaluate(&mut self, id: SlotId, evaluation: &mut Evaluation) -> Result<Value> {
        let id = self.canonical(id);
        if let Some(value) = self.slot(id).cached() {
            return Ok(value.clone());
        }
        if let Some(position) = evaluation.stack.iter().position(|&entry| entry == id) {
            let chain = evaluation.stack[position..]
                .iter()
                .chain(std::iter::once(&id))
                .map(|&entry| self.label(entry))
                .collect();
            return Err(Error::CircularReference {
                key: self.label(id),
                chain,
            });
        }
        if evaluation.stack.len() >= self.limits.max_depth {
            return Err(Error::InterpolationBudget {
                key: self.label(id),
                reason: format!("references nest deeper than {}", self.limits.max_depth),
            });
        }
        let Some(raw) = self.slot(id).raw().cloned() else {
            return Err(Error::Unresolved { key: self.label(id) });
        };

        tracing::trace!(slot = %self.label(id), "evaluating");
        evaluation.stack.push(id);
        let mut dependencies = BTreeSet::new();
        let computed = self.compute(id, &raw, evaluation, &mut dependencies);
        evaluation.stack.pop();
        self.record_dependencies(id, dependencies);

        let value = self.check(id, computed?)?;
        self.slot_mut(id).cache = Some(value.clone());
        Ok(value)
    }

    /// The value of `raw` before coercion
    pub(super) fn compute(
        &mut self,
        id: SlotId,
        raw: &RawValue,
        evaluation: &mut Evaluation,
        dependencies: &mut BTreeSet<SlotId>,
    ) -> Result<Value> {
        match raw {
            RawValue::Literal(value) => Ok(value.clone()),
            RawValue::Text(text) => match sole_marker(text) {
                Some(key) => self.reference(key, evaluation, dependencies),
                None => {
                    let label = self.label(id);
                    self.expand(text, &label, evaluation, dependencies)
                        .map(Value::Str)
                }
            },
            RawValue::Expr(expr) => expr.evaluate(&mut |key: &str| {
                key::validate(key)?;
                self.reference(key, evaluation, dependencies)
            }),
        }
    }

    /// Coerce a computed value and check it against the constraints of `id`
    pub(super) fn check(&self, id: SlotId, value: Value) -> Result<Value> {
        let slot = self.slot(id);
        if !slot.is_checked() {
            return Ok(value);
        }
        let label = self.label(id);
        let shown = value.to_string();
        let value = slot
            .schema()
            .coerce(value)
            .map_err(|reason| Error::casting(&label, shown, slot.schema().type_name(), reason))?;
        for constraint in slot.constraints() {
            constraint.validate(&label, &value)?;
        }
        Ok(value)
    }

    /// Evaluate the slot bound to `key` on behalf of the slot being evaluated
    pub(super) fn reference(
        &mut self,
        key: &str,
        evaluation: &mut Evaluation,
        dependencies: &mut BTreeSet<SlotId>,
    ) -> Result<Value> {
        let target = self.resolve(key);
        dependencies.insert(self.canonical(target));
        self.evaluate(target, evaluation)
    }

    /// Replace the dependency edges of `id` with `dependencies`
    pub(super) fn record_dependencies(&mut self, id: SlotId, dependencies: BTreeSet<SlotId>) {
        let previous = std::mem::take(&mut self.slot_mut(id).dependencies);
        for stale in previous.difference(&dependencies) {
            self.slot_mut(*stale).dependents.remove(&id);
        }
        for dependency in &dependencies {
            self.slot_mut(*dependency).dependents.insert(id);
        }
        self.slot_mut(id).dependencies = dependencies;
    }
}
