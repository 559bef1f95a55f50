//! Per-component trait tables
//!
//! An [`Inventory`] maps the traits of one component class or instance, and
//! every alias of them, onto nameserver slots. Inventories built by
//! [`Inventory::derive`] start out borrowing every slot of their ancestor. The
//! first write through the derived inventory forks the slot, so the ancestor
//! and any sibling never see it; traits that are never written keep reading
//! the ancestor's value.
//!
//! An inventory with a namespace also publishes its traits as dotted keys,
//! `<namespace>.<name>` for the canonical name and every alias. Keys of
//! borrowed traits are linked read-through; keys of owned traits are bound to
//! the private slot.

use std::collections::BTreeMap;

use tracing::debug;

use crate::component::TraitSpec;
use crate::error::{Error, Result};
use crate::key;
use crate::locator::Locator;
use crate::nameserver::Nameserver;
use crate::priority::Category;
use crate::slot::{Outcome, SlotId};
use crate::value::{RawValue, Value};

/// The slot behind one trait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub slot: SlotId,
    /// Whether the slot belongs to this inventory rather than an ancestor
    pub owned: bool,
}

#[derive(Debug, Clone)]
pub struct Inventory {
    owner: String,
    namespace: Option<String>,
    /// Canonical names and aliases, mapped to canonical names
    names: BTreeMap<String, String>,
    traits: BTreeMap<String, TraitSpec>,
    entries: BTreeMap<String, Entry>,
}

impl Inventory {
    /// Create an empty inventory; `namespace` is the key prefix of its traits.
    pub fn new(owner: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            owner: owner.into(),
            namespace,
            names: BTreeMap::new(),
            traits: BTreeMap::new(),
            entries: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Declare a trait owned by this inventory
    ///
    /// If configuration for the trait's keys reached the nameserver first, the
    /// slot holding it is adopted and the default is offered underneath it.
    /// Re-declaring a trait that was only inherited replaces it.
    pub fn declare(&mut self, ns: &mut Nameserver, spec: TraitSpec) -> Result<SlotId> {
        for name in spec.names() {
            key::validate(name)?;
            match self.names.get(name) {
                Some(canonical) if self.is_owned(canonical) || canonical != &spec.name => {
                    return Err(Error::DuplicateTrait {
                        component: self.owner.clone(),
                        name: name.to_string(),
                    });
                }
                _ => {}
            }
        }
        if let Some(previous) = self.traits.remove(&spec.name) {
            for name in previous.names() {
                self.names.remove(name);
            }
            self.entries.remove(&spec.name);
        }

        let slot = match self.namespace.as_deref() {
            Some(namespace) => {
                let slot_key = key::join(Some(namespace), &spec.name);
                let slot = match ns.binding(&slot_key) {
                    Some(binding) if !binding.shared => binding.slot,
                    _ => {
                        let slot = ns.allocate(Some(slot_key.clone()));
                        ns.bind_owned(&slot_key, slot);
                        slot
                    }
                };
                for alias in &spec.aliases {
                    ns.alias(&slot_key, &key::join(Some(namespace), alias))?;
                }
                slot
            }
            None => ns.allocate(None),
        };

        ns.configure_slot(slot, spec.schema.clone(), spec.constraints.clone());
        if let Some(initial) = spec.initial_value() {
            let locator = Locator::synthetic(format!("default of {}.{}", self.owner, spec.name));
            ns.assign_slot(slot, initial, spec.category, locator)?;
        }
        debug!(component = %self.owner, name = %spec.name, slot = %slot, "trait declared");

        for name in spec.names() {
            self.names.insert(name.to_string(), spec.name.clone());
        }
        self.entries.insert(spec.name.clone(), Entry { slot, owned: true });
        self.traits.insert(spec.name.clone(), spec);
        Ok(slot)
    }

    /// Borrow every trait of `ancestor`, replacing borrowed or owned traits of
    /// the same name
    pub fn inherit(&mut self, ancestor: &Inventory) {
        for (name, spec) in &ancestor.traits {
            if let Some(previous) = self.traits.get(name) {
                for alias in previous.names() {
                    self.names.remove(alias);
                }
            }
            for alias in spec.names() {
                self.names.insert(alias.to_string(), name.clone());
            }
            self.traits.insert(name.clone(), spec.clone());
            if let Some(entry) = ancestor.entries.get(name) {
                self.entries.insert(
                    name.clone(),
                    Entry {
                        slot: entry.slot,
                        owned: false,
                    },
                );
            }
        }
    }

    /// A new inventory that borrows every slot of this one
    pub fn derive(&self, owner: impl Into<String>, namespace: Option<String>) -> Inventory {
        let mut derived = Inventory::new(owner, namespace);
        derived.inherit(self);
        derived
    }

    /// Publish the keys of borrowed traits under the namespace
    ///
    /// A borrowed trait whose keys already hold configuration adopts the
    /// configured slot as its own; the ancestor's value is offered underneath
    /// at [`Category::Inherited`], and the configured value is checked against
    /// the trait right away. Every other borrowed trait is linked.
    pub fn publish(&mut self, ns: &mut Nameserver) -> Result<()> {
        let Some(namespace) = self.namespace.clone() else {
            return Ok(());
        };
        let borrowed: Vec<(String, SlotId)> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.owned)
            .map(|(name, entry)| (name.clone(), entry.slot))
            .collect();

        for (name, source) in borrowed {
            let keys = self.keys_of(&namespace, &name);
            let configured = keys.iter().find_map(|k| {
                ns.binding(k)
                    .filter(|binding| !binding.shared)
                    .map(|binding| (k.clone(), binding.slot))
            });

            match configured {
                Some((configured_key, slot)) => {
                    ns.inherit(slot, source);
                    for k in keys.iter().filter(|k| **k != configured_key) {
                        ns.alias(&configured_key, k)?;
                    }
                    let slot = ns.canonical(slot);
                    if ns.slot(slot).is_checked()
                        && let Err(error) = ns.value(slot)
                        && error.rejects_value()
                    {
                        return Err(error);
                    }
                    debug!(component = %self.owner, name = %name, slot = %slot, "configured trait adopted");
                    self.entries.insert(name, Entry { slot, owned: true });
                }
                None => {
                    for k in &keys {
                        ns.link(k, source);
                    }
                }
            }
        }
        Ok(())
    }

    fn keys_of(&self, namespace: &str, name: &str) -> Vec<String> {
        self.traits
            .get(name)
            .map(|spec| spec.names().map(|n| key::join(Some(namespace), n)).collect())
            .unwrap_or_default()
    }

    /// The canonical name of `name`, which may be an alias
    pub fn canonical_name(&self, name: &str) -> Result<&str> {
        self.names
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownTrait {
                component: self.owner.clone(),
                name: name.to_string(),
            })
    }

    /// The slot currently answering for `name`
    pub fn lookup(&self, name: &str) -> Result<SlotId> {
        let canonical = self.canonical_name(name)?;
        self.entries
            .get(canonical)
            .map(|entry| entry.slot)
            .ok_or_else(|| Error::UnknownTrait {
                component: self.owner.clone(),
                name: name.to_string(),
            })
    }

    pub fn entry(&self, name: &str) -> Option<Entry> {
        let canonical = self.names.get(name)?;
        self.entries.get(canonical).copied()
    }

    pub fn is_owned(&self, name: &str) -> bool {
        self.entry(name).is_some_and(|entry| entry.owned)
    }

    pub fn spec(&self, name: &str) -> Option<&TraitSpec> {
        let canonical = self.names.get(name)?;
        self.traits.get(canonical)
    }

    /// Canonical trait names, in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.traits.keys().map(String::as_str)
    }

    /// The value of trait `name`
    pub fn get(&self, ns: &mut Nameserver, name: &str) -> Result<Value> {
        let slot = self.lookup(name)?;
        ns.value(slot)
    }

    /// Offer a value for trait `name`
    ///
    /// A borrowed trait is forked first, so the write never reaches the
    /// ancestor.
    pub fn bind(
        &mut self,
        ns: &mut Nameserver,
        name: &str,
        value: impl Into<RawValue>,
        category: Category,
        locator: Locator,
    ) -> Result<Outcome> {
        let canonical = self.canonical_name(name)?.to_string();
        let slot = self.own(ns, &canonical)?;
        ns.assign_slot(slot, value.into(), category, locator)
    }

    /// The private slot of `canonical`, forking the borrowed one if needed
    fn own(&mut self, ns: &mut Nameserver, canonical: &str) -> Result<SlotId> {
        let entry = self
            .entries
            .get(canonical)
            .copied()
            .ok_or_else(|| Error::UnknownTrait {
                component: self.owner.clone(),
                name: canonical.to_string(),
            })?;
        if entry.owned {
            return Ok(entry.slot);
        }

        let slot_key = self
            .namespace
            .as_deref()
            .map(|namespace| key::join(Some(namespace), canonical));
        let slot = ns.fork(entry.slot, slot_key);
        if let Some(namespace) = self.namespace.clone() {
            for k in self.keys_of(&namespace, canonical) {
                ns.bind_owned(&k, slot);
            }
        }
        self.entries
            .insert(canonical.to_string(), Entry { slot, owned: true });
        Ok(slot)
    }

    /// Drop every key this inventory published and release its private slots
    ///
    /// Borrowed slots are untouched.
    pub fn retire(self, ns: &mut Nameserver) {
        if let Some(namespace) = self.namespace.as_deref() {
            for name in self.traits.keys() {
                for k in self.keys_of(namespace, name) {
                    ns.unbind(&k);
                }
            }
        }
        for entry in self.entries.values().filter(|entry| entry.owned) {
            ns.release(entry.slot);
        }
        debug!(component = %self.owner, namespace = ?self.namespace, "inventory retired");
    }
}
