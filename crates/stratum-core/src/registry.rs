//! Component registry
//!
//! A [`Registry`] is the resolution context an application threads through
//! its startup: it owns the nameserver, the class inventory of every
//! registered component, and the inventories of live instances.
//!
//! Registration flattens parent components into one trait table: inherited
//! traits keep sharing their ancestor's slot until something writes them
//! through the new component. Class-level traits of a component with a family
//! are published as `<family>.<trait>` keys, instance traits of a named
//! instance as `<instance>.<trait>`.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info};

use crate::component::ComponentSpec;
use crate::error::{Error, Result};
use crate::inventory::Inventory;
use crate::key;
use crate::locator::Locator;
use crate::nameserver::{Limits, Nameserver};
use crate::priority::Category;
use crate::slot::{Assignment, Outcome};
use crate::value::{RawValue, Value};

/// Handle to a live component instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(usize);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance #{}", self.0)
    }
}

#[derive(Debug)]
struct Component {
    spec: ComponentSpec,
    inventory: Inventory,
}

/// A live component instance
#[derive(Debug)]
pub struct Instance {
    component: String,
    name: Option<String>,
    inventory: Inventory,
}

impl Instance {
    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }
}

/// Where a dotted key is written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A trait of a named instance
    Instance { id: InstanceId, name: String },
    /// A class-level trait of a component family
    Class { component: String, name: String },
    /// A plain nameserver key
    Key,
}

#[derive(Debug, Default)]
pub struct Registry {
    nameserver: Nameserver,
    components: BTreeMap<String, Component>,
    /// Family prefix to component name
    families: BTreeMap<String, String>,
    instances: Vec<Option<Instance>>,
    names: BTreeMap<String, InstanceId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            nameserver: Nameserver::with_limits(limits),
            ..Self::default()
        }
    }

    pub fn nameserver(&self) -> &Nameserver {
        &self.nameserver
    }

    pub fn nameserver_mut(&mut self) -> &mut Nameserver {
        &mut self.nameserver
    }

    /// Register a component type
    ///
    /// Parents must already be registered. Their traits are inherited in
    /// order, later parents overriding earlier ones, and the component's own
    /// traits override both.
    pub fn register(&mut self, spec: ComponentSpec) -> Result<()> {
        if self.components.contains_key(&spec.name) {
            return Err(Error::DuplicateComponent {
                name: spec.name.clone(),
            });
        }
        if let Some(family) = &spec.family {
            key::validate(family)?;
            if self.families.contains_key(family) || self.names.contains_key(family) {
                return Err(Error::DuplicateComponent {
                    name: family.clone(),
                });
            }
        }

        let mut inventory = Inventory::new(spec.name.clone(), spec.family.clone());
        for parent in &spec.parents {
            let ancestor = self
                .components
                .get(parent)
                .ok_or_else(|| Error::UnknownComponent {
                    name: parent.clone(),
                })?;
            inventory.inherit(&ancestor.inventory);
        }
        for trait_spec in &spec.traits {
            inventory.declare(&mut self.nameserver, trait_spec.clone())?;
        }
        inventory.publish(&mut self.nameserver)?;

        info!(component = %spec.name, family = ?spec.family, traits = inventory.names().count(), "component registered");
        if let Some(family) = &spec.family {
            self.families.insert(family.clone(), spec.name.clone());
        }
        self.components
            .insert(spec.name.clone(), Component { spec, inventory });
        Ok(())
    }

    /// Names of registered components, in order
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.get(name).map(|component| &component.spec)
    }

    fn class(&self, component: &str) -> Result<&Component> {
        self.components
            .get(component)
            .ok_or_else(|| Error::UnknownComponent {
                name: component.to_string(),
            })
    }

    /// The class-level inventory of a component
    pub fn class_inventory(&self, component: &str) -> Result<&Inventory> {
        self.class(component).map(|component| &component.inventory)
    }

    /// Create an instance of `component`
    ///
    /// A named instance publishes its traits as `<name>.<trait>` keys. Values
    /// already configured under those keys are adopted by the instance and
    /// checked against the trait right away.
    pub fn instantiate(&mut self, component: &str, name: Option<&str>) -> Result<InstanceId> {
        if let Some(name) = name {
            key::validate(name)?;
            if self.names.contains_key(name) || self.families.contains_key(name) {
                return Err(Error::DuplicateInstance {
                    name: name.to_string(),
                });
            }
        }
        let class = self.class(component)?;
        let owner = match name {
            Some(name) => format!("{component} {name}"),
            None => format!("{component} instance"),
        };
        let mut inventory = class
            .inventory
            .derive(owner, name.map(str::to_string));
        inventory.publish(&mut self.nameserver)?;

        let id = InstanceId(self.instances.len());
        self.instances.push(Some(Instance {
            component: component.to_string(),
            name: name.map(str::to_string),
            inventory,
        }));
        if let Some(name) = name {
            self.names.insert(name.to_string(), id);
        }
        debug!(component, name = ?name, %id, "instance created");
        Ok(id)
    }

    pub fn instance(&self, id: InstanceId) -> Result<&Instance> {
        self.instances
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::UnknownInstance {
                name: id.to_string(),
            })
    }

    /// The handle of the instance called `name`
    pub fn lookup(&self, name: &str) -> Option<InstanceId> {
        self.names.get(name).copied()
    }

    /// Live instances, oldest first
    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances
            .iter()
            .enumerate()
            .filter_map(|(index, instance)| instance.as_ref().map(|i| (InstanceId(index), i)))
    }

    /// Discard an instance and the keys it published
    pub fn destroy(&mut self, id: InstanceId) -> Result<()> {
        let instance = self
            .instances
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| Error::UnknownInstance {
                name: id.to_string(),
            })?;
        instance.inventory.retire(&mut self.nameserver);
        if let Some(name) = &instance.name {
            self.names.remove(name);
        }
        debug!(%id, component = %instance.component, "instance destroyed");
        Ok(())
    }

    /// The value of a trait of an instance
    pub fn get(&mut self, id: InstanceId, name: &str) -> Result<Value> {
        let slot = self.instance(id)?.inventory.lookup(name)?;
        self.nameserver.value(slot)
    }

    /// The value of a trait of an instance, converted to `T`
    pub fn get_as<T>(&mut self, id: InstanceId, name: &str) -> Result<T>
    where
        T: TryFrom<Value, Error = Error>,
    {
        T::try_from(self.get(id, name)?)
    }

    /// Write a trait of an instance from code
    pub fn set(&mut self, id: InstanceId, name: &str, value: impl Into<RawValue>) -> Result<Outcome> {
        self.bind(id, name, value, Category::Explicit, Locator::Api)
    }

    /// Offer a value for a trait of an instance
    pub fn bind(
        &mut self,
        id: InstanceId,
        name: &str,
        value: impl Into<RawValue>,
        category: Category,
        locator: Locator,
    ) -> Result<Outcome> {
        let Self {
            nameserver,
            instances,
            ..
        } = self;
        let instance = instances
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::UnknownInstance {
                name: id.to_string(),
            })?;
        instance
            .inventory
            .bind(nameserver, name, value, category, locator)
    }

    /// The class-level value of a trait
    pub fn class_get(&mut self, component: &str, name: &str) -> Result<Value> {
        let slot = self.class(component)?.inventory.lookup(name)?;
        self.nameserver.value(slot)
    }

    /// Offer a class-level value for a trait
    ///
    /// Instances that have not written the trait themselves see the new value;
    /// components derived from this one do too, unless they forked it.
    pub fn class_bind(
        &mut self,
        component: &str,
        name: &str,
        value: impl Into<RawValue>,
        category: Category,
        locator: Locator,
    ) -> Result<Outcome> {
        let Self {
            nameserver,
            components,
            ..
        } = self;
        let class = components
            .get_mut(component)
            .ok_or_else(|| Error::UnknownComponent {
                name: component.to_string(),
            })?;
        class
            .inventory
            .bind(nameserver, name, value, category, locator)
    }

    /// Work out who owns `key`
    ///
    /// `<instance>.<trait>` belongs to the named instance and
    /// `<family>.<trait>` to the class inventory of the family; anything else
    /// is a plain nameserver key.
    pub fn route(&self, key: &str) -> Result<Route> {
        key::validate(key)?;
        let Some((prefix, name)) = key::split_last(key) else {
            return Ok(Route::Key);
        };
        if let Some(&id) = self.names.get(prefix) {
            self.instance(id)?.inventory.canonical_name(name)?;
            return Ok(Route::Instance {
                id,
                name: name.to_string(),
            });
        }
        if let Some(component) = self.families.get(prefix) {
            self.class(component)?.inventory.canonical_name(name)?;
            return Ok(Route::Class {
                component: component.clone(),
                name: name.to_string(),
            });
        }
        Ok(Route::Key)
    }

    /// Offer a value for any dotted key
    ///
    /// This is what configuration sources write through: the key is routed to
    /// the instance or class that owns it, so writes to borrowed traits fork
    /// the slot instead of reaching the ancestor.
    pub fn configure(
        &mut self,
        key: &str,
        value: impl Into<RawValue>,
        category: Category,
        locator: Locator,
    ) -> Result<Outcome> {
        match self.route(key)? {
            Route::Instance { id, name } => self.bind(id, &name, value, category, locator),
            Route::Class { component, name } => {
                self.class_bind(&component, &name, value, category, locator)
            }
            Route::Key => self.nameserver.assign(key, value, category, locator),
        }
    }

    /// The value of any dotted key
    pub fn get_key(&mut self, key: &str) -> Result<Value> {
        self.nameserver.get(key)
    }

    /// Expand `{dotted.key}` markers in `text`
    pub fn interpolate(&mut self, text: &str) -> Result<String> {
        self.nameserver.interpolate(text)
    }

    /// The audit trail of any dotted key
    pub fn explain(&self, key: &str) -> Result<&[Assignment]> {
        self.nameserver.explain(key)
    }
}
