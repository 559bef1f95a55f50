//! Component and trait declarations
//!
//! A [`ComponentSpec`] lists the parent components it builds on and the traits
//! it declares itself. The [`Registry`](crate::Registry) flattens the parents
//! into one trait table when the component is registered.

use crate::constraint::Constraint;
use crate::priority::Category;
use crate::schema::Schema;
use crate::value::RawValue;

/// Declaration of one configurable property of a component.
#[derive(Debug, Clone)]
pub struct TraitSpec {
    /// Canonical name
    pub name: String,
    /// Alternative names that resolve to the same slot
    pub aliases: Vec<String>,
    pub schema: Schema,
    /// Raw default value; `None` falls back to the implicit default of the schema
    pub default: Option<RawValue>,
    /// Category the default is assigned with
    pub category: Category,
    pub constraints: Vec<Constraint>,
    pub doc: Option<String>,
}

impl TraitSpec {
    /// Create an untyped trait with no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            schema: Schema::Any,
            default: None,
            category: Category::Default,
            constraints: Vec::new(),
            doc: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_default(mut self, value: impl Into<RawValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Assign the default with a category other than [`Category::Default`].
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// The canonical name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// The raw value the trait starts out with, if any.
    pub fn initial_value(&self) -> Option<RawValue> {
        self.default.clone().or_else(|| {
            self.schema
                .implicit_default()
                .map(RawValue::Literal)
        })
    }
}

/// Declaration of a component type.
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub name: String,
    /// Key prefix under which the class-level traits are published
    pub family: Option<String>,
    /// Parent components, flattened in order; later parents win on name clashes
    pub parents: Vec<String>,
    pub traits: Vec<TraitSpec>,
    pub doc: Option<String>,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: None,
            parents: Vec::new(),
            traits: Vec::new(),
            doc: None,
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    pub fn with_trait(mut self, spec: TraitSpec) -> Self {
        self.traits.push(spec);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn trait_builder_collects_names() {
        let spec = TraitSpec::new("tolerance")
            .with_alias("tol")
            .with_alias("eps")
            .with_schema(Schema::Float)
            .with_default(1e-6);
        let names: Vec<_> = spec.names().collect();
        assert_eq!(names, vec!["tolerance", "tol", "eps"]);
        assert_eq!(spec.initial_value(), Some(RawValue::Literal(Value::Float(1e-6))));
    }

    #[test]
    fn env_path_traits_default_from_the_environment() {
        let spec = TraitSpec::new("path")
            .with_schema(Schema::env_path("STRATUM_COMPONENT_TEST_UNSET_PATH"));
        assert_eq!(spec.initial_value(), Some(RawValue::Literal(Value::List(vec![]))));
    }

    #[test]
    fn component_builder_keeps_parent_order() {
        let spec = ComponentSpec::new("fast")
            .with_family("solvers.fast")
            .with_parent("base")
            .with_parent("tuned");
        assert_eq!(spec.parents, vec!["base", "tuned"]);
        assert_eq!(spec.family.as_deref(), Some("solvers.fast"));
    }
}
