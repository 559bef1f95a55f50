//! Sample component declarations.

use stratum_core::{ComponentSpec, Constraint, Registry, Schema, TraitSpec};

/// An application component in family `app`.
///
/// | trait | schema | default |
/// |---|---|---|
/// | `name` | str | `world` |
/// | `greeting` | str | `hello {app.name}` |
/// | `debug` | bool | `false` |
/// | `workers` (alias `jobs`) | int, at least 1 | `4` |
pub fn app() -> ComponentSpec {
    ComponentSpec::new("app")
        .with_family("app")
        .with_trait(TraitSpec::new("name").with_schema(Schema::Str).with_default("world"))
        .with_trait(TraitSpec::new("greeting").with_schema(Schema::Str).with_default("hello {app.name}"))
        .with_trait(TraitSpec::new("debug").with_schema(Schema::Bool).with_default(false))
        .with_trait(
            TraitSpec::new("workers")
                .with_alias("jobs")
                .with_schema(Schema::Int)
                .with_default(4_i64)
                .with_constraint(Constraint::at_least(1)),
        )
}

/// A numerical solver in family `solvers`.
pub fn solver() -> ComponentSpec {
    ComponentSpec::new("solver")
        .with_family("solvers")
        .with_trait(
            TraitSpec::new("tolerance")
                .with_alias("tol")
                .with_schema(Schema::Float)
                .with_default(1e-6)
                .with_constraint(Constraint::greater_than(0)),
        )
        .with_trait(TraitSpec::new("iterations").with_schema(Schema::Int).with_default(100_i64))
        .with_trait(TraitSpec::new("method").with_default("cg"))
}

/// A registry with [`app`] and [`solver`] registered.
///
/// # Panics
/// Panics if registration fails.
pub fn sample_registry() -> Registry {
    let mut registry = Registry::new();
    for spec in [app(), solver()] {
        let name = spec.name.clone();
        registry
            .register(spec)
            .unwrap_or_else(|e| panic!("sample_registry: failed to register {name}: {e}"));
    }
    registry
}
