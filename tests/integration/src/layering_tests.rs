//! End-to-end layering of files, environment and command line over components

use pretty_assertions::assert_eq;
use stratum_core::{Category, Disposition, Locator, Value};
use stratum_sources::{CommandLine, ConfigFile, Configurator, Environment};
use stratum_test_utils::ConfigDir;
use stratum_test_utils::components::sample_registry;

#[test]
fn test_group_overrides_reach_every_instance() {
    let mut registry = sample_registry();
    let fast = registry.instantiate("solver", Some("fast")).unwrap();
    let slow = registry.instantiate("solver", Some("slow")).unwrap();

    let mut configurator = Configurator::new();
    configurator
        .collect(&CommandLine::new(["--(fast,slow).tol=1e-2", "--fast.method=gmres"]))
        .unwrap();
    configurator.apply(&mut registry).unwrap();

    assert_eq!(registry.get(fast, "tolerance").unwrap(), Value::Float(1e-2));
    assert_eq!(registry.get(slow, "tolerance").unwrap(), Value::Float(1e-2));
    assert_eq!(registry.get(fast, "method").unwrap(), Value::from("gmres"));
    assert_eq!(registry.get(slow, "method").unwrap(), Value::from("cg"));
    assert_eq!(registry.class_get("solver", "tol").unwrap(), Value::Float(1e-6));
}

#[test]
fn test_configuration_waits_for_instances() {
    let dir = ConfigDir::new();
    let cfg = dir.write("solvers.cfg", "[fast]\ntol = 1e-4\n\n[solvers]\niterations = 50\n");

    let mut configurator = Configurator::new();
    configurator
        .collect(&ConfigFile::new(&cfg))
        .unwrap()
        .collect(&Environment::default().with_vars([("STRATUM_FAST__ITERATIONS", "75")]))
        .unwrap();

    let mut registry = sample_registry();
    configurator.apply(&mut registry).unwrap();
    let fast = registry.instantiate("solver", Some("fast")).unwrap();
    let slow = registry.instantiate("solver", Some("slow")).unwrap();

    assert_eq!(registry.get(fast, "tolerance").unwrap(), Value::Float(1e-4));
    assert_eq!(registry.get(fast, "iterations").unwrap(), Value::Int(75));
    assert_eq!(registry.get(slow, "iterations").unwrap(), Value::Int(50));
    assert_eq!(registry.get(slow, "tolerance").unwrap(), Value::Float(1e-6));

    // a later class change still reaches the instance that never wrote it
    registry
        .configure("solvers.iterations", 60_i64, Category::Explicit, Locator::Api)
        .unwrap();
    assert_eq!(registry.get(slow, "iterations").unwrap(), Value::Int(60));
    assert_eq!(registry.get(fast, "iterations").unwrap(), Value::Int(75));
}

#[test]
fn test_audit_trail_names_every_source() {
    let dir = ConfigDir::new();
    let cfg = dir.write("app.cfg", "# app\n[app]\nname = file\n");

    let mut configurator = Configurator::new();
    configurator
        .collect(&ConfigFile::new(&cfg))
        .unwrap()
        .collect(&CommandLine::new(["--app.name=cli"]).with_offset(1))
        .unwrap();
    let mut registry = sample_registry();
    configurator.apply(&mut registry).unwrap();

    let trail: Vec<_> = registry
        .explain("app.name")
        .unwrap()
        .iter()
        .map(|a| (a.disposition, a.locator.clone()))
        .collect();
    assert_eq!(
        trail,
        vec![
            (
                Disposition::Superseded,
                Locator::synthetic("default of app.name")
            ),
            (Disposition::Superseded, Locator::file(&cfg, Some(3))),
            (Disposition::Applied, Locator::command_line(1)),
        ]
    );

    let json = serde_json::to_value(registry.explain("app.name").unwrap()).unwrap();
    assert_eq!(json[2]["disposition"], "applied");
    assert_eq!(json[2]["locator"]["source"], "command-line");
}
