use pretty_assertions::assert_eq;
use rstest::rstest;
use stratum_core::{Category, Disposition, Value};
use stratum_sources::{CommandLine, ConfigFile, Configurator, Environment, Error};
use stratum_test_utils::ConfigDir;
use stratum_test_utils::components::sample_registry;

#[test]
fn test_sources_layer_by_category() {
    let dir = ConfigDir::new();
    let cfg = dir.write("app.cfg", "[app]\nname = file\nworkers = 2\ndebug = no\n");
    let toml = dir.write("solvers.toml", "[solvers]\ntol = 1e-3\nmethod = \"gmres\"\n");

    let mut configurator = Configurator::new();
    configurator
        .collect(&ConfigFile::new(&cfg))
        .unwrap()
        .collect(&ConfigFile::new(&toml))
        .unwrap()
        .collect(&Environment::default().with_vars([
            ("STRATUM_APP__NAME", "env"),
            ("STRATUM_APP__WORKERS", "3"),
        ]))
        .unwrap()
        .collect(&CommandLine::new(["--app.name=cli", "--app.debug", "run"]))
        .unwrap();

    let mut registry = sample_registry();
    let report = configurator.apply(&mut registry).unwrap();

    assert_eq!(registry.class_get("app", "name").unwrap(), Value::from("cli"));
    assert_eq!(registry.class_get("app", "workers").unwrap(), Value::Int(3));
    assert_eq!(registry.class_get("app", "debug").unwrap(), Value::Bool(true));
    assert_eq!(registry.class_get("app", "greeting").unwrap(), Value::from("hello cli"));
    assert_eq!(registry.class_get("solver", "tolerance").unwrap(), Value::Float(1e-3));
    assert_eq!(registry.class_get("solver", "method").unwrap(), Value::from("gmres"));
    assert_eq!(configurator.positional(), ["run".to_string()]);
    assert_eq!(report.shadowed().count(), 0);

    let history: Vec<_> = registry
        .explain("app.name")
        .unwrap()
        .iter()
        .map(|a| (a.priority.category, a.disposition))
        .collect();
    assert_eq!(
        history,
        vec![
            (Category::Default, Disposition::Superseded),
            (Category::File, Disposition::Superseded),
            (Category::Environment, Disposition::Superseded),
            (Category::CommandLine, Disposition::Applied),
        ]
    );
}

#[test]
fn test_lower_categories_arriving_late_are_shadowed() {
    let dir = ConfigDir::new();
    let json = dir.write("late.json", r#"{"app": {"name": "file"}}"#);

    let mut configurator = Configurator::new();
    configurator
        .collect(&CommandLine::new(["--app.name=cli"]))
        .unwrap()
        .collect(&ConfigFile::new(&json))
        .unwrap();

    let mut registry = sample_registry();
    let report = configurator.apply(&mut registry).unwrap();

    assert_eq!(registry.class_get("app", "name").unwrap(), Value::from("cli"));
    let shadowed: Vec<_> = report.shadowed().map(|e| e.key.as_str()).collect();
    assert_eq!(shadowed, vec!["app.name"]);
}

#[test]
fn test_files_configure_instances_created_later() {
    let dir = ConfigDir::new();
    let yaml = dir.write("prod.yaml", "prod:\n  jobs: 8\n  name: \"{app.name}-prod\"\n");

    let mut configurator = Configurator::new();
    configurator.collect(&ConfigFile::new(&yaml)).unwrap();
    let mut registry = sample_registry();
    configurator.apply(&mut registry).unwrap();

    let prod = registry.instantiate("app", Some("prod")).unwrap();
    assert_eq!(registry.get(prod, "workers").unwrap(), Value::Int(8));
    assert_eq!(registry.get(prod, "name").unwrap(), Value::from("world-prod"));
    assert_eq!(registry.class_get("app", "workers").unwrap(), Value::Int(4));
}

#[rstest]
#[case("bad.cfg", "[app]\nworkers = 0\n")]
#[case("bad.toml", "[app]\nworkers = \"many\"\n")]
fn test_rejected_values_abort_application(#[case] name: &str, #[case] content: &str) {
    let dir = ConfigDir::new();
    let path = dir.write(name, content);

    let mut configurator = Configurator::new();
    configurator.collect(&ConfigFile::new(&path)).unwrap();
    let mut registry = sample_registry();

    let err = configurator.apply(&mut registry).unwrap_err();
    assert!(matches!(err, Error::Core(ref core) if core.rejects_value()), "{err}");
    assert_eq!(registry.class_get("app", "workers").unwrap(), Value::Int(4));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = ConfigDir::new();
    let err = ConfigFile::new(dir.root().join("absent.toml")).load().unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}
