//! Registry lifecycle and shared access across crates

use std::thread;

use pretty_assertions::assert_eq;
use stratum_core::{Category, Error, Locator, SharedRegistry, Value};
use stratum_sources::{CommandLine, Configurator};
use stratum_test_utils::components::sample_registry;

#[test]
fn test_configurators_on_many_threads_share_one_registry() {
    let shared = SharedRegistry::new(sample_registry());
    let handles: Vec<_> = (1..=4)
        .map(|i| {
            let shared = shared.clone();
            thread::spawn(move || {
                let name = format!("node{i}");
                let mut configurator = Configurator::new();
                configurator
                    .collect(&CommandLine::new([format!("--{name}.jobs={i}")]))
                    .unwrap();
                shared.with(|registry| {
                    configurator.apply(registry).unwrap();
                    registry.instantiate("app", Some(&name)).unwrap()
                })
            })
        })
        .collect();

    let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    shared.with(|registry| {
        for (i, id) in (1..=4_i64).zip(ids) {
            assert_eq!(registry.get(id, "workers").unwrap(), Value::Int(i));
        }
        assert_eq!(registry.class_get("app", "workers").unwrap(), Value::Int(4));
    });
}

#[test]
fn test_destroyed_instances_release_their_keys() {
    let mut registry = sample_registry();
    let temp = registry.instantiate("app", Some("temp")).unwrap();
    registry.set(temp, "name", "scratch").unwrap();
    assert_eq!(registry.get_key("temp.name").unwrap(), Value::from("scratch"));

    registry.destroy(temp).unwrap();
    assert!(matches!(registry.get_key("temp.name"), Err(Error::Unresolved { .. })));
    assert!(matches!(registry.get(temp, "name"), Err(Error::UnknownInstance { .. })));

    // the name is free again and starts from the class values
    let again = registry.instantiate("app", Some("temp")).unwrap();
    assert_eq!(registry.get(again, "name").unwrap(), Value::from("world"));
}

#[test]
fn test_instance_greeting_follows_the_class_name() {
    let mut registry = sample_registry();
    let web = registry.instantiate("app", Some("web")).unwrap();

    registry
        .configure("app.name", "stratum", Category::File, Locator::Api)
        .unwrap();
    assert_eq!(registry.get(web, "greeting").unwrap(), Value::from("hello stratum"));
    assert_eq!(
        registry.interpolate("{web.greeting} with {web.jobs} workers").unwrap(),
        "hello stratum with 4 workers"
    );

    registry.set(web, "greeting", "hi {web.name}").unwrap();
    assert_eq!(registry.get(web, "greeting").unwrap(), Value::from("hi stratum"));
    assert_eq!(registry.class_get("app", "greeting").unwrap(), Value::from("hello stratum"));
}
