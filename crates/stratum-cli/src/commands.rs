//! Command implementations for stratum-cli

use std::collections::BTreeMap;

use colored::Colorize;
use serde::Serialize;
use stratum_core::{Assignment, Disposition, Registry, Value};
use stratum_sources::{CommandLine, ConfigFile, Configurator, Environment};
use tracing::debug;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Build a registry from files, then the environment, then the overrides.
pub fn load(cli: &Cli) -> Result<Registry> {
    let mut configurator = Configurator::new();
    for path in &cli.configs {
        configurator.collect(&ConfigFile::new(path))?;
    }
    if !cli.no_env {
        configurator.collect(&Environment::new(&cli.env_prefix))?;
    }
    configurator.collect(&CommandLine::new(cli.command.overrides().iter().cloned()))?;

    if let Some(extra) = configurator.positional().first() {
        return Err(CliError::user(format!(
            "unexpected argument {extra:?} in overrides; expected --key=value"
        )));
    }

    let mut registry = Registry::new();
    let report = configurator.apply(&mut registry)?;
    debug!(events = report.entries.len(), "registry loaded");
    Ok(registry)
}

/// Run the get command
pub fn run_get(registry: &mut Registry, keys: &[String]) -> Result<()> {
    for key in keys {
        let value = registry.get_key(key)?;
        println!("{value}");
    }
    Ok(())
}

/// Run the dump command
pub fn run_dump(registry: &mut Registry, json: bool) -> Result<()> {
    let keys: Vec<String> = registry.nameserver().keys().map(String::from).collect();
    let mut values = BTreeMap::new();
    for key in keys {
        let value = registry.get_key(&key)?;
        values.insert(key, value);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for (key, value) in &values {
            println!("{key} = {value}");
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct Explanation<'a> {
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    history: &'a [Assignment],
}

/// Run the explain command
pub fn run_explain(registry: &mut Registry, key: &str, json: bool) -> Result<()> {
    let (value, error) = match registry.get_key(key) {
        Ok(value) => (Some(value), None),
        Err(e) => (None, Some(e.to_string())),
    };
    let history = registry.explain(key)?;

    if json {
        let explanation = Explanation {
            key,
            value,
            error,
            history,
        };
        println!("{}", serde_json::to_string_pretty(&explanation)?);
        return Ok(());
    }

    match (&value, &error) {
        (Some(value), _) => println!("{} = {value}", key.bold()),
        (None, Some(error)) => println!("{}: {}", key.bold(), error.red()),
        (None, None) => println!("{}", key.bold()),
    }
    for assignment in history {
        let disposition = format!("{:<10}", assignment.disposition.to_string());
        let disposition = match assignment.disposition {
            Disposition::Applied => disposition.green(),
            Disposition::Invalid => disposition.red(),
            _ => disposition.dimmed(),
        };
        println!(
            "  {disposition} {:<12} {:<24} {}",
            assignment.priority.category.to_string(),
            assignment.value.to_string(),
            assignment.locator.to_string().dimmed()
        );
    }
    Ok(())
}

/// Run the interpolate command
pub fn run_interpolate(registry: &mut Registry, text: &str) -> Result<()> {
    println!("{}", registry.interpolate(text)?);
    Ok(())
}
