//! Configuration files
//!
//! The format is chosen by extension. Structured formats (`.toml`, `.json`,
//! `.yaml`/`.yml`) are flattened into dotted keys: nested tables become key
//! levels, strings stay interpolable text and every other value is a literal.
//! `.cfg` files are line oriented:
//!
//! ```text
//! ; comment
//! [solvers.fast]
//! tolerance = 1e-3
//! method: gmres
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use stratum_core::{Category, Locator, RawValue, Value, key};
use tracing::debug;

use crate::event::{Event, Harvest, Source};
use crate::{Error, Result};

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
    Yaml,
    Cfg,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "toml" => Ok(Format::Toml),
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "cfg" => Ok(Format::Cfg),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Toml => "TOML",
            Format::Json => "JSON",
            Format::Yaml => "YAML",
            Format::Cfg => "cfg",
        }
    }
}

/// A configuration file on disk.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Harvest> {
        let format = Format::from_path(&self.path)?;
        let content =
            fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let harvest = parse(&self.path, format, &content)?;
        debug!(path = %self.path.display(), events = harvest.events.len(), "loaded config file");
        Ok(harvest)
    }
}

impl Source for ConfigFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn harvest(&self) -> Result<Harvest> {
        self.load()
    }
}

/// Parse file content as `format`; `path` is only used for locators and errors.
pub fn parse(path: &Path, format: Format, content: &str) -> Result<Harvest> {
    let document: serde_json::Value = match format {
        Format::Cfg => return parse_cfg(path, content),
        Format::Toml => toml::from_str(content)
            .map_err(|e| Error::parse(path, format.name(), e.to_string(), None))?,
        Format::Json => serde_json::from_str(content)
            .map_err(|e| Error::parse(path, format.name(), e.to_string(), None))?,
        Format::Yaml => serde_yaml::from_str(content)
            .map_err(|e| Error::parse(path, format.name(), e.to_string(), None))?,
    };

    let mut harvest = Harvest::new();
    match document {
        serde_json::Value::Object(table) => {
            flatten(path, format, None, table, &mut harvest)?;
        }
        serde_json::Value::Null => {}
        other => {
            return Err(Error::parse(
                path,
                format.name(),
                format!("top level must be a table, found {other}"),
                None,
            ));
        }
    }
    Ok(harvest)
}

fn flatten(
    path: &Path,
    format: Format,
    prefix: Option<&str>,
    table: serde_json::Map<String, serde_json::Value>,
    harvest: &mut Harvest,
) -> Result<()> {
    for (name, value) in table {
        let key = key::join(prefix, &name);
        if !key::is_valid(&key) {
            return Err(Error::parse(
                path,
                format.name(),
                format!("{key:?} is not a valid key"),
                None,
            ));
        }
        let raw = match value {
            serde_json::Value::Object(nested) => {
                flatten(path, format, Some(&key), nested, harvest)?;
                continue;
            }
            serde_json::Value::String(text) => RawValue::Text(text),
            other => RawValue::Literal(Value::from(other)),
        };
        harvest.push(Event::new(
            key,
            raw,
            Category::File,
            Locator::file(path, None),
        ));
    }
    Ok(())
}

fn parse_cfg(path: &Path, content: &str) -> Result<Harvest> {
    let mut harvest = Harvest::new();
    let mut section: Option<String> = None;

    for (index, line) in content.lines().enumerate() {
        let number = index + 1;
        let error = |message: String| Error::parse(path, "cfg", message, Some(number));
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or_else(|| error("unterminated section header".to_string()))?
                .trim();
            if !key::is_valid(name) {
                return Err(error(format!("{name:?} is not a valid section name")));
            }
            section = Some(name.to_string());
            continue;
        }

        let Some(split) = line.find(['=', ':']) else {
            return Err(error("expected `key = value`".to_string()));
        };
        let name = line[..split].trim();
        let value = line[split + 1..].trim();
        let key = key::join(section.as_deref(), name);
        if !key::is_valid(&key) {
            return Err(error(format!("{key:?} is not a valid key")));
        }

        harvest.push(Event::new(
            key,
            RawValue::text(value),
            Category::File,
            Locator::file(path, Some(number)),
        ));
    }

    Ok(harvest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn pairs(harvest: &Harvest) -> Vec<(&str, RawValue)> {
        harvest
            .events
            .iter()
            .map(|e| (e.key.as_str(), e.value.clone()))
            .collect()
    }

    #[rstest]
    #[case("a.toml", Format::Toml)]
    #[case("a.JSON", Format::Json)]
    #[case("a.yml", Format::Yaml)]
    #[case("dir/a.yaml", Format::Yaml)]
    #[case("a.cfg", Format::Cfg)]
    fn format_follows_extension(#[case] path: &str, #[case] expected: Format) {
        assert_eq!(Format::from_path(Path::new(path)).unwrap(), expected);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = Format::from_path(Path::new("a.ini")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { extension } if extension == "ini"));
    }

    #[test]
    fn toml_tables_flatten_into_dotted_keys() {
        let content = r#"
            [user]
            name = "{user.first} smith"
            age = 42

            [solvers.fast]
            tolerance = 1e-3
            methods = ["cg", "gmres"]
        "#;
        let harvest = parse(Path::new("app.toml"), Format::Toml, content).unwrap();
        let mut events = pairs(&harvest);
        events.sort_by(|a, b| a.0.cmp(b.0));

        assert_eq!(
            events,
            vec![
                (
                    "solvers.fast.methods",
                    RawValue::Literal(Value::List(vec!["cg".into(), "gmres".into()]))
                ),
                ("solvers.fast.tolerance", RawValue::literal(1e-3)),
                ("user.age", RawValue::literal(42_i64)),
                ("user.name", RawValue::text("{user.first} smith")),
            ]
        );
        assert!(harvest
            .events
            .iter()
            .all(|e| e.category == Category::File && e.locator == Locator::file("app.toml", None)));
    }

    #[test]
    fn json_and_yaml_agree() {
        let json = r#"{"app": {"debug": true, "name": "demo"}}"#;
        let yaml = "app:\n  debug: true\n  name: demo\n";
        let json_parsed = parse(Path::new("a.json"), Format::Json, json).unwrap();
        let yaml_parsed = parse(Path::new("a.yaml"), Format::Yaml, yaml).unwrap();
        let mut from_json = pairs(&json_parsed);
        let mut from_yaml = pairs(&yaml_parsed);
        from_json.sort_by(|a, b| a.0.cmp(b.0));
        from_yaml.sort_by(|a, b| a.0.cmp(b.0));
        assert_eq!(from_json, from_yaml);
        assert_eq!(from_json[0], ("app.debug", RawValue::literal(true)));
    }

    #[test]
    fn structured_parse_errors_name_the_format() {
        let err = parse(Path::new("bad.json"), Format::Json, "{").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { ref format, .. } if format == "JSON"));

        let err = parse(Path::new("list.json"), Format::Json, "[1, 2]").unwrap_err();
        assert!(err.to_string().contains("top level must be a table"));

        let err = parse(Path::new("k.json"), Format::Json, r#"{"a b": 1}"#).unwrap_err();
        assert!(err.to_string().contains("not a valid key"));
    }

    #[test]
    fn cfg_sections_and_separators() {
        let content = "\
; top comment
greeting = hello {user.name}

[user]
# nested
name: ann
url = http://example.com/a=b
[solvers.fast]
tolerance=1e-3
";
        let harvest = parse(Path::new("app.cfg"), Format::Cfg, content).unwrap();
        assert_eq!(
            pairs(&harvest),
            vec![
                ("greeting", RawValue::text("hello {user.name}")),
                ("user.name", RawValue::text("ann")),
                ("user.url", RawValue::text("http://example.com/a=b")),
                ("solvers.fast.tolerance", RawValue::text("1e-3")),
            ]
        );
        let lines: Vec<_> = harvest.events.iter().map(|e| e.locator.to_string()).collect();
        assert_eq!(lines, vec!["app.cfg:2", "app.cfg:6", "app.cfg:7", "app.cfg:9"]);
    }

    #[rstest]
    #[case("[open\n", 1)]
    #[case("a = 1\njust words\n", 2)]
    #[case("\n\n[bad key]\n", 3)]
    #[case("[s]\n9 = x\n", 2)]
    fn cfg_errors_carry_line_numbers(#[case] content: &str, #[case] line: usize) {
        let err = parse(Path::new("bad.cfg"), Format::Cfg, content).unwrap_err();
        match err {
            Error::ConfigParse { line: Some(found), .. } => assert_eq!(found, line),
            other => panic!("unexpected error: {other}"),
        }
    }
}
