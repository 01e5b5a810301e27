//! YAML parsing utilities using yaml-rust2
//!
//! Provides YAML parsing with conversion to serde_json::Value for typed
//! deserialization, plus loading of flat `KEY: value` files used for env and
//! secrets data.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Number, Value};
use yaml_rust2::{Yaml, YamlLoader};

/// Error type for YAML parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlError(String);

impl std::fmt::Display for YamlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for YamlError {}

/// Parse a YAML string into a serde_json::Value.
///
/// For multi-document YAML, returns only the first document.
/// Returns `Value::Null` for empty input.
pub fn parse_yaml(input: &str) -> Result<Value, YamlError> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| YamlError(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => yaml_to_json(doc),
        None => Ok(Value::Null),
    }
}

/// Load a flat YAML mapping file into string key/value pairs.
///
/// - `Ok(None)` if the path does not exist, is not a regular file, or cannot
///   be read as UTF-8 text
/// - `Err` if the file does not parse or is not a mapping
/// - Scalar values keep their source text (`0.10` stays `0.10`)
/// - `null` values are dropped
/// - Nested values are rendered as compact JSON
///
/// An empty file is an empty mapping.
pub fn load_mapping_file(path: &Path) -> Result<Option<BTreeMap<String, String>>, YamlError> {
    if !path.is_file() {
        return Ok(None);
    }
    let Ok(text) = std::fs::read_to_string(path) else {
        return Ok(None);
    };
    parse_mapping(&text).map(Some)
}

/// Parse a flat YAML mapping from a string. See [`load_mapping_file`].
pub fn parse_mapping(input: &str) -> Result<BTreeMap<String, String>, YamlError> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| YamlError(e.to_string()))?;
    let hash = match docs.into_iter().next() {
        None => return Ok(BTreeMap::new()),
        Some(Yaml::Hash(hash)) => hash,
        Some(other) => {
            return Err(YamlError(format!(
                "expected a mapping, found {}",
                yaml_type_name(&other)
            )))
        }
    };

    let mut out = BTreeMap::new();
    for (k, v) in hash {
        let key = yaml_key(k)?;
        if let Some(value) = scalar_to_string(v)? {
            out.insert(key, value);
        }
    }
    Ok(out)
}

fn yaml_key(key: Yaml) -> Result<String, YamlError> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(r) => Ok(r),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        _ => Err(YamlError("unsupported YAML key type".to_string())),
    }
}

fn scalar_to_string(value: Yaml) -> Result<Option<String>, YamlError> {
    match value {
        Yaml::Null => Ok(None),
        Yaml::String(s) => Ok(Some(s)),
        Yaml::Integer(i) => Ok(Some(i.to_string())),
        Yaml::Real(r) => Ok(Some(r)),
        Yaml::Boolean(b) => Ok(Some(b.to_string())),
        nested @ (Yaml::Array(_) | Yaml::Hash(_)) => Ok(Some(yaml_to_json(nested)?.to_string())),
        Yaml::Alias(_) => Err(YamlError("YAML aliases not supported".to_string())),
        Yaml::BadValue => Err(YamlError("bad YAML value".to_string())),
    }
}

fn yaml_type_name(yaml: &Yaml) -> &'static str {
    match yaml {
        Yaml::Null => "null",
        Yaml::String(_) => "a string",
        Yaml::Integer(_) | Yaml::Real(_) => "a number",
        Yaml::Boolean(_) => "a boolean",
        Yaml::Array(_) => "a list",
        Yaml::Hash(_) => "a mapping",
        Yaml::Alias(_) => "an alias",
        Yaml::BadValue => "an invalid value",
    }
}

/// Convert a yaml_rust2::Yaml value to serde_json::Value
fn yaml_to_json(yaml: Yaml) -> Result<Value, YamlError> {
    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(s) => {
            let f: f64 = s
                .parse()
                .map_err(|e: std::num::ParseFloatError| YamlError(e.to_string()))?;
            Ok(Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null))
        }
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(arr) => arr
            .into_iter()
            .map(yaml_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Yaml::Hash(map) => map
            .into_iter()
            .map(|(k, v)| {
                let key = yaml_key(k)?;
                yaml_to_json(v).map(|v| (key, v))
            })
            .collect::<Result<Map<String, Value>, _>>()
            .map(Value::Object),
        Yaml::Alias(_) => Err(YamlError("YAML aliases not supported".to_string())),
        Yaml::BadValue => Err(YamlError("bad YAML value".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_yaml_nested() {
        let yaml = r#"
kind: redis
service:
  type: NodePort
  nodePort: 30080
"#;
        let result = parse_yaml(yaml).unwrap();
        assert_eq!(result["kind"], "redis");
        assert_eq!(result["service"]["type"], "NodePort");
        assert_eq!(result["service"]["nodePort"], 30080);
    }

    #[test]
    fn test_parse_yaml_empty() {
        assert_eq!(parse_yaml("").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_yaml_invalid() {
        assert!(parse_yaml("not: valid: yaml: {{").is_err());
    }

    #[test]
    fn test_deserialize_to_typed() {
        use serde::Deserialize;

        #[derive(Deserialize, Debug, PartialEq)]
        struct Config {
            name: String,
            replicas: u32,
        }

        let value = parse_yaml("name: cache\nreplicas: 2").unwrap();
        let config: Config = serde_json::from_value(value).unwrap();
        assert_eq!(
            config,
            Config {
                name: "cache".to_string(),
                replicas: 2
            }
        );
    }

    #[test]
    fn test_parse_mapping_keeps_scalar_text() {
        let map = parse_mapping("A: hello\nB: 0.10\nC: 42\nD: true\nE: null").unwrap();
        assert_eq!(map.get("A"), Some(&"hello".to_string()));
        assert_eq!(map.get("B"), Some(&"0.10".to_string()));
        assert_eq!(map.get("C"), Some(&"42".to_string()));
        assert_eq!(map.get("D"), Some(&"true".to_string()));
        assert!(!map.contains_key("E"));
    }

    #[test]
    fn test_parse_mapping_empty_input() {
        assert!(parse_mapping("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_mapping_rejects_list() {
        let err = parse_mapping("- a\n- b").unwrap_err();
        assert!(err.to_string().contains("a list"));
    }

    #[test]
    fn test_parse_mapping_renders_nested_as_json() {
        let map = parse_mapping("HOSTS:\n  - a\n  - b").unwrap();
        assert_eq!(map.get("HOSTS"), Some(&r#"["a","b"]"#.to_string()));
    }

    #[test]
    fn test_load_mapping_file_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_mapping_file(&dir.path().join("absent.yml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_mapping_file_directory_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_mapping_file(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_mapping_file_unreadable_is_none() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'A', b':', b' ', 0xff, 0xfe, b'\n']).unwrap();
        assert!(load_mapping_file(file.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_mapping_file_reads_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "REDIS_PASSWORD: hunter2").unwrap();
        let map = load_mapping_file(file.path()).unwrap().unwrap();
        assert_eq!(map.get("REDIS_PASSWORD"), Some(&"hunter2".to_string()));
    }
}
