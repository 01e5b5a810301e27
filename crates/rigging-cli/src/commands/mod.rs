//! CLI commands

use std::io::Write;
use std::path::Path;

use rigging_apps::{App, AppDefinition};
use serde::Serialize;
use tracing::debug;

use crate::{Error, Result};

pub mod connection_url;
pub mod render;
pub mod schema;

/// Read an app definition file.
pub fn load_definition(path: &Path) -> Result<AppDefinition> {
    let input = std::fs::read_to_string(path).map_err(|source| Error::ReadDefinition {
        path: path.to_path_buf(),
        source,
    })?;
    let definition = AppDefinition::from_yaml(&input)?;
    debug!(path = %path.display(), kind = definition.kind(), "loaded app definition");
    Ok(definition)
}

/// Read an app definition file and create its app.
pub fn load_app(path: &Path) -> Result<Box<dyn App>> {
    Ok(load_definition(path)?.into_app()?)
}

/// Write values as a multi-document YAML stream.
pub fn write_documents<T: Serialize>(out: &mut impl Write, documents: &[T]) -> Result<()> {
    for document in documents {
        writeln!(out, "---")?;
        out.write_all(serde_yaml::to_string(document)?.as_bytes())?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_documents_are_separated() {
        let mut out = Vec::new();
        write_documents(&mut out, &[json!({"a": 1}), json!({"b": 2})]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "---\na: 1\n---\nb: 2\n");
    }

    #[test]
    fn test_missing_definition_file() {
        let err = load_definition(Path::new("/nonexistent/app.yaml")).unwrap_err();
        assert!(matches!(err, Error::ReadDefinition { .. }));
    }
}
