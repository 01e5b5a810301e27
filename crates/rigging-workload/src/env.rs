//! Environment variable loading and compilation
//!
//! An app's environment comes from these places, applied in order with later
//! sources overwriting earlier ones:
//!
//! 1. variables the app derives itself (base)
//! 2. the env file
//! 3. credentials the app derives itself (sensitive base)
//! 4. the secrets file
//! 5. inline variables from the options
//!
//! On Kubernetes a Secret exists only when the secrets file has data; it then
//! holds the sensitive base and the secrets-file data, and everything else
//! goes to a ConfigMap. Without secrets-file data the sensitive base is plain
//! config. Both are loaded with `envFrom` (Secret last), and inline variables
//! that collide with a secret key are set as literal container env so the
//! order above still holds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rigging_common::yaml::load_mapping_file;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::group::K8sBuildContext;
use crate::k8s::{ConfigMap, EnvFromSource, EnvVar, Secret};

/// Variable name to value, sorted by name
pub type EnvironmentMap = BTreeMap<String, String>;

/// Environment options shared by every app
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvOptions {
    /// Inline variables; highest precedence
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "deserialize_scalar_map"
    )]
    pub env: EnvironmentMap,
    /// Flat YAML mapping of non-sensitive variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<PathBuf>,
    /// Flat YAML mapping of sensitive variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets_file: Option<PathBuf>,
}

/// Accept numbers and booleans as values, drop nulls
fn deserialize_scalar_map<'de, D>(deserializer: D) -> Result<EnvironmentMap, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    let mut out = EnvironmentMap::new();
    for (key, value) in raw {
        let value = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s,
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "env {}: expected a scalar, found {}",
                    key, other
                )))
            }
        };
        out.insert(key, value);
    }
    Ok(out)
}

/// Environment data after reading the env and secrets files
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedEnv {
    /// Variables derived by the app
    pub base: EnvironmentMap,
    /// Env file data
    pub env_file: EnvironmentMap,
    /// Credentials derived by the app
    pub sensitive_base: EnvironmentMap,
    /// Secrets file data
    pub secrets: EnvironmentMap,
    /// Inline variables
    pub inline: EnvironmentMap,
}

impl LoadedEnv {
    /// Read the files named by `options`.
    ///
    /// A file that is missing yields no data. A file that cannot be parsed
    /// is logged and yields no data.
    pub fn load(options: &EnvOptions) -> Self {
        Self {
            base: EnvironmentMap::new(),
            env_file: load_source(options.env_file.as_deref(), "env"),
            sensitive_base: EnvironmentMap::new(),
            secrets: load_source(options.secrets_file.as_deref(), "secrets"),
            inline: options.env.clone(),
        }
    }

    /// Set the app-derived variables
    pub fn with_base(mut self, base: EnvironmentMap) -> Self {
        self.base = base;
        self
    }

    /// Set the app-derived credentials
    pub fn with_sensitive_base(mut self, sensitive: EnvironmentMap) -> Self {
        self.sensitive_base = sensitive;
        self
    }

    /// All variables merged in precedence order
    pub fn merged(&self) -> EnvironmentMap {
        let mut merged = self.base.clone();
        for source in [
            &self.env_file,
            &self.sensitive_base,
            &self.secrets,
            &self.inline,
        ] {
            merged.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// Look up a key in the secrets-file data
    pub fn secret_value(&self, key: &str) -> Option<&str> {
        self.secrets.get(key).map(String::as_str)
    }

    /// Non-secret variables in precedence order
    fn plain(&self) -> EnvironmentMap {
        let mut plain = self.base.clone();
        plain.extend(self.env_file.iter().map(|(k, v)| (k.clone(), v.clone())));
        if self.secrets.is_empty() {
            plain.extend(self.sensitive_base.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        plain.extend(self.inline.iter().map(|(k, v)| (k.clone(), v.clone())));
        plain
    }

    /// Secret variables in precedence order; empty without secrets-file data
    fn sensitive(&self) -> EnvironmentMap {
        if self.secrets.is_empty() {
            return EnvironmentMap::new();
        }
        let mut sensitive = self.sensitive_base.clone();
        sensitive.extend(self.secrets.iter().map(|(k, v)| (k.clone(), v.clone())));
        sensitive
    }
}

fn load_source(path: Option<&Path>, source: &str) -> EnvironmentMap {
    let Some(path) = path else {
        return EnvironmentMap::new();
    };
    match load_mapping_file(path) {
        Ok(Some(data)) => {
            debug!(path = %path.display(), source, keys = data.len(), "loaded env data");
            data
        }
        Ok(None) => {
            debug!(path = %path.display(), source, "env data file missing or unreadable");
            EnvironmentMap::new()
        }
        Err(e) => {
            error!(path = %path.display(), source, error = %e, "invalid env data file, ignoring");
            EnvironmentMap::new()
        }
    }
}

// =============================================================================
// Kubernetes
// =============================================================================

/// Result of compiling environment variables for Kubernetes
#[derive(Debug, Default, PartialEq)]
pub struct CompiledEnv {
    /// ConfigMap for non-secret variables (if any)
    pub config_map: Option<ConfigMap>,
    /// Secret for secrets-file variables (if any)
    pub secret: Option<Secret>,
    /// EnvFrom references for the container
    pub env_from: Vec<EnvFromSource>,
    /// Literal env vars that must win over `env_from`
    pub env: Vec<EnvVar>,
}

/// Compile loaded env data into a ConfigMap and Secret
///
/// - ConfigMap only when there are non-secret variables
/// - Secret only when the secrets file supplied data
pub fn compile(
    env: &LoadedEnv,
    app_name: &str,
    config_map_name: &str,
    secret_name: &str,
    ctx: &K8sBuildContext,
) -> CompiledEnv {
    let mut result = CompiledEnv::default();

    let plain = env.plain();
    if !plain.is_empty() {
        let mut cm = ConfigMap::new(ctx.meta(config_map_name, app_name));
        cm.data = plain;
        result.config_map = Some(cm);
        result.env_from.push(EnvFromSource::config_map(config_map_name));
    }

    let sensitive = env.sensitive();
    if !sensitive.is_empty() {
        result.env = env
            .inline
            .iter()
            .filter(|(k, _)| sensitive.contains_key(*k))
            .map(|(k, v)| EnvVar::literal(k, v))
            .collect();

        let mut secret = Secret::new(ctx.meta(secret_name, app_name));
        secret.string_data = sensitive;
        result.secret = Some(secret);
        result.env_from.push(EnvFromSource::secret(secret_name));
    }

    result
}
