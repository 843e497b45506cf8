//! Manifest - Load the declared infrastructure from a TOML file
//!
//! ```toml
//! [provider]
//! instance_url = "https://example.datatap.adverity.com"
//! token = "${env.ADVERITY_TOKEN}"
//!
//! [backend]
//! type = "local"
//! path = "adverity.state.json"
//!
//! [data.adverity_workspace.main]
//! slug = "marketing"
//!
//! [resource.adverity_connection.facebook]
//! name = "Facebook Ads"
//! stack = "${data.adverity_workspace.main.workspace_id}"
//! connection_type_id = 42
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::resolver::{self, ResolveError};
use crate::resource::{Resource, Value};
use crate::schema::SchemaSet;

/// Manifest file used when none is given
pub const DEFAULT_MANIFEST_FILE: &str = "adverity.toml";
/// Fallback for `[provider] instance_url`
pub const INSTANCE_URL_ENV: &str = "ADVERITY_INSTANCE_URL";
/// Fallback for `[provider] token`
pub const TOKEN_ENV: &str = "ADVERITY_TOKEN";

/// Manifest error
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest: {0}")]
    Syntax(String),

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Invalid reference '{reference}' in {block}: expected ${{<type>.<name>.<attribute>}} or ${{data.<type>.<name>.<attribute>}}")]
    InvalidReference { block: String, reference: String },

    #[error("Unsupported value for '{attribute}' in {block}: {message}")]
    InvalidValue {
        block: String,
        attribute: String,
        message: String,
    },

    #[error("Missing provider setting '{setting}': set it in [provider] or via {env}")]
    MissingSetting {
        setting: &'static str,
        env: &'static str,
    },
}

/// Provider settings, after environment fallbacks
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub instance_url: Option<String>,
    pub token: Option<String>,
}

impl ProviderConfig {
    /// Instance URL and token, both required to talk to the API
    pub fn credentials(&self) -> Result<(String, String), ManifestError> {
        let instance_url = self
            .instance_url
            .clone()
            .ok_or(ManifestError::MissingSetting {
                setting: "instance_url",
                env: INSTANCE_URL_ENV,
            })?;
        let token = self.token.clone().ok_or(ManifestError::MissingSetting {
            setting: "token",
            env: TOKEN_ENV,
        })?;
        Ok((instance_url, token))
    }
}

/// `[backend]` table
#[derive(Debug, Clone, PartialEq)]
pub struct BackendBlock {
    pub backend_type: String,
    pub attributes: HashMap<String, Value>,
}

impl Default for BackendBlock {
    fn default() -> Self {
        Self {
            backend_type: "local".to_string(),
            attributes: HashMap::new(),
        }
    }
}

/// Parse result
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub provider: ProviderConfig,
    pub backend: BackendBlock,
    /// Data sources, then managed resources, each sorted by type and name
    pub resources: Vec<Resource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    provider: RawProvider,
    #[serde(default)]
    backend: Option<RawBlock>,
    #[serde(default)]
    data: Blocks,
    #[serde(default)]
    resource: Blocks,
}

/// type -> name -> attributes
type Blocks = BTreeMap<String, BTreeMap<String, toml::Table>>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProvider {
    instance_url: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    #[serde(rename = "type", default = "default_backend_type")]
    block_type: String,
    #[serde(flatten)]
    attributes: toml::Table,
}

fn default_backend_type() -> String {
    "local".to_string()
}

impl Manifest {
    /// Load a manifest from a TOML file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse a manifest, reading `${env.NAME}` values from the process environment
    pub fn parse(input: &str) -> Result<Self, ManifestError> {
        Self::parse_with_env(input, |name| std::env::var(name).ok())
    }

    /// Parse a manifest with an explicit environment lookup
    pub fn parse_with_env(
        input: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ManifestError> {
        let raw: RawManifest =
            toml::from_str(input).map_err(|e| ManifestError::Syntax(e.to_string()))?;

        let instance_url = match raw.provider.instance_url {
            Some(url) => Some(expand_env(&url, "[provider]", &env)?),
            None => env(INSTANCE_URL_ENV),
        };
        let token = match raw.provider.token {
            Some(token) => Some(expand_env(&token, "[provider]", &env)?),
            None => env(TOKEN_ENV),
        };

        let backend = match raw.backend {
            Some(block) => BackendBlock {
                backend_type: block.block_type,
                attributes: convert_table(&block.attributes, "[backend]", &env)?,
            },
            None => BackendBlock::default(),
        };

        let mut resources = Vec::new();
        for (resource_type, blocks) in &raw.data {
            for (name, table) in blocks {
                let label = format!("data.{}.{}", resource_type, name);
                let mut resource = Resource::new(resource_type, name).with_read_only(true);
                resource.attributes = convert_table(table, &label, &env)?;
                resource
                    .attributes
                    .insert("_binding".to_string(), Value::String(label));
                resources.push(resource);
            }
        }
        for (resource_type, blocks) in &raw.resource {
            for (name, table) in blocks {
                let label = format!("{}.{}", resource_type, name);
                let mut resource = Resource::new(resource_type, name);
                resource.attributes = convert_table(table, &label, &env)?;
                resources.push(resource);
            }
        }

        Ok(Manifest {
            provider: ProviderConfig {
                instance_url,
                token,
            },
            backend,
            resources,
        })
    }

    /// Managed resources (data sources excluded)
    pub fn managed(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| !r.is_data_source())
    }

    /// Apply schema defaults, then validate every block and every reference
    ///
    /// Returns one message per problem found.
    pub fn prepare(&mut self, schemas: &SchemaSet) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for resource in &mut self.resources {
            let label = resource.binding();
            let Some(schema) = schemas.get(resource) else {
                let kind = if resource.is_data_source() {
                    "data source"
                } else {
                    "resource"
                };
                errors.push(format!(
                    "{}: unknown {} type '{}'",
                    label, kind, resource.id.resource_type
                ));
                continue;
            };
            schema.apply_defaults(&mut resource.attributes);
            if let Err(type_errors) = schema.validate(&resource.attributes) {
                let mut messages: Vec<_> = type_errors
                    .iter()
                    .map(|e| format!("{}: {}", label, e))
                    .collect();
                messages.sort();
                errors.extend(messages);
            }
        }

        if let Err(ref_errors) = resolver::check_references(&self.resources) {
            errors.extend(ref_errors.iter().map(ResolveError::to_string));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Resources ordered so every reference target comes first
    pub fn ordered(&self) -> Result<Vec<Resource>, ResolveError> {
        resolver::sort_by_dependencies(&self.resources)
    }
}

fn convert_table(
    table: &toml::Table,
    block: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<HashMap<String, Value>, ManifestError> {
    table
        .iter()
        .map(|(k, v)| Ok((k.clone(), convert_value(v, block, k, env)?)))
        .collect()
}

fn convert_value(
    value: &toml::Value,
    block: &str,
    attribute: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Value, ManifestError> {
    match value {
        toml::Value::String(s) => parse_string(s, block, env),
        toml::Value::Integer(n) => Ok(Value::Int(*n)),
        toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
        toml::Value::Array(items) => items
            .iter()
            .map(|v| convert_value(v, block, attribute, env))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        toml::Value::Table(table) => convert_table(table, block, env).map(Value::Map),
        toml::Value::Float(_) | toml::Value::Datetime(_) => Err(ManifestError::InvalidValue {
            block: block.to_string(),
            attribute: attribute.to_string(),
            message: format!("{} values are not supported", value.type_str()),
        }),
    }
}

/// Interpret `${...}` strings: environment lookups and references
fn parse_string(
    s: &str,
    block: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Value, ManifestError> {
    let Some(inner) = s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) else {
        return Ok(Value::String(s.to_string()));
    };

    if let Some(name) = inner.strip_prefix("env.") {
        return env(name)
            .map(Value::String)
            .ok_or_else(|| ManifestError::EnvVarNotSet(name.to_string()));
    }

    let parts: Vec<&str> = inner.split('.').collect();
    let expected = if parts.first() == Some(&"data") { 4 } else { 3 };
    if parts.len() != expected || parts.iter().any(|p| p.is_empty()) {
        return Err(ManifestError::InvalidReference {
            block: block.to_string(),
            reference: s.to_string(),
        });
    }

    let (binding, attribute) = parts.split_at(parts.len() - 1);
    Ok(Value::ResourceRef(binding.join("."), attribute[0].to_string()))
}

/// Expand a provider setting that may be an `${env.NAME}` lookup
fn expand_env(
    s: &str,
    block: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<String, ManifestError> {
    match parse_string(s, block, env)? {
        Value::String(expanded) => Ok(expanded),
        _ => Err(ManifestError::InvalidReference {
            block: block.to_string(),
            reference: s.to_string(),
        }),
    }
}
