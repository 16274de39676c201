//! Variable lookup for `{{ dotted.path }}` placeholders.
//!
//! Two sources answer a lookup, checked in this order:
//! 1. the typed config namespaces (`project`, `repository`, `content`, `outputs`)
//! 2. the user variables tree loaded from `variables.yml`
//!
//! Anything neither source can answer is an error. Nothing resolves to an
//! empty string by accident.

use std::path::Path;
use std::sync::Arc;

use serde_yaml::Value;
use tracing::{debug, warn};

use llmsforge_shared::{BuildConfig, ConfigLookup, LlmsForgeError, Result};

/// Closed variable schema for one build.
#[derive(Debug, Clone)]
pub struct Variables {
    config: Arc<BuildConfig>,
    tree: Value,
}

impl Variables {
    /// Build a lookup from config plus an already-parsed variables tree.
    pub fn new(config: Arc<BuildConfig>, tree: Value) -> Self {
        Self { config, tree }
    }

    /// Load `variables.yml` for the given config. A missing file is an empty tree.
    pub fn load(config: Arc<BuildConfig>) -> Result<Self> {
        let path = config.variables_path();
        let tree = load_tree(&path)?;
        Ok(Self::new(config, tree))
    }

    /// Resolve a dotted variable name to its text.
    pub fn lookup(&self, name: &str) -> Result<String> {
        let unresolved = |reason: String| LlmsForgeError::UnresolvedVariable {
            name: name.to_string(),
            reason,
        };

        match self.config.lookup(name) {
            ConfigLookup::Value(value) => Ok(value),
            ConfigLookup::Unset => Err(unresolved("config field is not set".into())),
            ConfigLookup::UnknownField => {
                let namespace = name.split('.').next().unwrap_or_default();
                Err(unresolved(format!(
                    "not a recognized field of the '{namespace}' namespace"
                )))
            }
            ConfigLookup::NotConfig => self.lookup_tree(name).map_err(unresolved),
        }
    }

    /// Walk the variables tree (mappings only) down to a scalar leaf.
    fn lookup_tree(&self, name: &str) -> std::result::Result<String, String> {
        let mut node = &self.tree;
        for key in name.split('.').map(str::trim).filter(|k| !k.is_empty()) {
            node = match node {
                Value::Mapping(map) => map
                    .get(key)
                    .ok_or_else(|| format!("'{key}' is not defined in the variables file"))?,
                _ => return Err(format!("'{key}' is looked up on a non-mapping value")),
            };
        }

        match node {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Err("value is null".into()),
            Value::Sequence(_) | Value::Mapping(_) => {
                Err("value is not a scalar (lists and mappings cannot be inlined)".into())
            }
            Value::Tagged(tagged) => match &tagged.value {
                Value::String(s) => Ok(s.clone()),
                _ => Err("tagged value is not a string".into()),
            },
        }
    }
}

/// Read and parse a YAML variables file; absent means empty.
fn load_tree(path: &Path) -> Result<Value> {
    if !path.exists() {
        debug!(path = %path.display(), "no variables file, only config variables available");
        return Ok(Value::Mapping(Default::default()));
    }

    let text = std::fs::read_to_string(path).map_err(|e| LlmsForgeError::io(path, e))?;
    let tree: Value = serde_yaml::from_str(&text).map_err(|e| {
        LlmsForgeError::parse(format!("invalid variables file {}: {e}", path.display()))
    })?;

    match tree {
        Value::Mapping(_) => {
            debug!(path = %path.display(), "loaded variables file");
            Ok(tree)
        }
        Value::Null => {
            warn!(path = %path.display(), "variables file is empty");
            Ok(Value::Mapping(Default::default()))
        }
        _ => Err(LlmsForgeError::parse(format!(
            "variables file {} must contain a mapping at the top level",
            path.display()
        ))),
    }
}
