//! Role metadata parsing
//!
//! Dependencies are declared in `meta/main.yml` under the role root:
//!
//! ```yaml
//! dependencies:
//!   - role: base
//!   - role: users
//!     vars: { admin: true }
//!   - common
//! ```

use crate::error::{StrataError, StrataResult};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Metadata file names tried in order, relative to the role root
const META_FILES: &[&str] = &["meta/main.yml", "meta/main.yaml"];

/// Parsed dependency section of a role's metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleMeta {
    /// Dependency role names in declaration order
    pub dependencies: Vec<String>,
}

impl RoleMeta {
    /// Read the metadata of the role at `role_path`.
    ///
    /// A role without a metadata file has no dependencies.
    pub async fn from_role_dir(role_path: &Path) -> StrataResult<Self> {
        let Some(meta_path) = find_meta_file(role_path).await else {
            return Ok(Self::default());
        };

        let content = tokio::fs::read_to_string(&meta_path).await.map_err(|e| {
            StrataError::io(format!("reading role metadata {}", meta_path.display()), e)
        })?;
        Self::parse(&content, &meta_path)
    }

    /// Parse metadata from YAML; `path` is only used for error messages
    pub fn parse(content: &str, path: &Path) -> StrataResult<Self> {
        let invalid = |reason: String| StrataError::Metadata {
            path: path.to_path_buf(),
            reason,
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let doc: Value = serde_yaml::from_str(content).map_err(|e| invalid(e.to_string()))?;

        let deps = match &doc {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(map) => map.get("dependencies"),
            _ => return Err(invalid("expected a mapping at the top level".to_string())),
        };

        let entries = match deps {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Sequence(entries)) => entries,
            Some(_) => return Err(invalid("'dependencies' must be a list".to_string())),
        };

        let mut dependencies = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Value::String(name) => dependencies.push(name.clone()),
                Value::Mapping(map) => match map.get("role") {
                    Some(Value::String(name)) => dependencies.push(name.clone()),
                    None | Some(Value::Null) => {}
                    Some(other) => {
                        return Err(invalid(format!(
                            "dependency 'role' must be a string, got {:?}",
                            other
                        )))
                    }
                },
                other => {
                    return Err(invalid(format!(
                        "dependency entry must be a name or a mapping, got {:?}",
                        other
                    )))
                }
            }
        }

        Ok(Self { dependencies })
    }
}

async fn find_meta_file(role_path: &Path) -> Option<PathBuf> {
    for relative in META_FILES {
        let candidate = role_path.join(relative);
        if tokio::fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Some(candidate);
        }
    }
    None
}
