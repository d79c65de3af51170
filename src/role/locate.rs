//! Role location
//!
//! Resolves role names to directories by searching, in order:
//! 1. Configured search paths (project `roles/` by default)
//! 2. `ANSIBLE_ROLES_PATH` entries
//! 3. `~/.ansible/roles/{name}/`
//! 4. `/etc/ansible/roles/{name}/`

use crate::error::{StrataError, StrataResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maps a role name to the directory holding it
#[async_trait]
pub trait RoleLocator: Send + Sync {
    /// Locate a role, failing with `RoleNotFound` if no candidate exists
    async fn locate(&self, name: &str) -> StrataResult<PathBuf>;
}

/// Validate that a role name is safe (no path traversal, no special characters).
///
/// Dots are allowed for namespaced roles such as `acme.nginx`.
pub fn validate_role_name(name: &str) -> StrataResult<()> {
    let invalid = |reason: &str| StrataError::RoleNameInvalid {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") || name.contains('\0') {
        return Err(invalid("must not contain path separators or '..'"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(invalid(
            "must contain only alphanumeric characters, '.', '-' or '_'",
        ));
    }
    Ok(())
}

/// Locates roles in an ordered list of directories (first match wins)
#[derive(Debug, Clone)]
pub struct SearchPathLocator {
    search_paths: Vec<PathBuf>,
}

impl SearchPathLocator {
    /// Create a locator over exactly the given directories
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Create a locator from configured paths plus the standard Ansible
    /// role directories. Relative configured paths are resolved against
    /// `project_dir`.
    pub fn with_defaults(project_dir: &Path, configured: &[PathBuf]) -> Self {
        let mut search_paths: Vec<PathBuf> = configured
            .iter()
            .map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    project_dir.join(p)
                }
            })
            .collect();

        if let Some(env_paths) = std::env::var_os("ANSIBLE_ROLES_PATH") {
            search_paths.extend(
                std::env::split_paths(&env_paths).filter(|p| !p.as_os_str().is_empty()),
            );
        }
        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".ansible").join("roles"));
        }
        search_paths.push(PathBuf::from("/etc/ansible/roles"));

        Self { search_paths }
    }

    /// Directories searched, in order
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

#[async_trait]
impl RoleLocator for SearchPathLocator {
    async fn locate(&self, name: &str) -> StrataResult<PathBuf> {
        validate_role_name(name)?;

        for dir in &self.search_paths {
            let candidate = dir.join(name);
            let is_dir = tokio::fs::metadata(&candidate)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if is_dir {
                debug!("Located role {} at {}", name, candidate.display());
                return Ok(candidate);
            }
        }

        let searched: Vec<String> = self
            .search_paths
            .iter()
            .map(|dir| dir.join(name).display().to_string())
            .collect();

        Err(StrataError::RoleNotFound {
            name: name.to_string(),
            searched: searched.join(", "),
            required_by: None,
        })
    }
}
