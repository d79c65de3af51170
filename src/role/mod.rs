//! Roles and their dependencies
//!
//! A role is a directory of configuration plus a `meta/main.yml` that may
//! name other roles it depends on. Roles are resolved on demand; nothing is
//! cached between fingerprint computations.

pub mod locate;
pub mod meta;

pub use locate::{validate_role_name, RoleLocator, SearchPathLocator};
pub use meta::RoleMeta;

use crate::error::StrataResult;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// A role located on disk with its declared dependencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRole {
    /// Role name as referenced by callers and dependency entries
    pub name: String,

    /// Role root directory
    pub path: PathBuf,

    /// Dependency names in declaration order
    pub dependencies: Vec<String>,
}

/// Resolves role names into located roles with their dependency lists
#[derive(Clone)]
pub struct DependencyResolver {
    locator: Arc<dyn RoleLocator>,
}

impl DependencyResolver {
    pub fn new(locator: Arc<dyn RoleLocator>) -> Self {
        Self { locator }
    }

    /// Locate `name` and read its dependency metadata
    pub async fn resolve(&self, name: &str) -> StrataResult<ResolvedRole> {
        let path = self.locator.locate(name).await?;
        let meta = RoleMeta::from_role_dir(&path).await?;

        debug!(
            "Resolved role {} ({} dependencies)",
            name,
            meta.dependencies.len()
        );

        Ok(ResolvedRole {
            name: name.to_string(),
            path,
            dependencies: meta.dependencies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrataError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn resolve_reads_dependencies() {
        let temp = TempDir::new().unwrap();
        let web = temp.path().join("web");
        std::fs::create_dir_all(web.join("meta")).unwrap();
        std::fs::write(web.join("meta").join("main.yml"), "dependencies:\n  - role: base\n")
            .unwrap();

        let resolver = DependencyResolver::new(Arc::new(SearchPathLocator::new(vec![temp
            .path()
            .to_path_buf()])));
        let role = resolver.resolve("web").await.unwrap();

        assert_eq!(role.name, "web");
        assert_eq!(role.path, web);
        assert_eq!(role.dependencies, vec!["base"]);
    }

    #[tokio::test]
    async fn resolve_unknown_role_fails() {
        let temp = TempDir::new().unwrap();
        let resolver = DependencyResolver::new(Arc::new(SearchPathLocator::new(vec![temp
            .path()
            .to_path_buf()])));

        let err = resolver.resolve("ghost").await.unwrap_err();
        assert!(matches!(err, StrataError::RoleNotFound { .. }));
    }

    #[tokio::test]
    async fn resolve_malformed_meta_fails() {
        let temp = TempDir::new().unwrap();
        let web = temp.path().join("web");
        std::fs::create_dir_all(web.join("meta")).unwrap();
        std::fs::write(web.join("meta").join("main.yml"), "dependencies: {").unwrap();

        let resolver = DependencyResolver::new(Arc::new(SearchPathLocator::new(vec![temp
            .path()
            .to_path_buf()])));

        let err = resolver.resolve("web").await.unwrap_err();
        assert!(matches!(err, StrataError::Metadata { .. }));
    }
}
