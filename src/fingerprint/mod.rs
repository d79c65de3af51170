//! Role fingerprints
//!
//! A fingerprint is the SHA-256 of a role's files followed by the files of
//! every role in its dependency closure, visited depth-first with
//! dependencies in sorted name order. Each role is hashed once, so diamond
//! and cyclic dependency graphs terminate and hash deterministically.
//!
//! Stream layout:
//!
//! | Part | Bytes |
//! |------|-------|
//! | root role | files as written by [`hasher::hash_directory`] |
//! | each dependency | `role:<name>::` then its files |

pub mod hasher;

pub use hasher::hash_directory;

use crate::error::{StrataError, StrataResult};
use crate::role::{DependencyResolver, ResolvedRole};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Content digest of a role and its dependency closure (64 hex chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Number of hex characters in a fingerprint
    pub const LEN: usize = 64;

    fn from_digest(digest: Sha256) -> Self {
        Self(hex::encode(digest.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for display
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl FromStr for Fingerprint {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.len() == Self::LEN
            && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(StrataError::InvalidFingerprint(s.to_string()))
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fingerprint together with the roles that went into it
#[derive(Debug, Clone, Serialize)]
pub struct FingerprintReport {
    pub fingerprint: Fingerprint,

    /// Every role of the closure, in the order it was hashed
    pub roles: Vec<ResolvedRole>,
}

/// Computes fingerprints over role dependency closures
#[derive(Clone)]
pub struct FingerprintEngine {
    resolver: DependencyResolver,
}

impl FingerprintEngine {
    pub fn new(resolver: DependencyResolver) -> Self {
        Self { resolver }
    }

    /// Fingerprint `role` and its transitive dependencies
    pub async fn fingerprint(
        &self,
        role: &str,
        cancel: &CancellationToken,
    ) -> StrataResult<Fingerprint> {
        Ok(self.fingerprint_closure(role, cancel).await?.fingerprint)
    }

    /// Fingerprint `role` and report the closure it covers.
    ///
    /// Any resolution or read failure aborts the computation; no partial
    /// fingerprint is produced.
    pub async fn fingerprint_closure(
        &self,
        role: &str,
        cancel: &CancellationToken,
    ) -> StrataResult<FingerprintReport> {
        let mut digest = Sha256::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut roles = Vec::new();

        // (role, role that declared it); popped in depth-first pre-order
        let mut pending: Vec<(String, Option<String>)> = vec![(role.to_string(), None)];

        while let Some((name, parent)) = pending.pop() {
            if cancel.is_cancelled() {
                return Err(StrataError::Cancelled);
            }
            if !visited.insert(name.clone()) {
                debug!("Role {} already hashed, skipping", name);
                continue;
            }

            let resolved = match &parent {
                Some(parent) => self
                    .resolver
                    .resolve(&name)
                    .await
                    .map_err(|e| e.required_by(parent))?,
                None => self.resolver.resolve(&name).await?,
            };

            if parent.is_some() {
                digest.update(b"role:");
                digest.update(name.as_bytes());
                digest.update(hasher::SEPARATOR);
            }
            hash_directory(&mut digest, &resolved.path, cancel).await?;

            let mut deps = resolved.dependencies.clone();
            deps.sort();
            deps.dedup();
            for dep in deps.into_iter().rev() {
                pending.push((dep, Some(name.clone())));
            }

            roles.push(resolved);
        }

        let fingerprint = Fingerprint::from_digest(digest);
        debug!(
            "Fingerprint for {}: {} ({} roles)",
            role,
            fingerprint.short(),
            roles.len()
        );

        Ok(FingerprintReport { fingerprint, roles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::SearchPathLocator;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn engine(roles_dir: &Path) -> FingerprintEngine {
        let locator = SearchPathLocator::new(vec![roles_dir.to_path_buf()]);
        FingerprintEngine::new(DependencyResolver::new(Arc::new(locator)))
    }

    async fn fingerprint(roles_dir: &Path, role: &str) -> StrataResult<Fingerprint> {
        engine(roles_dir)
            .fingerprint(role, &CancellationToken::new())
            .await
    }

    #[test]
    fn parse_valid_fingerprint() {
        let hex = "0123456789abcdef".repeat(4);
        let fp: Fingerprint = hex.parse().unwrap();
        assert_eq!(fp.as_str(), hex);
        assert_eq!(fp.short(), "0123456789ab");
        assert_eq!(fp.to_string(), hex);
    }

    #[test]
    fn parse_rejects_bad_fingerprints() {
        assert!("abc".parse::<Fingerprint>().is_err());
        assert!("G".repeat(64).parse::<Fingerprint>().is_err());
        assert!("AB".repeat(32).parse::<Fingerprint>().is_err());
    }

    #[tokio::test]
    async fn web_base_scenario() {
        let roles = TempDir::new().unwrap();
        write(roles.path(), "web/tasks/main.yml", "echo hi");
        write(roles.path(), "web/meta/main.yml", "dependencies: []");
        write(roles.path(), "base/tasks/main.yml", "dnf install -y git");

        let f1 = fingerprint(roles.path(), "web").await.unwrap();
        assert_eq!(f1.as_str().len(), 64);
        assert_eq!(f1, fingerprint(roles.path(), "web").await.unwrap());

        write(roles.path(), "web/tasks/main.yml", "echo bye");
        let f2 = fingerprint(roles.path(), "web").await.unwrap();
        assert_ne!(f1, f2);

        write(roles.path(), "web/meta/main.yml", "dependencies: [{role: base}]");
        let f3 = fingerprint(roles.path(), "web").await.unwrap();
        assert_ne!(f2, f3);
        assert_ne!(f1, f3);
    }

    #[tokio::test]
    async fn dependency_content_changes_fingerprint() {
        let roles = TempDir::new().unwrap();
        write(roles.path(), "web/meta/main.yml", "dependencies:\n  - role: base\n");
        write(roles.path(), "base/tasks/main.yml", "v1");
        let before = fingerprint(roles.path(), "web").await.unwrap();

        write(roles.path(), "base/tasks/main.yml", "v2");
        let after = fingerprint(roles.path(), "web").await.unwrap();

        assert_ne!(before, after);
    }

    #[tokio::test]
    async fn fewer_dependencies_changes_fingerprint() {
        let roles = TempDir::new().unwrap();
        write(roles.path(), "web/tasks/main.yml", "echo hi");
        write(roles.path(), "web/meta/main.yml", "dependencies: [base, extra]");
        write(roles.path(), "base/tasks/main.yml", "base");
        write(roles.path(), "extra/tasks/main.yml", "extra");
        let full = fingerprint(roles.path(), "web").await.unwrap();

        write(roles.path(), "web/meta/main.yml", "dependencies: [base]");
        let reduced = fingerprint(roles.path(), "web").await.unwrap();

        assert_ne!(full, reduced);
    }

    #[tokio::test]
    async fn empty_dependency_is_part_of_digest() {
        let roles = TempDir::new().unwrap();
        std::fs::create_dir_all(roles.path().join("empty")).unwrap();
        write(roles.path(), "a/meta/main.yml", "dependencies: [empty]");

        let report = engine(roles.path())
            .fingerprint_closure("a", &CancellationToken::new())
            .await
            .unwrap();

        let mut expected = Sha256::new();
        hash_directory(&mut expected, &roles.path().join("a"), &CancellationToken::new())
            .await
            .unwrap();
        expected.update(b"role:empty::");
        assert_eq!(report.fingerprint.as_str(), hex::encode(expected.finalize()));
    }

    #[tokio::test]
    async fn dependencies_visited_in_sorted_order() {
        let roles = TempDir::new().unwrap();
        write(roles.path(), "web/meta/main.yml", "dependencies: [b, a, b]");
        write(roles.path(), "a/tasks/main.yml", "a");
        write(roles.path(), "b/tasks/main.yml", "b");

        let report = engine(roles.path())
            .fingerprint_closure("web", &CancellationToken::new())
            .await
            .unwrap();
        let names: Vec<&str> = report.roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["web", "a", "b"]);
    }

    #[tokio::test]
    async fn cycle_terminates_and_hashes_each_role_once() {
        let roles = TempDir::new().unwrap();
        write(roles.path(), "a/meta/main.yml", "dependencies: [b]");
        write(roles.path(), "a/tasks/main.yml", "a");
        write(roles.path(), "b/meta/main.yml", "dependencies: [a]");
        write(roles.path(), "b/tasks/main.yml", "b");

        let report = engine(roles.path())
            .fingerprint_closure("a", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.roles.len(), 2);

        let cancel = CancellationToken::new();
        let mut expected = Sha256::new();
        hash_directory(&mut expected, &roles.path().join("a"), &cancel)
            .await
            .unwrap();
        expected.update(b"role:b::");
        hash_directory(&mut expected, &roles.path().join("b"), &cancel)
            .await
            .unwrap();

        assert_eq!(report.fingerprint.as_str(), hex::encode(expected.finalize()));
    }

    #[tokio::test]
    async fn diamond_dependency_hashed_once() {
        let roles = TempDir::new().unwrap();
        write(roles.path(), "app/meta/main.yml", "dependencies: [left, right]");
        write(roles.path(), "left/meta/main.yml", "dependencies: [common]");
        write(roles.path(), "right/meta/main.yml", "dependencies: [common]");
        write(roles.path(), "common/tasks/main.yml", "common");

        let report = engine(roles.path())
            .fingerprint_closure("app", &CancellationToken::new())
            .await
            .unwrap();
        let names: Vec<&str> = report.roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["app", "left", "common", "right"]);
    }

    #[tokio::test]
    async fn root_name_not_part_of_fingerprint() {
        let roles = TempDir::new().unwrap();
        write(roles.path(), "web/tasks/main.yml", "echo hi");
        write(roles.path(), "www/tasks/main.yml", "echo hi");

        assert_eq!(
            fingerprint(roles.path(), "web").await.unwrap(),
            fingerprint(roles.path(), "www").await.unwrap()
        );
    }

    #[tokio::test]
    async fn missing_dependency_names_requiring_role() {
        let roles = TempDir::new().unwrap();
        write(roles.path(), "web/meta/main.yml", "dependencies: [ghost]");

        let err = fingerprint(roles.path(), "web").await.unwrap_err();
        match err {
            StrataError::RoleNotFound {
                name, required_by, ..
            } => {
                assert_eq!(name, "ghost");
                assert_eq!(required_by.as_deref(), Some("web"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_root_role_fails() {
        let roles = TempDir::new().unwrap();
        let err = fingerprint(roles.path(), "web").await.unwrap_err();
        assert!(matches!(
            err,
            StrataError::RoleNotFound {
                required_by: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn malformed_dependency_meta_aborts() {
        let roles = TempDir::new().unwrap();
        write(roles.path(), "web/meta/main.yml", "dependencies: [base]");
        write(roles.path(), "base/meta/main.yml", "dependencies: 42");

        let err = fingerprint(roles.path(), "web").await.unwrap_err();
        assert!(matches!(err, StrataError::Metadata { .. }));
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let roles = TempDir::new().unwrap();
        write(roles.path(), "web/tasks/main.yml", "echo hi");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = engine(roles.path())
            .fingerprint("web", &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, StrataError::Cancelled));
    }
}
