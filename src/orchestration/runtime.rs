//! Container engine abstraction
//!
//! Two seams: [`ContainerEngine`] runs build containers, [`ImageStore`] is
//! the artifact store images are queried from and committed into. The CLI
//! engine implements both; tests substitute in-memory fakes.

use crate::error::{StrataError, StrataResult};
use crate::orchestration::podman::{CommitRequest, ContainerConfig, ImageInfo};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;

/// An operation an image store may or may not support
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// List images by label, including intermediate images
    Query,
    /// Commit a container as a new image
    Commit,
    /// Add a repository tag to an image
    Tag,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Query => "image queries",
            Self::Commit => "committing containers",
            Self::Tag => "tagging images",
        };
        write!(f, "{}", name)
    }
}

/// The set of operations a store declares support for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    /// Every capability
    pub fn all() -> Self {
        Self::from([Capability::Query, Capability::Commit, Capability::Tag].as_slice())
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    /// Fail with `Unsupported` unless `capability` is in the set
    pub fn require(&self, engine: &str, capability: Capability) -> StrataResult<()> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(StrataError::Unsupported {
                engine: engine.to_string(),
                capability: capability.to_string(),
            })
        }
    }
}

impl From<&[Capability]> for CapabilitySet {
    fn from(capabilities: &[Capability]) -> Self {
        Self(capabilities.iter().copied().collect())
    }
}

/// Image storage: label queries, commits, tags
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// All images (tagged or intermediate) carrying label `key=value`
    async fn images_by_label(&self, key: &str, value: &str) -> StrataResult<Vec<ImageInfo>>;

    /// Commit a container as a new image, returning the image ID
    async fn commit(&self, container_id: &str, request: &CommitRequest) -> StrataResult<String>;

    /// Tag an image as `repository:tag`
    async fn tag(&self, image_id: &str, repository: &str, tag: &str) -> StrataResult<()>;

    /// Operations this store supports
    fn capabilities(&self) -> CapabilitySet;

    /// Human-readable store name for messages
    fn store_name(&self) -> &'static str;
}

/// Container lifecycle operations used while building layers
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Check if an image exists locally
    async fn image_exists(&self, image: &str) -> StrataResult<bool>;

    /// Pull an image
    async fn pull(&self, image: &str) -> StrataResult<()>;

    /// Start a detached container and return its ID
    async fn run(&self, config: &ContainerConfig) -> StrataResult<String>;

    /// Block until the container exits and return its exit code
    async fn wait(&self, container_id: &str) -> StrataResult<i32>;

    /// Get combined container output (0 = all lines)
    async fn logs(&self, container_id: &str, lines: u32) -> StrataResult<String>;

    /// Remove a container, ignoring ones that no longer exist
    async fn remove(&self, container_id: &str) -> StrataResult<()>;

    /// Get the human-readable engine name for display
    fn engine_name(&self) -> &'static str;
}
