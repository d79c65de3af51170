//! Engine shared types
//!
//! Contains data structures passed to engine and store implementations.
//! The actual command execution is in the engine implementations.

use std::collections::BTreeMap;

/// Container configuration for starting a build container
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Container image to use
    pub image: String,
    /// Working directory inside the container
    pub workdir: String,
    /// Volume mounts (host:container[:opts] format)
    pub volumes: Vec<String>,
    /// Environment variables
    pub env: BTreeMap<String, String>,
    /// Labels attached to the container
    pub labels: BTreeMap<String, String>,
    /// Command and arguments
    pub command: Vec<String>,
}

/// An image as reported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Full image ID
    pub id: String,
    /// `repository:tag` references (empty for intermediate images)
    pub tags: Vec<String>,
}

/// How a container is turned into an image
#[derive(Debug, Clone, Default)]
pub struct CommitRequest {
    /// Labels set on the new image
    pub labels: BTreeMap<String, String>,
    /// Commit message
    pub message: String,
    /// Repository to name the image with
    pub repository: Option<String>,
    /// Tag within `repository`
    pub tag: Option<String>,
}

impl CommitRequest {
    /// `repository:tag` when a repository is set (tag defaults to `latest`)
    pub fn reference(&self) -> Option<String> {
        self.repository.as_ref().map(|repo| {
            format!("{}:{}", repo, self.tag.as_deref().unwrap_or("latest"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_reference() {
        let mut request = CommitRequest {
            repository: Some("acme-web".to_string()),
            tag: Some("20240115100000".to_string()),
            ..Default::default()
        };
        assert_eq!(
            request.reference().as_deref(),
            Some("acme-web:20240115100000")
        );

        request.tag = None;
        assert_eq!(request.reference().as_deref(), Some("acme-web:latest"));

        request.repository = None;
        assert!(request.reference().is_none());
    }
}
