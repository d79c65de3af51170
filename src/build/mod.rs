//! Build orchestration
//!
//! Turns a role name into an image ID, building only when the role's
//! fingerprint has no image yet.
//!
//! ```text
//! Start -> Fingerprinted -> Cached                (index hit)
//! Start -> Fingerprinted -> Building -> Built     (index miss)
//! any   -> Failed                                 (error propagated)
//! ```
//!
//! On a miss the builder produces a container, the index is checked again,
//! and only then is the container committed with the fingerprint label. A
//! build that fails before the commit leaves no labelled image.

pub mod builder;

pub use builder::{BuildRequest, ContainerRoleBuilder, LayerBuilder, RoleBuildSettings};

use crate::cache::{labels, ImageCache, LAYER_COMMENT};
use crate::error::{StrataError, StrataResult};
use crate::fingerprint::{Fingerprint, FingerprintEngine};
use crate::orchestration::{Capability, CommitRequest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Build stamp tag format (UTC)
const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Tag applied to the newest layer of a repository
const LATEST_TAG: &str = "latest";

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    Start,
    Fingerprinted,
    Cached,
    Building,
    Built,
    Failed,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Fingerprinted => "fingerprinted",
            Self::Cached => "cached",
            Self::Building => "building",
            Self::Built => "built",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of `ensure_built`
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    pub image_id: String,
    pub fingerprint: Fingerprint,

    /// `Cached` or `Built`
    pub state: BuildState,

    /// References applied to a freshly built image
    pub tags: Vec<String>,
}

/// Naming applied to committed layers
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Repository for build stamp tags; untagged when `None`
    pub repository: Option<String>,

    /// Also tag `<repository>:latest`
    pub tag_latest: bool,
}

/// Drives fingerprint, lookup, build and commit for a role
pub struct Conductor {
    fingerprints: FingerprintEngine,
    cache: ImageCache,
    options: BuildOptions,
}

impl Conductor {
    pub fn new(fingerprints: FingerprintEngine, cache: ImageCache, options: BuildOptions) -> Self {
        Self {
            fingerprints,
            cache,
            options,
        }
    }

    /// Return the image for `role`, building it if no image carries its
    /// fingerprint.
    pub async fn ensure_built(
        &self,
        role: &str,
        builder: &dyn LayerBuilder,
        cancel: &CancellationToken,
    ) -> StrataResult<BuildOutcome> {
        let result = self.drive(role, builder, cancel).await;
        if let Err(e) = &result {
            warn!(role, state = %BuildState::Failed, error = %e, "Layer build failed");
        }
        result
    }

    async fn drive(
        &self,
        role: &str,
        builder: &dyn LayerBuilder,
        cancel: &CancellationToken,
    ) -> StrataResult<BuildOutcome> {
        debug!(role, state = %BuildState::Start, "Ensuring layer");

        let report = self.fingerprints.fingerprint_closure(role, cancel).await?;
        let fingerprint = report.fingerprint;
        debug!(
            role,
            fingerprint = %fingerprint,
            state = %BuildState::Fingerprinted,
            "Fingerprint computed"
        );

        if let Some(image_id) = self.cache.lookup(&fingerprint).await? {
            info!(
                role,
                fingerprint = %fingerprint,
                state = %BuildState::Cached,
                image = %image_id,
                "Layer cached"
            );
            return Ok(BuildOutcome {
                image_id,
                fingerprint,
                state: BuildState::Cached,
                tags: Vec::new(),
            });
        }

        self.require_commit_capabilities()?;

        if cancel.is_cancelled() {
            return Err(StrataError::Cancelled);
        }

        info!(
            role,
            fingerprint = %fingerprint,
            state = %BuildState::Building,
            "Building layer"
        );
        let container_id = builder
            .build(&BuildRequest {
                role,
                fingerprint: &fingerprint,
                closure: &report.roles,
                cancel,
            })
            .await?;

        let committed = self
            .commit_layer(role, &fingerprint, &container_id, cancel)
            .await;

        if let Err(e) = builder.discard(&container_id).await {
            warn!("Failed to discard build container {}: {}", container_id, e);
        }

        let (image_id, state, tags) = committed?;
        info!(
            role,
            fingerprint = %fingerprint,
            state = %state,
            image = %image_id,
            "Layer ready"
        );

        Ok(BuildOutcome {
            image_id,
            fingerprint,
            state,
            tags,
        })
    }

    fn require_commit_capabilities(&self) -> StrataResult<()> {
        let store = self.cache.store();
        let capabilities = store.capabilities();
        capabilities.require(store.store_name(), Capability::Commit)?;
        if self.options.repository.is_some() {
            capabilities.require(store.store_name(), Capability::Tag)?;
        }
        Ok(())
    }

    /// Commit `container_id` unless the fingerprint appeared while building
    async fn commit_layer(
        &self,
        role: &str,
        fingerprint: &Fingerprint,
        container_id: &str,
        cancel: &CancellationToken,
    ) -> StrataResult<(String, BuildState, Vec<String>)> {
        if cancel.is_cancelled() {
            return Err(StrataError::Cancelled);
        }

        if let Some(existing) = self.cache.lookup(fingerprint).await? {
            info!(
                role,
                fingerprint = %fingerprint,
                image = %existing,
                "Layer committed concurrently, discarding build"
            );
            return Ok((existing, BuildState::Cached, Vec::new()));
        }

        let request = commit_request(role, fingerprint, &self.options, Utc::now());
        let store = self.cache.store();

        let image_id = store
            .commit(container_id, &request)
            .await
            .map_err(|e| StrataError::Build {
                role: role.to_string(),
                reason: format!("commit failed: {}", e),
            })?;

        let mut tags: Vec<String> = request.reference().into_iter().collect();

        // Already committed and labelled; a failed `latest` tag is only logged
        if let Some(repository) = &self.options.repository {
            if self.options.tag_latest {
                match store.tag(&image_id, repository, LATEST_TAG).await {
                    Ok(()) => tags.push(format!("{}:{}", repository, LATEST_TAG)),
                    Err(e) => warn!(
                        role,
                        image = %image_id,
                        "Failed to tag {}:{}: {}",
                        repository,
                        LATEST_TAG,
                        e
                    ),
                }
            }
        }

        Ok((image_id, BuildState::Built, tags))
    }
}

/// Commit request labelling the layer with its fingerprint
fn commit_request(
    role: &str,
    fingerprint: &Fingerprint,
    options: &BuildOptions,
    now: DateTime<Utc>,
) -> CommitRequest {
    let mut image_labels = BTreeMap::new();
    image_labels.insert(labels::FINGERPRINT.to_string(), fingerprint.to_string());
    image_labels.insert(labels::ROLE.to_string(), role.to_string());
    image_labels.insert(labels::BUILT_AT.to_string(), now.to_rfc3339());

    CommitRequest {
        labels: image_labels,
        message: LAYER_COMMENT.to_string(),
        repository: options.repository.clone(),
        tag: options
            .repository
            .as_ref()
            .map(|_| now.format(STAMP_FORMAT).to_string()),
    }
}
