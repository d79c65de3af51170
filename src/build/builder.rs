//! Build executors
//!
//! A [`LayerBuilder`] applies a role to a fresh container and hands the
//! container back for committing. The container role builder does this by
//! mounting every role of the closure read-only and running the configured
//! role-application command.

use crate::cache::labels;
use crate::error::{StrataError, StrataResult};
use crate::fingerprint::Fingerprint;
use crate::orchestration::{ContainerConfig, ContainerEngine};
use crate::role::ResolvedRole;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lines of container output included in build errors
const FAILURE_LOG_LINES: u32 = 50;

/// Everything a builder needs to produce a layer
#[derive(Debug)]
pub struct BuildRequest<'a> {
    /// Root role being built
    pub role: &'a str,
    /// Fingerprint the resulting layer will be labelled with
    pub fingerprint: &'a Fingerprint,
    /// Root role followed by its dependencies, in hash order
    pub closure: &'a [ResolvedRole],
    pub cancel: &'a CancellationToken,
}

/// Produces a container holding the applied role
#[async_trait]
pub trait LayerBuilder: Send + Sync {
    /// Apply the role and return the ID of the stopped container
    async fn build(&self, request: &BuildRequest<'_>) -> StrataResult<String>;

    /// Remove a container returned by `build`
    async fn discard(&self, container_id: &str) -> StrataResult<()>;
}

/// Settings for [`ContainerRoleBuilder`]
#[derive(Debug, Clone)]
pub struct RoleBuildSettings {
    /// Image the role is applied on top of
    pub base_image: String,
    /// Command template; `{role}` is replaced with the role name
    pub command: Vec<String>,
    /// Working directory; roles are mounted under `{workdir}/roles`
    pub workdir: String,
}

/// Applies roles by running a command in a container on the base image
pub struct ContainerRoleBuilder {
    engine: Arc<dyn ContainerEngine>,
    settings: RoleBuildSettings,
}

impl ContainerRoleBuilder {
    pub fn new(engine: Arc<dyn ContainerEngine>, settings: RoleBuildSettings) -> Self {
        Self { engine, settings }
    }

    fn roles_dir(&self) -> String {
        format!("{}/roles", self.settings.workdir.trim_end_matches('/'))
    }

    /// Container configuration for building `request`
    fn container_config(&self, request: &BuildRequest<'_>) -> ContainerConfig {
        let roles_dir = self.roles_dir();

        let volumes = request
            .closure
            .iter()
            .map(|role| format!("{}:{}/{}:ro", role.path.display(), roles_dir, role.name))
            .collect();

        let mut env = BTreeMap::new();
        env.insert("ANSIBLE_ROLES_PATH".to_string(), roles_dir);

        let mut container_labels = BTreeMap::new();
        container_labels.insert(labels::ROLE.to_string(), request.role.to_string());

        let command = self
            .settings
            .command
            .iter()
            .map(|arg| arg.replace("{role}", request.role))
            .collect();

        ContainerConfig {
            image: self.settings.base_image.clone(),
            workdir: self.settings.workdir.clone(),
            volumes,
            env,
            labels: container_labels,
            command,
        }
    }

    async fn remove_quietly(&self, container_id: &str) {
        if let Err(e) = self.engine.remove(container_id).await {
            warn!("Failed to remove build container {}: {}", container_id, e);
        }
    }
}

#[async_trait]
impl LayerBuilder for ContainerRoleBuilder {
    async fn build(&self, request: &BuildRequest<'_>) -> StrataResult<String> {
        let config = self.container_config(request);
        debug!("Build container config: {:?}", config);

        let container_id = self.engine.run(&config).await.map_err(|e| StrataError::Build {
            role: request.role.to_string(),
            reason: e.to_string(),
        })?;

        let exit_code = tokio::select! {
            code = self.engine.wait(&container_id) => code,
            _ = request.cancel.cancelled() => {
                self.remove_quietly(&container_id).await;
                return Err(StrataError::Cancelled);
            }
        };

        let exit_code = match exit_code {
            Ok(code) => code,
            Err(e) => {
                self.remove_quietly(&container_id).await;
                return Err(StrataError::Build {
                    role: request.role.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if exit_code != 0 {
            let output = self
                .engine
                .logs(&container_id, FAILURE_LOG_LINES)
                .await
                .unwrap_or_default();
            self.remove_quietly(&container_id).await;
            return Err(StrataError::Build {
                role: request.role.to_string(),
                reason: format!("exit code {}\n{}", exit_code, output),
            });
        }

        info!("Applied role {} in {}", request.role, self.engine.engine_name());
        Ok(container_id)
    }

    async fn discard(&self, container_id: &str) -> StrataResult<()> {
        self.engine.remove(container_id).await
    }
}
