//! Configuration schema for Strata
//!
//! Global configuration is stored at `~/.config/strata/config.toml`.
//! A project-local `strata.toml` uses the same schema and overrides it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Container engine settings
    pub engine: EngineConfig,

    /// Role lookup settings
    pub roles: RolesConfig,

    /// Layer build settings
    pub build: BuildConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// General application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: LogFormat,
}

/// Which container engine binary drives builds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineSelection {
    /// Prefer podman, fall back to docker
    #[default]
    Auto,
    Podman,
    Docker,
}

/// Container engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine to use: "auto", "podman" or "docker"
    pub runtime: EngineSelection,
}

/// Role lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    /// Directories searched for roles, in order. Relative paths are
    /// resolved against the project directory.
    pub search_paths: Vec<PathBuf>,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from("roles")],
        }
    }
}

/// Layer build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Image the role is applied on top of
    pub base_image: String,

    /// Repository name for committed layers (untagged when unset)
    pub repository: Option<String>,

    /// Command run inside the build container. `{role}` is replaced
    /// with the role name.
    pub command: Vec<String>,

    /// Working directory inside the build container
    pub workdir: String,

    /// Also tag each committed layer as `latest`
    pub tag_latest: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            base_image: "fedora:41".to_string(),
            repository: None,
            command: vec![
                "ansible".to_string(),
                "localhost".to_string(),
                "--connection".to_string(),
                "local".to_string(),
                "--module-name".to_string(),
                "include_role".to_string(),
                "--args".to_string(),
                "name={role}".to_string(),
            ],
            workdir: "/strata".to_string(),
            tag_latest: true,
        }
    }
}
