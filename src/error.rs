//! Error types for Strata
//!
//! All modules use `StrataResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Strata operations
pub type StrataResult<T> = Result<T, StrataError>;

/// All errors that can occur in Strata
#[derive(Error, Debug)]
pub enum StrataError {
    // Role resolution errors
    #[error("Role not found: {name}{}. Searched: {searched}", required_by_suffix(.required_by))]
    RoleNotFound {
        name: String,
        searched: String,
        required_by: Option<String>,
    },

    #[error("Invalid role name '{name}': {reason}")]
    RoleNameInvalid { name: String, reason: String },

    #[error("Invalid role metadata {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },

    // Fingerprint and cache errors
    #[error("Invalid fingerprint '{0}': expected 64 lowercase hex characters")]
    InvalidFingerprint(String),

    #[error("Cache inconsistency: {} images carry fingerprint {fingerprint}: {}", .images.len(), .images.join(", "))]
    CacheInconsistency {
        fingerprint: String,
        images: Vec<String>,
    },

    #[error("Cancelled")]
    Cancelled,

    // Build errors
    #[error("Build failed for role {role}: {reason}")]
    Build { role: String, reason: String },

    // Engine errors
    #[error("No container engine found. Install podman or docker")]
    EngineNotFound,

    #[error("{engine} does not support {capability}")]
    Unsupported {
        engine: String,
        capability: String,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

fn required_by_suffix(required_by: &Option<String>) -> String {
    match required_by {
        Some(parent) => format!(" (dependency of {})", parent),
        None => String::new(),
    }
}

impl StrataError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Record which role declared the dependency that failed to resolve.
    ///
    /// Only `RoleNotFound` carries this; every other error passes through.
    pub fn required_by(self, parent: &str) -> Self {
        match self {
            Self::RoleNotFound {
                name,
                searched,
                required_by: None,
            } => Self::RoleNotFound {
                name,
                searched,
                required_by: Some(parent.to_string()),
            },
            other => other,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::EngineNotFound => Some("Install podman (recommended) or docker"),
            Self::RoleNotFound { .. } => {
                Some("Add a search path with --roles-path or [roles] search_paths")
            }
            Self::CacheInconsistency { .. } => {
                Some("Remove the duplicate images, then run the build again")
            }
            _ => None,
        }
    }
}
