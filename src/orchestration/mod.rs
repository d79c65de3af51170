//! Orchestration module for container engines
//!
//! Drives Podman or Docker through their CLIs:
//! - label queries, commits and tags for the image cache
//! - run/wait/logs/rm for build containers

pub mod cli_engine;
mod factory;
pub mod podman;
mod runtime;

pub use cli_engine::{CliEngine, EngineKind};
pub use factory::{create_engine, selected_kind};
pub use podman::{CommitRequest, ContainerConfig, ImageInfo};
pub use runtime::{Capability, CapabilitySet, ContainerEngine, ImageStore};

/// Max number of output lines to include in build error messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of build output for error diagnostics.
///
/// Combines stdout and stderr, then returns the last `BUILD_ERROR_TAIL_LINES`
/// lines so error messages are actionable without being overwhelming.
pub(crate) fn build_error_output(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let total = lines.len();
    let tail: Vec<&str> = if total > BUILD_ERROR_TAIL_LINES {
        lines[total - BUILD_ERROR_TAIL_LINES..].to_vec()
    } else {
        lines
    };
    tail.join("\n")
}
