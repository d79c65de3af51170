//! Podman/Docker engine driven through its command line
//!
//! Implements both [`ContainerEngine`] and [`ImageStore`] by executing the
//! engine binary directly. Podman and Docker accept the same arguments for
//! everything used here except image existence checks and commit output.

use crate::error::{StrataError, StrataResult};
use crate::orchestration::build_error_output;
use crate::orchestration::podman::{CommitRequest, ContainerConfig, ImageInfo};
use crate::orchestration::runtime::{CapabilitySet, ContainerEngine, ImageStore};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Which engine binary to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Podman,
    Docker,
}

impl EngineKind {
    /// Binary name on PATH
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Podman => "podman",
            Self::Docker => "docker",
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Podman => "Podman",
            Self::Docker => "Docker",
        }
    }

    /// Check if the binary is installed
    pub async fn installed(&self) -> bool {
        Command::new(self.binary())
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// Container engine using the podman or docker CLI
pub struct CliEngine {
    kind: EngineKind,
}

impl CliEngine {
    /// Create an engine for the given binary
    pub fn new(kind: EngineKind) -> Self {
        Self { kind }
    }

    /// Execute an engine command and return the output
    async fn exec(&self, args: &[&str]) -> StrataResult<std::process::Output> {
        let binary = self.kind.binary();
        debug!("Executing: {} {:?}", binary, args);

        Command::new(binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| StrataError::command_failed(format!("{} {:?}", binary, args), e))
    }

    /// Execute and fail with the command's stderr on a non-zero exit
    async fn exec_ok(&self, args: &[&str]) -> StrataResult<String> {
        let output = self.exec(args).await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(StrataError::command_exec(
                format!("{} {}", self.kind.binary(), args.first().unwrap_or(&"")),
                stderr.trim(),
            ))
        }
    }

    fn commit_args(&self, container_id: &str, request: &CommitRequest) -> Vec<String> {
        let mut args = vec!["commit".to_string()];

        if self.kind == EngineKind::Podman {
            // Docker format keeps the commit message; -q hides copy progress
            args.extend(["--format".to_string(), "docker".to_string(), "-q".to_string()]);
        }

        if !request.message.is_empty() {
            args.push("--message".to_string());
            args.push(request.message.clone());
        }

        for (key, value) in &request.labels {
            args.push("--change".to_string());
            args.push(format!("LABEL {}={}", key, label_quote(value)));
        }

        args.push(container_id.to_string());
        if let Some(reference) = request.reference() {
            args.push(reference);
        }
        args
    }
}

/// Quote a LABEL value for a `--change` instruction.
/// Embedded double quotes and backslashes are escaped.
fn label_quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Parse `images --format '{{.ID}}\t{{.Repository}}:{{.Tag}}'` output.
///
/// Engines print one line per tag, so lines are grouped by ID in first-seen
/// order. `<none>:<none>` marks an untagged image.
fn parse_image_list(stdout: &str) -> Vec<ImageInfo> {
    let mut images: Vec<ImageInfo> = Vec::new();

    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (id, reference) = match line.split_once('\t') {
            Some((id, reference)) => (id.trim(), Some(reference.trim())),
            None => (line, None),
        };
        let reference = reference.filter(|r| !r.contains("<none>") && !r.is_empty());

        match images.iter_mut().find(|img| img.id == id) {
            Some(existing) => {
                if let Some(r) = reference {
                    if !existing.tags.iter().any(|t| t == r) {
                        existing.tags.push(r.to_string());
                    }
                }
            }
            None => images.push(ImageInfo {
                id: id.to_string(),
                tags: reference.map(|r| vec![r.to_string()]).unwrap_or_default(),
            }),
        }
    }

    images
}

/// The new image ID is the last non-empty line `commit` prints
fn parse_commit_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(str::to_string)
}

fn parse_exit_code(stdout: &str) -> StrataResult<i32> {
    let trimmed = stdout.trim();
    trimmed
        .lines()
        .last()
        .unwrap_or("")
        .trim()
        .parse()
        .map_err(|_| StrataError::Internal(format!("unexpected wait output: {:?}", trimmed)))
}

#[async_trait]
impl ContainerEngine for CliEngine {
    async fn image_exists(&self, image: &str) -> StrataResult<bool> {
        let output = match self.kind {
            EngineKind::Podman => self.exec(&["image", "exists", image]).await?,
            EngineKind::Docker => {
                self.exec(&["image", "inspect", "--format", "{{.Id}}", image])
                    .await?
            }
        };
        Ok(output.status.success())
    }

    async fn pull(&self, image: &str) -> StrataResult<()> {
        info!("Pulling image: {}", image);
        self.exec_ok(&["pull", image]).await?;
        Ok(())
    }

    async fn run(&self, config: &ContainerConfig) -> StrataResult<String> {
        if !self.image_exists(&config.image).await? {
            self.pull(&config.image).await?;
        }

        let mut args = vec!["run".to_string(), "-d".to_string()];

        args.push("-w".to_string());
        args.push(config.workdir.clone());

        for v in &config.volumes {
            args.push("-v".to_string());
            args.push(v.clone());
        }

        for (k, v) in &config.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", k, v));
        }

        for (k, v) in &config.labels {
            args.push("--label".to_string());
            args.push(format!("{}={}", k, v));
        }

        args.push(config.image.clone());
        args.extend(config.command.iter().cloned());

        let args_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.exec(&args_refs).await?;

        if output.status.success() {
            let container_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
            info!(
                "Build container started: {}",
                &container_id[..12.min(container_id.len())]
            );
            Ok(container_id)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(StrataError::command_exec(
                format!("{} run", self.kind.binary()),
                stderr.trim(),
            ))
        }
    }

    async fn wait(&self, container_id: &str) -> StrataResult<i32> {
        debug!("Waiting for container: {}", container_id);
        let stdout = self.exec_ok(&["wait", container_id]).await?;
        parse_exit_code(&stdout)
    }

    async fn logs(&self, container_id: &str, lines: u32) -> StrataResult<String> {
        let tail_arg = if lines == 0 {
            "all".to_string()
        } else {
            lines.to_string()
        };

        let output = self.exec(&["logs", "--tail", &tail_arg, container_id]).await?;

        Ok(build_error_output(
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        ))
    }

    async fn remove(&self, container_id: &str) -> StrataResult<()> {
        debug!("Removing container: {}", container_id);

        let output = self.exec(&["rm", "-f", container_id]).await?;

        if output.status.success() {
            Ok(())
        } else {
            // Ignore error if container doesn't exist
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.to_lowercase().contains("no such container") {
                Ok(())
            } else {
                Err(StrataError::command_exec(
                    format!("{} rm", self.kind.binary()),
                    stderr.trim(),
                ))
            }
        }
    }

    fn engine_name(&self) -> &'static str {
        self.kind.name()
    }
}

#[async_trait]
impl ImageStore for CliEngine {
    async fn images_by_label(&self, key: &str, value: &str) -> StrataResult<Vec<ImageInfo>> {
        let filter = format!("label={}={}", key, value);
        let stdout = self
            .exec_ok(&[
                "images",
                "--all",
                "--no-trunc",
                "--filter",
                &filter,
                "--format",
                "{{.ID}}\t{{.Repository}}:{{.Tag}}",
            ])
            .await?;
        Ok(parse_image_list(&stdout))
    }

    async fn commit(&self, container_id: &str, request: &CommitRequest) -> StrataResult<String> {
        let args = self.commit_args(container_id, request);
        let args_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        let stdout = self.exec_ok(&args_refs).await?;
        parse_commit_output(&stdout).ok_or_else(|| {
            StrataError::command_exec(
                format!("{} commit", self.kind.binary()),
                "no image ID in output",
            )
        })
    }

    async fn tag(&self, image_id: &str, repository: &str, tag: &str) -> StrataResult<()> {
        let reference = format!("{}:{}", repository, tag);
        debug!("Tagging {} as {}", image_id, reference);
        self.exec_ok(&["tag", image_id, &reference]).await?;
        Ok(())
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::all()
    }

    fn store_name(&self) -> &'static str {
        self.kind.name()
    }
}
