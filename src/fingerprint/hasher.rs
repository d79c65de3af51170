//! Directory hashing
//!
//! Feeds a directory tree into a caller-owned SHA-256 accumulator. Files are
//! visited in sorted relative-path order so the digest never depends on the
//! order the filesystem happens to enumerate entries in.

use crate::error::{StrataError, StrataResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Token written after each path and after each file's content
pub const SEPARATOR: &[u8] = b"::";

/// Read size for file content
const BLOCK_SIZE: usize = 64 * 1024;

/// Hash every file under `root` into `digest`.
///
/// For each file, in order: relative path (`/`-separated), separator, the
/// content, separator. Symlinks to files are hashed through their target;
/// symlinks to directories are not descended.
pub async fn hash_directory(
    digest: &mut Sha256,
    root: &Path,
    cancel: &CancellationToken,
) -> StrataResult<()> {
    let files = list_files(root).await?;
    let mut buf = vec![0u8; BLOCK_SIZE];

    for (relative, path) in &files {
        if cancel.is_cancelled() {
            return Err(StrataError::Cancelled);
        }

        digest.update(relative);
        digest.update(SEPARATOR);
        hash_file(digest, path, &mut buf, cancel).await?;
        digest.update(SEPARATOR);
    }

    debug!("Hashed {} files under {}", files.len(), root.display());
    Ok(())
}

async fn hash_file(
    digest: &mut Sha256,
    path: &Path,
    buf: &mut [u8],
    cancel: &CancellationToken,
) -> StrataResult<()> {
    let mut file = fs::File::open(path)
        .await
        .map_err(|e| StrataError::io(format!("opening {}", path.display()), e))?;
    hash_reader(digest, &mut file, path, buf, cancel).await
}

/// Feed `reader` into `digest` one block at a time until EOF or cancellation
async fn hash_reader<R: AsyncRead + Unpin>(
    digest: &mut Sha256,
    reader: &mut R,
    path: &Path,
    buf: &mut [u8],
    cancel: &CancellationToken,
) -> StrataResult<()> {
    loop {
        if cancel.is_cancelled() {
            return Err(StrataError::Cancelled);
        }

        let n = reader
            .read(buf)
            .await
            .map_err(|e| StrataError::io(format!("reading {}", path.display()), e))?;
        if n == 0 {
            return Ok(());
        }
        digest.update(&buf[..n]);
    }
}

/// Collect `(relative key, absolute path)` for every file, sorted by key
async fn list_files(root: &Path) -> StrataResult<Vec<(Vec<u8>, PathBuf)>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| StrataError::io(format!("listing {}", dir.display()), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StrataError::io(format!("listing {}", dir.display()), e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StrataError::io(format!("inspecting {}", path.display()), e))?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_symlink() {
                // Dangling links surface as errors here
                let target = fs::metadata(&path).await.map_err(|e| {
                    StrataError::io(format!("following symlink {}", path.display()), e)
                })?;
                if target.is_file() {
                    files.push(path);
                }
            } else if file_type.is_file() {
                files.push(path);
            }
        }
    }

    let mut keyed = files
        .into_iter()
        .map(|path| {
            let relative = path.strip_prefix(root).map_err(|_| {
                StrataError::Internal(format!(
                    "{} is not under {}",
                    path.display(),
                    root.display()
                ))
            })?;
            Ok((relative_key(relative), path))
        })
        .collect::<StrataResult<Vec<_>>>()?;

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed)
}

/// Raw bytes of `relative` joined with `/`, so undecodable names stay distinct
fn relative_key(relative: &Path) -> Vec<u8> {
    relative
        .components()
        .map(|c| c.as_os_str().as_encoded_bytes())
        .collect::<Vec<_>>()
        .join(&b'/')
}
