use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::{debug, warn};

use crate::{config::ToolchainConfig, error::Error};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Per-request pair of generated files: the source written from the request
/// and the artifact the compiler produces.
///
/// Removal happens in [`Workspace::dispose`]; if the workspace is dropped
/// without being disposed (for instance because the request future was
/// cancelled), `Drop` removes the files instead. Only files this workspace
/// created are removed: if [`Workspace::materialize`] found the source path
/// already taken, neither path is touched.
#[derive(Debug)]
pub struct Workspace {
    id: String,
    source_path: PathBuf,
    artifact_path: PathBuf,
    owned: bool,
    disposed: bool,
}

impl Workspace {
    /// Computes the file paths for a new workspace under `base_dir`.
    ///
    /// Names follow `compile_<timestamp>_<id>.<src>` and
    /// `program_<timestamp>_<id>.<artifact>`. The id combines the request id
    /// with a process-wide sequence number, so two allocations in one process
    /// never share a path. No file is created here.
    pub fn allocate(base_dir: &Path, toolchain: &ToolchainConfig, request_id: &str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}_{}_{}", timestamp, request_id, sequence);

        let source_path =
            base_dir.join(format!("compile_{}.{}", id, toolchain.source_extension));
        let artifact_path =
            base_dir.join(format!("program_{}.{}", id, toolchain.artifact_extension));

        Self {
            id,
            source_path,
            artifact_path,
            owned: false,
            disposed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Writes `content` to the source path and syncs it to disk, so the
    /// compiler process sees the complete file. Fails if the path already
    /// exists.
    pub async fn materialize(&mut self, content: &str) -> Result<(), Error> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.source_path)
            .await?;
        self.owned = true;

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;

        debug!(
            path = %self.source_path.display(),
            bytes = content.len(),
            "Wrote source file"
        );
        Ok(())
    }

    /// Removes both files if present and owned. Failures are logged and
    /// discarded.
    pub async fn dispose(mut self) {
        self.disposed = true;
        if !self.owned {
            return;
        }
        for path in [&self.source_path, &self.artifact_path] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!(path = %path.display(), "Removed generated file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "Failed to remove generated file: {}", e),
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.disposed || !self.owned {
            return;
        }
        for path in [&self.source_path, &self.artifact_path] {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), "Failed to remove generated file: {}", e);
                }
            }
        }
    }
}
