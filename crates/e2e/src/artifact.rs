//! Exported artifacts and the directory the browser saves them to

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::controls::{ArtifactKind, ExportFormat};
use crate::error::E2eResult;
use crate::wait::{await_file, WaitPolicy};

/// Whether an export has landed on disk yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Materialization {
    Pending,
    Present,
}

/// A file produced by an export action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub format: ExportFormat,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.format.kind()
    }

    pub fn state(&self) -> Materialization {
        if self.path.is_file() {
            Materialization::Present
        } else {
            Materialization::Pending
        }
    }
}

/// The fixed download location, holding at most one artifact per format
#[derive(Debug, Clone)]
pub struct DownloadDir {
    dir: PathBuf,
    stem: String,
}

impl DownloadDir {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Where an export in `format` will appear
    pub fn expected(&self, format: ExportFormat) -> Artifact {
        let file = format!("{}.{}", self.stem, format.extension());
        Artifact::new(self.dir.join(file), format)
    }

    /// Delete any artifact left by an earlier export, including partial
    /// downloads. Creates the directory when it does not exist.
    pub fn clear(&self) -> E2eResult<usize> {
        std::fs::create_dir_all(&self.dir)?;

        let mut removed = 0;
        for format in ExportFormat::ALL {
            removed += self.discard(format)?;
        }
        Ok(removed)
    }

    /// Delete the artifact of one format and its partial download, so a
    /// following export cannot be mistaken for an earlier one.
    pub fn discard(&self, format: ExportFormat) -> E2eResult<usize> {
        let artifact = self.expected(format);
        let partial = artifact.path.with_extension(format!("{}.part", format.extension()));

        let mut removed = 0;
        for path in [artifact.path, partial] {
            if path.is_file() {
                std::fs::remove_file(&path)?;
                debug!("Removed stale {}", path.display());
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Block until the export in `format` is present.
    ///
    /// Existence only; content is left to the oracle.
    pub async fn await_artifact(&self, format: ExportFormat, policy: WaitPolicy) -> E2eResult<Artifact> {
        let artifact = self.expected(format);
        await_file(&artifact.path, policy).await?;
        info!("Artifact ready: {}", artifact.path.display());
        Ok(artifact)
    }
}
