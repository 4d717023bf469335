//! Visual oracle: decides whether an exported artifact matches its golden
//! reference
//!
//! Raster exports differ between renders (antialiasing, font hinting), so
//! they are scored with windowed SSIM. Vector exports are deterministic and
//! are scored with a near-exact text ratio. A low score is a
//! [`E2eError::SimilarityMismatch`]; an unreadable file is never treated as
//! "not similar".

pub mod raster;
pub mod text;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::artifact::Artifact;
use crate::config::OracleConfig;
use crate::controls::ArtifactKind;
use crate::error::{E2eError, E2eResult};

/// Outcome of one comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub kind: ArtifactKind,
    pub artifact: PathBuf,
    pub golden: PathBuf,
    pub score: f64,
    pub threshold: f64,
    pub passed: bool,
}

impl Comparison {
    fn judge(kind: ArtifactKind, artifact: &Path, golden: &Path, score: f64, threshold: f64) -> Self {
        let passed = score >= threshold;
        if passed {
            debug!("{:?} similarity {:.10} (threshold {})", kind, score, threshold);
        } else {
            warn!(
                "{:?} similarity {:.10} below threshold {} for {}",
                kind,
                score,
                threshold,
                artifact.display()
            );
        }

        Self {
            kind,
            artifact: artifact.to_path_buf(),
            golden: golden.to_path_buf(),
            score,
            threshold,
            passed,
        }
    }

    /// The error describing this comparison as a mismatch
    pub fn mismatch(&self) -> E2eError {
        E2eError::SimilarityMismatch {
            artifact: self.artifact.clone(),
            golden: self.golden.clone(),
            score: self.score,
            threshold: self.threshold,
        }
    }

    /// `Ok` when passed, [`E2eError::SimilarityMismatch`] otherwise
    pub fn into_result(self) -> E2eResult<Self> {
        if self.passed {
            Ok(self)
        } else {
            Err(self.mismatch())
        }
    }
}

pub struct VisualOracle {
    raster_threshold: f64,
    vector_threshold: f64,
    diff_dir: Option<PathBuf>,
}

impl VisualOracle {
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            raster_threshold: config.raster_threshold,
            vector_threshold: config.vector_threshold,
            diff_dir: config.diff_dir.clone(),
        }
    }

    /// Configured threshold for a kind of artifact
    pub fn threshold(&self, kind: ArtifactKind) -> f64 {
        match kind {
            ArtifactKind::Raster => self.raster_threshold,
            ArtifactKind::Vector => self.vector_threshold,
        }
    }

    /// Score `artifact` against `golden` with the method its format calls
    /// for. `threshold` overrides the configured one.
    pub fn compare(&self, artifact: &Artifact, golden: &Path, threshold: Option<f64>) -> E2eResult<Comparison> {
        let threshold = threshold.unwrap_or_else(|| self.threshold(artifact.kind()));
        match artifact.kind() {
            ArtifactKind::Raster => self.compare_raster(&artifact.path, golden, threshold),
            ArtifactKind::Vector => self.compare_vector(&artifact.path, golden, threshold),
        }
    }

    /// Like [`VisualOracle::compare`], failing on a mismatch
    pub fn assert_matches(&self, artifact: &Artifact, golden: &Path, threshold: Option<f64>) -> E2eResult<Comparison> {
        self.compare(artifact, golden, threshold)?.into_result()
    }

    /// SSIM of two raster files; `artifact` sets the reference size.
    ///
    /// Byte-identical files score exactly 1.0. A mismatch leaves a diff
    /// image in the configured diff directory.
    pub fn compare_raster(&self, artifact: &Path, golden: &Path, threshold: f64) -> E2eResult<Comparison> {
        let (a, b) = raster::load_pair(artifact, golden)?;

        let score = if file_digest(artifact)? == file_digest(golden)? {
            debug!("{} is byte-identical to its golden", artifact.display());
            1.0
        } else {
            raster::ssim(&a, &b)
        };

        let comparison = Comparison::judge(ArtifactKind::Raster, artifact, golden, score, threshold);
        if !comparison.passed {
            if let Some(dir) = &self.diff_dir {
                self.write_diff(dir, artifact, &a, &b);
            }
        }
        Ok(comparison)
    }

    /// Text ratio of two SVG files
    pub fn compare_vector(&self, artifact: &Path, golden: &Path, threshold: f64) -> E2eResult<Comparison> {
        let a = read_svg(artifact)?;
        let b = read_svg(golden)?;
        let score = text::ratio(&a, &b);
        Ok(Comparison::judge(ArtifactKind::Vector, artifact, golden, score, threshold))
    }

    fn write_diff(&self, dir: &Path, artifact: &Path, a: &image::GrayImage, b: &image::GrayImage) {
        let stem = artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        let path = dir.join(format!("{}-diff.png", stem));

        let written = std::fs::create_dir_all(dir)
            .map_err(|e| e.to_string())
            .and_then(|_| raster::difference(a, b).save(&path).map_err(|e| e.to_string()));
        match written {
            Ok(()) => debug!("Diff image written to {}", path.display()),
            Err(e) => warn!("Failed to write diff image {}: {}", path.display(), e),
        }
    }
}

fn read_svg(path: &Path) -> E2eResult<String> {
    let content = text::read_text(path)?;
    if !content.contains("<svg") {
        return Err(E2eError::Decode {
            path: path.to_path_buf(),
            reason: "no <svg> element".to_string(),
        });
    }
    Ok(content)
}

fn file_digest(path: &Path) -> E2eResult<String> {
    let data = std::fs::read(path).map_err(|source| E2eError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// SSIM between two raster files, in [-1, 1]
pub fn raster_similarity(a: &Path, b: &Path) -> E2eResult<f64> {
    raster::similarity(a, b)
}

/// Whether two raster files score at least `threshold`
/// ([`crate::config::DEFAULT_RASTER_THRESHOLD`] in the usual case)
pub fn raster_similar(a: &Path, b: &Path, threshold: f64) -> E2eResult<bool> {
    let score = raster_similarity(a, b)?;
    Ok(Comparison::judge(ArtifactKind::Raster, a, b, score, threshold).passed)
}

/// Matching-block ratio between two text files, in [0, 1]
pub fn text_similarity(a: &Path, b: &Path) -> E2eResult<f64> {
    text::similarity(a, b)
}

/// Whether two text files score at least `threshold`
/// ([`crate::config::DEFAULT_VECTOR_THRESHOLD`] in the usual case)
pub fn text_similar(a: &Path, b: &Path, threshold: f64) -> E2eResult<bool> {
    let score = text_similarity(a, b)?;
    Ok(Comparison::judge(ArtifactKind::Vector, a, b, score, threshold).passed)
}
