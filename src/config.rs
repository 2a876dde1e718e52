use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// File names used by the pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineFiles {
    /// Flattened image rows to split.
    pub images: PathBuf,
    pub original: PathBuf,
    pub control: PathBuf,
    pub synthetic: PathBuf,
}

impl Default for PipelineFiles {
    fn default() -> Self {
        Self {
            images: PathBuf::from("images.csv"),
            original: PathBuf::from("ori.csv"),
            control: PathBuf::from("control.csv"),
            synthetic: PathBuf::from("syn.csv"),
        }
    }
}

impl PipelineFiles {
    /// Same file names, placed under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        let d = Self::default();
        Self {
            images: dir.join(d.images),
            original: dir.join(d.original),
            control: dir.join(d.control),
            synthetic: dir.join(d.synthetic),
        }
    }
}

// ---------------------------------------------------------------------------
// AuditConfig – every knob of one pipeline run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Privacy parameter of the pixel noise. Smaller is noisier.
    pub epsilon: f64,
    pub sensitivity: f64,
    /// Share of rows held out as the control partition.
    pub control_fraction: f64,
    /// Seeds the partition split and the evaluators.
    pub seed: u64,
    /// Seeds the pixel noise; OS entropy when unset.
    pub noise_seed: Option<u64>,
    /// Attack budget per evaluator.
    pub n_attacks: usize,
    pub grayscale: bool,
    pub files: PipelineFiles,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            sensitivity: 1.0,
            control_fraction: 0.3,
            seed: 42,
            noise_seed: None,
            n_attacks: 32,
            grayscale: true,
            files: PipelineFiles::default(),
        }
    }
}

impl AuditConfig {
    /// Read a JSON config; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AuditConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ConfigError::InvalidEpsilon(self.epsilon));
        }
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(ConfigError::InvalidSensitivity(self.sensitivity));
        }
        if !(self.control_fraction > 0.0 && self.control_fraction < 1.0) {
            return Err(ConfigError::InvalidFraction(self.control_fraction));
        }
        if self.n_attacks == 0 {
            return Err(ConfigError::ZeroAttacks);
        }
        Ok(())
    }
}
