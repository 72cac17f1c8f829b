//! Pipeline configuration

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the loaded data is used for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    /// Autoencoder: noisy images in, clean images out
    #[default]
    Denoise,
    /// Classifier: images in, one-hot labels out
    Classify,
}

/// Corruption model applied to clean images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoiseKind {
    /// Additive N(0, 1) noise scaled by the intensity, then clipped
    #[default]
    Gaussian,
    /// Pixels forced to black or white with total probability `intensity`
    SaltAndPepper,
}

impl std::str::FromStr for NoiseKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gaussian" => Ok(NoiseKind::Gaussian),
            "salt-and-pepper" | "salt-pepper" => Ok(NoiseKind::SaltAndPepper),
            other => Err(PipelineError::Config(format!("unknown noise kind: {other}"))),
        }
    }
}

/// How a dataset is partitioned into train and validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitPolicy {
    /// First rows train, last rows validate, original order kept
    #[default]
    Contiguous,
    /// One random permutation applied to images and labels before slicing
    Shuffled,
}

/// Noise settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    pub kind: NoiseKind,
    /// Noise factor (Gaussian) or corruption probability (salt-and-pepper)
    pub intensity: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            kind: NoiseKind::Gaussian,
            intensity: 0.5,
        }
    }
}

/// Options handed to a model trainer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitOptions {
    /// Samples per gradient update
    pub batch_size: usize,
    /// Passes over the training data
    pub epochs: usize,
    /// Reshuffle the training data every epoch
    pub shuffle: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            batch_size: 128,
            epochs: 10,
            shuffle: true,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub task: Task,
    /// Fraction of the training source held out for validation
    pub validation_ratio: f64,
    pub split: SplitPolicy,
    pub noise: NoiseConfig,
    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Digits shown by a preview
    pub preview_count: usize,
    pub fit: FitOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            task: Task::Denoise,
            validation_ratio: 0.1,
            split: SplitPolicy::Contiguous,
            noise: NoiseConfig::default(),
            seed: None,
            preview_count: 5,
            fit: FitOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Configuration for the digit classifier variant
    pub fn classifier() -> Self {
        Self {
            task: Task::Classify,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.validation_ratio > 0.0 && self.validation_ratio < 1.0) {
            return Err(PipelineError::Config(format!(
                "validation_ratio must be in (0, 1), got {}",
                self.validation_ratio
            )));
        }

        if !(0.0..=1.0).contains(&self.noise.intensity) {
            return Err(PipelineError::Config(format!(
                "noise intensity must be in [0, 1], got {}",
                self.noise.intensity
            )));
        }

        if self.preview_count == 0 {
            return Err(PipelineError::Config("preview_count must be > 0".to_string()));
        }

        if self.fit.batch_size == 0 {
            return Err(PipelineError::Config("batch_size must be > 0".to_string()));
        }

        if self.fit.epochs == 0 {
            return Err(PipelineError::Config("epochs must be > 0".to_string()));
        }

        Ok(())
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Deserialize from JSON and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.task, Task::Denoise);
        assert_eq!(config.validation_ratio, 0.1);
        assert_eq!(config.split, SplitPolicy::Contiguous);
        assert_eq!(config.noise.kind, NoiseKind::Gaussian);
        assert_eq!(config.noise.intensity, 0.5);
        assert_eq!(config.fit.batch_size, 128);
        assert_eq!(config.fit.epochs, 10);
        assert!(config.fit.shuffle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_classifier() {
        let config = PipelineConfig::classifier();
        assert_eq!(config.task, Task::Classify);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ratio() {
        for ratio in [0.0, 1.0, -0.5, f64::NAN] {
            let config = PipelineConfig {
                validation_ratio: ratio,
                ..PipelineConfig::default()
            };
            assert!(config.validate().is_err(), "ratio {ratio} accepted");
        }
    }

    #[test]
    fn test_validate_rejects_bad_intensity() {
        let mut config = PipelineConfig::default();
        config.noise.intensity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = PipelineConfig::default();
        config.noise.kind = NoiseKind::SaltAndPepper;
        config.seed = Some(42);

        let json = config.to_json().unwrap();
        assert!(json.contains("salt-and-pepper"));

        let loaded = PipelineConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PipelineConfig::from_json(r#"{ "task": "classify" }"#).unwrap();
        assert_eq!(config.task, Task::Classify);
        assert_eq!(config.validation_ratio, 0.1);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{ "seed": 7, "preview_count": 3 }"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.preview_count, 3);
    }

    #[test]
    fn test_noise_kind_from_str() {
        assert_eq!("gaussian".parse::<NoiseKind>().unwrap(), NoiseKind::Gaussian);
        assert_eq!(
            "salt-and-pepper".parse::<NoiseKind>().unwrap(),
            NoiseKind::SaltAndPepper
        );
        assert!("speckle".parse::<NoiseKind>().is_err());
    }
}
