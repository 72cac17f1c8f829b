//! Noise injection for denoising tasks
//!
//! Both corruption models share [`NoiseModel`] and are picked from
//! [`NoiseConfig`]. Inputs are never mutated and every output value is
//! clipped to [0, 1].

use crate::config::{NoiseConfig, NoiseKind};
use crate::dataset::check_image_shape;
use crate::error::{PipelineError, Result};
use ndarray::Array4;
use rand::Rng;
use rand_distr::StandardNormal;

/// Per-pixel corruption strategy
pub trait NoiseModel {
    /// Corrupted value for one normalized pixel, before clipping.
    fn corrupt<R: Rng + ?Sized>(&self, value: f32, rng: &mut R) -> f32;
}

/// Additive N(0, 1) noise scaled by `factor`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianNoise {
    pub factor: f32,
}

impl NoiseModel for GaussianNoise {
    fn corrupt<R: Rng + ?Sized>(&self, value: f32, rng: &mut R) -> f32 {
        let n: f32 = rng.sample(StandardNormal);
        value + n * self.factor
    }
}

/// Black with probability `p / 2`, white with probability `p / 2`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaltAndPepper {
    pub probability: f32,
}

impl NoiseModel for SaltAndPepper {
    fn corrupt<R: Rng + ?Sized>(&self, value: f32, rng: &mut R) -> f32 {
        let r: f32 = rng.gen();
        if r < self.probability / 2.0 {
            0.0
        } else if r < self.probability {
            1.0
        } else {
            value
        }
    }
}

/// A configured noise model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Noise {
    Gaussian(GaussianNoise),
    SaltAndPepper(SaltAndPepper),
}

impl Noise {
    /// Build the model named by `config`, checking intensity is in [0, 1].
    pub fn from_config(config: &NoiseConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.intensity) {
            return Err(PipelineError::InvalidArgument(format!(
                "noise intensity must be in [0, 1], got {}",
                config.intensity
            )));
        }
        Ok(match config.kind {
            NoiseKind::Gaussian => Noise::Gaussian(GaussianNoise {
                factor: config.intensity,
            }),
            NoiseKind::SaltAndPepper => Noise::SaltAndPepper(SaltAndPepper {
                probability: config.intensity,
            }),
        })
    }

    /// Corrupted copy of `images`, same shape, values in [0, 1].
    pub fn apply<R: Rng + ?Sized>(&self, images: &Array4<f32>, rng: &mut R) -> Result<Array4<f32>> {
        check_image_shape(images.shape())?;
        Ok(images.mapv(|v| self.corrupt(v, rng).clamp(0.0, 1.0)))
    }
}

impl NoiseModel for Noise {
    fn corrupt<R: Rng + ?Sized>(&self, value: f32, rng: &mut R) -> f32 {
        match self {
            Noise::Gaussian(model) => model.corrupt(value, rng),
            Noise::SaltAndPepper(model) => model.corrupt(value, rng),
        }
    }
}

/// Add noise described by `config` to a `[N, 28, 28, 1]` tensor.
pub fn add_noise<R: Rng + ?Sized>(
    images: &Array4<f32>,
    config: &NoiseConfig,
    rng: &mut R,
) -> Result<Array4<f32>> {
    Noise::from_config(config)?.apply(images, rng)
}
