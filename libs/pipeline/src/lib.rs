//! Dataset pipeline for MNIST-style CSV digits
//!
//! Turns raw CSV text into normalized `[N, 28, 28, 1]` image tensors with
//! aligned labels, splits them into train and validation sets, corrupts
//! them for denoising, and samples small batches for preview. Model
//! training, prediction, and drawing stay behind the traits in [`model`].

pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod noise;
pub mod parser;
pub mod preview;
pub mod render;
pub mod sampler;
pub mod session;
pub mod split;

pub use config::{FitOptions, NoiseConfig, NoiseKind, PipelineConfig, SplitPolicy, Task};
pub use dataset::{one_hot, Dataset, Labels, Sample};
pub use error::{PipelineError, Result, RowError};
pub use model::{
    EpochStats, LogCallback, ModelPredictor, ModelTrainer, RenderSurface, Targets,
    TrainingCallback, TrainingData,
};
pub use noise::{add_noise, GaussianNoise, Noise, NoiseModel, SaltAndPepper};
pub use parser::{parse, parse_with_report, ParseReport, RejectedRow};
pub use preview::{Prediction, PreviewBatch, PreviewRow};
pub use render::{image_buffer_at, to_image_buffer, PixelBuffer};
pub use sampler::{sample_random, Batches, SampledBatch};
pub use session::{Evaluation, LoadSummary, NoiseMode, Session};
pub use split::{split, split_with, Split};

#[cfg(feature = "fs")]
pub use parser::load_csv;
