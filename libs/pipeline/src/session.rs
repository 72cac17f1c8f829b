//! Loaded data for one user session
//!
//! A [`Session`] owns at most one current training source (split into train
//! and validation) and one current test source, each with a persistent noisy
//! copy. Loading a new pair builds everything first and only then replaces
//! the old data, so a failed load leaves the session as it was.

use crate::config::{PipelineConfig, Task};
use crate::dataset::{Dataset, Labels};
use crate::error::{PipelineError, Result};
use crate::model::{
    accuracy, as_probabilities, mean_squared_error, predict_checked, EpochStats, ModelPredictor,
    ModelTrainer, Targets, TrainingCallback, TrainingData,
};
use crate::noise::Noise;
use crate::parser::{parse_with_report, ParseReport};
use crate::preview::{Prediction, PreviewBatch};
use crate::sampler::sample_random;
use crate::split::{split_with, Split};
use ndarray::{Array1, Array4, Axis, Ix4};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;

/// Which noisy test copy an evaluation runs against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoiseMode {
    /// The copy generated at load time
    #[default]
    Persistent,
    /// New corruption drawn for this call
    Fresh,
}

/// Result of evaluating a model on the test source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Mean squared error between denoised and clean test images
    Denoise { mse: f32 },
    /// Fraction of test digits classified correctly
    Classify { accuracy: f32 },
}

/// Sizes of a completed load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
    /// Lines rejected across both sources
    pub rejected: usize,
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "train {}, val {}, test {}",
            self.train, self.validation, self.test
        )?;
        if self.rejected > 0 {
            write!(f, " ({} rows rejected)", self.rejected)?;
        }
        Ok(())
    }
}

struct TrainData {
    split: Split,
    noisy_train: Array4<f32>,
    noisy_validation: Array4<f32>,
    report: ParseReport,
}

struct TestData {
    data: Dataset,
    noisy: Array4<f32>,
    report: ParseReport,
}

/// Explicit owner of the current datasets
pub struct Session {
    config: PipelineConfig,
    noise: Noise,
    rng: StdRng,
    train: Option<TrainData>,
    test: Option<TestData>,
}

impl Session {
    /// Create an empty session, seeding the RNG from `config.seed` if set.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let noise = Noise::from_config(&config.noise)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            noise,
            rng,
            train: None,
            test: None,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Whether both sources are loaded
    pub fn is_loaded(&self) -> bool {
        self.train.is_some() && self.test.is_some()
    }

    /// Load a train and a test source from CSV text.
    ///
    /// Both inputs are required; `MissingInput` is returned before any
    /// parsing if either is absent.
    pub fn load_text(&mut self, train_csv: Option<&str>, test_csv: Option<&str>) -> Result<LoadSummary> {
        let (train_csv, test_csv) = require_both(train_csv, test_csv)?;
        self.load_named(train_csv, "train", test_csv, "test")
    }

    /// Read both files in full, then load them.
    #[cfg(feature = "fs")]
    pub async fn load_files(
        &mut self,
        train_path: Option<&std::path::Path>,
        test_path: Option<&std::path::Path>,
    ) -> Result<LoadSummary> {
        let (train_path, test_path) = require_both(train_path, test_path)?;

        tracing::info!(path = %train_path.display(), "reading train CSV");
        let train_csv = tokio::fs::read_to_string(train_path).await?;
        tracing::info!(path = %test_path.display(), "reading test CSV");
        let test_csv = tokio::fs::read_to_string(test_path).await?;

        self.load_named(
            &train_csv,
            &source_name(train_path),
            &test_csv,
            &source_name(test_path),
        )
    }

    fn load_named(
        &mut self,
        train_csv: &str,
        train_name: &str,
        test_csv: &str,
        test_name: &str,
    ) -> Result<LoadSummary> {
        let task = self.config.task;
        let (train_source, train_report) = parse_with_report(train_csv, train_name, task)?;
        let (test_source, test_report) = parse_with_report(test_csv, test_name, task)?;

        let split = split_with(
            &train_source,
            self.config.validation_ratio,
            self.config.split,
            &mut self.rng,
        )?;
        let noisy_train = self.noise.apply(split.train.images(), &mut self.rng)?;
        let noisy_validation = self.noise.apply(split.validation.images(), &mut self.rng)?;
        let noisy_test = self.noise.apply(test_source.images(), &mut self.rng)?;

        let summary = LoadSummary {
            train: split.train.count(),
            validation: split.validation.count(),
            test: test_source.count(),
            rejected: train_report.rejected_count() + test_report.rejected_count(),
        };

        self.install(
            TrainData {
                split,
                noisy_train,
                noisy_validation,
                report: train_report,
            },
            TestData {
                data: test_source,
                noisy: noisy_test,
                report: test_report,
            },
        );

        tracing::info!(%summary, "loaded");
        Ok(summary)
    }

    fn install(&mut self, train: TrainData, test: TestData) {
        if let Some(old) = self.train.replace(train) {
            tracing::debug!(samples = old.split.train.count(), "released previous train data");
        }
        if let Some(old) = self.test.replace(test) {
            tracing::debug!(samples = old.data.count(), "released previous test data");
        }
    }

    /// Release all loaded data.
    pub fn clear(&mut self) {
        let train = self.train.take();
        let test = self.test.take();
        if train.is_some() || test.is_some() {
            tracing::debug!("released session data");
        }
    }

    fn train_data(&self) -> Result<&TrainData> {
        self.train
            .as_ref()
            .ok_or_else(|| PipelineError::MissingInput("training data not loaded".to_string()))
    }

    fn test_data(&self) -> Result<&TestData> {
        self.test
            .as_ref()
            .ok_or_else(|| PipelineError::MissingInput("test data not loaded".to_string()))
    }

    pub fn train(&self) -> Result<&Dataset> {
        Ok(&self.train_data()?.split.train)
    }

    pub fn validation(&self) -> Result<&Dataset> {
        Ok(&self.train_data()?.split.validation)
    }

    pub fn test(&self) -> Result<&Dataset> {
        Ok(&self.test_data()?.data)
    }

    pub fn noisy_train(&self) -> Result<&Array4<f32>> {
        Ok(&self.train_data()?.noisy_train)
    }

    pub fn noisy_validation(&self) -> Result<&Array4<f32>> {
        Ok(&self.train_data()?.noisy_validation)
    }

    /// Noisy test copy generated at load time
    pub fn noisy_test(&self) -> Result<&Array4<f32>> {
        Ok(&self.test_data()?.noisy)
    }

    /// Newly corrupted copy of the test images; the persistent copy is untouched.
    pub fn fresh_noisy_test(&mut self) -> Result<Array4<f32>> {
        let test = self
            .test
            .as_ref()
            .ok_or_else(|| PipelineError::MissingInput("test data not loaded".to_string()))?;
        self.noise.apply(test.data.images(), &mut self.rng)
    }

    pub fn train_report(&self) -> Option<&ParseReport> {
        self.train.as_ref().map(|t| &t.report)
    }

    pub fn test_report(&self) -> Option<&ParseReport> {
        self.test.as_ref().map(|t| &t.report)
    }

    /// Training pairs for the configured task, plus validation pairs when
    /// the validation split is not empty.
    pub fn training_data(&self) -> Result<(TrainingData<'_>, Option<TrainingData<'_>>)> {
        let data = self.train_data()?;
        let train = pairs(self.config.task, &data.split.train, &data.noisy_train)?;
        let validation = if data.split.validation.is_empty() {
            None
        } else {
            Some(pairs(
                self.config.task,
                &data.split.validation,
                &data.noisy_validation,
            )?)
        };
        Ok((train, validation))
    }

    /// Hand the training pairs to `trainer`.
    pub fn fit(
        &self,
        trainer: &mut dyn ModelTrainer,
        callback: &mut dyn TrainingCallback,
    ) -> Result<Vec<EpochStats>> {
        let (train, validation) = self.training_data()?;
        tracing::info!(
            samples = train.inputs.shape()[0],
            epochs = self.config.fit.epochs,
            batch_size = self.config.fit.batch_size,
            "training"
        );
        let history = trainer.fit(train, validation, &self.config.fit, callback)?;
        callback.on_training_end(&history);
        Ok(history)
    }

    /// Score `predictor` on the whole test source.
    pub fn evaluate(&mut self, predictor: &dyn ModelPredictor, mode: NoiseMode) -> Result<Evaluation> {
        match self.config.task {
            Task::Denoise => {
                let fresh;
                let noisy = match mode {
                    NoiseMode::Persistent => self.noisy_test()?,
                    NoiseMode::Fresh => {
                        fresh = self.fresh_noisy_test()?;
                        &fresh
                    }
                };
                let clean = self.test()?.images();
                let denoised = predict_checked(predictor, noisy.view())?;
                let mse = mean_squared_error(denoised.view(), clean.view().into_dyn())?;
                tracing::info!(mse, "test evaluation");
                Ok(Evaluation::Denoise { mse })
            }
            Task::Classify => {
                let test = self.test()?;
                let probabilities = as_probabilities(predict_checked(predictor, test.images().view())?)?;
                let classes = Array1::from(test.labels().classes());
                let accuracy = accuracy(probabilities.view(), classes.view())?;
                tracing::info!(accuracy, "test evaluation");
                Ok(Evaluation::Classify { accuracy })
            }
        }
    }

    /// Pick `k` random test digits with their noisy copies and, if a
    /// predictor is given, its output.
    pub fn preview(&mut self, k: usize, predictor: Option<&dyn ModelPredictor>) -> Result<PreviewBatch> {
        let test = self
            .test
            .as_ref()
            .ok_or_else(|| PipelineError::MissingInput("test data not loaded".to_string()))?;
        let sampled = sample_random(&test.data, k, &mut self.rng)?;
        let noisy = test.noisy.select(Axis(0), &sampled.indices);
        let clean = sampled.data.images().clone();

        let prediction = match predictor {
            None => None,
            Some(predictor) => Some(match self.config.task {
                Task::Denoise => {
                    let output = predict_checked(predictor, noisy.view())?;
                    let images = output.into_dimensionality::<Ix4>().map_err(|_| {
                        PipelineError::InvalidArgument(
                            "denoiser output is not a 4-D image tensor".to_string(),
                        )
                    })?;
                    crate::dataset::check_image_shape(images.shape())?;
                    Prediction::Images(images)
                }
                Task::Classify => {
                    let output = predict_checked(predictor, clean.view())?;
                    let probabilities = as_probabilities(output)?;
                    Prediction::Classes(
                        probabilities
                            .outer_iter()
                            .map(|row| crate::dataset::argmax(row.iter().copied()) as u8)
                            .collect(),
                    )
                }
            }),
        };

        Ok(PreviewBatch {
            labels: sampled.data.labels().classes(),
            indices: sampled.indices,
            clean,
            noisy,
            prediction,
        })
    }
}

fn pairs<'a>(task: Task, clean: &'a Dataset, noisy: &'a Array4<f32>) -> Result<TrainingData<'a>> {
    match task {
        Task::Denoise => Ok(TrainingData {
            inputs: noisy.view(),
            targets: Targets::Images(clean.images().view()),
        }),
        Task::Classify => match clean.labels() {
            Labels::OneHot(encoded) => Ok(TrainingData {
                inputs: clean.images().view(),
                targets: Targets::OneHot(encoded.view()),
            }),
            Labels::Raw(_) => Err(PipelineError::InvalidArgument(
                "classification needs one-hot labels".to_string(),
            )),
        },
    }
}

fn require_both<T>(train: Option<T>, test: Option<T>) -> Result<(T, T)> {
    match (train, test) {
        (Some(train), Some(test)) => Ok((train, test)),
        (None, None) => Err(PipelineError::MissingInput(
            "train and test CSV".to_string(),
        )),
        (None, _) => Err(PipelineError::MissingInput("train CSV".to_string())),
        (_, None) => Err(PipelineError::MissingInput("test CSV".to_string())),
    }
}

#[cfg(feature = "fs")]
fn source_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
