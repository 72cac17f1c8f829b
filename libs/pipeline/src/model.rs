//! Interfaces to the external model and display collaborators
//!
//! Training, prediction, and drawing are done elsewhere. The pipeline only
//! supplies tensors through these traits and checks what comes back.

use crate::config::FitOptions;
use crate::dataset::argmax;
use crate::error::{PipelineError, Result};
use crate::render::PixelBuffer;
use ndarray::{Array2, ArrayD, ArrayView1, ArrayView2, ArrayView4, ArrayViewD, Axis};
use serde::{Deserialize, Serialize};

/// Targets paired with the training inputs
#[derive(Debug, Clone, Copy)]
pub enum Targets<'a> {
    /// Clean images for an autoencoder
    Images(ArrayView4<'a, f32>),
    /// One-hot labels for a classifier
    OneHot(ArrayView2<'a, f32>),
}

impl Targets<'_> {
    pub fn len(&self) -> usize {
        match self {
            Targets::Images(images) => images.shape()[0],
            Targets::OneHot(labels) => labels.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inputs and targets for one fit call
#[derive(Debug, Clone, Copy)]
pub struct TrainingData<'a> {
    pub inputs: ArrayView4<'a, f32>,
    pub targets: Targets<'a>,
}

/// Scalars reported after one epoch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss: f32,
    pub val_loss: Option<f32>,
    /// Only reported by classifiers
    pub accuracy: Option<f32>,
}

/// Simple callback for training events
pub trait TrainingCallback {
    /// Called after each epoch
    fn on_epoch_end(&mut self, _stats: &EpochStats) {}

    /// Called when training completes
    fn on_training_end(&mut self, _history: &[EpochStats]) {}
}

/// Callback that reports progress through `tracing`
#[derive(Debug, Default)]
pub struct LogCallback;

impl TrainingCallback for LogCallback {
    fn on_epoch_end(&mut self, stats: &EpochStats) {
        tracing::info!(
            epoch = stats.epoch,
            loss = stats.loss,
            val_loss = ?stats.val_loss,
            accuracy = ?stats.accuracy,
            "epoch complete"
        );
    }

    fn on_training_end(&mut self, history: &[EpochStats]) {
        let final_loss = history.last().map(|s| s.loss);
        tracing::info!(epochs = history.len(), final_loss = ?final_loss, "training complete");
    }
}

/// Model trainer collaborator
pub trait ModelTrainer {
    /// Fit on `train`, optionally reporting against `validation`.
    fn fit(
        &mut self,
        train: TrainingData<'_>,
        validation: Option<TrainingData<'_>>,
        options: &FitOptions,
        callback: &mut dyn TrainingCallback,
    ) -> Result<Vec<EpochStats>>;
}

/// Model predictor collaborator
pub trait ModelPredictor {
    /// Predict for a `[N, 28, 28, 1]` batch.
    ///
    /// The output must keep the leading batch dimension: denoised images
    /// `[N, 28, 28, 1]` or class probabilities `[N, 10]`.
    fn predict(&self, batch: ArrayView4<'_, f32>) -> Result<ArrayD<f32>>;
}

/// Something a pixel buffer can be drawn on
pub trait RenderSurface {
    fn draw(&mut self, buffer: &PixelBuffer) -> Result<()>;
}

/// Run `predictor` and check the batch dimension survived.
pub fn predict_checked<P: ModelPredictor + ?Sized>(
    predictor: &P,
    batch: ArrayView4<'_, f32>,
) -> Result<ArrayD<f32>> {
    let prediction = predictor.predict(batch)?;
    let expected = batch.shape()[0];
    if prediction.shape().first() != Some(&expected) {
        return Err(PipelineError::ShapeMismatch {
            expected: vec![expected],
            actual: prediction.shape().to_vec(),
        });
    }
    Ok(prediction)
}

/// Mean of squared element differences.
pub fn mean_squared_error(a: ArrayViewD<'_, f32>, b: ArrayViewD<'_, f32>) -> Result<f32> {
    if a.shape() != b.shape() {
        return Err(PipelineError::ShapeMismatch {
            expected: a.shape().to_vec(),
            actual: b.shape().to_vec(),
        });
    }
    if a.is_empty() {
        return Err(PipelineError::InvalidArgument(
            "mean squared error of empty tensors".to_string(),
        ));
    }
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum();
    Ok((sum / a.len() as f64) as f32)
}

/// Fraction of rows whose argmax matches the class label.
pub fn accuracy(probabilities: ArrayView2<'_, f32>, classes: ArrayView1<'_, u8>) -> Result<f32> {
    if probabilities.nrows() != classes.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: vec![classes.len()],
            actual: probabilities.shape().to_vec(),
        });
    }
    if classes.is_empty() {
        return Err(PipelineError::InvalidArgument(
            "accuracy of an empty batch".to_string(),
        ));
    }
    let correct = probabilities
        .axis_iter(Axis(0))
        .zip(classes.iter())
        .filter(|(row, class)| argmax(row.iter().copied()) == **class as usize)
        .count();
    Ok(correct as f32 / classes.len() as f32)
}

/// Reshape a flat prediction into `[N, 10]` probabilities.
pub fn as_probabilities(prediction: ArrayD<f32>) -> Result<Array2<f32>> {
    let shape = prediction.shape().to_vec();
    let mismatch = || PipelineError::ShapeMismatch {
        expected: vec![shape.first().copied().unwrap_or(0), common::NUM_CLASSES],
        actual: shape.clone(),
    };
    let probabilities: Array2<f32> = prediction.into_dimensionality().map_err(|_| mismatch())?;
    if probabilities.ncols() != common::NUM_CLASSES {
        return Err(mismatch());
    }
    Ok(probabilities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array4, IxDyn};

    struct Identity;

    impl ModelPredictor for Identity {
        fn predict(&self, batch: ArrayView4<'_, f32>) -> Result<ArrayD<f32>> {
            Ok(batch.to_owned().into_dyn())
        }
    }

    struct Truncating;

    impl ModelPredictor for Truncating {
        fn predict(&self, _batch: ArrayView4<'_, f32>) -> Result<ArrayD<f32>> {
            Ok(ArrayD::zeros(IxDyn(&[1, 10])))
        }
    }

    #[test]
    fn test_predict_checked() {
        let batch = Array4::<f32>::zeros((3, 28, 28, 1));
        assert!(predict_checked(&Identity, batch.view()).is_ok());
        assert!(matches!(
            predict_checked(&Truncating, batch.view()),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_mean_squared_error() {
        let a = array![0.0f32, 1.0, 0.5, 0.5].into_dyn();
        let b = array![0.0f32, 0.0, 0.5, 1.0].into_dyn();
        let mse = mean_squared_error(a.view(), b.view()).unwrap();
        assert!((mse - 0.3125).abs() < 1e-6);

        let c = array![0.0f32].into_dyn();
        assert!(mean_squared_error(a.view(), c.view()).is_err());
    }

    #[test]
    fn test_accuracy() {
        let probs = array![[0.9f32, 0.1], [0.2, 0.8], [0.6, 0.4]];
        let classes = array![0u8, 1, 1];
        let acc = accuracy(probs.view(), classes.view()).unwrap();
        assert!((acc - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_as_probabilities() {
        let flat = ArrayD::<f32>::zeros(IxDyn(&[4, 10]));
        assert_eq!(as_probabilities(flat).unwrap().shape(), &[4, 10]);

        let images = ArrayD::<f32>::zeros(IxDyn(&[4, 28, 28, 1]));
        assert!(as_probabilities(images).is_err());

        let narrow = ArrayD::<f32>::zeros(IxDyn(&[4, 3]));
        assert!(as_probabilities(narrow).is_err());
    }

    #[test]
    fn test_log_callback() {
        // Just verify it doesn't panic
        let mut logger = LogCallback;
        let stats = EpochStats {
            epoch: 1,
            loss: 0.05,
            val_loss: Some(0.06),
            accuracy: None,
        };
        logger.on_epoch_end(&stats);
        logger.on_training_end(&[stats]);
    }
}
