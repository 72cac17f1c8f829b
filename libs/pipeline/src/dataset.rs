//! Tensor-backed datasets of labelled digits
//!
//! Images are stored as one `[count, 28, 28, 1]` tensor with values in
//! [0, 1]. Labels are either raw class indices or one-hot rows of width 10,
//! depending on the task the data was loaded for.

use crate::config::Task;
use crate::error::{PipelineError, Result};
use common::{Digit, IMAGE_SIDE, NUM_CLASSES};
use ndarray::{s, Array1, Array2, Array4, ArrayView2, Axis};
use std::ops::Range;

/// Trailing dimensions of every image tensor
pub const IMAGE_DIMS: [usize; 3] = [IMAGE_SIDE, IMAGE_SIDE, 1];

/// Check that `shape` is `[N, 28, 28, 1]`.
pub fn check_image_shape(shape: &[usize]) -> Result<()> {
    if shape.len() != 4 || shape[1..] != IMAGE_DIMS {
        let batch = shape.first().copied().unwrap_or(0);
        return Err(PipelineError::ShapeMismatch {
            expected: vec![batch, IMAGE_SIDE, IMAGE_SIDE, 1],
            actual: shape.to_vec(),
        });
    }
    Ok(())
}

/// One-hot encode class indices into a `[n, 10]` matrix.
pub fn one_hot(classes: &[u8]) -> Array2<f32> {
    let mut encoded = Array2::zeros((classes.len(), NUM_CLASSES));
    for (row, &class) in classes.iter().enumerate() {
        if (class as usize) < NUM_CLASSES {
            encoded[[row, class as usize]] = 1.0;
        }
    }
    encoded
}

/// Labels aligned with the images of a [`Dataset`]
#[derive(Debug, Clone, PartialEq)]
pub enum Labels {
    /// Class indices, shape `[count]`
    Raw(Array1<u8>),
    /// One-hot rows, shape `[count, 10]`
    OneHot(Array2<f32>),
}

impl Labels {
    /// Encode class indices the way `task` needs them.
    pub fn from_classes(classes: Vec<u8>, task: Task) -> Self {
        match task {
            Task::Denoise => Labels::Raw(Array1::from(classes)),
            Task::Classify => Labels::OneHot(one_hot(&classes)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Labels::Raw(raw) => raw.len(),
            Labels::OneHot(encoded) => encoded.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_one_hot(&self) -> bool {
        matches!(self, Labels::OneHot(_))
    }

    /// Class index of row `index` (argmax for one-hot rows).
    ///
    /// Panics if `index >= len()`; use [`Labels::get`] for a checked lookup.
    pub fn class_of(&self, index: usize) -> u8 {
        match self {
            Labels::Raw(raw) => raw[index],
            Labels::OneHot(encoded) => argmax(encoded.row(index).iter().copied()) as u8,
        }
    }

    /// Class index of row `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Option<u8> {
        (index < self.len()).then(|| self.class_of(index))
    }

    /// All class indices in order
    pub fn classes(&self) -> Vec<u8> {
        (0..self.len()).map(|i| self.class_of(i)).collect()
    }

    /// One-hot view of the labels, encoding raw labels on demand
    pub fn to_one_hot(&self) -> Array2<f32> {
        match self {
            Labels::Raw(raw) => one_hot(&raw.to_vec()),
            Labels::OneHot(encoded) => encoded.clone(),
        }
    }

    fn select(&self, indices: &[usize]) -> Self {
        match self {
            Labels::Raw(raw) => Labels::Raw(raw.select(Axis(0), indices)),
            Labels::OneHot(encoded) => Labels::OneHot(encoded.select(Axis(0), indices)),
        }
    }

    fn slice(&self, range: Range<usize>) -> Self {
        match self {
            Labels::Raw(raw) => Labels::Raw(raw.slice(s![range]).to_owned()),
            Labels::OneHot(encoded) => Labels::OneHot(encoded.slice(s![range, ..]).to_owned()),
        }
    }
}

/// Index of the largest value; ties resolve to the first.
pub(crate) fn argmax(values: impl Iterator<Item = f32>) -> usize {
    let mut best = (0, f32::NEG_INFINITY);
    for (i, v) in values.enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best.0
}

/// One labelled image pulled out of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label: u8,
    /// 784 normalized values, row-major 28x28
    pub pixels: Vec<f32>,
}

impl Sample {
    pub fn to_digit(&self) -> Digit {
        Digit::from_normalized(self.label, &self.pixels)
    }
}

/// Images and labels loaded together
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    images: Array4<f32>,
    labels: Labels,
}

impl Dataset {
    /// Pair an image tensor with its labels.
    ///
    /// Fails with `ShapeMismatch` unless images are `[N, 28, 28, 1]` and
    /// there are exactly N labels.
    pub fn new(images: Array4<f32>, labels: Labels) -> Result<Self> {
        check_image_shape(images.shape())?;
        if images.shape()[0] != labels.len() {
            return Err(PipelineError::ShapeMismatch {
                expected: vec![images.shape()[0]],
                actual: vec![labels.len()],
            });
        }
        if let Labels::OneHot(encoded) = &labels {
            if encoded.ncols() != NUM_CLASSES {
                return Err(PipelineError::ShapeMismatch {
                    expected: vec![encoded.nrows(), NUM_CLASSES],
                    actual: encoded.shape().to_vec(),
                });
            }
        }
        Ok(Self { images, labels })
    }

    /// Number of samples
    pub fn count(&self) -> usize {
        self.images.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn images(&self) -> &Array4<f32> {
        &self.images
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// The `[28, 28]` image at `index`
    pub fn image(&self, index: usize) -> ArrayView2<'_, f32> {
        self.images
            .index_axis(Axis(0), index)
            .index_axis_move(Axis(2), 0)
    }

    /// Class index of sample `index`. Panics if `index >= count()`.
    pub fn class_of(&self, index: usize) -> u8 {
        self.labels.class_of(index)
    }

    pub fn sample(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            label: self.labels.get(index)?,
            pixels: self.image(index).iter().copied().collect(),
        })
    }

    pub fn digit(&self, index: usize) -> Option<Digit> {
        self.sample(index).map(|s| s.to_digit())
    }

    /// Contiguous rows `range`, images and labels cut at the same bounds.
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.count() {
            return Err(PipelineError::InvalidArgument(format!(
                "slice {}..{} out of bounds for {} samples",
                range.start,
                range.end,
                self.count()
            )));
        }
        Ok(Self {
            images: self.images.slice(s![range.clone(), .., .., ..]).to_owned(),
            labels: self.labels.slice(range),
        })
    }

    /// Gather rows in the order given by `indices`.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.count()) {
            return Err(PipelineError::InvalidArgument(format!(
                "index {bad} out of bounds for {} samples",
                self.count()
            )));
        }
        Ok(Self {
            images: self.images.select(Axis(0), indices),
            labels: self.labels.select(indices),
        })
    }

    /// Count of samples per class
    pub fn label_histogram(&self) -> [usize; NUM_CLASSES] {
        let mut histogram = [0; NUM_CLASSES];
        for class in self.labels.classes() {
            if let Some(slot) = histogram.get_mut(class as usize) {
                *slot += 1;
            }
        }
        histogram
    }
}
