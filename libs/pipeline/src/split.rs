//! Train/validation splitting
//!
//! The boundary is computed once from the ratio and used for both images
//! and labels, so pairs can never drift apart.

use crate::config::SplitPolicy;
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// Disjoint train and validation subsets of one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Dataset,
    pub validation: Dataset,
}

/// Number of samples held out for validation: `floor(count * ratio)`.
pub fn validation_len(count: usize, ratio: f64) -> Result<usize> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(PipelineError::InvalidArgument(format!(
            "split ratio must be in (0, 1), got {ratio}"
        )));
    }
    Ok(((count as f64) * ratio).floor() as usize)
}

/// Contiguous split: the first rows train, the rest validate.
pub fn split(dataset: &Dataset, ratio: f64) -> Result<Split> {
    let boundary = dataset.count() - validation_len(dataset.count(), ratio)?;

    let split = Split {
        train: dataset.slice(0..boundary)?,
        validation: dataset.slice(boundary..dataset.count())?,
    };

    tracing::debug!(
        train = split.train.count(),
        validation = split.validation.count(),
        "contiguous split"
    );
    Ok(split)
}

/// Split following `policy`.
///
/// `Shuffled` permutes the rows once, then cuts at the same boundary a
/// contiguous split would use.
pub fn split_with<R: Rng + ?Sized>(
    dataset: &Dataset,
    ratio: f64,
    policy: SplitPolicy,
    rng: &mut R,
) -> Result<Split> {
    match policy {
        SplitPolicy::Contiguous => split(dataset, ratio),
        SplitPolicy::Shuffled => {
            let val_len = validation_len(dataset.count(), ratio)?;
            let boundary = dataset.count() - val_len;

            let mut order: Vec<usize> = (0..dataset.count()).collect();
            order.shuffle(rng);
            let (train_idx, val_idx) = order.split_at(boundary);

            let split = Split {
                train: dataset.select(train_idx)?,
                validation: dataset.select(val_idx)?,
            };

            tracing::debug!(
                train = split.train.count(),
                validation = split.validation.count(),
                "shuffled split"
            );
            Ok(split)
        }
    }
}
