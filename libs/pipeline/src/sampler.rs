//! Random sampling and mini-batching

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// `k` distinct rows drawn from a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct SampledBatch {
    /// Source row of each sample, in draw order
    pub indices: Vec<usize>,
    /// Gathered images and labels, in the same order as `indices`
    pub data: Dataset,
}

/// Shuffle `0..count` and keep the first `k`.
///
/// Fails with `SampleTooLarge` if `k > count`.
pub fn random_indices<R: Rng + ?Sized>(count: usize, k: usize, rng: &mut R) -> Result<Vec<usize>> {
    if k > count {
        return Err(PipelineError::SampleTooLarge {
            requested: k,
            available: count,
        });
    }
    let mut order: Vec<usize> = (0..count).collect();
    order.shuffle(rng);
    order.truncate(k);
    Ok(order)
}

/// Draw `k` distinct samples uniformly without replacement.
pub fn sample_random<R: Rng + ?Sized>(dataset: &Dataset, k: usize, rng: &mut R) -> Result<SampledBatch> {
    let indices = random_indices(dataset.count(), k, rng)?;
    let data = dataset.select(&indices)?;
    Ok(SampledBatch { indices, data })
}

/// Iterator over consecutive mini-batches of a dataset
pub struct Batches<'a> {
    dataset: &'a Dataset,
    order: Vec<usize>,
    batch_size: usize,
    current_index: usize,
}

impl<'a> Batches<'a> {
    /// Batches in dataset order
    pub fn new(dataset: &'a Dataset, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(PipelineError::InvalidArgument(
                "batch_size must be > 0".to_string(),
            ));
        }
        Ok(Self {
            dataset,
            order: (0..dataset.count()).collect(),
            batch_size,
            current_index: 0,
        })
    }

    /// Batches over one random permutation of the rows
    pub fn shuffled<R: Rng + ?Sized>(dataset: &'a Dataset, batch_size: usize, rng: &mut R) -> Result<Self> {
        let mut batches = Self::new(dataset, batch_size)?;
        batches.order.shuffle(rng);
        Ok(batches)
    }

    /// Number of batches, counting a short final one
    pub fn num_batches(&self) -> usize {
        self.order.len().div_ceil(self.batch_size)
    }

    /// Reset to beginning
    pub fn reset(&mut self) {
        self.current_index = 0;
    }
}

impl Iterator for Batches<'_> {
    type Item = Dataset;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index >= self.order.len() {
            return None;
        }

        let end = std::cmp::min(self.current_index + self.batch_size, self.order.len());
        let batch = self.dataset.select(&self.order[self.current_index..end]).ok();
        self.current_index = end;
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Task;
    use crate::dataset::Labels;
    use ndarray::Array4;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn toy(n: usize) -> Dataset {
        let images = Array4::from_shape_fn((n, 28, 28, 1), |(i, _, _, _)| i as f32);
        let classes = (0..n).map(|i| (i % 10) as u8).collect();
        Dataset::new(images, Labels::from_classes(classes, Task::Classify)).unwrap()
    }

    #[test]
    fn test_indices_distinct_and_in_range() {
        let mut rng = StdRng::seed_from_u64(2);
        for k in [0, 1, 5, 30] {
            let indices = random_indices(30, k, &mut rng).unwrap();
            assert_eq!(indices.len(), k);
            let unique: HashSet<_> = indices.iter().collect();
            assert_eq!(unique.len(), k);
            assert!(indices.iter().all(|&i| i < 30));
        }
    }

    #[test]
    fn test_too_many_requested() {
        let mut rng = StdRng::seed_from_u64(2);
        let err = sample_random(&toy(3), 4, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SampleTooLarge {
                requested: 4,
                available: 3
            }
        ));
    }

    #[test]
    fn test_sample_follows_indices() {
        let ds = toy(20);
        let mut rng = StdRng::seed_from_u64(17);
        let batch = sample_random(&ds, 5, &mut rng).unwrap();
        assert_eq!(batch.data.count(), 5);
        for (pos, &src) in batch.indices.iter().enumerate() {
            assert_eq!(batch.data.images()[[pos, 3, 3, 0]], src as f32);
            assert_eq!(batch.data.class_of(pos) as usize, src % 10);
        }
    }

    #[test]
    fn test_batches_cover_dataset() {
        let ds = toy(10);
        let batches = Batches::new(&ds, 4).unwrap();
        assert_eq!(batches.num_batches(), 3);
        let sizes: Vec<usize> = batches.map(|b| b.count()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn test_shuffled_batches_are_a_permutation() {
        let ds = toy(9);
        let mut rng = StdRng::seed_from_u64(6);
        let mut seen: Vec<usize> = Batches::shuffled(&ds, 2, &mut rng)
            .unwrap()
            .flat_map(|b| {
                (0..b.count())
                    .map(|i| b.images()[[i, 0, 0, 0]] as usize)
                    .collect::<Vec<_>>()
            })
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_batches_reset() {
        let ds = toy(3);
        let mut batches = Batches::new(&ds, 3).unwrap();
        assert!(batches.next().is_some());
        assert!(batches.next().is_none());
        batches.reset();
        assert!(batches.next().is_some());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(Batches::new(&toy(3), 0).is_err());
    }
}
