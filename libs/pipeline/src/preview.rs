//! Preview batches: a few random test digits for display

use crate::error::{PipelineError, Result};
use crate::model::RenderSurface;
use crate::render::{image_buffer_at, PixelBuffer};
use common::{side_by_side, IMAGE_SIDE};
use ndarray::Array4;

/// What the model produced for a preview
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Denoised images, `[k, 28, 28, 1]`
    Images(Array4<f32>),
    /// Predicted class per sample
    Classes(Vec<u8>),
}

/// Which images of a preview to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewRow {
    Clean,
    Noisy,
    Predicted,
}

/// Randomly chosen samples prepared for display
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewBatch {
    /// Row of each sample in the source dataset
    pub indices: Vec<usize>,
    pub labels: Vec<u8>,
    pub clean: Array4<f32>,
    pub noisy: Array4<f32>,
    pub prediction: Option<Prediction>,
}

impl PreviewBatch {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn images(&self, row: PreviewRow) -> Result<&Array4<f32>> {
        match row {
            PreviewRow::Clean => Ok(&self.clean),
            PreviewRow::Noisy => Ok(&self.noisy),
            PreviewRow::Predicted => match &self.prediction {
                Some(Prediction::Images(images)) => Ok(images),
                Some(Prediction::Classes(_)) => Err(PipelineError::InvalidArgument(
                    "classifier predictions have no images".to_string(),
                )),
                None => Err(PipelineError::MissingInput("no prediction in preview".to_string())),
            },
        }
    }

    /// Pixel buffers for one row, magnified by `scale`.
    pub fn buffers(&self, row: PreviewRow, scale: usize) -> Result<Vec<PixelBuffer>> {
        let images = self.images(row)?;
        (0..self.len())
            .map(|i| image_buffer_at(images, i)?.upscale(scale))
            .collect()
    }

    /// Draw every image of `row` onto `surface`, in preview order.
    pub fn draw_row(
        &self,
        row: PreviewRow,
        scale: usize,
        surface: &mut dyn RenderSurface,
    ) -> Result<()> {
        for buffer in self.buffers(row, scale)? {
            surface.draw(&buffer)?;
        }
        Ok(())
    }

    /// The images of `row` as ASCII art, side by side.
    pub fn ascii_row(&self, row: PreviewRow) -> Result<String> {
        let blocks = self
            .buffers(row, 1)?
            .iter()
            .zip(&self.labels)
            .map(|(buffer, &label)| buffer.to_digit(label).to_ascii_art(IMAGE_SIDE, IMAGE_SIDE))
            .collect::<Vec<_>>();
        Ok(side_by_side(&blocks, 2))
    }

    /// Predicted classes, when a classifier produced them
    pub fn predicted_classes(&self) -> Option<&[u8]> {
        match &self.prediction {
            Some(Prediction::Classes(classes)) => Some(classes),
            _ => None,
        }
    }
}
