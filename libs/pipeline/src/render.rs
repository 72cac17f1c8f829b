//! Pixel buffers for displaying digits
//!
//! A normalized `[28, 28]` image becomes a 28x28 RGBA buffer: each value `v`
//! maps to gray level `round(v * 255)` on all three color channels with full
//! alpha. Magnification happens afterwards and never touches the values.

use crate::dataset::check_image_shape;
use crate::error::{PipelineError, Result};
use common::{to_byte, Digit, IMAGE_SIDE};
use ndarray::{Array2, Array4, ArrayView2, Axis};

/// RGBA pixels, row-major, 4 bytes per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
}

impl PixelBuffer {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.rgba
    }

    /// Gray level at (row, col). Panics outside the buffer.
    pub fn gray_at(&self, row: usize, col: usize) -> u8 {
        self.rgba[(row * self.width + col) * 4]
    }

    /// Gray level at (row, col), or `None` outside the buffer
    pub fn get_gray(&self, row: usize, col: usize) -> Option<u8> {
        (row < self.height && col < self.width).then(|| self.gray_at(row, col))
    }

    /// Nearest-neighbour magnification by an integer factor.
    pub fn upscale(&self, scale: usize) -> Result<Self> {
        if scale == 0 {
            return Err(PipelineError::InvalidArgument(
                "scale must be > 0".to_string(),
            ));
        }
        let width = self.width * scale;
        let height = self.height * scale;
        let mut rgba = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            for x in 0..width {
                let src = ((y / scale) * self.width + x / scale) * 4;
                rgba.extend_from_slice(&self.rgba[src..src + 4]);
            }
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Read the gray channel back as values in [0, 1].
    pub fn to_normalized(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.height, self.width), |(row, col)| {
            self.gray_at(row, col) as f32 / 255.0
        })
    }

    /// Gray channel as a digit with the given label
    pub fn to_digit(&self, label: u8) -> Digit {
        let pixels = self.rgba.chunks_exact(4).map(|px| px[0]).collect();
        Digit::new(label, pixels)
    }
}

/// Convert one normalized `[28, 28]` image to an RGBA buffer.
pub fn to_image_buffer(image: ArrayView2<'_, f32>) -> Result<PixelBuffer> {
    if image.shape() != [IMAGE_SIDE, IMAGE_SIDE] {
        return Err(PipelineError::ShapeMismatch {
            expected: vec![IMAGE_SIDE, IMAGE_SIDE],
            actual: image.shape().to_vec(),
        });
    }

    let mut rgba = Vec::with_capacity(IMAGE_SIDE * IMAGE_SIDE * 4);
    for &v in image.iter() {
        let gray = to_byte(v);
        rgba.extend_from_slice(&[gray, gray, gray, 255]);
    }

    Ok(PixelBuffer {
        width: IMAGE_SIDE,
        height: IMAGE_SIDE,
        rgba,
    })
}

/// Buffer for image `index` of a `[N, 28, 28, 1]` tensor.
pub fn image_buffer_at(images: &Array4<f32>, index: usize) -> Result<PixelBuffer> {
    check_image_shape(images.shape())?;
    if index >= images.shape()[0] {
        return Err(PipelineError::InvalidArgument(format!(
            "image {index} out of bounds for {} images",
            images.shape()[0]
        )));
    }
    let view = images
        .index_axis(Axis(0), index)
        .index_axis_move(Axis(2), 0);
    to_image_buffer(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_buffer_layout() {
        let mut image = Array2::<f32>::zeros((28, 28));
        image[[0, 1]] = 1.0;
        image[[2, 0]] = 0.5;

        let buffer = to_image_buffer(image.view()).unwrap();
        assert_eq!(buffer.width(), 28);
        assert_eq!(buffer.height(), 28);
        assert_eq!(buffer.rgba().len(), 28 * 28 * 4);
        assert_eq!(&buffer.rgba()[4..8], &[255, 255, 255, 255]);
        assert_eq!(&buffer.rgba()[0..4], &[0, 0, 0, 255]);
        assert_eq!(buffer.gray_at(2, 0), 128);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let image = Array2::from_shape_fn((28, 28), |(r, c)| ((r * 28 + c) % 256) as f32 / 255.0);
        let buffer = to_image_buffer(image.view()).unwrap();
        let back = buffer.to_normalized();
        for (a, b) in image.iter().zip(back.iter()) {
            assert!((a - b).abs() <= 1.0 / 255.0);
        }
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let image = Array2::<f32>::zeros((28, 27));
        assert!(matches!(
            to_image_buffer(image.view()),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_upscale_nearest_neighbour() {
        let mut image = Array2::<f32>::zeros((28, 28));
        image[[27, 27]] = 1.0;
        let buffer = to_image_buffer(image.view()).unwrap();
        let big = buffer.upscale(4).unwrap();
        assert_eq!(big.width(), 112);
        assert_eq!(big.height(), 112);
        for y in 108..112 {
            for x in 108..112 {
                assert_eq!(big.gray_at(y, x), 255);
            }
        }
        assert_eq!(big.gray_at(107, 111), 0);
        assert_eq!(buffer.upscale(1).unwrap(), buffer);
        assert!(buffer.upscale(0).is_err());
    }

    #[test]
    fn test_get_gray_bounds() {
        let mut image = Array2::<f32>::zeros((28, 28));
        image[[27, 0]] = 1.0;
        let buffer = to_image_buffer(image.view()).unwrap();
        assert_eq!(buffer.get_gray(27, 0), Some(255));
        assert_eq!(buffer.get_gray(0, 28), None);
        assert_eq!(buffer.get_gray(28, 0), None);
    }

    #[test]
    #[should_panic]
    fn test_gray_at_out_of_bounds_panics() {
        let buffer = to_image_buffer(Array2::<f32>::zeros((28, 28)).view()).unwrap();
        buffer.gray_at(28, 0);
    }

    #[test]
    fn test_image_buffer_at() {
        let mut images = Array4::<f32>::zeros((2, 28, 28, 1));
        images[[1, 5, 6, 0]] = 1.0;
        let buffer = image_buffer_at(&images, 1).unwrap();
        assert_eq!(buffer.gray_at(5, 6), 255);
        assert!(image_buffer_at(&images, 2).is_err());
    }

    #[test]
    fn test_to_digit() {
        let image = Array2::from_elem((28, 28), 1.0f32);
        let digit = to_image_buffer(image.view()).unwrap().to_digit(4);
        assert_eq!(digit.label(), 4);
        assert!(digit.pixels().iter().all(|&p| p == 255));
    }
}
