use serde::{Deserialize, Serialize};

/// Side length of an MNIST image in pixels
pub const IMAGE_SIDE: usize = 28;

/// Pixels per image (28 x 28)
pub const PIXEL_COUNT: usize = IMAGE_SIDE * IMAGE_SIDE;

/// Fields per CSV row: one label followed by every pixel
pub const FIELD_COUNT: usize = PIXEL_COUNT + 1;

/// Number of digit classes
pub const NUM_CLASSES: usize = 10;

/// A labelled 28x28 grayscale digit with raw 8-bit intensities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digit {
    label: u8,
    pixels: Vec<u8>,
}

impl Digit {
    pub fn new(label: u8, pixels: Vec<u8>) -> Self {
        Self { label, pixels }
    }

    /// Build a digit from normalized intensities in [0, 1].
    ///
    /// Each value maps to `round(v * 255)`; values outside the unit
    /// interval saturate.
    pub fn from_normalized(label: u8, values: &[f32]) -> Self {
        let pixels = values.iter().map(|&v| to_byte(v)).collect();
        Self { label, pixels }
    }

    pub fn label(&self) -> u8 {
        self.label
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Get pixel value at (row, col) given a specific width
    pub fn pixel_at(&self, row: usize, col: usize, width: usize) -> u8 {
        self.pixels[row * width + col]
    }

    /// Convert digit to ASCII art representation
    pub fn to_ascii_art(&self, width: usize, height: usize) -> String {
        const CHARS: [char; 5] = [' ', '░', '▒', '▓', '█'];

        let mut result = String::new();
        for row in 0..height {
            for col in 0..width {
                let pixel = self.pixel_at(row, col, width);
                let char_idx = (pixel as usize * (CHARS.len() - 1)) / 255;
                result.push(CHARS[char_idx]);
            }
            result.push('\n');
        }
        result
    }
}

/// Map a normalized intensity onto an 8-bit gray level.
pub fn to_byte(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Lay several equally sized ASCII-art blocks side by side.
pub fn side_by_side(blocks: &[String], gap: usize) -> String {
    let split: Vec<Vec<&str>> = blocks.iter().map(|b| b.lines().collect()).collect();
    let height = split.iter().map(Vec::len).max().unwrap_or(0);
    let spacer = " ".repeat(gap);

    let mut out = String::new();
    for row in 0..height {
        let line: Vec<&str> = split
            .iter()
            .map(|lines| lines.get(row).copied().unwrap_or(""))
            .collect();
        out.push_str(&line.join(&spacer));
        out.push('\n');
    }
    out
}
