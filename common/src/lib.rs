mod digit;

pub use digit::{
    side_by_side, to_byte, Digit, FIELD_COUNT, IMAGE_SIDE, NUM_CLASSES, PIXEL_COUNT,
};
